// Library lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

pub use crate::frame::Packet;
pub use crate::parser::ProtocolParser;
pub use crate::protocols::{ProtocolData, ProtocolId};

pub mod checksum;
pub mod fragment;
pub mod frame;
pub mod parser;
pub mod protocols;
