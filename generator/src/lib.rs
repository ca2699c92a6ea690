// Library lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

pub mod attacks;
pub mod builder;
pub mod config;
pub mod features;
pub mod sink;
