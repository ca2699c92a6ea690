use crate::frame::Packet;
use crate::parser::ParseFn;
use serde::{Deserialize, Serialize};

/// Guide: How to Add a Protocol
/// 1. Add it to the `ProtocolId` enum and to `ProtocolData`.
/// 2. Add a parsing method with the signature `ParseFn` to the `ProtocolId::parse` method. The parsing method itself should be placed in your module, e.g., `protocols::custom_protocol`.
/// 3. If there is a way to determine the nested protocol, create a `best_children` method in your module, following the pattern of existing methods. Link your new method in `ProtocolId::best_children`.
/// 4. Add an `encode` method to your protocol structure and link it in `ProtocolData::encode`.
///
/// That's it! After that, write tests and verify that parsing and encoding agree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ProtocolId {
    Ethernet,

    Arp,

    IPv4,

    ICMPv4,
    TCP,
    UDP,

    DNS,
}

impl ProtocolId {
    pub fn parse(&self) -> ParseFn {
        match self {
            Self::Ethernet => ethernet::parse,
            Self::Arp => arp::parse,
            Self::DNS => dns::parse,
            Self::ICMPv4 => icmpv4::parse,
            Self::IPv4 => ipv4::parse,
            Self::TCP => tcp::parse,
            Self::UDP => udp::parse,
        }
    }

    pub fn best_children(&self, packet: &Packet) -> Option<Self> {
        match self {
            Self::Ethernet => ethernet::best_children(packet),
            Self::Arp => None,
            Self::DNS => None,
            Self::ICMPv4 => None,
            Self::IPv4 => ipv4::best_children(packet),
            Self::TCP => tcp::best_children(packet),
            Self::UDP => udp::best_children(packet),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum ProtocolData {
    Ethernet(ethernet::Ethernet),

    Arp(arp::Arp),

    DNS(dns::DNS),

    IPv4(ipv4::IPv4),

    ICMPv4(icmpv4::ICMPv4),

    TCP(tcp::TCP),
    UDP(udp::UDP),

    // Application bytes no protocol above claims
    Payload(Vec<u8>),
}

impl ProtocolData {
    /// Wire bytes of this layer with `payload` (already encoded inner layers) appended.
    /// `outer` is the enclosing layer, needed for pseudo-header checksums.
    pub fn encode(&self, payload: &[u8], outer: Option<&ProtocolData>) -> Vec<u8> {
        match self {
            Self::Ethernet(value) => value.encode(payload),
            Self::Arp(value) => value.encode(payload),
            Self::DNS(value) => value.encode(payload),
            Self::IPv4(value) => value.encode(payload),
            Self::ICMPv4(value) => value.encode(payload),
            Self::TCP(value) => value.encode(payload, outer),
            Self::UDP(value) => value.encode(payload, outer),
            Self::Payload(bytes) => {
                let mut result = Vec::with_capacity(bytes.len() + payload.len());
                result.extend_from_slice(bytes);
                result.extend_from_slice(payload);
                result
            },
        }
    }
}

impl From<ethernet::Ethernet> for ProtocolData {
    fn from(value: ethernet::Ethernet) -> Self {
        Self::Ethernet(value)
    }
}

impl From<arp::Arp> for ProtocolData {
    fn from(value: arp::Arp) -> Self {
        Self::Arp(value)
    }
}

impl From<dns::DNS> for ProtocolData {
    fn from(value: dns::DNS) -> Self {
        Self::DNS(value)
    }
}

impl From<ipv4::IPv4> for ProtocolData {
    fn from(value: ipv4::IPv4) -> Self {
        Self::IPv4(value)
    }
}

impl From<icmpv4::ICMPv4> for ProtocolData {
    fn from(value: icmpv4::ICMPv4) -> Self {
        Self::ICMPv4(value)
    }
}

impl From<tcp::TCP> for ProtocolData {
    fn from(value: tcp::TCP) -> Self {
        Self::TCP(value)
    }
}

impl From<udp::UDP> for ProtocolData {
    fn from(value: udp::UDP) -> Self {
        Self::UDP(value)
    }
}

impl From<Vec<u8>> for ProtocolData {
    fn from(value: Vec<u8>) -> Self {
        Self::Payload(value)
    }
}

pub mod arp;
pub mod dns;
pub mod ethernet;
pub mod icmpv4;
pub mod ip {
    pub mod address;
    pub mod protocol;
}
pub mod ipv4;
pub mod tcp;
pub mod udp;
