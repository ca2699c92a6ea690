use crate::protocols::arp::Arp;
use crate::protocols::dns::DNS;
use crate::protocols::icmpv4::ICMPv4;
use crate::protocols::ipv4::IPv4;
use crate::protocols::tcp::TCP;
use crate::protocols::udp::UDP;
use crate::protocols::ProtocolData;
use serde::{Deserialize, Serialize};

/// Layered packet, outermost layer first.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Packet {
    pub layers: Vec<ProtocolData>,
}

impl Packet {
    pub fn new(layers: Vec<ProtocolData>) -> Self {
        Self { layers }
    }

    /// Stacks `layer` under the current innermost layer.
    pub fn push(mut self, layer: impl Into<ProtocolData>) -> Self {
        self.layers.push(layer.into());
        self
    }

    /// Wire bytes. Lengths and checksums are recomputed on every call.
    pub fn encode(&self) -> Vec<u8> {
        encode_layers(&self.layers, None)
    }

    /// Length of the encoded packet in bytes.
    pub fn len(&self) -> usize {
        self.encode().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn arp(&self) -> Option<&Arp> {
        self.layers.iter().find_map(|layer| match layer {
            ProtocolData::Arp(value) => Some(value),
            _ => None,
        })
    }

    pub fn dns(&self) -> Option<&DNS> {
        self.layers.iter().find_map(|layer| match layer {
            ProtocolData::DNS(value) => Some(value),
            _ => None,
        })
    }

    pub fn icmpv4(&self) -> Option<&ICMPv4> {
        self.layers.iter().find_map(|layer| match layer {
            ProtocolData::ICMPv4(value) => Some(value),
            _ => None,
        })
    }

    pub fn ipv4(&self) -> Option<&IPv4> {
        self.layers.iter().find_map(|layer| match layer {
            ProtocolData::IPv4(value) => Some(value),
            _ => None,
        })
    }

    pub fn tcp(&self) -> Option<&TCP> {
        self.layers.iter().find_map(|layer| match layer {
            ProtocolData::TCP(value) => Some(value),
            _ => None,
        })
    }

    pub fn udp(&self) -> Option<&UDP> {
        self.layers.iter().find_map(|layer| match layer {
            ProtocolData::UDP(value) => Some(value),
            _ => None,
        })
    }

    /// Encoded bytes carried by the first TCP layer, or by the first UDP layer
    /// when there is no TCP. Empty when neither is present.
    pub fn transport_payload(&self) -> Vec<u8> {
        let position = self
            .layers
            .iter()
            .position(|layer| matches!(layer, ProtocolData::TCP(_)))
            .or_else(|| {
                self.layers
                    .iter()
                    .position(|layer| matches!(layer, ProtocolData::UDP(_)))
            });

        match position {
            Some(index) => match self.layers.get(index + 1..) {
                Some(inner) => encode_layers(inner, self.layers.get(index)),
                None => Vec::new(),
            },
            None => Vec::new(),
        }
    }
}

/// Encodes `layers` innermost first, so every layer sees its encoded payload.
pub fn encode_layers(layers: &[ProtocolData], outer: Option<&ProtocolData>) -> Vec<u8> {
    let mut bytes: Vec<u8> = Vec::new();
    for (index, layer) in layers.iter().enumerate().rev() {
        let enclosing = match index.checked_sub(1) {
            Some(previous) => layers.get(previous),
            None => outer,
        };
        bytes = layer.encode(&bytes, enclosing);
    }

    bytes
}
