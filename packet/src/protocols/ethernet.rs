use crate::frame::Packet;
use crate::protocols::ethernet::ether_type::EtherType;
use crate::protocols::ethernet::mac::MacAddress;
use crate::protocols::{ProtocolData, ProtocolId};
use nom::IResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Ethernet II
// IEEE 802.3

pub const HEADER_LENGTH: usize = 14;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], ProtocolData> {
    // Destination MAC. 6 bytes
    let (rest, destination_mac) = mac::parse(bytes)?;
    // Source MAC. 6 bytes
    let (rest, source_mac) = mac::parse(rest)?;
    // EtherType. 2 bytes
    let (rest, ether_type) = ether_type::parse(rest)?;

    let protocol = Ethernet {
        destination_mac,
        source_mac,
        ether_type,
    };

    Ok((rest, ProtocolData::Ethernet(protocol)))
}

pub fn best_children(packet: &Packet) -> Option<ProtocolId> {
    let ethernet = match packet.layers.last() {
        Some(ProtocolData::Ethernet(value)) => value,
        _ => return None,
    };

    match ethernet.ether_type {
        EtherType::Arp => Some(ProtocolId::Arp),
        EtherType::Ipv4 => Some(ProtocolId::IPv4),
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Ethernet {
    pub destination_mac: MacAddress,
    pub source_mac: MacAddress,
    pub ether_type: EtherType,
}

impl Ethernet {
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LENGTH + payload.len());
        bytes.extend_from_slice(&self.destination_mac.0);
        bytes.extend_from_slice(&self.source_mac.0);
        bytes.extend_from_slice(self.ether_type.bytes());
        bytes.extend_from_slice(payload);

        bytes
    }
}

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq)]
pub enum EthernetError {
    #[error("Unknown ether type.")]
    EtherTypeUnknown,

    #[error("Failed to decode MAC address from hex.")]
    MacFailedHexDecode,

    #[error("Invalid MAC address bytes length.")]
    MacInvalidBytesLength,

    #[error("Invalid MAC address string length.")]
    MacInvalidStringLength,
}

pub mod ether_type;
pub mod mac;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ProtocolParser;
    use crate::protocols::arp::Arp;
    use crate::protocols::arp::operation::Operation;
    use std::net::Ipv4Addr;

    #[test]
    fn test_arp_frame() {
        let hex_actual = "00 1A 8C 10 AD 30 00 1E 68 51 4F A9 08 06 00 01 08 00 06 04 00 02 00 1E 68 51 4F A9 AC 10 FF 01 00 1A 8C 10 AD 30 AC 10 00 01".replace(" ", "");
        let frame = hex::decode(hex_actual).unwrap();

        let parser = ProtocolParser::new(ProtocolId::Ethernet);
        let packet = parser.process(&frame).unwrap();

        let actual_ethernet = match packet.layers[0].clone() {
            ProtocolData::Ethernet(value) => value,
            _ => panic!(),
        };
        let expected_ethernet = Ethernet {
            destination_mac: MacAddress::try_from("00:1A:8C:10:AD:30").unwrap(),
            source_mac: MacAddress::try_from("00:1E:68:51:4F:A9").unwrap(),
            ether_type: EtherType::Arp,
        };
        assert_eq!(actual_ethernet, expected_ethernet);

        let actual_arp = packet.arp().unwrap();
        let expected_arp = Arp::reply(
            MacAddress::try_from("00:1E:68:51:4F:A9").unwrap(),
            Ipv4Addr::new(172, 16, 255, 1),
            MacAddress::try_from("00:1A:8C:10:AD:30").unwrap(),
            Ipv4Addr::new(172, 16, 0, 1),
        );
        assert_eq!(actual_arp, &expected_arp);
        assert_eq!(actual_arp.operation, Operation::Reply);

        assert_eq!(packet.encode(), frame);
    }

    #[test]
    fn test_unhandled_ether_type_keeps_payload() {
        let hex_actual = "FF FF FF FF FF FF 00 1E 68 51 4F A9 88 CC 02 07 04".replace(" ", "");
        let frame = hex::decode(hex_actual).unwrap();

        let parser = ProtocolParser::new(ProtocolId::Ethernet);
        let packet = parser.process(&frame).unwrap();

        assert_eq!(packet.layers.len(), 2);
        assert_eq!(packet.layers[1], ProtocolData::Payload(vec![0x02, 0x07, 0x04]));
    }
}
