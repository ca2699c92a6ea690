use crate::checksum;
use crate::protocols::ProtocolData;
use nom::IResult;
use nom::Parser;
use nom::number::{be_u8, be_u16};
use serde::{Deserialize, Serialize};

// ICMPv4 Protocol
// RFC 792: https://datatracker.ietf.org/doc/html/rfc792

pub const HEADER_LENGTH: usize = 4;
pub const TYPE_ECHO_REPLY: u8 = 0;
pub const TYPE_ECHO_REQUEST: u8 = 8;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], ProtocolData> {
    // Message type. 1 byte
    let (rest, message_type) = be_u8().parse(bytes)?;

    // Code. 1 byte
    let (rest, code) = be_u8().parse(rest)?;

    // Checksum. 2 bytes
    let (rest, checksum) = be_u16().parse(rest)?;

    // Data, depending on type & code.
    let data = rest.to_vec();

    let protocol = ICMPv4 {
        message_type,
        code,
        checksum,
        data,
    };

    let rest: &[u8] = &[];
    Ok((rest, ProtocolData::ICMPv4(protocol)))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ICMPv4 {
    pub message_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub data: Vec<u8>,
}

impl ICMPv4 {
    /// Echo request with zero identifier and sequence number.
    pub fn echo_request() -> Self {
        Self {
            message_type: TYPE_ECHO_REQUEST,
            code: 0,
            checksum: 0,
            data: vec![0; 4],
        }
    }

    /// Checksum is recomputed over the whole message.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LENGTH + self.data.len() + payload.len());
        bytes.push(self.message_type);
        bytes.push(self.code);
        // Checksum placeholder
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&self.data);
        bytes.extend_from_slice(payload);

        let checksum = checksum::internet(&bytes);
        bytes[2..4].copy_from_slice(&checksum.to_be_bytes());

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ProtocolParser;
    use crate::protocols::ProtocolId;
    use crate::protocols::ip::protocol::IpNextLevelProtocol;
    use crate::protocols::ipv4::IPv4;
    use std::net::Ipv4Addr;

    #[test]
    fn test_icmpv4() {
        let hex_actual = "00 1A 8C 10 AD 30 00 1E 68 51 4F A9 08 00 45 00 00 3C 7E 74 00 00 20 01 EB DF AC 10 FF 01 43 D7 41 84 08 00 40 08 00 01 0F 55 41 42 43 44 45 46 47 48 49 4A 4B 4C 4D 4E 4F 50 51 52 53 54 55 56 57 41 42 43 44 45 46 47 48 49".replace(" ", "");
        let frame = hex::decode(hex_actual).unwrap();

        let parser = ProtocolParser::new(ProtocolId::Ethernet);
        let packet = parser.process(&frame).unwrap();

        let expected_ipv4 = IPv4 {
            version: 4,
            internet_header_length: 20,
            differentiated_services_code_point: 0,
            explicit_congestion_notification: 0,
            total_length: 60,
            identification: 0x7e74,
            flags: 0,
            fragment_offset: 0,
            time_to_live: 32,
            protocol_inner: IpNextLevelProtocol::ICMP,
            checksum: 0xebdf,
            address_source: Ipv4Addr::new(172, 16, 255, 1),
            options: vec![],
            address_destination: Ipv4Addr::new(67, 215, 65, 132),
        };
        assert_eq!(packet.ipv4(), Some(&expected_ipv4));

        let expected_icmp = ICMPv4 {
            message_type: 8,
            code: 0,
            checksum: 0x4008,
            data: vec![
                0x00, 0x01, 0x0F, 0x55, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
                0x49, 0x4a, 0x4b, 0x4c, 0x4d, 0x4e, 0x4f, 0x50, 0x51, 0x52, 0x53, 0x54,
                0x55, 0x56, 0x57, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
            ],
        };
        assert_eq!(packet.icmpv4(), Some(&expected_icmp));
        assert_eq!(packet.layers.len(), 3);

        assert_eq!(packet.encode(), frame);
    }

    #[test]
    fn test_echo_request() {
        let bytes = ICMPv4::echo_request().encode(&[]);
        assert_eq!(bytes, vec![0x08, 0x00, 0xF7, 0xFF, 0x00, 0x00, 0x00, 0x00]);
    }
}
