use crate::checksum;
use crate::frame::Packet;
use crate::parser::ParserError;
use crate::protocols::ip::protocol::IpNextLevelProtocol;
use crate::protocols::{ProtocolData, ProtocolId, dns};
use nom::IResult;
use nom::Parser;
use nom::number::be_u16;
use serde::{Deserialize, Serialize};

// UDP Protocol
// RFC 768: https://datatracker.ietf.org/doc/html/rfc768

pub const HEADER_LENGTH: usize = 8;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], ProtocolData> {
    // Source port. 2 bytes
    let (rest, port_source) = be_u16().parse(bytes)?;
    // Destination port. 2 bytes
    let (rest, port_destination) = be_u16().parse(rest)?;
    // Length. 2 bytes
    let (rest, length) = be_u16().parse(rest)?;
    // Checksum. 2 bytes
    let (rest, checksum) = be_u16().parse(rest)?;

    let payload_length = (length as usize)
        .checked_sub(HEADER_LENGTH)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
    let payload = rest.get(..payload_length).unwrap_or(rest);

    let protocol = UDP {
        port_source,
        port_destination,
        length,
        checksum,
    };

    Ok((payload, ProtocolData::UDP(protocol)))
}

pub fn best_children(packet: &Packet) -> Option<ProtocolId> {
    // Checking ports
    let layer = match packet.layers.last() {
        Some(ProtocolData::UDP(value)) => value,
        _ => return None,
    };

    if dns::is_protocol_default(layer.port_source, layer.port_destination) {
        Some(ProtocolId::DNS)
    } else {
        None
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UDP {
    pub port_source: u16,
    pub port_destination: u16,
    pub length: u16,
    pub checksum: u16,
}

impl UDP {
    pub fn new(port_source: u16, port_destination: u16) -> Self {
        Self {
            port_source,
            port_destination,
            length: HEADER_LENGTH as u16,
            checksum: 0,
        }
    }

    /// Length and checksum are recomputed. Checksum needs an enclosing IPv4 layer.
    pub fn encode(&self, payload: &[u8], outer: Option<&ProtocolData>) -> Vec<u8> {
        let length = u16::try_from(HEADER_LENGTH + payload.len()).unwrap_or(u16::MAX);

        let mut bytes = Vec::with_capacity(HEADER_LENGTH + payload.len());
        bytes.extend_from_slice(&self.port_source.to_be_bytes());
        bytes.extend_from_slice(&self.port_destination.to_be_bytes());
        bytes.extend_from_slice(&length.to_be_bytes());
        // Checksum placeholder
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(payload);

        if matches!(outer, Some(ProtocolData::IPv4(_))) {
            let checksum =
                match checksum::transport(outer, IpNextLevelProtocol::UDP.number(), &bytes) {
                    // Zero means "no checksum" in UDP
                    0 => 0xFFFF,
                    value => value,
                };
            bytes[6..8].copy_from_slice(&checksum.to_be_bytes());
        }

        bytes
    }
}
