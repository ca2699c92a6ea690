use crate::checksum;
use crate::frame::Packet;
use crate::parser::ParserError;
use crate::protocols::ip::protocol::IpNextLevelProtocol;
use crate::protocols::{ProtocolData, ProtocolId, ip};
use nom::bytes::take;
use nom::number::{be_u8, be_u16};
use nom::{IResult, Parser, bits};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

// IPv4 Protocol
// RFC 791: https://datatracker.ietf.org/doc/html/rfc791

pub const VERSION_LENGTH_BITS: usize = 4;
pub const IHL_LENGTH_BITS: usize = 4;
pub const DSCP_LENGTH_BITS: usize = 6;
pub const ECN_LENGTH_BITS: usize = 2;
pub const FLAGS_LENGTH_BITS: usize = 3;
pub const FRAGMENT_OFFSET_LENGTH_BITS: usize = 13;

pub const HEADER_LENGTH: usize = 20;
pub const FLAG_DONT_FRAGMENT: u8 = 0b010;
pub const FLAG_MORE_FRAGMENTS: u8 = 0b001;
// Fragment offset is a 13-bit field
pub const MAX_FRAGMENT_OFFSET: u16 = 0x1FFF;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], ProtocolData> {
    // Version (4 bits), Internet Header Length (4 bits)
    let (rest, (version, internet_header_length)): (&[u8], (u8, u8)) =
        bits::bits::<_, _, nom::error::Error<_>, _, _>((
            bits::complete::take(VERSION_LENGTH_BITS),
            bits::complete::take(IHL_LENGTH_BITS),
        ))(bytes)?;
    if version != 4 {
        return Err(ParserError::ErrorVerify.to_nom(bytes));
    }
    // IHL is stored in 32bit words.
    let internet_header_length = internet_header_length
        .checked_mul(4)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
    if (internet_header_length as usize) < HEADER_LENGTH {
        return Err(ParserError::ErrorVerify.to_nom(bytes));
    }

    // DSCP (6 bits), ECN (2 bits)
    let (rest, (differentiated_services_code_point, explicit_congestion_notification)): (
        &[u8],
        (u8, u8),
    ) = bits::bits::<_, _, nom::error::Error<_>, _, _>((
        bits::complete::take(DSCP_LENGTH_BITS),
        bits::complete::take(ECN_LENGTH_BITS),
    ))(rest)?;

    // Total Length. 2 bytes
    let (rest, total_length) = be_u16().parse(rest)?;
    // Identification. 2 bytes
    let (rest, identification) = be_u16().parse(rest)?;

    // Flags (3 bits), Fragment Offset (13 bits)
    let (rest, (flags, fragment_offset)): (&[u8], (u8, u16)) =
        bits::bits::<_, _, nom::error::Error<_>, _, _>((
            bits::complete::take(FLAGS_LENGTH_BITS),
            bits::complete::take(FRAGMENT_OFFSET_LENGTH_BITS),
        ))(rest)?;

    // Time To Live. 1 byte
    let (rest, time_to_live) = be_u8().parse(rest)?;
    // Protocol. 1 byte
    let (rest, protocol_inner) = be_u8().parse(rest)?;
    let protocol_inner = IpNextLevelProtocol::try_from(protocol_inner)
        .map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;
    // Header Checksum. 2 bytes
    let (rest, checksum) = be_u16().parse(rest)?;

    // Source Address
    let (rest, address_source) = ip::address::v4_parse(rest)?;
    // Destination Address
    let (rest, address_destination) = ip::address::v4_parse(rest)?;

    // Options, kept as raw bytes
    let options_length = internet_header_length as usize - HEADER_LENGTH;
    let (rest, options) = take(options_length).parse(rest)?;

    // Cutting ethernet padding
    let payload_length = (total_length as usize)
        .checked_sub(internet_header_length as usize)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
    let payload = rest
        .get(..payload_length)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;

    let protocol = IPv4 {
        version,
        internet_header_length,
        differentiated_services_code_point,
        explicit_congestion_notification,
        total_length,
        identification,
        flags,
        fragment_offset,
        time_to_live,
        protocol_inner,
        checksum,
        address_source,
        address_destination,
        options: options.to_vec(),
    };

    Ok((payload, ProtocolData::IPv4(protocol)))
}

pub fn best_children(packet: &Packet) -> Option<ProtocolId> {
    // Checking IP inner protocol type
    let ipv4 = match packet.layers.last() {
        Some(ProtocolData::IPv4(value)) => value,
        _ => return None,
    };

    // Fragments carry raw slices of the original datagram
    if ipv4.is_fragment() {
        return None;
    }

    match ipv4.protocol_inner {
        IpNextLevelProtocol::ICMP => Some(ProtocolId::ICMPv4),
        IpNextLevelProtocol::TCP => Some(ProtocolId::TCP),
        IpNextLevelProtocol::UDP => Some(ProtocolId::UDP),
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IPv4 {
    pub version: u8,
    // In bytes
    pub internet_header_length: u8,
    pub differentiated_services_code_point: u8,
    pub explicit_congestion_notification: u8,
    pub total_length: u16,
    pub identification: u16,
    pub flags: u8,
    pub fragment_offset: u16,
    pub time_to_live: u8,
    pub protocol_inner: IpNextLevelProtocol,
    pub checksum: u16,
    pub address_source: Ipv4Addr,
    pub address_destination: Ipv4Addr,
    pub options: Vec<u8>,
}

impl IPv4 {
    pub fn new(
        address_source: Ipv4Addr, address_destination: Ipv4Addr, time_to_live: u8,
        protocol_inner: IpNextLevelProtocol,
    ) -> Self {
        Self {
            version: 4,
            internet_header_length: HEADER_LENGTH as u8,
            differentiated_services_code_point: 0,
            explicit_congestion_notification: 0,
            total_length: 0,
            identification: 1,
            flags: 0,
            fragment_offset: 0,
            time_to_live,
            protocol_inner,
            checksum: 0,
            address_source,
            address_destination,
            options: vec![],
        }
    }

    pub fn is_fragment(&self) -> bool {
        self.flags & FLAG_MORE_FRAGMENTS != 0 || self.fragment_offset != 0
    }

    /// Emits 20 bytes plus the options padded to 32-bit words. The IHL field is
    /// `internet_header_length` or the emitted length, whichever is larger,
    /// so a header may claim more bytes than it has.
    /// Total length and checksum are recomputed.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut options = self.options.clone();
        while options.len() % 4 != 0 {
            options.push(0);
        }
        let header_length = HEADER_LENGTH + options.len();

        let total_length = u16::try_from(header_length + payload.len()).unwrap_or(u16::MAX);
        let claimed_length = usize::from(self.internet_header_length).max(header_length);
        let ihl_words = u8::try_from(claimed_length / 4).unwrap_or(0x0F) & 0x0F;

        let mut bytes = Vec::with_capacity(header_length + payload.len());
        bytes.push((self.version << 4) | ihl_words);
        bytes.push(
            (self.differentiated_services_code_point << 2)
                | (self.explicit_congestion_notification & 0b11),
        );
        bytes.extend_from_slice(&total_length.to_be_bytes());
        bytes.extend_from_slice(&self.identification.to_be_bytes());
        let flags_and_offset = (u16::from(self.flags & 0b111) << 13)
            | (self.fragment_offset & MAX_FRAGMENT_OFFSET);
        bytes.extend_from_slice(&flags_and_offset.to_be_bytes());
        bytes.push(self.time_to_live);
        bytes.push(self.protocol_inner.number());
        // Checksum placeholder
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&self.address_source.octets());
        bytes.extend_from_slice(&self.address_destination.octets());
        bytes.extend_from_slice(&options);

        let checksum = checksum::internet(&bytes);
        bytes[10..12].copy_from_slice(&checksum.to_be_bytes());

        bytes.extend_from_slice(payload);
        bytes
    }
}
