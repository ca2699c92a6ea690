use crate::checksum;
use crate::frame::Packet;
use crate::parser::{self, ParserError};
use crate::protocols::ip::protocol::IpNextLevelProtocol;
use crate::protocols::{ProtocolData, ProtocolId, dns};
use nom::bytes::take;
use nom::number::{be_u8, be_u16, be_u32, be_u64};
use nom::{IResult, Parser, bits};
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
// TCP Protocol
// RFC 9293: https://datatracker.ietf.org/doc/html/rfc9293

pub const DATA_OFFSET_LENGTH_BITS: usize = 4;
pub const RESERVED_LENGTH_BITS: usize = 4;
pub const FLAG_LENGTH_BITS: usize = 1;
pub const HEADER_LENGTH: usize = 20;

pub const FLAG_FIN: u8 = 0x01;
pub const FLAG_SYN: u8 = 0x02;
pub const FLAG_RST: u8 = 0x04;
pub const FLAG_PSH: u8 = 0x08;
pub const FLAG_ACK: u8 = 0x10;
pub const FLAG_URG: u8 = 0x20;
pub const FLAG_ECE: u8 = 0x40;
pub const FLAG_CWR: u8 = 0x80;

type TcpFlags = (u8, u8, u8, u8, u8, u8, u8, u8);
pub fn parse(bytes: &[u8]) -> IResult<&[u8], ProtocolData> {
    // Source port. 2 bytes
    let (rest, port_source) = be_u16().parse(bytes)?;
    // Destination port. 2 bytes
    let (rest, port_destination) = be_u16().parse(rest)?;

    // Sequence number, 4 bytes
    let (rest, sequence_number) = be_u32().parse(rest)?;
    // Acknowledgement number, 4 bytes
    let (rest, acknowledgement_number) = be_u32().parse(rest)?;

    // Data Offset, Reserved. Both - 4 bits
    let (rest, (data_offset, reserved)): (&[u8], (u16, u8)) =
        bits::bits::<_, _, nom::error::Error<_>, _, _>((
            bits::complete::take(DATA_OFFSET_LENGTH_BITS),
            bits::complete::take(RESERVED_LENGTH_BITS),
        ))(rest)?;
    // Data Offset is stored in 32bit words. So, we are doing DOffset * 32 / 8 (bits in bytes)
    let data_offset = data_offset
        .checked_mul(4)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
    if (data_offset as usize) < HEADER_LENGTH {
        return Err(ParserError::ErrorVerify.to_nom(bytes));
    }

    // Already parsed 13 bytes, so doing sub 13.
    let boundary = data_offset
        .checked_sub(13)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))? as usize;
    let payload = rest
        .get(boundary..)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
    let rest = rest
        .get(..boundary)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;

    // Flags: 8 flags by 1 bit.
    let (rest, flags): (&[u8], TcpFlags) =
        bits::bits::<_, _, nom::error::Error<_>, _, _>((
            bits::complete::take(FLAG_LENGTH_BITS),
            bits::complete::take(FLAG_LENGTH_BITS),
            bits::complete::take(FLAG_LENGTH_BITS),
            bits::complete::take(FLAG_LENGTH_BITS),
            bits::complete::take(FLAG_LENGTH_BITS),
            bits::complete::take(FLAG_LENGTH_BITS),
            bits::complete::take(FLAG_LENGTH_BITS),
            bits::complete::take(FLAG_LENGTH_BITS),
        ))(rest)?;
    let flags =
        Flags::try_from(flags).map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;

    // Window: 2 bytes.
    let (rest, window) = be_u16().parse(rest)?;
    // Checksum: 2 bytes.
    let (rest, checksum) = be_u16().parse(rest)?;
    // Urgent pointer: 2 bytes.
    let (rest, urgent_pointer) = be_u16().parse(rest)?;

    // Options - up to 320 bits.
    let mut options: Vec<OptionData> = Vec::new();
    let mut option_bytes_buffer = rest;
    while !option_bytes_buffer.is_empty() {
        let (rest, kind) = be_u8().parse(option_bytes_buffer)?;
        // Unknown kinds and unexpected layouts are skipped by their length byte
        let (rest, value) = match OptionId::try_from(kind) {
            Ok(id) => id.parse(rest).or_else(|_| parse_unknown_option(kind, rest))?,
            Err(_) => parse_unknown_option(kind, rest)?,
        };
        options.push(value);
        option_bytes_buffer = rest;
    }

    let protocol = TCP {
        port_source,
        port_destination,
        sequence_number,
        acknowledgement_number,
        data_offset,
        reserved,
        flags,
        window,
        checksum,
        urgent_pointer,
        options,
    };

    Ok((payload, ProtocolData::TCP(protocol)))
}

fn parse_unknown_option(kind: u8, bytes: &[u8]) -> IResult<&[u8], OptionData> {
    // Length covers kind and length bytes
    let (rest, length) = be_u8().parse(bytes)?;
    let data_length = length
        .checked_sub(2)
        .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
    let (rest, data) = take(data_length).parse(rest)?;

    Ok((
        rest,
        OptionData::Unknown {
            kind,
            data: data.to_vec(),
        },
    ))
}

pub fn best_children(packet: &Packet) -> Option<ProtocolId> {
    // Checking ports
    let layer = match packet.layers.last() {
        Some(ProtocolData::TCP(value)) => value,
        _ => return None,
    };

    if dns::is_protocol_default(layer.port_source, layer.port_destination) {
        return Some(ProtocolId::DNS);
    }

    None
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TCP {
    pub port_source: u16,
    pub port_destination: u16,
    pub sequence_number: u32,
    pub acknowledgement_number: u32,
    pub data_offset: u16,
    pub reserved: u8,
    pub flags: Flags,
    pub window: u16,
    pub checksum: u16,
    pub urgent_pointer: u16,
    pub options: Vec<OptionData>,
}

impl TCP {
    pub fn new(port_source: u16, port_destination: u16, flags: Flags, window: u16) -> Self {
        Self {
            port_source,
            port_destination,
            sequence_number: 0,
            acknowledgement_number: 0,
            data_offset: HEADER_LENGTH as u16,
            reserved: 0,
            flags,
            window,
            checksum: 0,
            urgent_pointer: 0,
            options: vec![],
        }
    }

    /// Data offset and checksum are recomputed. Checksum needs an enclosing IPv4 layer.
    pub fn encode(&self, payload: &[u8], outer: Option<&ProtocolData>) -> Vec<u8> {
        let mut options: Vec<u8> = Vec::new();
        for option in &self.options {
            option.encode(&mut options);
        }
        // Header is aligned to 32bit words
        while options.len() % 4 != 0 {
            options.push(0);
        }
        let header_length = HEADER_LENGTH + options.len();
        let data_offset_words = u8::try_from(header_length / 4).unwrap_or(0x0F) & 0x0F;

        let mut bytes = Vec::with_capacity(header_length + payload.len());
        bytes.extend_from_slice(&self.port_source.to_be_bytes());
        bytes.extend_from_slice(&self.port_destination.to_be_bytes());
        bytes.extend_from_slice(&self.sequence_number.to_be_bytes());
        bytes.extend_from_slice(&self.acknowledgement_number.to_be_bytes());
        bytes.push((data_offset_words << 4) | (self.reserved & 0x0F));
        bytes.push(u8::from(&self.flags));
        bytes.extend_from_slice(&self.window.to_be_bytes());
        // Checksum placeholder
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&self.urgent_pointer.to_be_bytes());
        bytes.extend_from_slice(&options);
        bytes.extend_from_slice(payload);

        let checksum =
            checksum::transport(outer, IpNextLevelProtocol::TCP.number(), &bytes);
        bytes[16..18].copy_from_slice(&checksum.to_be_bytes());

        bytes
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Flags {
    pub congestion_window_reduced: bool,
    pub ecn_echo: bool,
    pub urgent: bool,
    pub acknowledgment: bool,
    pub push: bool,
    pub reset: bool,
    pub syn: bool,
    pub fin: bool,
}

impl TryFrom<TcpFlags> for Flags {
    type Error = ParserError;

    fn try_from(value: TcpFlags) -> Result<Self, Self::Error> {
        Ok(Self {
            congestion_window_reduced: parser::cast_to_bool(value.0)?,
            ecn_echo: parser::cast_to_bool(value.1)?,
            urgent: parser::cast_to_bool(value.2)?,
            acknowledgment: parser::cast_to_bool(value.3)?,
            push: parser::cast_to_bool(value.4)?,
            reset: parser::cast_to_bool(value.5)?,
            syn: parser::cast_to_bool(value.6)?,
            fin: parser::cast_to_bool(value.7)?,
        })
    }
}

/// From a flag mask, e.g. `FLAG_PSH | FLAG_ACK`.
impl From<u8> for Flags {
    fn from(value: u8) -> Self {
        Self {
            congestion_window_reduced: value & FLAG_CWR != 0,
            ecn_echo: value & FLAG_ECE != 0,
            urgent: value & FLAG_URG != 0,
            acknowledgment: value & FLAG_ACK != 0,
            push: value & FLAG_PSH != 0,
            reset: value & FLAG_RST != 0,
            syn: value & FLAG_SYN != 0,
            fin: value & FLAG_FIN != 0,
        }
    }
}

impl From<&Flags> for u8 {
    fn from(flags: &Flags) -> Self {
        [
            (flags.congestion_window_reduced, FLAG_CWR),
            (flags.ecn_echo, FLAG_ECE),
            (flags.urgent, FLAG_URG),
            (flags.acknowledgment, FLAG_ACK),
            (flags.push, FLAG_PSH),
            (flags.reset, FLAG_RST),
            (flags.syn, FLAG_SYN),
            (flags.fin, FLAG_FIN),
        ]
        .into_iter()
        .filter(|(is_set, _)| *is_set)
        .fold(0, |mask, (_, bit)| mask | bit)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum OptionId {
    EndOfOptionList = 0,
    NoOperation = 1,
    MaximumSegmentSize = 2,
    WindowScaling = 3,
    SAckPermitted = 4,
    SAck = 5,

    Timestamps = 8,
    FastOpen = 34,
}

impl OptionId {
    pub fn parse<'a>(&self, bytes: &'a [u8]) -> IResult<&'a [u8], OptionData> {
        match self {
            Self::EndOfOptionList => Ok((bytes, OptionData::EndOfOptionList)),

            Self::NoOperation => Ok((bytes, OptionData::NoOperation)),

            Self::MaximumSegmentSize => {
                let (rest, length) = be_u8().parse(bytes)?;
                if length != 4 {
                    return Err(ParserError::ErrorVerify.to_nom(bytes));
                }
                let (rest, maximum_segment_size) = be_u16().parse(rest)?;
                Ok((rest, OptionData::MaximumSegmentSize(maximum_segment_size)))
            },

            Self::WindowScaling => {
                let (rest, length) = be_u8().parse(bytes)?;
                if length != 3 {
                    return Err(ParserError::ErrorVerify.to_nom(bytes));
                }
                let (rest, window) = be_u8().parse(rest)?;
                Ok((rest, OptionData::WindowScaling(window)))
            },

            Self::SAckPermitted => {
                let (rest, length) = be_u8().parse(bytes)?;
                if length != 2 {
                    return Err(ParserError::ErrorVerify.to_nom(bytes));
                }
                Ok((rest, OptionData::SAckPermitted))
            },

            Self::SAck => {
                // Length covers kind and length bytes, then 8-byte blocks
                let (rest, length) = be_u8().parse(bytes)?;
                let blocks_length = length
                    .checked_sub(2)
                    .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
                if blocks_length % 8 != 0 {
                    return Err(ParserError::ErrorVerify.to_nom(bytes));
                }
                let mut values = Vec::with_capacity(blocks_length as usize / 8);
                let mut buffer = rest;
                for _ in 0..(blocks_length / 8) {
                    let (rest, value) = be_u64().parse(buffer)?;
                    values.push(value);
                    buffer = rest;
                }

                Ok((buffer, OptionData::SAck(values)))
            },

            Self::Timestamps => {
                let (rest, length) = be_u8().parse(bytes)?;
                if length != 10 {
                    return Err(ParserError::ErrorVerify.to_nom(bytes));
                }

                let (rest, initial_time) = be_u32().parse(rest)?;
                let (rest, reply_time) = be_u32().parse(rest)?;

                Ok((rest, OptionData::Timestamps(initial_time, reply_time)))
            },

            Self::FastOpen => {
                // Empty cookie is a request, otherwise 4 to 16 bytes
                let (rest, length) = be_u8().parse(bytes)?;
                let cookie_length = length
                    .checked_sub(2)
                    .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
                if cookie_length != 0 && !(4..=16).contains(&cookie_length) {
                    return Err(ParserError::ErrorVerify.to_nom(bytes));
                }
                let (rest, cookie) = take(cookie_length).parse(rest)?;

                Ok((rest, OptionData::FastOpen(cookie.to_vec())))
            },
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum OptionData {
    EndOfOptionList,
    NoOperation,
    MaximumSegmentSize(u16),
    WindowScaling(u8),
    SAckPermitted,
    SAck(Vec<u64>),
    Timestamps(u32, u32),
    FastOpen(Vec<u8>),
    Unknown { kind: u8, data: Vec<u8> },
}

impl OptionData {
    pub fn encode(&self, buffer: &mut Vec<u8>) {
        match self {
            Self::EndOfOptionList => buffer.push(OptionId::EndOfOptionList as u8),
            Self::NoOperation => buffer.push(OptionId::NoOperation as u8),
            Self::MaximumSegmentSize(value) => {
                buffer.extend_from_slice(&[OptionId::MaximumSegmentSize as u8, 4]);
                buffer.extend_from_slice(&value.to_be_bytes());
            },
            Self::WindowScaling(value) => {
                buffer.extend_from_slice(&[OptionId::WindowScaling as u8, 3, *value]);
            },
            Self::SAckPermitted => {
                buffer.extend_from_slice(&[OptionId::SAckPermitted as u8, 2]);
            },
            Self::SAck(values) => {
                let length = u8::try_from(2 + values.len() * 8).unwrap_or(u8::MAX);
                buffer.extend_from_slice(&[OptionId::SAck as u8, length]);
                for value in values {
                    buffer.extend_from_slice(&value.to_be_bytes());
                }
            },
            Self::Timestamps(initial_time, reply_time) => {
                buffer.extend_from_slice(&[OptionId::Timestamps as u8, 10]);
                buffer.extend_from_slice(&initial_time.to_be_bytes());
                buffer.extend_from_slice(&reply_time.to_be_bytes());
            },
            Self::FastOpen(cookie) => {
                let length = u8::try_from(2 + cookie.len()).unwrap_or(u8::MAX);
                buffer.extend_from_slice(&[OptionId::FastOpen as u8, length]);
                buffer.extend_from_slice(cookie);
            },
            Self::Unknown { kind, data } => {
                let length = u8::try_from(2 + data.len()).unwrap_or(u8::MAX);
                buffer.extend_from_slice(&[*kind, length]);
                buffer.extend_from_slice(data);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ProtocolParser;
    use crate::protocols::ipv4::IPv4;
    use std::net::Ipv4Addr;

    #[test]
    fn test_tcp_without_options() {
        let hex_actual = "45 00 00 56 2B 9A 00 00 34 06 79 3B 48 0E D5 93 C0 A8 03 83 01 BB CB B8 EE BA 28 1D 18 D9 BD 5F 50 18 00 D5 37 24 00 00 DE A9 06 7D DE 13 B6 78 A0 EA 50 53 29 A3 75 9C 1B B3 B0 3B 4D E5 21 DD 11 D4 75 A8 79 D5 58 B6 9F 6D 32 EA 72 F8 B0 54 C3 2F E9 AF 98 E4".replace(" ", "");
        let bytes = hex::decode(hex_actual).unwrap();

        let parser = ProtocolParser::new(ProtocolId::IPv4);
        let packet = parser.process(&bytes).unwrap();

        let actual_tcp = packet.tcp().unwrap();
        let expected_tcp = TCP {
            port_source: 443,
            port_destination: 52152,
            sequence_number: 4005177373,
            acknowledgement_number: 416922975,
            data_offset: 20,
            reserved: 0,
            flags: Flags {
                congestion_window_reduced: false,
                ecn_echo: false,
                urgent: false,
                acknowledgment: true,
                push: true,
                reset: false,
                syn: false,
                fin: false,
            },
            window: 213,
            checksum: 0x3724,
            urgent_pointer: 0,
            options: vec![],
        };
        assert_eq!(actual_tcp, &expected_tcp);

        // Application data stays opaque
        assert_eq!(packet.transport_payload().len(), 46);
    }

    #[test]
    fn test_flags_mask() {
        let flags = Flags::from(FLAG_FIN | FLAG_PSH | FLAG_URG);

        assert!(flags.fin && flags.push && flags.urgent);
        assert!(!flags.syn && !flags.acknowledgment && !flags.reset);
        assert_eq!(u8::from(&flags), 0x29);
    }

    #[test]
    fn test_syn_segment() {
        let ipv4 = IPv4::new(
            Ipv4Addr::new(10, 1, 2, 3),
            Ipv4Addr::new(203, 0, 113, 9),
            64,
            IpNextLevelProtocol::TCP,
        );
        let tcp = TCP::new(40000, 445, Flags::from(FLAG_SYN), 8192);
        let bytes = Packet::default().push(ipv4).push(tcp.clone()).encode();

        let parser = ProtocolParser::new(ProtocolId::IPv4);
        let packet = parser.process(&bytes).unwrap();
        let decoded = packet.tcp().unwrap();

        assert_eq!(decoded.flags, tcp.flags);
        assert_eq!(decoded.port_destination, 445);
        assert_eq!(decoded.window, 8192);
        assert_eq!(decoded.data_offset, 20);

        // Pseudo-header checksum verifies to zero
        let segment = &bytes[20..];
        let outer = packet.layers.first();
        assert_eq!(
            checksum::transport(outer, IpNextLevelProtocol::TCP.number(), segment),
            0
        );
    }

    #[test]
    fn test_options_padding() {
        let mut tcp = TCP::new(1, 2, Flags::from(FLAG_SYN), 1024);
        tcp.options = vec![OptionData::MaximumSegmentSize(1460), OptionData::WindowScaling(7)];
        let bytes = tcp.encode(&[], None);

        // 20 + 4 + 3 padded to 28
        assert_eq!(bytes.len(), 28);
        assert_eq!(bytes[12] >> 4, 7);
    }

    fn syn_with_options(options: &str) -> Vec<u8> {
        let ipv4 = "45 00 00 00 00 01 00 00 40 06 00 00 0A 00 00 01 0A 00 00 02";
        let tcp = "9C 40 01 BB 00 00 00 00 00 00 00 00 00 02 20 00 00 00 00 00";
        let mut bytes = hex::decode(format!("{ipv4}{tcp}{options}").replace(" ", "")).unwrap();

        // Lengths are patched in, checksums are not verified on parse
        let total_length = bytes.len() as u16;
        bytes[2..4].copy_from_slice(&total_length.to_be_bytes());
        bytes[32] = (((bytes.len() - 20) / 4) as u8) << 4;
        bytes
    }

    #[test]
    fn test_unknown_option_is_skipped() {
        // Multipath TCP, 12 bytes
        let bytes = syn_with_options("1E 0C 00 81 01 02 03 04 05 06 07 08");

        let parser = ProtocolParser::new(ProtocolId::IPv4);
        let packet = parser.process(&bytes).unwrap();
        let tcp = packet.tcp().unwrap();

        assert!(tcp.flags.syn);
        assert_eq!(tcp.port_destination, 443);
        assert_eq!(
            tcp.options,
            vec![OptionData::Unknown {
                kind: 30,
                data: vec![0x00, 0x81, 1, 2, 3, 4, 5, 6, 7, 8],
            }]
        );

        // Unknown options are written back as they came
        assert_eq!(&packet.encode()[40..], &bytes[40..]);
    }

    #[test]
    fn test_short_fast_open_cookie() {
        // Fast Open with an 8-byte cookie, NOP padding
        let bytes = syn_with_options("22 0A 11 22 33 44 55 66 77 88 01 01");

        let parser = ProtocolParser::new(ProtocolId::IPv4);
        let packet = parser.process(&bytes).unwrap();
        let tcp = packet.tcp().unwrap();

        assert_eq!(tcp.data_offset, 32);
        assert_eq!(
            tcp.options,
            vec![
                OptionData::FastOpen(vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88]),
                OptionData::NoOperation,
                OptionData::NoOperation,
            ]
        );
    }

    #[test]
    fn test_known_kind_with_unexpected_length() {
        // MSS claiming 6 bytes, MD5 signature is cut to fit the header
        let bytes = syn_with_options("02 06 05 B4 00 00 13 06 AA BB CC DD");

        let parser = ProtocolParser::new(ProtocolId::IPv4);
        let packet = parser.process(&bytes).unwrap();
        let tcp = packet.tcp().unwrap();

        assert_eq!(
            tcp.options,
            vec![
                OptionData::Unknown {
                    kind: 2,
                    data: vec![0x05, 0xB4, 0x00, 0x00],
                },
                OptionData::Unknown {
                    kind: 19,
                    data: vec![0xAA, 0xBB, 0xCC, 0xDD],
                },
            ]
        );
    }

    #[test]
    fn test_option_without_length_fails() {
        // Unknown kind as the last byte of the header
        let bytes = syn_with_options("01 01 01 1E");

        let parser = ProtocolParser::new(ProtocolId::IPv4);
        let packet = parser.process(&bytes).unwrap();

        assert!(packet.tcp().is_none());
    }
}
