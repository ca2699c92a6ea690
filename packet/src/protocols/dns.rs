use crate::parser;
use crate::parser::ParserError;
use crate::protocols::ProtocolData;
use nom::IResult;
use nom::bytes::take;
use nom::number::{be_u8, be_u16};
use nom::{Parser, bits};
use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

// DNS Protocol
// RFC 1035: https://datatracker.ietf.org/doc/html/rfc1035

pub const PORT_DNS: u16 = 53;
pub const HEADER_LENGTH: usize = 12;
pub const MAX_LABEL_LENGTH: usize = 63;

pub const MESSAGE_TYPE_LENGTH_BITS: usize = 1;
pub const OPERATION_CODE_LENGTH_BITS: usize = 4;
pub const AUTHORITATIVE_ANSWER_LENGTH_BITS: usize = 1;
pub const TRUNCATION_FLAG_LENGTH_BITS: usize = 1;
pub const RECURSION_DESIRED_LENGTH_BITS: usize = 1;
pub const RECURSION_AVAILABLE_LENGTH_BITS: usize = 1;
pub const RESERVED_LENGTH_BITS: usize = 3;
pub const RESPONSE_CODE_LENGTH_BITS: usize = 4;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], ProtocolData> {
    // HEADER
    // Identifier - 16 bits.
    let (rest, id) = be_u16().parse(bytes)?;

    // Message Type (QR), Operation Code (OPCODE)
    // Authoritative Answer (AA), Truncation (TC), Recursion Desired (RD)
    // Recursion Available (RA), Reserved (Z), Response Code (RCODE)
    type DnsHeaderBits = (u8, u8, u8, u8, u8, u8, u8, u8);
    let (rest, (qr, opcode, aa, tc, rd, ra, z, rcode)): (&[u8], DnsHeaderBits) =
        bits::bits::<_, _, nom::error::Error<_>, _, _>((
            bits::complete::take(MESSAGE_TYPE_LENGTH_BITS),
            bits::complete::take(OPERATION_CODE_LENGTH_BITS),
            bits::complete::take(AUTHORITATIVE_ANSWER_LENGTH_BITS),
            bits::complete::take(TRUNCATION_FLAG_LENGTH_BITS),
            bits::complete::take(RECURSION_DESIRED_LENGTH_BITS),
            bits::complete::take(RECURSION_AVAILABLE_LENGTH_BITS),
            bits::complete::take(RESERVED_LENGTH_BITS),
            bits::complete::take(RESPONSE_CODE_LENGTH_BITS),
        ))(rest)?;
    let message_type =
        MessageType::try_from(qr).map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;
    let operation_code = OperationCode::try_from(opcode)
        .map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;
    let authoritative_answer =
        parser::cast_to_bool(aa).map_err(|err| err.to_nom(bytes))?;
    let truncation = parser::cast_to_bool(tc).map_err(|err| err.to_nom(bytes))?;
    let recursion_desired = parser::cast_to_bool(rd).map_err(|err| err.to_nom(bytes))?;
    let recursion_available =
        parser::cast_to_bool(ra).map_err(|err| err.to_nom(bytes))?;
    if z != 0 {
        return Err(ParserError::ErrorVerify.to_nom(bytes));
    }
    let response_code = ResponseCode::try_from(rcode)
        .map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;

    // QDCOUNT, ANCOUNT, NSCOUNT, ARCOUNT - 16 bits each
    let (rest, question_entries) = be_u16().parse(rest)?;
    let (rest, answer_records) = be_u16().parse(rest)?;
    let (rest, authority_records) = be_u16().parse(rest)?;
    let (mut rest, additional_records) = be_u16().parse(rest)?;

    let header = Header {
        id,
        message_type,
        operation_code,
        authoritative_answer,
        truncation,
        recursion_desired,
        recursion_available,
        response_code,

        question_entries,
        answer_records,
        authority_records,
        additional_records,
    };

    // QUESTION SECTION
    let mut question_section: Vec<QuestionEntry> = Vec::new();
    for _ in 0..question_entries {
        let (section_rest, question) = parse_question_section(rest, bytes)?;
        question_section.push(question);
        rest = section_rest;
    }

    // Resource records are kept as they are
    let protocol = DNS {
        header,
        question_section,
        records: rest.to_vec(),
    };

    let rest: &[u8] = &[];
    Ok((rest, ProtocolData::DNS(protocol)))
}

pub fn is_protocol_default(port_source: u16, port_destination: u16) -> bool {
    port_source == PORT_DNS || port_destination == PORT_DNS
}

fn parse_question_section<'a>(
    bytes: &'a [u8], whole: &'a [u8],
) -> IResult<&'a [u8], QuestionEntry> {
    // QNAME
    let (rest, qname) = parse_name(bytes, whole, 1)?;

    // QTYPE
    let (rest, qtype) = be_u16().parse(rest)?;
    let qtype =
        DnsType::try_from(qtype).map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;

    // QCLASS
    let (rest, qclass) = be_u16().parse(rest)?;
    let qclass =
        Class::try_from(qclass).map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;

    let section = QuestionEntry {
        name: qname,
        entry_type: qtype,
        class: qclass,
    };

    Ok((rest, section))
}

fn parse_name<'a>(
    bytes: &'a [u8], whole: &'a [u8], depth: u8,
) -> IResult<&'a [u8], String> {
    const MAX_DEPTH_LEVEL_RECURSION_NAME_PARSING: u8 = 7;
    if depth > MAX_DEPTH_LEVEL_RECURSION_NAME_PARSING {
        return Err(ParserError::ErrorVerify.to_nom(bytes));
    }

    let mut labels: Vec<String> = Vec::new();

    let mut main_rest = bytes;
    loop {
        let (rest, length_octet) = be_u8().parse(main_rest)?;
        if length_octet == 0 {
            main_rest = rest;
            break;
        }

        // Two high bits set - compression pointer
        if (length_octet & 0b1100_0000) == 0b1100_0000 {
            let (rest, next_byte) = be_u8().parse(rest)?;
            let offset = (u16::from(length_octet & 0b0011_1111) << 8) | u16::from(next_byte);
            let pointed_slice = whole
                .get(usize::from(offset)..)
                .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
            let next_depth = depth
                .checked_add(1)
                .ok_or(ParserError::ErrorVerify.to_nom(bytes))?;
            let (_, suffix) = parse_name(pointed_slice, whole, next_depth)?;
            labels.push(suffix);
            main_rest = rest;
            break;
        }

        let (rest, word) = take(length_octet).parse(rest)?;
        let word = String::from_utf8(word.to_vec())
            .map_err(|_| ParserError::ErrorVerify.to_nom(bytes))?;
        labels.push(word);
        main_rest = rest;
    }

    Ok((main_rest, labels.join(".")))
}

/// Uncompressed wire form. Labels longer than 63 bytes are cut.
pub fn encode_name(name: &str, buffer: &mut Vec<u8>) {
    for label in name.split('.').filter(|label| !label.is_empty()) {
        let label = label.as_bytes();
        let label = label.get(..MAX_LABEL_LENGTH).unwrap_or(label);
        buffer.push(label.len() as u8);
        buffer.extend_from_slice(label);
    }
    buffer.push(0);
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DNS {
    pub header: Header,
    pub question_section: Vec<QuestionEntry>,
    // Answer, authority and additional sections in wire form
    pub records: Vec<u8>,
}

impl DNS {
    /// Standard query with recursion desired.
    pub fn query(id: u16, name: &str, entry_type: DnsType) -> Self {
        Self {
            header: Header {
                id,
                message_type: MessageType::Query,
                operation_code: OperationCode::StandardQuery,
                authoritative_answer: false,
                truncation: false,
                recursion_desired: true,
                recursion_available: false,
                response_code: ResponseCode::NoErrorCondition,
                question_entries: 1,
                answer_records: 0,
                authority_records: 0,
                additional_records: 0,
            },
            question_section: vec![QuestionEntry {
                name: name.to_string(),
                entry_type,
                class: Class::IN,
            }],
            records: vec![],
        }
    }

    /// QDCOUNT follows the question section. Other counts are written as stored.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let header = &self.header;
        let question_entries = u16::try_from(self.question_section.len()).unwrap_or(u16::MAX);

        let mut bytes = Vec::with_capacity(HEADER_LENGTH + self.records.len() + payload.len());
        bytes.extend_from_slice(&header.id.to_be_bytes());
        bytes.push(
            ((header.message_type.clone() as u8) << 7)
                | (((header.operation_code.clone() as u8) & 0x0F) << 3)
                | (u8::from(header.authoritative_answer) << 2)
                | (u8::from(header.truncation) << 1)
                | u8::from(header.recursion_desired),
        );
        bytes.push(
            (u8::from(header.recursion_available) << 7)
                | ((header.response_code.clone() as u8) & 0x0F),
        );
        bytes.extend_from_slice(&question_entries.to_be_bytes());
        bytes.extend_from_slice(&header.answer_records.to_be_bytes());
        bytes.extend_from_slice(&header.authority_records.to_be_bytes());
        bytes.extend_from_slice(&header.additional_records.to_be_bytes());

        for question in &self.question_section {
            encode_name(&question.name, &mut bytes);
            bytes.extend_from_slice(&(question.entry_type.clone() as u16).to_be_bytes());
            bytes.extend_from_slice(&(question.class.clone() as u16).to_be_bytes());
        }

        bytes.extend_from_slice(&self.records);
        bytes.extend_from_slice(payload);

        bytes
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Header {
    pub id: u16,
    pub message_type: MessageType,
    pub operation_code: OperationCode,
    pub authoritative_answer: bool,
    pub truncation: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub response_code: ResponseCode,

    pub question_entries: u16,
    pub answer_records: u16,
    pub authority_records: u16,
    pub additional_records: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuestionEntry {
    pub name: String,
    pub entry_type: DnsType,
    pub class: Class,
}

#[derive(Clone, Debug, Display, Serialize, Deserialize, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum MessageType {
    Query = 0,
    Response = 1,
}

#[derive(Clone, Debug, Display, Serialize, Deserialize, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum OperationCode {
    StandardQuery = 0,
    InverseQuery = 1,
    ServerStatusRequest = 2,

    #[num_enum(alternatives = [3..15])]
    Reserved = 15,
}

#[derive(Clone, Debug, Display, Serialize, Deserialize, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum ResponseCode {
    NoErrorCondition = 0,
    FormatError = 1,
    ServerFailure = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,

    #[num_enum(alternatives = [6..15])]
    Reserved = 15,
}

#[derive(Clone, Debug, Display, Serialize, Deserialize, PartialEq, TryFromPrimitive)]
#[repr(u16)]
pub enum DnsType {
    A = 1,      // A host address
    NS = 2,     // An authoritative name server
    CNAME = 5,  // The canonical name for an alias
    SOA = 6,    // Marks the start of a zone of authority
    PTR = 12,   // A domain name pointer
    HINFO = 13, // Host information
    MX = 15,    // Mail exchange
    TXT = 16,   // Text strings
    AAAA = 28,  // IPv6 address record
    SRV = 33,   // Service locator
    OPT = 41,   // EDNS pseudo-record
    DS = 43,    // Delegation signer
    RRSIG = 46, // DNSSEC signature
    NSEC = 47,  // Next Secure record
    DNSKEY = 48,
    SVCB = 64,  // Service Binding
    HTTPS = 65, // HTTPS Binding

    AXFR = 252, // A request for a transfer of an entire zone
    ANY = 255,  // A request for all records
    CAA = 257,  // Certification Authority Authorization
}

#[derive(Clone, Debug, Display, Serialize, Deserialize, PartialEq, TryFromPrimitive)]
#[repr(u16)]
pub enum Class {
    IN = 1, // The Internet
    CS = 2, // The CSNET class (Obsolete)
    CH = 3, // The CHAOS class
    HS = 4, // Hesiod [Dyer 87]

    ANY = 255,
}
