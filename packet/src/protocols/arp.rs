use crate::parser::ParserError;
use crate::protocols::arp::hardware_type::HardwareType;
use crate::protocols::arp::operation::Operation;
use crate::protocols::ethernet::ether_type::EtherType;
use crate::protocols::ethernet::mac::MacAddress;
use crate::protocols::{ProtocolData, ethernet, ip};
use nom::IResult;
use nom::Parser;
use nom::number::be_u8;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use thiserror::Error;

// ARP Protocol
// RFC 826: https://datatracker.ietf.org/doc/html/rfc826
pub const PACKET_LENGTH: usize = 28;

pub fn parse(bytes: &[u8]) -> IResult<&[u8], ProtocolData> {
    if bytes.len() < PACKET_LENGTH {
        return Err(ParserError::FailureVerify.to_nom(bytes));
    };

    // Cutting Ethernet padding & FCS
    let bytes = bytes.get(..PACKET_LENGTH).unwrap_or(bytes);

    // HTYPE
    let (rest, hardware_type) = hardware_type::parse(bytes)?;

    // PTYPE
    let (rest, protocol_type) = ethernet::ether_type::parse(rest)?;
    if protocol_type != EtherType::Ipv4 {
        return Err(ParserError::FailureVerify.to_nom(bytes));
    }

    // HLEN
    let (rest, hardware_address_length) = be_u8().parse(rest)?;
    if hardware_address_length != ethernet::mac::LENGTH_BYTES as u8 {
        return Err(ParserError::FailureVerify.to_nom(bytes));
    }

    // PLEN
    let (rest, protocol_address_length) = be_u8().parse(rest)?;
    if protocol_address_length != ip::address::V4_LENGTH_BYTES as u8 {
        return Err(ParserError::FailureVerify.to_nom(bytes));
    }

    // OP
    let (rest, operation) = operation::parse(rest)?;

    // SENDER_HARDWARE_ADDRESS
    let (rest, sender_hardware_address) = ethernet::mac::parse(rest)?;

    // SENDER_PROTOCOL_ADDRESS
    let (rest, sender_protocol_address) = ip::address::v4_parse(rest)?;

    // TARGET_HARDWARE_ADDRESS
    let (rest, target_hardware_address) = ethernet::mac::parse(rest)?;

    // TARGET_PROTOCOL_ADDRESS
    let (_, target_protocol_address) = ip::address::v4_parse(rest)?;

    let arp = Arp {
        hardware_type,
        protocol_type,
        hardware_address_length,
        protocol_address_length,
        operation,
        sender_mac: sender_hardware_address,
        sender_ip: sender_protocol_address,
        target_mac: target_hardware_address,
        target_ip: target_protocol_address,
    };

    let rest: &[u8] = &[];
    Ok((rest, ProtocolData::Arp(arp)))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Arp {
    pub hardware_type: HardwareType,
    pub protocol_type: EtherType,

    pub hardware_address_length: u8,
    pub protocol_address_length: u8,

    pub operation: Operation,

    pub sender_mac: MacAddress,
    pub sender_ip: Ipv4Addr,

    pub target_mac: MacAddress,
    pub target_ip: Ipv4Addr,
}

impl Arp {
    /// "`sender_ip` is at `sender_mac`", addressed to the target.
    pub fn reply(
        sender_mac: MacAddress, sender_ip: Ipv4Addr, target_mac: MacAddress,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self {
            hardware_type: HardwareType::Ethernet,
            protocol_type: EtherType::Ipv4,
            hardware_address_length: ethernet::mac::LENGTH_BYTES as u8,
            protocol_address_length: ip::address::V4_LENGTH_BYTES as u8,
            operation: Operation::Reply,
            sender_mac,
            sender_ip,
            target_mac,
            target_ip,
        }
    }

    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(PACKET_LENGTH + payload.len());
        bytes.extend_from_slice(self.hardware_type.bytes());
        bytes.extend_from_slice(self.protocol_type.bytes());
        bytes.push(self.hardware_address_length);
        bytes.push(self.protocol_address_length);
        bytes.extend_from_slice(self.operation.bytes());
        bytes.extend_from_slice(&self.sender_mac.0);
        bytes.extend_from_slice(&self.sender_ip.octets());
        bytes.extend_from_slice(&self.target_mac.0);
        bytes.extend_from_slice(&self.target_ip.octets());
        bytes.extend_from_slice(payload);

        bytes
    }
}

#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq)]
pub enum ArpError {
    #[error("Unknown hardware type")]
    HardwareTypeUnknown,

    #[error("Unknown operation type")]
    OperationUnknown,
}

pub mod hardware_type;
pub mod operation;
