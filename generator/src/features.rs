use crate::attacks::AttackType;
use packet::{Packet, ProtocolId, ProtocolParser};
use serde::{Serialize, Serializer};
use strum_macros::Display;

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Unknown,
}

/// Per-packet features, one CSV row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeatureRecord {
    pub protocol: Protocol,
    pub destination_port: Option<u16>,
    pub length: usize,
    pub ttl: Option<u8>,
    #[serde(serialize_with = "serialize_flag")]
    pub syn_flag: bool,
    #[serde(serialize_with = "serialize_flag")]
    pub ack_flag: bool,
    #[serde(serialize_with = "serialize_flag")]
    pub fin_flag: bool,
    #[serde(serialize_with = "serialize_flag")]
    pub rst_flag: bool,
    pub window_size: Option<u16>,
    pub payload_size: usize,
    pub entropy: f64,

    #[serde(skip)]
    pub attack_type: AttackType,
}

impl FeatureRecord {
    pub const COLUMNS: [&str; 11] = [
        "Protocol",
        "DestinationPort",
        "Length",
        "Ttl",
        "SynFlag",
        "AckFlag",
        "FinFlag",
        "RstFlag",
        "WindowSize",
        "PayloadSize",
        "Entropy",
    ];
}

// Labeled datasets spell booleans as True/False
fn serialize_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(if *value { "True" } else { "False" })
}

pub fn extract(packet: &Packet, attack: AttackType) -> FeatureRecord {
    let tcp = packet.tcp();
    let udp = packet.udp();

    // First match wins
    let protocol = if tcp.is_some() {
        Protocol::Tcp
    } else if udp.is_some() {
        Protocol::Udp
    } else if packet.icmpv4().is_some() {
        Protocol::Icmp
    } else {
        Protocol::Unknown
    };

    let destination_port = tcp
        .map(|tcp| tcp.port_destination)
        .or(udp.map(|udp| udp.port_destination));

    let payload = packet.transport_payload();

    FeatureRecord {
        protocol,
        destination_port,
        length: packet.len(),
        ttl: packet.ipv4().map(|ipv4| ipv4.time_to_live),
        syn_flag: tcp.is_some_and(|tcp| tcp.flags.syn),
        ack_flag: tcp.is_some_and(|tcp| tcp.flags.acknowledgment),
        fin_flag: tcp.is_some_and(|tcp| tcp.flags.fin),
        rst_flag: tcp.is_some_and(|tcp| tcp.flags.reset),
        window_size: tcp.map(|tcp| tcp.window),
        payload_size: payload.len(),
        entropy: entropy(&payload),
        attack_type: attack,
    }
}

/// Decodes a raw frame starting from `root` and extracts its features.
/// `None` when the root protocol doesn't match.
pub fn extract_frame(
    bytes: &[u8], root: ProtocolId, attack: AttackType,
) -> Option<FeatureRecord> {
    let parser = ProtocolParser::new(root);
    let packet = parser.process(bytes)?;

    Some(extract(&packet, attack))
}

/// Shannon entropy of the byte distribution, in bits. 0 for empty data.
pub fn entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0usize; 256];
    for byte in data {
        counts[*byte as usize] += 1;
    }

    let length = data.len() as f64;
    counts
        .iter()
        .filter(|count| **count > 0)
        .map(|count| {
            let probability = *count as f64 / length;
            -probability * probability.log2()
        })
        .sum()
}
