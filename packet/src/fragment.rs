use crate::frame::{Packet, encode_layers};
use crate::protocols::ProtocolData;
use crate::protocols::ipv4::{FLAG_MORE_FRAGMENTS, MAX_FRAGMENT_OFFSET};
use thiserror::Error;

/// Splits the IPv4 payload of `packet` into fragments of `size` bytes,
/// rounded up to a multiple of 8. <br>
/// Layers before IPv4 are copied into every fragment, the fragment data is raw. <br>
/// Every fragment except the last gets the MF flag, the last one keeps the original flags.
pub fn fragment(packet: &Packet, size: usize) -> Result<Vec<Packet>, FragmentError> {
    if size == 0 {
        return Err(FragmentError::ZeroSize);
    }
    let fragment_size = size.div_ceil(8) * 8;

    let position = packet
        .layers
        .iter()
        .position(|layer| matches!(layer, ProtocolData::IPv4(_)))
        .ok_or(FragmentError::NoIpLayer)?;
    let (head, inner) = packet.layers.split_at(position + 1);
    let ipv4 = match head.last() {
        Some(ProtocolData::IPv4(value)) => value,
        _ => return Err(FragmentError::NoIpLayer),
    };

    let payload = encode_layers(inner, head.last());

    let mut fragments = Vec::with_capacity(payload.len().div_ceil(fragment_size));
    let chunks_number = payload.len().div_ceil(fragment_size);
    for (index, chunk) in payload.chunks(fragment_size).enumerate() {
        let offset = usize::from(ipv4.fragment_offset) + index * fragment_size / 8;
        if offset > usize::from(MAX_FRAGMENT_OFFSET) {
            return Err(FragmentError::OffsetOverflow(offset));
        }

        let mut header = ipv4.clone();
        header.fragment_offset = offset as u16;
        if index + 1 != chunks_number {
            header.flags |= FLAG_MORE_FRAGMENTS;
        }

        let mut layers = head.to_vec();
        if let Some(last) = layers.last_mut() {
            *last = ProtocolData::IPv4(header);
        }
        layers.push(ProtocolData::Payload(chunk.to_vec()));

        fragments.push(Packet::new(layers));
    }

    Ok(fragments)
}

#[derive(Debug, Error, PartialEq)]
pub enum FragmentError {
    #[error("Packet has no IPv4 layer.")]
    NoIpLayer,

    #[error("Fragment size must be positive.")]
    ZeroSize,

    #[error("Fragment offset doesn't fit into 13 bits.")]
    OffsetOverflow(usize),
}

impl FragmentError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            FragmentError::OffsetOverflow(offset) => Some(format!("Offset: {offset}")),
            _ => None,
        }
    }
}
