use crate::protocols::ProtocolData;

// Internet checksum
// RFC 1071: https://datatracker.ietf.org/doc/html/rfc1071

pub fn internet(data: &[u8]) -> u16 {
    fold(sum(0, data))
}

/// TCP/UDP checksum over the IPv4 pseudo-header and `segment`. <br>
/// Without an enclosing IPv4 layer there is no pseudo-header and the checksum is 0.
pub fn transport(outer: Option<&ProtocolData>, protocol: u8, segment: &[u8]) -> u16 {
    let ipv4 = match outer {
        Some(ProtocolData::IPv4(value)) => value,
        _ => return 0,
    };

    let length = u16::try_from(segment.len()).unwrap_or(u16::MAX);

    let mut accumulator = sum(0, &ipv4.address_source.octets());
    accumulator = sum(accumulator, &ipv4.address_destination.octets());
    accumulator = sum(accumulator, &[0, protocol]);
    accumulator = sum(accumulator, &length.to_be_bytes());
    accumulator = sum(accumulator, segment);

    fold(accumulator)
}

fn sum(initial: u32, data: &[u8]) -> u32 {
    let mut accumulator = initial;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        accumulator = accumulator.wrapping_add(u32::from(u16::from_be_bytes([
            chunk[0], chunk[1],
        ])));
    }
    if let [last] = chunks.remainder() {
        accumulator = accumulator.wrapping_add(u32::from(*last) << 8);
    }

    accumulator
}

fn fold(mut accumulator: u32) -> u16 {
    while accumulator >> 16 != 0 {
        accumulator = (accumulator & 0xFFFF) + (accumulator >> 16);
    }

    !(accumulator as u16)
}
