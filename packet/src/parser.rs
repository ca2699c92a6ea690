use crate::frame::Packet;
use crate::protocols::{ProtocolData, ProtocolId};
use nom::IResult;

pub struct ProtocolParser {
    root: ProtocolId,
}

impl ProtocolParser {
    pub fn new(root: ProtocolId) -> Self {
        Self { root }
    }

    /// Decodes raw bytes into layers, starting from the root protocol. <br>
    /// Bytes that no known protocol claims are kept as a trailing `Payload` layer.
    pub fn process(&self, bytes: &[u8]) -> Option<Packet> {
        let mut packet = Packet::default();

        match traversal(&self.root, bytes, &mut packet, 0) {
            ProcessResult::Complete | ProcessResult::Incomplete => Some(packet),
            ProcessResult::Failed => None,
        }
    }
}

fn traversal(
    id: &ProtocolId, bytes: &[u8], packet: &mut Packet, depth: usize,
) -> ProcessResult {
    const MAX_DEPTH: usize = 16;
    if depth > MAX_DEPTH {
        return ProcessResult::Failed;
    }

    let result = id.parse()(bytes);

    match result {
        Ok(([], layer)) => {
            packet.layers.push(layer);
            ProcessResult::Complete
        },
        Ok((rest, layer)) => {
            packet.layers.push(layer);

            let best = match id.best_children(packet) {
                Some(value) => value,
                None => {
                    packet.layers.push(ProtocolData::Payload(rest.to_vec()));
                    return ProcessResult::Complete;
                },
            };

            let new_depth = match depth.checked_add(1) {
                Some(value) => value,
                None => return ProcessResult::Failed,
            };

            let parsed_layers = packet.layers.len();
            match traversal(&best, rest, packet, new_depth) {
                ProcessResult::Failed => {
                    // Inner protocol didn't match, the rest stays opaque
                    packet.layers.truncate(parsed_layers);
                    packet.layers.push(ProtocolData::Payload(rest.to_vec()));
                    ProcessResult::Incomplete
                },
                result => result,
            }
        },
        Err(_) => ProcessResult::Failed,
    }
}

pub fn cast_to_bool(bit: u8) -> Result<bool, ParserError> {
    match bit {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(ParserError::ErrorVerify),
    }
}

pub type ParseFn = fn(&[u8]) -> IResult<&[u8], ProtocolData>;

pub enum ParserError {
    ErrorVerify,
    FailureVerify,
}

impl ParserError {
    pub fn to_nom<T>(&self, input: T) -> nom::Err<nom::error::Error<T>> {
        match self {
            Self::ErrorVerify => nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )),
            Self::FailureVerify => nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )),
        }
    }
}

#[derive(Clone, Debug)]
enum ProcessResult {
    // Fully parsed, unclaimed bytes kept as payload
    Complete,

    // Outer protocols parsed, but the inner one didn't match
    Incomplete,

    // Root not matched
    Failed,
}
