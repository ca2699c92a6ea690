use crate::parser::ParserError;
use crate::protocols::arp::ArpError;
use nom::IResult;
use nom::Parser;
use nom::number::be_u16;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

#[derive(Clone, Debug, Serialize, Deserialize, EnumIter, PartialEq)]
pub enum Operation {
    Request,
    Reply,
}

impl Operation {
    pub fn bytes(&self) -> &[u8] {
        match self {
            Self::Request => &[0x00, 0x01],
            Self::Reply => &[0x00, 0x02],
        }
    }
}

impl TryFrom<u16> for Operation {
    type Error = ArpError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let bytes = value.to_be_bytes();
        Self::iter()
            .find(|operation| operation.bytes() == bytes.as_slice())
            .ok_or(ArpError::OperationUnknown)
    }
}

pub fn parse(input: &[u8]) -> IResult<&[u8], Operation> {
    let (input, number) = be_u16().parse(input)?;

    let operation = Operation::try_from(number)
        .map_err(|_| ParserError::FailureVerify.to_nom(input))?;

    Ok((input, operation))
}
