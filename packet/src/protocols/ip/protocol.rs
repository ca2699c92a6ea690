use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};

// IANA Assigned Internet Protocol Numbers
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum IpNextLevelProtocol {
    ICMP = 1,
    IGMP = 2,
    TCP = 6,
    UDP = 17,
    IPv6 = 41,
    GRE = 47,
    ESP = 50,
    AH = 51,
    Ipv6Icmp = 58,
    SCTP = 132,
}

impl IpNextLevelProtocol {
    pub fn number(&self) -> u8 {
        *self as u8
    }
}
