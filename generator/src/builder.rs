use packet::protocols::ethernet::mac::MacAddress;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

// Real vendor prefixes
pub const OUI_PREFIXES: [[u8; 3]; 8] = [
    [0x00, 0x1A, 0x2B],
    [0x00, 0x1B, 0x44],
    [0x00, 0x1C, 0xC0],
    [0x00, 0x1D, 0xFA],
    [0x00, 0x1E, 0x67],
    [0x00, 0x1F, 0x29],
    [0x00, 0x0A, 0xE6],
    [0x00, 0x0B, 0xCD],
];

pub const TTL_VALUES: [u8; 4] = [32, 64, 128, 255];

pub const WINDOW_SIZES: [u16; 7] = [1024, 2048, 4096, 8192, 16384, 32768, 65535];

// Commonly exploited services
pub const EXPLOITED_PORTS: [u16; 20] = [
    19, 135, 137, 138, 139, 445, 1433, 1720, 1900, 2323, 4444, 5555, 6666, 6667, 6668,
    6669, 11211, 12345, 31337, 54321,
];

// IHL values in 32-bit words, 5 is the only honest one
pub const HEADER_LENGTH_WORDS: [u8; 4] = [5, 6, 7, 8];
// IHL is a 4-bit field
pub const MAX_HEADER_LENGTH_WORDS: u8 = 0x0F;

pub const PAYLOAD_LENGTH: RangeInclusive<usize> = 20..=1400;
pub const EPHEMERAL_PORTS: RangeInclusive<u16> = 1024..=65535;

/// Header field values for crafted packets.
pub trait FieldSource {
    fn mac(&mut self) -> MacAddress;

    /// Address from one of the private ranges.
    fn ipv4(&mut self) -> Ipv4Addr;

    fn ttl(&mut self) -> u8;

    fn window(&mut self) -> u16;

    fn payload(&mut self) -> Vec<u8>;

    fn ephemeral_port(&mut self) -> u16;

    fn exploited_port(&mut self) -> u16;

    /// IPv4 header length in 32-bit words.
    fn header_length(&mut self) -> u8;
}

pub struct RandomFields<R: Rng> {
    rng: R,
}

impl RandomFields<StdRng> {
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self::new(rng)
    }
}

impl<R: Rng> RandomFields<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick<T: Copy>(&mut self, values: &[T], fallback: T) -> T {
        values.choose(&mut self.rng).copied().unwrap_or(fallback)
    }
}

impl<R: Rng> FieldSource for RandomFields<R> {
    fn mac(&mut self) -> MacAddress {
        let prefix = self.pick(&OUI_PREFIXES, OUI_PREFIXES[0]);
        let suffix: [u8; 3] = self.rng.random();

        MacAddress([
            prefix[0], prefix[1], prefix[2], suffix[0], suffix[1], suffix[2],
        ])
    }

    fn ipv4(&mut self) -> Ipv4Addr {
        let [second, third, fourth]: [u8; 3] = self.rng.random();

        match self.pick(&[10u8, 172, 192], 10) {
            10 => Ipv4Addr::new(10, second, third, fourth),
            172 => Ipv4Addr::new(172, self.rng.random_range(16..=31), third, fourth),
            _ => Ipv4Addr::new(192, 168, third, fourth),
        }
    }

    fn ttl(&mut self) -> u8 {
        self.pick(&TTL_VALUES, TTL_VALUES[0])
    }

    fn window(&mut self) -> u16 {
        self.pick(&WINDOW_SIZES, WINDOW_SIZES[0])
    }

    fn payload(&mut self) -> Vec<u8> {
        let length = self.rng.random_range(PAYLOAD_LENGTH);
        let mut payload = vec![0u8; length];
        self.rng.fill(payload.as_mut_slice());

        payload
    }

    fn ephemeral_port(&mut self) -> u16 {
        self.rng.random_range(EPHEMERAL_PORTS)
    }

    fn exploited_port(&mut self) -> u16 {
        self.pick(&EXPLOITED_PORTS, EXPLOITED_PORTS[0])
    }

    fn header_length(&mut self) -> u8 {
        self.pick(&HEADER_LENGTH_WORDS, HEADER_LENGTH_WORDS[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_stay_in_their_sets() {
        let mut fields = RandomFields::from_seed(Some(7));

        for _ in 0..500 {
            assert!(TTL_VALUES.contains(&fields.ttl()));
            assert!(WINDOW_SIZES.contains(&fields.window()));
            assert!(EXPLOITED_PORTS.contains(&fields.exploited_port()));
            assert!(HEADER_LENGTH_WORDS.contains(&fields.header_length()));
            assert!(fields.ephemeral_port() >= 1024);
            assert!(PAYLOAD_LENGTH.contains(&fields.payload().len()));
        }
    }

    #[test]
    fn test_mac_has_known_vendor() {
        let mut fields = RandomFields::from_seed(Some(7));

        for _ in 0..100 {
            let mac = fields.mac();
            assert!(OUI_PREFIXES.contains(&mac.oui()));
        }
    }

    #[test]
    fn test_addresses_are_private() {
        let mut fields = RandomFields::from_seed(Some(11));

        let mut families = [false; 3];
        for _ in 0..300 {
            let address = fields.ipv4();
            assert!(address.is_private());

            match address.octets()[0] {
                10 => families[0] = true,
                172 => families[1] = true,
                192 => families[2] = true,
                other => panic!("Unexpected first octet {other}"),
            }
        }
        assert_eq!(families, [true; 3]);
    }

    #[test]
    fn test_same_seed_same_values() {
        let mut first = RandomFields::from_seed(Some(2024));
        let mut second = RandomFields::from_seed(Some(2024));

        assert_eq!(first.payload(), second.payload());
        assert_eq!(first.ipv4(), second.ipv4());
        assert_eq!(first.mac(), second.mac());
    }
}
