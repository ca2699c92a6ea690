use crate::builder::{FieldSource, MAX_HEADER_LENGTH_WORDS};
use crate::config::AttackPlan;
use crate::sink::RecordSink;
use packet::Packet;
use packet::fragment::{self, FragmentError};
use packet::protocols::arp::Arp;
use packet::protocols::dns::{DNS, DnsType, PORT_DNS};
use packet::protocols::icmpv4::ICMPv4;
use packet::protocols::ip::protocol::IpNextLevelProtocol;
use packet::protocols::ipv4::{FLAG_MORE_FRAGMENTS, IPv4};
use packet::protocols::tcp::{self, Flags, TCP};
use packet::protocols::udp::UDP;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use strum_macros::{Display, EnumIter};

pub const DNS_RESOLVER: Ipv4Addr = Ipv4Addr::new(8, 8, 8, 8);
pub const DNS_QUERY_NAME: &str = "example.com";
pub const HTTP_PORT: u16 = 80;
pub const FRAGMENT_SIZE: usize = 8;

#[derive(
    Clone, Copy, Debug, Display, EnumIter, Eq, Hash, PartialEq, Serialize, Deserialize,
)]
pub enum AttackType {
    #[strum(to_string = "SYN Flood")]
    SynFlood,

    #[strum(to_string = "IP Spoofing")]
    IpSpoofing,

    #[strum(to_string = "Malformed Packet")]
    MalformedPacket,

    #[strum(to_string = "DNS Amplification")]
    DnsAmplification,

    #[strum(to_string = "ICMP Flood")]
    IcmpFlood,

    #[strum(to_string = "HTTP Flood")]
    HttpFlood,

    #[strum(to_string = "TCP FIN Scan")]
    TcpFinScan,

    #[strum(to_string = "Fragmentation Attack")]
    FragmentationAttack,

    #[strum(to_string = "ARP Poisoning")]
    ArpPoisoning,
}

/// Builds attack traffic and hands every packet to the sink.
pub struct TrafficGenerator<S: FieldSource> {
    fields: S,
}

impl<S: FieldSource> TrafficGenerator<S> {
    pub fn new(fields: S) -> Self {
        Self { fields }
    }

    /// Runs one configured plan. Returns the number of appended records.
    pub fn run(
        &mut self, plan: &AttackPlan, target: Ipv4Addr, gateway: Ipv4Addr,
        sink: &mut RecordSink,
    ) -> Result<usize, FragmentError> {
        let before = sink.len();

        match plan {
            AttackPlan::SynFlood { packet_count } => {
                self.syn_flood(target, *packet_count, sink)
            },
            AttackPlan::IpSpoofing { packet_count } => {
                self.ip_spoofing(target, *packet_count, sink)
            },
            AttackPlan::MalformedPackets { packet_count } => {
                self.malformed_packets(target, *packet_count, sink)
            },
            AttackPlan::DnsAmplification { packet_count } => {
                self.dns_amplification(target, *packet_count, sink)
            },
            AttackPlan::IcmpFlood { packet_count } => {
                self.icmp_flood(target, *packet_count, sink)
            },
            AttackPlan::HttpFlood { packet_count } => {
                self.http_flood(target, *packet_count, sink)
            },
            AttackPlan::TcpFinScan {
                start_port,
                end_port,
            } => self.tcp_fin_scan(target, *start_port..=*end_port, sink),
            AttackPlan::FragmentationAttack { packet_count } => {
                self.fragmentation_attack(target, *packet_count, sink)?
            },
            AttackPlan::ArpPoisoning { packet_count } => {
                self.arp_poisoning(target, gateway, *packet_count, sink)
            },
        }

        Ok(sink.len() - before)
    }

    /// SYN segments from random sources, no payload.
    pub fn syn_flood(&mut self, target: Ipv4Addr, count: usize, sink: &mut RecordSink) {
        for _ in 0..count {
            let source = self.fields.ipv4();
            let port = self.fields.exploited_port();
            let packet = Packet::default()
                .push(self.ipv4_header(source, target, IpNextLevelProtocol::TCP))
                .push(self.tcp_header(port, tcp::FLAG_SYN));

            submit(packet, AttackType::SynFlood, sink);
        }
    }

    /// SYN segments from random sources carrying random data.
    pub fn ip_spoofing(&mut self, target: Ipv4Addr, count: usize, sink: &mut RecordSink) {
        for _ in 0..count {
            let source = self.fields.ipv4();
            let port = self.fields.exploited_port();
            let packet = Packet::default()
                .push(self.ipv4_header(source, target, IpNextLevelProtocol::TCP))
                .push(self.tcp_header(port, tcp::FLAG_SYN))
                .push(self.fields.payload());

            submit(packet, AttackType::IpSpoofing, sink);
        }
    }

    /// IHL field disagrees with the emitted header, FIN+PSH+URG set.
    pub fn malformed_packets(
        &mut self, target: Ipv4Addr, count: usize, sink: &mut RecordSink,
    ) {
        for _ in 0..count {
            let source = self.fields.ipv4();
            let mut ipv4 = self.ipv4_header(source, target, IpNextLevelProtocol::TCP);
            let words = self.fields.header_length().min(MAX_HEADER_LENGTH_WORDS);
            ipv4.internet_header_length = words * 4;

            let port = self.fields.exploited_port();
            let flags = tcp::FLAG_FIN | tcp::FLAG_PSH | tcp::FLAG_URG;
            let packet = Packet::default()
                .push(ipv4)
                .push(self.tcp_header(port, flags))
                .push(self.fields.payload());

            submit(packet, AttackType::MalformedPacket, sink);
        }
    }

    /// Queries to a public resolver with the target as the spoofed source.
    pub fn dns_amplification(
        &mut self, target: Ipv4Addr, count: usize, sink: &mut RecordSink,
    ) {
        for _ in 0..count {
            let packet = Packet::default()
                .push(self.ipv4_header(target, DNS_RESOLVER, IpNextLevelProtocol::UDP))
                .push(UDP::new(self.fields.ephemeral_port(), PORT_DNS))
                .push(DNS::query(0, DNS_QUERY_NAME, DnsType::A));

            submit(packet, AttackType::DnsAmplification, sink);
        }
    }

    pub fn icmp_flood(&mut self, target: Ipv4Addr, count: usize, sink: &mut RecordSink) {
        for _ in 0..count {
            let source = self.fields.ipv4();
            let packet = Packet::default()
                .push(self.ipv4_header(source, target, IpNextLevelProtocol::ICMP))
                .push(ICMPv4::echo_request());

            submit(packet, AttackType::IcmpFlood, sink);
        }
    }

    /// `GET /` requests pushed straight to port 80.
    pub fn http_flood(&mut self, target: Ipv4Addr, count: usize, sink: &mut RecordSink) {
        let request = format!("GET / HTTP/1.1\r\nHost: {target}\r\n\r\n").into_bytes();

        for _ in 0..count {
            let source = self.fields.ipv4();
            let packet = Packet::default()
                .push(self.ipv4_header(source, target, IpNextLevelProtocol::TCP))
                .push(self.tcp_header(HTTP_PORT, tcp::FLAG_PSH | tcp::FLAG_ACK))
                .push(request.clone());

            submit(packet, AttackType::HttpFlood, sink);
        }
    }

    /// One FIN segment per port of the range.
    pub fn tcp_fin_scan(
        &mut self, target: Ipv4Addr, ports: RangeInclusive<u16>, sink: &mut RecordSink,
    ) {
        for port in ports {
            let source = self.fields.ipv4();
            let packet = Packet::default()
                .push(self.ipv4_header(source, target, IpNextLevelProtocol::TCP))
                .push(self.tcp_header(port, tcp::FLAG_FIN));

            submit(packet, AttackType::TcpFinScan, sink);
        }
    }

    /// Every datagram is split into 8-byte fragments, each fragment is a record.
    pub fn fragmentation_attack(
        &mut self, target: Ipv4Addr, count: usize, sink: &mut RecordSink,
    ) -> Result<(), FragmentError> {
        for _ in 0..count {
            let source = self.fields.ipv4();
            let mut ipv4 = self.ipv4_header(source, target, IpNextLevelProtocol::TCP);
            ipv4.flags = FLAG_MORE_FRAGMENTS;

            let port = self.fields.exploited_port();
            let packet = Packet::default()
                .push(ipv4)
                .push(self.tcp_header(port, tcp::FLAG_PSH | tcp::FLAG_ACK))
                .push(self.fields.payload());

            for fragment in fragment::fragment(&packet, FRAGMENT_SIZE)? {
                submit(fragment, AttackType::FragmentationAttack, sink);
            }
        }

        Ok(())
    }

    /// Two forged replies per iteration: to the target claiming the gateway
    /// address and to the gateway claiming the target address.
    pub fn arp_poisoning(
        &mut self, target: Ipv4Addr, gateway: Ipv4Addr, count: usize,
        sink: &mut RecordSink,
    ) {
        let target_mac = self.fields.mac();
        let gateway_mac = self.fields.mac();

        for _ in 0..count {
            let to_target =
                Arp::reply(gateway_mac.clone(), gateway, target_mac.clone(), target);
            let to_gateway =
                Arp::reply(target_mac.clone(), target, gateway_mac.clone(), gateway);

            submit(Packet::default().push(to_target), AttackType::ArpPoisoning, sink);
            submit(Packet::default().push(to_gateway), AttackType::ArpPoisoning, sink);
        }
    }

    fn ipv4_header(
        &mut self, source: Ipv4Addr, destination: Ipv4Addr, protocol: IpNextLevelProtocol,
    ) -> IPv4 {
        IPv4::new(source, destination, self.fields.ttl(), protocol)
    }

    fn tcp_header(&mut self, port_destination: u16, flags: u8) -> TCP {
        TCP::new(
            self.fields.ephemeral_port(),
            port_destination,
            Flags::from(flags),
            self.fields.window(),
        )
    }
}

fn submit(packet: Packet, attack: AttackType, sink: &mut RecordSink) {
    log::trace!("{attack}: {} layers, {} bytes", packet.layers.len(), packet.len());
    sink.record(&packet, attack);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RandomFields;
    use crate::features::Protocol;
    use packet::protocols::ethernet::mac::MacAddress;

    const TARGET: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 9);
    const GATEWAY: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 1);

    // Same value every call
    struct CannedFields {
        payload_length: usize,
        header_length_words: u8,
    }

    impl FieldSource for CannedFields {
        fn mac(&mut self) -> MacAddress {
            MacAddress([0x00, 0x1E, 0x67, 0x01, 0x02, 0x03])
        }
        fn ipv4(&mut self) -> Ipv4Addr {
            Ipv4Addr::new(10, 1, 2, 3)
        }
        fn ttl(&mut self) -> u8 {
            64
        }
        fn window(&mut self) -> u16 {
            8192
        }
        fn payload(&mut self) -> Vec<u8> {
            vec![0xAB; self.payload_length]
        }
        fn ephemeral_port(&mut self) -> u16 {
            40000
        }
        fn exploited_port(&mut self) -> u16 {
            445
        }
        fn header_length(&mut self) -> u8 {
            self.header_length_words
        }
    }

    fn canned(payload_length: usize) -> TrafficGenerator<CannedFields> {
        TrafficGenerator::new(CannedFields {
            payload_length,
            header_length_words: 7,
        })
    }

    #[test]
    fn test_syn_flood() {
        let mut generator = TrafficGenerator::new(RandomFields::from_seed(Some(1)));
        let mut sink = RecordSink::default();
        generator.syn_flood(TARGET, 3, &mut sink);

        assert_eq!(sink.len(), 3);
        for record in sink.records() {
            assert_eq!(record.protocol, Protocol::Tcp);
            assert!(record.syn_flag);
            assert!(!record.ack_flag && !record.fin_flag && !record.rst_flag);
            let port = record.destination_port.unwrap();
            assert!(crate::builder::EXPLOITED_PORTS.contains(&port));
            assert_eq!(record.payload_size, 0);
            assert_eq!(record.length, 40);
            assert_eq!(record.attack_type, AttackType::SynFlood);
        }
    }

    #[test]
    fn test_ip_spoofing_carries_payload() {
        let mut generator = canned(100);
        let mut sink = RecordSink::default();
        generator.ip_spoofing(TARGET, 2, &mut sink);

        let record = &sink.records()[1];
        assert_eq!(record.payload_size, 100);
        assert_eq!(record.length, 140);
        assert_eq!(record.entropy, 0.0);
        assert!(record.syn_flag);
    }

    #[test]
    fn test_malformed_packets() {
        let mut generator = canned(30);
        let mut sink = RecordSink::default();
        generator.malformed_packets(TARGET, 4, &mut sink);

        assert_eq!(sink.len(), 4);
        let record = &sink.records()[0];
        assert!(record.fin_flag);
        assert!(!record.syn_flag && !record.ack_flag);
        // Claimed header length doesn't change the emitted bytes
        assert_eq!(record.length, 20 + 20 + 30);
    }

    #[test]
    fn test_malformed_header_length_out_of_range() {
        let mut generator = TrafficGenerator::new(CannedFields {
            payload_length: 10,
            header_length_words: 200,
        });
        let mut sink = RecordSink::default();
        generator.malformed_packets(TARGET, 1, &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0].length, 20 + 20 + 10);
    }

    #[test]
    fn test_dns_amplification() {
        let mut generator = canned(0);
        let mut sink = RecordSink::default();
        generator.dns_amplification(TARGET, 5, &mut sink);

        assert_eq!(sink.len(), 5);
        let record = &sink.records()[0];
        assert_eq!(record.protocol, Protocol::Udp);
        assert_eq!(record.destination_port, Some(53));
        assert_eq!(record.window_size, None);
        // DNS query for example.com
        assert_eq!(record.payload_size, 29);
        assert_eq!(record.length, 20 + 8 + 29);
    }

    #[test]
    fn test_icmp_flood() {
        let mut generator = canned(0);
        let mut sink = RecordSink::default();
        generator.icmp_flood(TARGET, 2, &mut sink);

        let record = &sink.records()[0];
        assert_eq!(record.protocol, Protocol::Icmp);
        assert_eq!(record.destination_port, None);
        assert_eq!(record.ttl, Some(64));
        assert_eq!(record.length, 28);
        assert_eq!(record.payload_size, 0);
    }

    #[test]
    fn test_http_flood() {
        let mut generator = canned(0);
        let mut sink = RecordSink::default();
        generator.http_flood(TARGET, 1, &mut sink);

        let request = "GET / HTTP/1.1\r\nHost: 203.0.113.9\r\n\r\n";
        let record = &sink.records()[0];
        assert_eq!(record.destination_port, Some(80));
        assert!(record.ack_flag);
        assert!(!record.syn_flag);
        assert_eq!(record.payload_size, request.len());
    }

    #[test]
    fn test_fin_scan_covers_range() {
        let mut generator = canned(0);
        let mut sink = RecordSink::default();
        generator.tcp_fin_scan(TARGET, 1..=1024, &mut sink);

        assert_eq!(sink.len(), 1024);
        let ports: Vec<u16> = sink
            .records()
            .iter()
            .filter_map(|record| record.destination_port)
            .collect();
        assert_eq!(ports.first(), Some(&1));
        assert_eq!(ports.last(), Some(&1024));
        assert!(sink.records().iter().all(|record| record.fin_flag));
    }

    #[test]
    fn test_fragmentation_counts_fragments() {
        let mut generator = canned(21);
        let mut sink = RecordSink::default();
        generator.fragmentation_attack(TARGET, 3, &mut sink).unwrap();

        // (20 + 21) bytes in 8-byte fragments
        assert_eq!(sink.len(), 3 * 6);
        for record in sink.records() {
            assert_eq!(record.protocol, Protocol::Unknown);
            assert_eq!(record.destination_port, None);
            assert_eq!(record.payload_size, 0);
            assert_eq!(record.ttl, Some(64));
        }
        assert_eq!(sink.records()[0].length, 28);
        assert_eq!(sink.records()[5].length, 21);
    }

    #[test]
    fn test_arp_poisoning_two_records_per_iteration() {
        let mut generator = canned(0);
        let mut sink = RecordSink::default();
        generator.arp_poisoning(TARGET, GATEWAY, 7, &mut sink);

        assert_eq!(sink.len(), 14);
        for record in sink.records() {
            assert_eq!(record.protocol, Protocol::Unknown);
            assert_eq!(record.ttl, None);
            assert_eq!(record.length, 28);
        }
    }

    #[test]
    fn test_run_dispatches_plans() {
        let mut generator = TrafficGenerator::new(RandomFields::from_seed(Some(5)));
        let mut sink = RecordSink::default();

        let plans = [
            AttackPlan::SynFlood { packet_count: 4 },
            AttackPlan::ArpPoisoning { packet_count: 2 },
            AttackPlan::TcpFinScan {
                start_port: 20,
                end_port: 22,
            },
        ];
        let appended: Vec<usize> = plans
            .iter()
            .map(|plan| generator.run(plan, TARGET, GATEWAY, &mut sink).unwrap())
            .collect();

        assert_eq!(appended, vec![4, 4, 3]);
        assert_eq!(
            sink.count_by_attack(),
            vec![
                (AttackType::SynFlood, 4),
                (AttackType::TcpFinScan, 3),
                (AttackType::ArpPoisoning, 4),
            ]
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(AttackType::SynFlood.to_string(), "SYN Flood");
        assert_eq!(AttackType::MalformedPacket.to_string(), "Malformed Packet");
        assert_eq!(AttackType::TcpFinScan.to_string(), "TCP FIN Scan");
    }
}
