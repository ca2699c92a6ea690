use crate::attacks::AttackType;
use crate::features::{self, FeatureRecord};
use packet::Packet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use strum::IntoEnumIterator;
use thiserror::Error;

/// Ordered, append-only collection of extracted records.
#[derive(Debug, Default)]
pub struct RecordSink {
    records: Vec<FeatureRecord>,
}

impl RecordSink {
    pub fn record(&mut self, packet: &Packet, attack: AttackType) {
        self.records.push(features::extract(packet, attack));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FeatureRecord] {
        &self.records
    }

    /// Number of records per attack, attacks without records are left out.
    pub fn count_by_attack(&self) -> Vec<(AttackType, usize)> {
        AttackType::iter()
            .map(|attack| {
                let count = self
                    .records
                    .iter()
                    .filter(|record| record.attack_type == attack)
                    .count();
                (attack, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    /// Header row, then one row per record. Missing values are empty cells.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        writer.write_record(FeatureRecord::COLUMNS)?;
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        Ok(())
    }

    pub fn export(&self, path: &Path) -> Result<(), ExportError> {
        common::io::create_parent_directories(path)?;
        let file = File::create(path)?;

        self.write_csv(file)
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("CSV Error.")]
    CsvError(#[from] csv::Error),
}

impl ExportError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            ExportError::IOError(err) => Some(err.to_string()),
            ExportError::CsvError(err) => Some(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packet::protocols::arp::Arp;
    use packet::protocols::ethernet::mac::MacAddress;
    use packet::protocols::icmpv4::ICMPv4;
    use packet::protocols::ip::protocol::IpNextLevelProtocol;
    use packet::protocols::ipv4::IPv4;
    use packet::protocols::tcp::{self, Flags, TCP};
    use std::net::Ipv4Addr;

    fn syn() -> Packet {
        Packet::default()
            .push(IPv4::new(
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(192, 168, 1, 100),
                64,
                IpNextLevelProtocol::TCP,
            ))
            .push(TCP::new(40000, 445, Flags::from(tcp::FLAG_SYN), 8192))
    }

    fn arp() -> Packet {
        Packet::default().push(Arp::reply(
            MacAddress([0x00, 0x1E, 0x67, 0x01, 0x02, 0x03]),
            Ipv4Addr::new(192, 168, 1, 1),
            MacAddress([0x00, 0x0B, 0xCD, 0x04, 0x05, 0x06]),
            Ipv4Addr::new(192, 168, 1, 100),
        ))
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut sink = RecordSink::default();
        assert!(sink.is_empty());

        sink.record(&syn(), AttackType::SynFlood);
        sink.record(&arp(), AttackType::ArpPoisoning);
        sink.record(&syn(), AttackType::SynFlood);

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.records()[1].attack_type, AttackType::ArpPoisoning);
        // No deduplication
        assert_eq!(sink.records()[0], sink.records()[2]);
    }

    #[test]
    fn test_csv_layout() {
        let mut sink = RecordSink::default();
        sink.record(&syn(), AttackType::SynFlood);
        sink.record(&arp(), AttackType::ArpPoisoning);

        let mut buffer = Vec::new();
        sink.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Protocol,DestinationPort,Length,Ttl,SynFlag,AckFlag,FinFlag,RstFlag,WindowSize,PayloadSize,Entropy",
                "Tcp,445,40,64,True,False,False,False,8192,0,0.0",
                "Unknown,,28,,False,False,False,False,,0,0.0",
            ]
        );
    }

    #[test]
    fn test_empty_sink_writes_header() {
        let mut buffer = Vec::new();
        RecordSink::default().write_csv(&mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("Protocol,"));
    }

    #[test]
    fn test_count_by_attack() {
        let mut sink = RecordSink::default();
        sink.record(&arp(), AttackType::ArpPoisoning);
        sink.record(&syn(), AttackType::SynFlood);
        sink.record(&arp(), AttackType::ArpPoisoning);
        let icmp = Packet::default()
            .push(IPv4::new(
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
                32,
                IpNextLevelProtocol::ICMP,
            ))
            .push(ICMPv4::echo_request());
        sink.record(&icmp, AttackType::IcmpFlood);

        assert_eq!(
            sink.count_by_attack(),
            vec![
                (AttackType::SynFlood, 1),
                (AttackType::IcmpFlood, 1),
                (AttackType::ArpPoisoning, 2),
            ]
        );
    }

    #[test]
    fn test_export_creates_directories() {
        let root = std::env::temp_dir().join(format!("generator-sink-{}", std::process::id()));
        let path = root.join("dataset").join("malicious_traffic.csv");

        let mut sink = RecordSink::default();
        sink.record(&syn(), AttackType::SynFlood);
        sink.export(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
