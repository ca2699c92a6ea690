use csv::StringRecord;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Columns rewritten as whole numbers, `80.0` becomes `80`.
pub const INTEGER_COLUMNS: [&str; 2] = ["DestinationPort", "Ttl"];

pub const FIRST_INPUT: &str = "first";
pub const SECOND_INPUT: &str = "second";

// 2^63, whole numbers in [-2^63, 2^63) fit into i64
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Concatenates the rows of both inputs under the union of their headers.
/// Returns the number of data rows written.
pub fn run<F: Read, S: Read, W: Write>(
    first: F, second: S, output: W,
) -> Result<usize, CombineError> {
    let mut first = csv::Reader::from_reader(first);
    let mut second = csv::Reader::from_reader(second);
    let mut writer = csv::Writer::from_writer(output);

    let first_header = header(&mut first)?;
    let second_header = header(&mut second)?;

    // First-seen order
    let mut columns: Vec<String> = first_header.iter().map(str::to_string).collect();
    for name in second_header.iter() {
        if !columns.iter().any(|column| column == name) {
            columns.push(name.to_string());
        }
    }
    writer.write_record(&columns)?;

    let rows = append(FIRST_INPUT, &mut first, &first_header, &columns, &mut writer)?
        + append(SECOND_INPUT, &mut second, &second_header, &columns, &mut writer)?;
    writer.flush()?;

    Ok(rows)
}

/// Rows are numbered from 1 within each input.
fn append<R: Read, W: Write>(
    input: &'static str, reader: &mut csv::Reader<R>, header: &StringRecord,
    columns: &[String], writer: &mut csv::Writer<W>,
) -> Result<usize, CombineError> {
    // Position of each output column in this input
    let positions: Vec<Option<usize>> = columns
        .iter()
        .map(|column| header.iter().position(|name| name == column))
        .collect();

    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        rows += 1;

        let mut row = StringRecord::new();
        for (column, position) in columns.iter().zip(&positions) {
            let cell = position.and_then(|index| record.get(index)).unwrap_or_default();

            if INTEGER_COLUMNS.contains(&column.as_str()) {
                let value = normalize_integer(cell).ok_or_else(|| CombineError::NotNumeric {
                    input,
                    column: column.to_string(),
                    row: rows,
                    value: cell.to_string(),
                })?;
                row.push_field(&value);
            } else {
                row.push_field(cell);
            }
        }
        writer.write_record(&row)?;
    }

    Ok(rows)
}

pub fn run_files(first: &Path, second: &Path, output: &Path) -> Result<usize, CombineError> {
    let first = File::open(first)?;
    let second = File::open(second)?;
    common::io::create_parent_directories(output)?;
    let output = File::create(output)?;

    run(first, second, output)
}

fn header<R: Read>(reader: &mut csv::Reader<R>) -> Result<StringRecord, CombineError> {
    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(CombineError::MissingHeader);
    }

    Ok(header)
}

/// Truncates toward zero. Empty and `NaN` cells stay empty.
/// `None` for text, infinities and values outside the `i64` range.
fn normalize_integer(cell: &str) -> Option<String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Some(String::new());
    }

    let value = cell.parse::<f64>().ok()?;
    if value.is_nan() {
        return Some(String::new());
    }

    let value = value.trunc();
    if !(-I64_BOUND..I64_BOUND).contains(&value) {
        return None;
    }

    Some(format!("{}", value as i64))
}

#[derive(Error, Debug)]
pub enum CombineError {
    #[error("Input has no header row.")]
    MissingHeader,

    #[error("Value is not a number.")]
    NotNumeric {
        input: &'static str,
        column: String,
        row: usize,
        value: String,
    },

    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("CSV Error.")]
    CsvError(#[from] csv::Error),
}

impl CombineError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            CombineError::NotNumeric {
                input,
                column,
                row,
                value,
            } => Some(format!(
                "Input: {input}, column: {column}, row: {row}, value: {value}"
            )),
            CombineError::IOError(err) => Some(err.to_string()),
            CombineError::CsvError(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combine(first: &str, second: &str) -> Result<(usize, Vec<String>), CombineError> {
        let mut output = Vec::new();
        let rows = run(first.as_bytes(), second.as_bytes(), &mut output)?;
        let text = String::from_utf8(output).unwrap();

        Ok((rows, text.lines().map(str::to_string).collect()))
    }

    #[test]
    fn test_same_columns() {
        let benign = "Protocol,DestinationPort,Ttl,IsMalicious\nTcp,443.0,64.0,False\n";
        let malicious = "Protocol,DestinationPort,Ttl,IsMalicious\nUnknown,,,True\nUdp,53,128,True\n";

        let (rows, lines) = combine(benign, malicious).unwrap();
        assert_eq!(rows, 3);
        assert_eq!(
            lines,
            vec![
                "Protocol,DestinationPort,Ttl,IsMalicious",
                "Tcp,443,64,False",
                "Unknown,,,True",
                "Udp,53,128,True",
            ]
        );
    }

    #[test]
    fn test_header_union() {
        let first = "Protocol,Ttl\nTcp,64\n";
        let second = "Entropy,Protocol\n7.5,Udp\n";

        let (_, lines) = combine(first, second).unwrap();
        assert_eq!(
            lines,
            vec!["Protocol,Ttl,Entropy", "Tcp,64,", "Udp,,7.5"]
        );
    }

    #[test]
    fn test_other_columns_untouched() {
        let data = "Length,Entropy\n60.0,0.0\n";

        let (_, lines) = combine(data, data).unwrap();
        assert_eq!(lines[1], "60.0,0.0");
    }

    #[test]
    fn test_normalize_integer() {
        assert_eq!(normalize_integer("80.0"), Some("80".to_string()));
        assert_eq!(normalize_integer("63.9"), Some("63".to_string()));
        assert_eq!(normalize_integer("-7.5"), Some("-7".to_string()));
        assert_eq!(normalize_integer(" 128 "), Some("128".to_string()));
        assert_eq!(normalize_integer(""), Some(String::new()));
        assert_eq!(normalize_integer("NaN"), Some(String::new()));
        assert_eq!(normalize_integer("inf"), None);
        assert_eq!(normalize_integer("high"), None);
    }

    #[test]
    fn test_normalize_integer_range() {
        assert_eq!(
            normalize_integer("-9223372036854775808"),
            Some(i64::MIN.to_string())
        );
        assert_eq!(normalize_integer("9223372036854775808"), None);
        assert_eq!(normalize_integer("1e30"), None);
        assert_eq!(normalize_integer("-1e19"), None);
    }

    #[test]
    fn test_not_numeric_names_input_column_and_row() {
        let first = "Protocol,Ttl\nTcp,64\n";
        let second = "Protocol,Ttl\nUdp,128\nIcmp,high\n";

        let err = combine(first, second).unwrap_err();
        assert!(matches!(
            &err,
            CombineError::NotNumeric { input: SECOND_INPUT, column, row: 2, value }
                if column == "Ttl" && value == "high"
        ));
        assert_eq!(
            err.additional_info(),
            Some("Input: second, column: Ttl, row: 2, value: high".to_string())
        );

        let err = combine("DestinationPort\n80\n1e30\n", "DestinationPort\n").unwrap_err();
        assert!(matches!(
            err,
            CombineError::NotNumeric { input: FIRST_INPUT, row: 2, .. }
        ));
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(
            combine("", "Protocol\nTcp\n"),
            Err(CombineError::MissingHeader)
        ));
    }

    #[test]
    fn test_run_files() {
        let root = std::env::temp_dir().join(format!("tools-combine-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        let first = root.join("benign.csv");
        let second = root.join("malicious.csv");
        let output = root.join("train").join("train.csv");
        std::fs::write(&first, "Ttl\n64.0\n").unwrap();
        std::fs::write(&second, "Ttl\n255.0\n").unwrap();

        assert_eq!(run_files(&first, &second, &output).unwrap(), 2);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "Ttl\n64\n255\n"
        );

        std::fs::remove_dir_all(&root).unwrap();
    }
}
