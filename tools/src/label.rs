use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_COLUMN: &str = "IsMalicious";
pub const DEFAULT_ROW_LIMIT: usize = 120_000;

#[derive(Clone, Debug, PartialEq)]
pub struct LabelOptions {
    pub column: String,
    pub value: bool,
    /// Data rows kept, the header is not counted.
    pub row_limit: usize,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            column: DEFAULT_COLUMN.to_string(),
            value: false,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

/// Sets a constant boolean column and keeps the first `row_limit` rows.
/// An existing column is overwritten in place, otherwise it is appended.
/// Returns the number of data rows written.
pub fn run<R: Read, W: Write>(
    input: R, output: W, options: &LabelOptions,
) -> Result<usize, LabelError> {
    let mut reader = csv::Reader::from_reader(input);
    let mut writer = csv::Writer::from_writer(output);

    let mut header = reader.headers()?.clone();
    if header.is_empty() {
        return Err(LabelError::MissingHeader);
    }
    let position = header.iter().position(|name| name == options.column);
    if position.is_none() {
        header.push_field(&options.column);
    }
    writer.write_record(&header)?;

    let value = if options.value { "True" } else { "False" };

    let mut rows = 0;
    for record in reader.records().take(options.row_limit) {
        let mut record = record?;
        match position {
            Some(position) => {
                record = record
                    .iter()
                    .enumerate()
                    .map(|(index, cell)| if index == position { value } else { cell })
                    .collect();
            },
            None => record.push_field(value),
        }
        writer.write_record(&record)?;
        rows += 1;
    }
    writer.flush()?;

    Ok(rows)
}

pub fn run_files(
    input: &Path, output: &Path, options: &LabelOptions,
) -> Result<usize, LabelError> {
    let input = File::open(input)?;
    common::io::create_parent_directories(output)?;
    let output = File::create(output)?;

    run(input, output, options)
}

#[derive(Error, Debug)]
pub enum LabelError {
    #[error("Input has no header row.")]
    MissingHeader,

    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("CSV Error.")]
    CsvError(#[from] csv::Error),
}

impl LabelError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            LabelError::IOError(err) => Some(err.to_string()),
            LabelError::CsvError(err) => Some(err.to_string()),
            _ => None,
        }
    }
}
