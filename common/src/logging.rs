use chrono::{Datelike, Local, Timelike};
use log::{LevelFilter, Record};
use std::fmt::Arguments;
use thiserror::Error;

pub const DEFAULT_FORMAT: &str = "[$Y-$m-$D $H:$M:$S $LEVEL $TARGET] $MESSAGE";

#[derive(Error, Debug)]
pub enum LogError {
    #[error("IO Error.")]
    IOError(#[from] std::io::Error),

    #[error("Logger initialization error.")]
    SetLoggerError(log::SetLoggerError),
}

impl LogError {
    pub fn additional_info(&self) -> Option<String> {
        match self {
            LogError::IOError(err) => Some(err.to_string()),
            LogError::SetLoggerError(err) => Some(err.to_string()),
        }
    }
}

// Longest first: `$M` is a prefix of `$MESSAGE`
const PLACEHOLDERS: [&str; 9] = [
    "$MESSAGE", "$LEVEL", "$TARGET", "$Y", "$m", "$D", "$H", "$M", "$S",
];

pub fn parse_format(format: String, message: &Arguments, record: &Record) -> String {
    let format = format.trim();
    let time = Local::now();

    let mut log = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(position) = rest.find('$') {
        log.push_str(&rest[..position]);
        rest = &rest[position..];

        let placeholder = PLACEHOLDERS
            .iter()
            .find(|placeholder| rest.starts_with(*placeholder));
        let Some(placeholder) = placeholder else {
            log.push('$');
            rest = &rest[1..];
            continue;
        };

        let value = match *placeholder {
            // Time
            "$Y" => format!("{:0>2}", time.year()),
            "$m" => format!("{:0>2}", time.month()),
            "$D" => format!("{:0>2}", time.day()),
            "$H" => format!("{:0>2}", time.hour()),
            "$M" => format!("{:0>2}", time.minute()),
            "$S" => format!("{:0>2}", time.second()),
            // Level
            "$LEVEL" => record.level().as_str().to_string(),
            // Target
            "$TARGET" => record.target().to_string(),
            // Message
            _ => message.to_string(),
        };
        log.push_str(&value);
        rest = &rest[placeholder.len()..];
    }
    log.push_str(rest);

    log
}

/// Installs the global stdout logger. Does nothing when the level is `Off`.
pub fn setup(log_level: &LevelFilter, log_format: String) -> Result<(), LogError> {
    if log_level.eq(&LevelFilter::Off) {
        return Ok(());
    }

    fern::Dispatch::new()
        .level(*log_level)
        .format(move |out, message, record| {
            let formatted = parse_format(log_format.clone(), message, record);

            out.finish(format_args!("{}", formatted))
        })
        .chain(std::io::stdout())
        .apply()
        .map_err(LogError::SetLoggerError)
}
