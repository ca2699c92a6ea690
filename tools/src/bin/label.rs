// Project lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

use tools::config::Config;
use tools::label;

fn main() {
    // Reading config
    let config = match Config::from_file() {
        Ok(value) => value,
        Err(err) => {
            let mut message = format!("Config initialization failed. Error: {err}.");
            if let Some(additional_info) = err.additional_info() {
                message.push_str(&format!(" Additional_info: {additional_info}"));
            }
            eprintln!("{}", message);
            std::process::exit(1);
        },
    };

    // Logging setup
    common::logging::setup(&config.log_level, config.log_format.clone()).unwrap_or_else(|err| {
        let mut message = format!("Logger initialization failed. Error: {err}.");
        if let Some(additional_info) = err.additional_info() {
            message.push_str(&format!(" Additional_info: {additional_info}"));
        }
        println!("{}", message);
        std::process::exit(1);
    });

    let section = &config.label;
    log::info!("Labeling {}...", section.input.display());
    log::debug!("Label options: {:#?}", section);

    match label::run_files(&section.input, &section.output, &section.options()) {
        Ok(rows) => log::info!(
            "New CSV file with '{}' column has been saved as '{}', {rows} rows.",
            section.column,
            section.output.display()
        ),
        Err(err) => {
            let mut message = format!("Labeling failed. Error: {err}.");
            if let Some(additional_info) = err.additional_info() {
                message.push_str(&format!(" Additional_info: {additional_info}"));
            }
            log::error!("{}", message);
            std::process::exit(1);
        },
    }
}
