// Project lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::Path;
use tools::config::Config;
use tools::size;

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

    print!("Enter the directory path: ");
    let mut directory = String::new();
    let input = std::io::stdout()
        .flush()
        .and_then(|_| std::io::stdin().read_line(&mut directory));
    if let Err(err) = input {
        log::error!("Reading directory failed. Error: {err}.");
        std::process::exit(1);
    }
    let directory = directory.trim();

    let extension = &config.size.extension;
    match size::total_size(Path::new(directory), extension) {
        Ok(bytes) => println!("{}", size::report(directory, extension, bytes)),
        Err(err) => {
            log::error!("Counting size failed. Error: {err}.");
            std::process::exit(1);
        },
    }
}
