// Project lints
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unsafe_code)]

use generator::attacks::TrafficGenerator;
use generator::builder::RandomFields;
use generator::config::Config;
use generator::sink::RecordSink;

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

    log::info!("Starting malicious traffic generation...");
    log::debug!("Config loaded: {:#?}", config);

    let mut generator = TrafficGenerator::new(RandomFields::from_seed(config.seed));
    let mut sink = RecordSink::default();

    for plan in &config.attacks {
        let attack = plan.attack_type();
        log::info!("{attack}: started.");

        match generator.run(plan, config.target_ip, config.gateway_ip, &mut sink) {
            Ok(records) => log::info!("{attack}: finished, {records} records."),
            Err(err) => {
                let mut message = format!("{attack} failed. Error: {err}.");
                if let Some(additional_info) = err.additional_info() {
                    message.push_str(&format!(" Additional_info: {additional_info}"));
                }
                log::error!("{}", message);
                std::process::exit(1);
            },
        }
    }

    log::info!("Number of records generated: {}", sink.len());
    for (attack, count) in sink.count_by_attack() {
        log::info!("{attack}: {count}");
    }

    let Some(path) = &config.output_path else {
        log::info!("No output path configured, records are not exported.");
        return;
    };

    if let Err(err) = sink.export(path) {
        let mut message = format!("Export failed. Error: {err}.");
        if let Some(additional_info) = err.additional_info() {
            message.push_str(&format!(" Additional_info: {additional_info}"));
        }
        log::error!("{}", message);
        std::process::exit(1);
    }
    log::info!("CSV file written successfully to {}.", path.display());
}
