use repair_board::app::Host;
use repair_board::cli::Args;
use repair_board::config::{self, Settings};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use std::time::Duration;

fn main() -> Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());

    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {:#}", e);
    }

    // Settings file is read before logging so its default level can apply.
    // Errors are reported once the logger is up.
    let settings_path = config::config_file(config::SETTINGS_FILE, &path_config);
    let file_level = Settings::load(&settings_path)
        .map(|s| s.log.level)
        .unwrap_or_else(|_| "warn".to_string());

    // 0 (default) = settings level, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let default_level = match args.verbosity {
        0 => file_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    if let Some(log_path_opt) = &args.log_file {
        let log_path = log_path_opt
            .clone()
            .unwrap_or_else(|| config::data_file(config::LOG_FILE, &path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .parse_filters(default_level)
            .filter_module("tiny_http", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!("Logging to file: {} (level: {})", log_path.display(), default_level);
    } else {
        // Console logging (respects RUST_LOG if set)
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("tiny_http", log::LevelFilter::Warn)
            .format_timestamp_millis()
            .init();
    }

    let mut settings = Settings::load_or_default(&settings_path);
    args.apply_to(&mut settings);

    info!("Repair board starting...");
    debug!("Command-line args: {:?}", args);
    info!("Settings path: {}", settings_path.display());
    debug!("Settings: {:?}", settings);

    let mut host = Host::new(settings);
    if host.repository().is_empty() {
        info!("Board starts empty");
    } else {
        info!("Board seeded with {} record(s)", host.repository().len());
    }

    host.start()?;
    host.run(args.run_for.map(Duration::from_secs))?;

    info!("Repair board stopped");
    Ok(())
}
