use clap::Parser;
use std::path::PathBuf;

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "HTTP:   rouille 3\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Kiosk repair-status board with a REST control plane
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// REST API port (overrides settings file)
    #[arg(short = 'p', long = "port", value_name = "PORT")]
    pub port: Option<u16>,

    /// Address to bind the REST API to (overrides settings file)
    #[arg(short = 'b', long = "bind", value_name = "ADDR")]
    pub bind: Option<String>,

    /// Do not start the REST API server
    #[arg(long = "no-server")]
    pub no_server: bool,

    /// Seed the board with sample repair records
    #[arg(short = 'd', long = "demo")]
    pub demo: bool,

    /// Exit after N seconds (default: run until killed)
    #[arg(long = "run-for", value_name = "SECS")]
    pub run_for: Option<u64>,

    /// Enable debug logging to file (default: repair-board.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

impl Args {
    /// Apply CLI overrides on top of the settings file.
    pub fn apply_to(&self, settings: &mut crate::config::Settings) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(bind) = &self.bind {
            settings.server.bind = bind.clone();
        }
        if self.no_server {
            settings.server.enabled = false;
        }
        if self.demo {
            settings.demo_data = true;
        }
    }
}
