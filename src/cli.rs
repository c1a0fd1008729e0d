use clap::{CommandFactory, Parser};
use std::path::PathBuf;

pub const DEFAULT_REPORT_FILE: &str = "apple-cdn-speed.report";

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "cdn-speed-probe")]
#[command(about = "Compare TCP connect latency across candidate CDN addresses.")]
pub struct CommandLine {
    /// Path to the JSON payload describing services and their IP groups
    pub payload: PathBuf,

    /// Per-probe connect timeout in milliseconds
    #[arg(long, default_value_t = 400)]
    pub timeout: u64,

    /// Number of probes in flight at once
    #[arg(long, default_value_t = 10)]
    pub concurrent: usize,

    /// How many times each address is probed
    #[arg(long = "testing_times", default_value_t = 20)]
    pub testing_times: usize,

    /// Where the report is written
    #[arg(long, default_value = DEFAULT_REPORT_FILE)]
    pub output: PathBuf,

    /// Log verbosity: trace, debug, info, warn, error
    #[arg(long = "log-level", env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Help text, as printed when the tool is run without arguments.
    pub fn help() -> String {
        Self::command().render_help().to_string()
    }
}
