//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "pomodoro-server")]
#[command(about = "A pomodoro timer service with session accounting and a device bridge")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, env = "PORT", default_value = "3001")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Directory holding the session history
    #[arg(long, env = "POMODORO_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Work interval length at startup, in minutes (minimum 25)
    #[arg(short, long, default_value = "25")]
    pub work_minutes: u32,

    /// URL to poll for the work length (e.g. http://localhost:3000/api/pomodoro/work-time)
    #[arg(long, env = "POMODORO_REMOTE_CONFIG_URL")]
    pub remote_config_url: Option<String>,

    /// Seconds between remote config polls
    #[arg(long, default_value = "5")]
    pub poll_secs: u64,

    /// Serial device node of the external timer (e.g. /dev/ttyUSB0)
    #[arg(short, long, env = "POMODORO_DEVICE")]
    pub device: Option<PathBuf>,

    /// Seconds between alarm reminders until the alarm is acknowledged
    #[arg(long, default_value = "10")]
    pub alarm_repeat_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments and environment
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_secs.max(1))
    }

    pub fn alarm_repeat(&self) -> Duration {
        Duration::from_secs(self.alarm_repeat_secs.max(1))
    }
}
