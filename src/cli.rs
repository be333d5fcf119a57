use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{SettingsOverrides, DEFAULT_SETTINGS_FILE};

/// Download the avatar of every member of your Discord servers
#[derive(Parser, Debug)]
#[command(name = "dl-avatars")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Harvest every server listed in settings.json:
        dl-avatars

    Harvest specific servers into another folder:
        dl-avatars -o ~/avatars 123456789012345678 876543210987654321

    Check that the bot can see the configured servers:
        dl-avatars test

settings.json holds the bot token, the server IDs and the output folder.")]
pub struct Cli {
    /// Server IDs to harvest (replaces serverIDs from the settings file)
    #[arg(value_name = "SERVER_ID")]
    pub servers: Vec<String>,

    /// Settings file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Maximum simultaneous downloads per server (0 = unlimited)
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Avatar size in pixels (power of two, 16-4096)
    #[arg(long, value_name = "PX")]
    pub size: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (-vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log filter, e.g. `debug` or `dl_avatars=trace`
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Append logs to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Resolve the configured servers without downloading anything
    Test,

    /// Show the settings file location and effective settings
    Config,

    /// Show version information
    Version {
        #[arg(long)]
        detailed: bool,
    },
}

impl Cli {
    /// Parse arguments and handle special cases
    pub fn parse_and_validate() -> Self {
        Self::parse().normalized()
    }

    fn normalized(mut self) -> Self {
        if self.quiet {
            self.verbose = 0;
        }
        self
    }

    /// Get the effective log level
    pub fn get_log_level(&self) -> &str {
        if let Some(ref level) = self.log_level {
            level
        } else {
            match self.verbose {
                0 if self.quiet => "error",
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Get settings overrides from CLI arguments
    pub fn get_settings_overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            server_ids: self.servers.clone(),
            output_dir: self.output.clone(),
            concurrency: self.concurrency,
            timeout_secs: self.timeout,
            avatar_size: self.size,
        }
    }
}
