//! Command-line interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Return leased Android devices to a clean state when their session ends.
#[derive(Parser, Debug)]
#[command(name = "device-reclaim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate the configuration, then exit.
    Validate,

    /// Run one device session: wait for boot, record the baseline, clean
    /// up when released with Ctrl-C.
    Session {
        /// Device serial as reported by `adb devices`.
        #[arg(short, long)]
        serial: String,

        /// Also release when stdin reaches end of input. Leave off when
        /// stdin is /dev/null (services, nohup).
        #[arg(long)]
        release_on_eof: bool,
    },

    /// Print the packages installed on a device.
    Packages {
        /// Device serial as reported by `adb devices`.
        #[arg(short, long)]
        serial: String,
    },
}
