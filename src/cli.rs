// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands, their arguments, and device-spec parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use perista::error::Error;
use perista::types::{DevicePath, Role};

#[derive(Parser)]
#[command(name = "perista")]
#[command(about = "Firmware deployment for paired embedded devices")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output (only final result)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON lines output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a perista.yml settings file
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },

    /// Deploy firmware to one or two connected devices
    Update {
        /// Directory holding the downloaded firmware bundle
        #[arg(long)]
        firmware: PathBuf,

        /// Firmware version being deployed
        #[arg(long = "fw-version")]
        fw_version: String,

        /// Target device as PATH:ROLE (role is primary or secondary);
        /// repeat for a pair
        #[arg(short, long = "device", required = true)]
        devices: Vec<String>,

        /// Break live device locks
        #[arg(long)]
        force: bool,
    },

    /// Apply a therapy profile to one or two connected devices
    Configure {
        /// YAML file holding the therapy profile
        #[arg(long)]
        profile: PathBuf,

        /// Target device path; repeat for a pair
        #[arg(short, long = "device", required = true)]
        devices: Vec<String>,

        /// Break live device locks
        #[arg(long)]
        force: bool,
    },
}

/// Parse a `PATH` or `PATH:ROLE` device argument.
pub fn parse_device_spec(spec: &str) -> Result<(DevicePath, Option<Role>), Error> {
    match spec.rsplit_once(':') {
        Some((path, role)) => {
            let role: Role = role
                .parse()
                .map_err(|_| Error::InvalidDeviceSpec(spec.to_string()))?;
            Ok((DevicePath::new(path)?, Some(role)))
        }
        None => Ok((DevicePath::new(spec)?, None)),
    }
}
