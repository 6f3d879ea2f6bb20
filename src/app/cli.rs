//! Command-line argument definitions (clap) for the platform utility.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::platform::{Airflow, ComponentKind, LedColor};

#[derive(Parser, Debug)]
#[command(name = "silverstonex-util")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Silverstone-X platform firmware, fan, and thermal utility", long_about = None)]
pub struct Args {
    /// Platform profile JSON overriding the built-in tables
    #[arg(long, global = true, value_name = "FILE", help_heading = "Platform")]
    pub profile: Option<PathBuf>,

    /// Chassis airflow scheme for airflow-dependent thresholds
    #[arg(long, global = true, default_value = "B2F", help_heading = "Platform")]
    pub airflow: Airflow,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); RUST_LOG overrides
    #[arg(long = "log-level", global = true, default_value = "info", help_heading = "Platform")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all components with descriptions and firmware versions
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the firmware version of one component
    Version {
        /// Component name (FPGA, SYSCPLD, SWCPLD1, SWCPLD2, FANCPLD,
        /// Main_BMC, Backup_BMC, BIOS)
        component: ComponentKind,
    },

    /// Flash a firmware image into a CPLD
    Install {
        component: ComponentKind,
        /// Path to the firmware image
        image: PathBuf,
    },

    /// Show fan presence, speed, direction, and LED state
    Fans {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show thermal sensor readings and thresholds
    Thermals {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Read a CPLD register via the getreg node
    Register {
        /// Register address, e.g. 0x62
        register: String,
    },

    /// Set a fan tray status LED
    Led {
        /// Tray number, 1-based
        tray: usize,
        /// LED color (off, green, red)
        color: LedColor,
    },

    /// Dump the active profile as JSON
    Profile,

    /// Full platform snapshot as JSON
    Snapshot,
}
