//! mcepnn CLI
//!
//! Commands:
//! - `mcepnn export`  - Build, initialize and export the network
//! - `mcepnn inspect` - Reload an export and probe it

pub mod export;
pub mod inspect;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::loss::LossStrategy;
use crate::variant::ModelVariant;

/// Residual mcep regression network tool
#[derive(Parser, Debug)]
#[command(name = "mcepnn")]
#[command(author, version, about = "Define, initialize and export the mcep conversion network")]
pub struct Cli {
    /// Configuration directory (default.toml, $MCEPNN_ENV.toml)
    #[arg(long, global = true, env = "MCEPNN_CONFIG_DIR", default_value = "config")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the network and export its initialized parameters
    Export {
        /// Feature layout (mcep40, mcep177)
        #[arg(short, long)]
        variant: Option<ModelVariant>,
        /// Loss operation (mse, half_sum_squares)
        #[arg(short, long)]
        loss: Option<LossStrategy>,
        /// Export directory; must not exist yet
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Reload an export, print its signature and run a zero-vector probe
    Inspect {
        /// Export directory
        dir: PathBuf,
    },
}
