mod main_runtime;

use clap::Parser;
use mcepnn::cli::export::ExportRequest;
use mcepnn::cli::{self, Cli, Commands};
use mcepnn::config::AppConfig;
use tracing::error;

use crate::main_runtime::{init_logging, init_logging_simple};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Export { variant, loss, out } => {
            let config = AppConfig::load_from(&cli.config)?;
            init_logging(&config.logging);
            let request = ExportRequest::resolve(&config, *variant, *loss, out.clone());
            cli::export::run(request)
        }
        Commands::Inspect { dir } => {
            init_logging_simple();
            cli::inspect::run(dir)
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
