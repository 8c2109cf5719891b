mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "logsift",
    version,
    about = "Multi-format log classification, threat scoring, and metrics"
)]
struct Cli {
    /// Path to a logsift.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a log file into normalized records
    Parse {
        /// Log file to parse
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Aggregate metrics over a log file
    Metrics {
        /// Log file to aggregate
        file: PathBuf,
        /// Include the security/threat summary
        #[arg(long)]
        security: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Focused threat analysis of a log file
    Threats {
        /// Log file to analyze
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Parse { file, json } => commands::parse::run(&file, json, config),
        Commands::Metrics {
            file,
            security,
            json,
        } => commands::metrics::run(&file, security, json, config),
        Commands::Threats { file, json } => commands::threats::run(&file, json, config),
    };

    if let Err(err) = result {
        eprintln!("[logsift] error: {err}");
        std::process::exit(1);
    }
}
