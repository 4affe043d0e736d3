//! `ami-endpoints` - list the PJSIP endpoints registered on an Asterisk server
//! together with the address each one registered from.

mod output;
mod settings;

use std::path::PathBuf;

use ami_core::{AmiClient, ResultKey};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ami-endpoints", version, about = "List registered PJSIP endpoints and their addresses")]
pub struct Cli {
    /// TOML config file (defaults to <config dir>/ami-endpoints/config.toml if present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Manager interface host
    #[arg(long, env = "AMI_HOST")]
    pub host: Option<String>,

    /// Manager interface port
    #[arg(short, long, env = "AMI_PORT")]
    pub port: Option<u16>,

    /// Manager user name
    #[arg(short, long, env = "AMI_USERNAME")]
    pub username: Option<String>,

    /// Manager secret
    #[arg(short, long, env = "AMI_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Key the result by resolved address or by endpoint name
    #[arg(short, long, value_enum)]
    pub key_by: Option<KeyBy>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log protocol traffic (repeat for trace output)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyBy {
    Address,
    Identifier,
}

impl From<KeyBy> for ResultKey {
    fn from(key: KeyBy) -> Self {
        match key {
            KeyBy::Address => ResultKey::Address,
            KeyBy::Identifier => ResultKey::Identifier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = settings::resolve(&cli)?;
    let key_by = config.result_key;
    let address = config.address();
    info!("Querying endpoints on {}", address);

    let result = AmiClient::new(config)
        .query_endpoints()
        .await
        .with_context(|| format!("Endpoint query against {} failed", address))?;

    match cli.format {
        Format::Json => println!("{}", output::render_json(&result, key_by)?),
        Format::Table => {
            if result.is_empty() {
                eprintln!("{}", "No registered endpoints found".yellow());
            } else {
                println!("{}", output::render_table(&result));
                eprintln!(
                    "{} registered endpoints (keyed by {})",
                    result.len().to_string().bold(),
                    key_by
                );
            }
        }
    }
    Ok(())
}
