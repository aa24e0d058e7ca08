// src/main.rs
//! Custodial wallet runner.
//! Loads configuration, keeps the exchange-rate snapshot fresh and serves as
//! the process that owns the wallet service.
use anyhow::Result;
use clap::{Parser, Subcommand};
use custodial_wallet::core::config::WalletConfig;
use custodial_wallet::pricing::{PricingClient, RateSource};
use custodial_wallet::WalletService;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "custodial_wallet")]
#[command(about = "Custodial bitcoin wallet service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// TOML configuration file; `WALLET_*` environment variables are used when omitted
    #[arg(long, env = "CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep exchange rates refreshed until interrupted (default)
    Run,
    /// Fetch the rate snapshot once and print it
    Rates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging()?;

    info!("Starting custodial wallet v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => WalletConfig::from_file(path)?,
        None => WalletConfig::from_env()?,
    };

    match args.command.unwrap_or(Commands::Run) {
        Commands::Rates => {
            let table = PricingClient::new(&config.pricing).fetch().await?;
            for (currency, rate) in table.iter() {
                println!("{} {}", currency, rate);
            }
        }
        Commands::Run => {
            let service = WalletService::from_config(&config)?;
            service.start_rate_refresh();

            tokio::signal::ctrl_c().await?;
            info!("Shutdown requested");
            service.shutdown().await;
            info!("{}", service.metrics().export_metrics()?);
        }
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=info,reqwest=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
