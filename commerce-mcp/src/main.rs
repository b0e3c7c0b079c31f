//! Commerce MCP Server Binary
//!
//! ## Usage
//!
//! ```bash
//! # Cart service (stdio)
//! commerce-mcp --service cart --budget 1500
//!
//! # A retailer catalog
//! commerce-mcp --service iotmarket
//!
//! # Config file, overridden by COMMERCE_* env vars and flags
//! COMMERCE_CONFIRMATION_MODE=strict commerce-mcp --config commerce.json
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use commerce_core::{CommerceConfig, ConfirmationMode, Retailer};
use commerce_mcp::{CommerceServer, Service};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ServiceArg {
    Cart,
    Techhub,
    Gadgetzone,
    Iotmarket,
}

impl From<ServiceArg> for Service {
    fn from(arg: ServiceArg) -> Self {
        match arg {
            ServiceArg::Cart => Service::Cart,
            ServiceArg::Techhub => Service::Catalog(Retailer::TechHub),
            ServiceArg::Gadgetzone => Service::Catalog(Retailer::GadgetZone),
            ServiceArg::Iotmarket => Service::Catalog(Retailer::IoTMarket),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Handshake,
    Strict,
}

impl From<ModeArg> for ConfirmationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Handshake => ConfirmationMode::Handshake,
            ModeArg::Strict => ConfirmationMode::Strict,
        }
    }
}

/// Agent-facing commerce tools over MCP stdio
#[derive(Debug, Parser)]
#[command(name = "commerce-mcp", version, about)]
struct Cli {
    /// Service to expose
    #[arg(long, value_enum, default_value_t = ServiceArg::Cart)]
    service: ServiceArg,

    /// Budget ceiling for new carts
    #[arg(long)]
    budget: Option<f64>,

    /// How checkout treats untrusted items
    #[arg(long, value_enum)]
    confirmation_mode: Option<ModeArg>,

    /// JSON config file
    #[arg(long, env = "COMMERCE_CONFIG")]
    config: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<CommerceConfig, Box<dyn std::error::Error>> {
    let base = match &cli.config {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            CommerceConfig::from_file(path)?
        }
        None => CommerceConfig::default(),
    };

    let mut builder = CommerceConfig::builder().base(base.with_env()?);
    if let Some(budget) = cli.budget {
        builder = builder.default_budget(budget);
    }
    if let Some(mode) = cli.confirmation_mode {
        builder = builder.confirmation_mode(mode.into());
    }
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the protocol
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "commerce_mcp=info,commerce_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let service = Service::from(cli.service);

    tracing::info!(
        "Starting {} v{} (budget {}, {:?} checkout)",
        service.server_name(),
        env!("CARGO_PKG_VERSION"),
        config.default_budget,
        config.confirmation_mode
    );

    let server = CommerceServer::new(service, config)?;

    tracing::info!("MCP server ready, listening on stdio");
    server.run_stdio().await?;

    Ok(())
}
