//! xrate command-line front end.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xrate_fx::{ExchangeCalculator, HttpRateSource, RateCache};
use xrate_gateway::serve::render;
use xrate_gateway::{
    serve_lines, ExchangeHandler, ExchangeRequestBuilder, GatewayConfig, RawExchangeRequest,
};

/// xrate CLI
#[derive(Parser, Debug)]
#[command(name = "xrate")]
#[command(about = "Currency exchange over cached upstream rate tables")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Exchange a single amount and print the result
    Exchange {
        /// Amount to exchange
        #[arg(long, allow_hyphen_values = true)]
        price: Option<Decimal>,

        /// Currency the price is in
        #[arg(long)]
        source: Option<String>,

        /// Currency to exchange into
        #[arg(long)]
        target: Option<String>,
    },

    /// Read JSON requests from stdin, one per line, and answer each on stdout
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let config = GatewayConfig::from_env();

    // Logs go to stderr; stdout carries responses
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(
        rates_base_url = %config.rates_base_url,
        refresh_ttl_days = config.refresh_ttl_days,
        currencies = config.currencies.len(),
        "Starting xrate"
    );

    let source = Arc::new(HttpRateSource::new(config.source_config())?);
    let cache = Arc::new(RateCache::new(source));
    let calculator = Arc::new(ExchangeCalculator::new(cache, config.calculator_config()));
    let handler = Arc::new(ExchangeHandler::new(
        ExchangeRequestBuilder::new(config.currencies.clone()),
        calculator,
    ));

    match args.command {
        Command::Exchange {
            price,
            source,
            target,
        } => {
            let outcome = handler
                .handle(&RawExchangeRequest {
                    price,
                    source,
                    target,
                })
                .await;
            println!("{}", render(&outcome));

            Ok(if outcome.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Serve => {
            serve(handler, &config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn serve(handler: Arc<ExchangeHandler>, config: &GatewayConfig) -> anyhow::Result<()> {
    let input = BufReader::new(tokio::io::stdin());
    let handled = serve_lines(handler.clone(), input, tokio::io::stdout()).await?;

    let stats = handler
        .calculator()
        .cache()
        .stats(config.refresh_ttl_days, xrate_common::time::now());
    info!(
        handled,
        cached_tables = stats.entries,
        stale_tables = stats.stale_entries,
        "Input closed, shutting down"
    );

    Ok(())
}
