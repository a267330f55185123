use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use delivery_api::{
    client::{ApiClient, AuthFailure, ClientConfig, SessionContext},
    geo::inspect_coordinates,
    handlers::pricing::CURRENCY,
    services::{calculate_delivery_price, DistanceService, PricingTiers},
};
use serde::Serialize;
use serde_json::json;
use validator::Validate;

#[derive(Parser)]
#[command(
    name = "delivery-cli",
    about = "Inspect coordinate inputs, distances and delivery prices",
    version
)]
struct Cli {
    /// Log filter, e.g. `debug`; logs go to stderr
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a coordinate string or map link
    Parse {
        input: String,
    },
    /// Distance between two locations, through the API with local fallback
    Distance(DistanceArgs),
    /// Delivery price for a distance in kilometers
    Price(PriceArgs),
}

#[derive(Args)]
struct DistanceArgs {
    pickup: String,
    dropoff: String,
    /// API base URL; defaults to API_BASE_URL or the local server
    #[arg(long)]
    api_url: Option<String>,
    /// Bearer token for the API
    #[arg(long)]
    token: Option<String>,
}

#[derive(Args)]
struct PriceArgs {
    distance_km: f64,
    /// Pricing schedule as JSON, e.g. '{"range_0_1km":375,...}'
    #[arg(long)]
    tiers_json: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Parse { input } => print_json(&inspect_coordinates(&input)),
        Commands::Distance(args) => handle_distance(args).await,
        Commands::Price(args) => handle_price(args),
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn handle_distance(args: DistanceArgs) -> Result<()> {
    let config = match args.api_url {
        Some(url) => ClientConfig::new(url),
        None => ClientConfig::from_env(),
    };
    let session = match args.token {
        Some(token) => SessionContext::with_token(token),
        None => SessionContext::new(),
    };

    let api = ApiClient::new(config, session)
        .context("failed to create API client")?
        .with_auth_failure_handler(Arc::new(|failure: &AuthFailure| {
            eprintln!(
                "authentication rejected ({}) on {}; check --token",
                failure.status, failure.path
            );
        }));
    let service = DistanceService::new(Arc::new(api));

    let output = match service
        .calculate_distance_from_urls(&args.pickup, &args.dropoff)
        .await
    {
        Ok(result) => json!({ "success": true, "result": result }),
        Err(err) => json!({ "success": false, "error": err.to_string() }),
    };
    print_json(&output)
}

fn handle_price(args: PriceArgs) -> Result<()> {
    if !args.distance_km.is_finite() || args.distance_km < 0.0 {
        return Err(anyhow!("distance must be a non-negative number of kilometers"));
    }

    let tiers = args
        .tiers_json
        .as_deref()
        .map(|raw| serde_json::from_str::<PricingTiers>(raw).context("invalid --tiers-json"))
        .transpose()?;
    if let Some(tiers) = &tiers {
        tiers.validate().context("invalid pricing tiers")?;
    }

    let price = calculate_delivery_price(args.distance_km, tiers.as_ref())?;
    print_json(&json!({
        "distance_km": args.distance_km,
        "price": price,
        "currency": CURRENCY,
    }))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
