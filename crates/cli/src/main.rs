use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use travelwise_agents::TravelPlanner;
use travelwise_core::{pricing_plans, BillingCycle, Budget, TravelStyle, TripRequest};
use travelwise_dataset::DatasetCatalog;
use travelwise_observability::{init_tracing, AppMetrics};
use travelwise_providers::{AiBackend, PlacesBackend, ProviderConfig, ProviderStack};
use travelwise_storage::Store;

type Planner = TravelPlanner<PlacesBackend, AiBackend, Store>;

#[derive(Debug, Parser)]
#[command(name = "travelwise")]
#[command(about = "TravelWise trip planner CLI")]
struct Cli {
    #[arg(long, env = "TRAVELWISE_DATA_ROOT", default_value = "data")]
    data_root: PathBuf,

    /// Skip the Places and Gemini providers even when keys are configured.
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct TripArgs {
    destination: String,
    #[arg(long, default_value = "mid_range")]
    budget: String,
    #[arg(long, default_value = "solo")]
    style: String,
    /// Comma-separated interests, e.g. `beaches,food`.
    #[arg(long, value_delimiter = ',')]
    interests: Vec<String>,
    #[arg(long, default_value_t = 3)]
    days: u8,
}

#[derive(Debug, Subcommand)]
enum Command {
    Suggest(TripArgs),
    Plan {
        #[command(flatten)]
        trip: TripArgs,
        /// First day of the trip (YYYY-MM-DD), defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long, default_value = "guest")]
        user: String,
    },
    Cities {
        /// Prefix to autocomplete; lists every city when omitted.
        query: Option<String>,
    },
    /// Popular places of a dataset city with their curated details.
    Places {
        city: String,
    },
    Place {
        name: String,
        #[arg(long)]
        city: String,
    },
    Outfit {
        city: String,
        #[arg(long, default_value_t = 1)]
        day: u8,
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    Pricing {
        #[arg(long, default_value = "monthly")]
        cycle: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("travelwise_cli");
    let cli = Cli::parse();

    let planner = build_planner(&cli.data_root, cli.offline).await?;
    let today = Utc::now().date_naive();

    match cli.command {
        Command::Suggest(trip) => {
            let report = planner.suggest(trip_request(trip)?).await?;
            print_json(&report)?;
        }
        Command::Plan { trip, start, user } => {
            let plan = planner
                .plan(&user, trip_request(trip)?, start.unwrap_or(today))
                .await?;
            print_json(&plan)?;
        }
        Command::Cities { query } => {
            let dataset = planner.dataset();
            let cities: Vec<serde_json::Value> = match query.as_deref() {
                Some(query) => dataset.autocomplete(query),
                None => dataset.all_cities().iter().collect(),
            }
            .into_iter()
            .map(|record| serde_json::json!({ "city": record.city, "state": record.state }))
            .collect();
            print_json(&cities)?;
        }
        Command::Places { city } => {
            let dataset = planner.dataset();
            let places = dataset.places_by_city(&city);
            if places.is_empty() {
                bail!("no dataset city matches `{city}`");
            }
            let infos: Vec<_> = places
                .iter()
                .map(|place| dataset.place_info(place, &city))
                .collect();
            print_json(&infos)?;
        }
        Command::Place { name, city } => {
            let details = planner.place_details(&name, &city).await;
            let info = planner.dataset().place_info(&name, &city);
            print_json(&serde_json::json!({ "details": details, "info": info }))?;
        }
        Command::Outfit { city, day, start } => {
            let report = planner.outfit(&city, day, start.unwrap_or(today))?;
            print_json(&report)?;
        }
        Command::Pricing { cycle } => {
            let cycle = BillingCycle::from_str(&cycle).context("invalid --cycle value")?;
            print_json(&pricing_plans(cycle))?;
        }
    }

    Ok(())
}

fn trip_request(args: TripArgs) -> Result<TripRequest> {
    Ok(TripRequest {
        destination: args.destination,
        budget: Budget::from_str(&args.budget).context("invalid --budget value")?,
        travel_style: TravelStyle::from_str(&args.style).context("invalid --style value")?,
        interests: args.interests,
        duration: args.days,
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn build_planner(data_root: &Path, offline: bool) -> Result<Planner> {
    let metrics = AppMetrics::shared();

    let dataset = Arc::new(
        DatasetCatalog::from_data_dir(data_root)
            .with_context(|| format!("failed loading travel dataset from {}", data_root.display()))?,
    );

    let store = if let Ok(database_url) = env::var("TRAVELWISE_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };

    let providers = if offline {
        ProviderStack::offline()
    } else {
        ProviderStack::from_config(ProviderConfig::from_env())?
    };

    Ok(TravelPlanner::new(
        dataset,
        providers.places,
        providers.ai,
        Arc::new(store),
        metrics,
    ))
}
