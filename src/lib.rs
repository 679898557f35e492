pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod models;
pub mod query;
pub mod quiz;
mod utils;

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{AppConfig, ConfigStore};
use db::{BookingStore, CoffeeStore, TriviaStore};

fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .context("failed to install tracing subscriber")
}

/// Opens the three stores (creating schema and seed rows on first run) and
/// logs what each one holds.
pub fn run() -> anyhow::Result<()> {
    let (settings, load_error) = ConfigStore::load();
    let config = settings.read();
    init_tracing(&config)?;
    if let Some(err) = load_error {
        tracing::warn!(path = ?settings.path(), %err, "unreadable config, using defaults");
    }

    let booking_path = config.booking_db_path();
    let booking = BookingStore::open(&booking_path)
        .with_context(|| format!("opening booking store at {}", booking_path.display()))?;
    let trivia_path = config.trivia_db_path();
    let trivia = TriviaStore::open(&trivia_path)
        .with_context(|| format!("opening trivia store at {}", trivia_path.display()))?;
    let coffee_path = config.coffee_db_path();
    let coffee = CoffeeStore::open(&coffee_path)
        .with_context(|| format!("opening coffee store at {}", coffee_path.display()))?;

    let areas = api::booking::list_venue_areas(&booking, Utc::now())?;
    tracing::info!(
        areas = areas.len(),
        venues = booking.list_venues()?.len(),
        artists = booking.list_artists()?.len(),
        shows = booking.list_shows()?.len(),
        "booking store ready"
    );

    let categories = api::trivia::categories(&trivia)?;
    tracing::info!(
        categories = categories.total_categories,
        questions = trivia.count_questions()?,
        page_size = config.effective_page_size(),
        empty_search = ?config.empty_search,
        "trivia store ready"
    );

    let menu = api::coffee::drinks(&coffee)?;
    tracing::info!(drinks = menu.drinks.len(), "coffee store ready");
    Ok(())
}
