use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use clap::Parser;
use nba_betting_report::config::init_logging;
use nba_betting_report::utils::data::{load_from_cache, save_games_odds_to_csv, save_to_cache};
use nba_betting_report::utils::lines::{build_games_odds_row, game_date};
use nba_betting_report::{AppConfig, Game, GamesOddsRow, OddsEvent, ReportService, Team};
use std::path::Path;
use tracing::{info, warn};

const GAMES_PER_PAGE: u32 = 50;

/// Store recent games with their lines and ATS/O-U results in `games_odds`
#[derive(Debug, Parser)]
#[command(name = "odds_etl")]
struct Cli {
    /// Team abbreviation (e.g. CHI)
    #[arg(long)]
    team: String,

    /// Days of history to include
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// Also write the rows to this CSV file
    #[arg(long)]
    csv: Option<String>,

    /// Read odds from this JSON snapshot if it exists, otherwise fetch and write it
    #[arg(long)]
    odds_cache: Option<String>,
}

/// Rows for games on or after `cutoff`
fn recent_rows(team: &Team, games: &[Game], events: &[OddsEvent], cutoff: NaiveDate) -> Vec<GamesOddsRow> {
    games
        .iter()
        .filter(|game| game_date(game).is_some_and(|date| date >= cutoff))
        .filter_map(|game| build_games_odds_row(team, game, events))
        .collect()
}

async fn load_odds(service: &ReportService, cache: Option<&str>) -> Result<Vec<OddsEvent>> {
    if let Some(path) = cache {
        if Path::new(path).exists() {
            info!("Loading odds from cache file: {}", path);
            return load_from_cache(path);
        }
    }

    let events = service
        .odds()
        .current_odds()
        .await
        .context("Failed to fetch odds")?;
    if let Some(path) = cache {
        save_to_cache(&events, path)?;
        info!("Saved odds to cache file: {}", path);
    }
    Ok(events)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config);
    let cli = Cli::parse();
    let season = config.default_season;

    let service = ReportService::from_config(config)?;
    let team = service
        .resolve_team(&cli.team)
        .await
        .with_context(|| format!("Failed to resolve team {}", cli.team))?;

    info!("Fetching games for {} (season {})", team.abbreviation, season);
    let games = service
        .balldontlie()
        .games_by_team(team.id, Some(season), GAMES_PER_PAGE)
        .await
        .context("Failed to fetch games")?;
    info!("Found {} games for {}", games.len(), team.abbreviation);

    let events = load_odds(&service, cli.odds_cache.as_deref()).await?;
    info!("Found {} odds events", events.len());

    let cutoff = Utc::now().date_naive() - Duration::days(cli.days);
    let rows = recent_rows(&team, &games, &events, cutoff);
    if rows.is_empty() {
        info!("No rows to store");
        return Ok(());
    }

    if let Some(path) = &cli.csv {
        save_games_odds_to_csv(&rows, path)?;
        info!("Wrote {} rows to {}", rows.len(), path);
    }

    match service.supabase() {
        Some(supabase) => supabase.insert_games_odds(&rows).await?,
        None => warn!("Supabase is not configured, {} rows not stored", rows.len()),
    }
    Ok(())
}
