use anyhow::{Context, Result};
use clap::Parser;
use nba_betting_report::config::init_logging;
use nba_betting_report::utils::lines::find_odds_for_matchup;
use nba_betting_report::{
    AppConfig, GameRow, InjuryRow, OddsEvent, OddsRow, ReportService, SupabaseClient, TeamRow,
};
use tracing::{error, info, warn};

const GAMES_PER_PAGE: u32 = 100;
const INJURIES_PER_PAGE: u32 = 100;

/// Load teams, games, injuries and matched odds from BallDontLie and The Odds API into Supabase
#[derive(Debug, Parser)]
#[command(name = "etl")]
struct Cli {
    /// Single team query (abbreviation or name)
    #[arg(long, conflicts_with = "teams")]
    team: Option<String>,

    /// Comma-separated list of team queries
    #[arg(long)]
    teams: Option<String>,

    /// Season to load, defaults to DEFAULT_NBA_SEASON
    #[arg(long)]
    season: Option<i32>,
}

impl Cli {
    fn team_queries(&self) -> Vec<String> {
        if let Some(team) = &self.team {
            return vec![team.trim().to_string()];
        }
        self.teams
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

async fn run_for_team(
    service: &ReportService,
    supabase: &SupabaseClient,
    events: &[OddsEvent],
    query: &str,
    season: i32,
) -> Result<()> {
    let team = match service.resolve_team(query).await {
        Ok(team) => team,
        Err(nba_betting_report::ReportError::TeamNotFound(_)) => {
            warn!("Team not found: {}", query);
            return Ok(());
        }
        Err(e) => return Err(e).context("Team lookup failed"),
    };
    supabase.insert_teams(&[TeamRow::from(&team)]).await?;

    let games = service
        .balldontlie()
        .games_by_team(team.id, Some(season), GAMES_PER_PAGE)
        .await
        .with_context(|| format!("Failed to fetch games for {}", team.abbreviation))?;
    let game_rows: Vec<GameRow> = games.iter().map(GameRow::from).collect();
    supabase.insert_games(&game_rows).await?;

    let injuries = service
        .balldontlie()
        .injuries_by_team(team.id, INJURIES_PER_PAGE)
        .await
        .with_context(|| format!("Failed to fetch injuries for {}", team.abbreviation))?;
    if !injuries.is_empty() {
        let rows: Vec<InjuryRow> = injuries.iter().map(InjuryRow::from).collect();
        supabase.insert_injuries(&rows).await?;
    }

    let selected = find_odds_for_matchup(events, &team.name_and_city_tokens());
    if !selected.is_empty() {
        let rows: Vec<OddsRow> = selected.into_iter().map(OddsRow::from_event).collect();
        supabase.insert_odds(&rows).await?;
    }

    info!(
        "Loaded {}: {} games, {} injuries",
        team.abbreviation,
        game_rows.len(),
        injuries.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config);

    let cli = Cli::parse();
    let queries = cli.team_queries();
    if queries.is_empty() {
        anyhow::bail!("Provide --team or --teams");
    }
    let season = cli.season.unwrap_or(config.default_season);

    let service = ReportService::from_config(config)?;
    let supabase = service
        .supabase()
        .context("SUPABASE_URL and SUPABASE_SERVICE_KEY must be set")?;

    // One odds snapshot serves every team
    let events = match service.odds().current_odds().await {
        Ok(events) => events,
        Err(e) => {
            warn!("Odds unavailable, loading without odds: {}", e);
            Vec::new()
        }
    };

    for query in &queries {
        if let Err(e) = run_for_team(&service, supabase, &events, query, season).await {
            error!("ETL failed for {}: {:#}", query, e);
        }
    }
    Ok(())
}
