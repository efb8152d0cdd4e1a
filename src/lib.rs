pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use api::*;
pub use config::AppConfig;
pub use error::{FetchError, ReportError};
pub use models::*;
pub use utils::*;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utils::analysis::{analyze_team, TeamAnalysis, RATE_WINDOW};
use utils::lines::find_odds_for_matchup;
use utils::teams::search_term;

/// Games requested per team
const GAMES_PER_PAGE: u32 = 25;
/// Games included in the simple report
const REPORT_GAMES: usize = 10;
const INJURIES_PER_PAGE: u32 = 100;

/// Report built from games, injuries and all current odds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleReport {
    pub team: String,
    pub games: Vec<Game>,
    pub injuries: Vec<PlayerInjury>,
    pub odds: Vec<OddsEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub city: String,
    pub division: String,
    pub conference: String,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.display_name().to_string(),
            abbreviation: team.abbreviation.clone(),
            city: team.city.clone(),
            division: team.division.clone(),
            conference: team.conference.clone(),
        }
    }
}

/// Report with team details, the season's games and odds matched to the team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BdlReport {
    pub team: TeamSummary,
    pub season: i32,
    pub games: Vec<Game>,
    pub injuries: Vec<PlayerInjury>,
    pub odds: Vec<OddsEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamAnalysisReport {
    pub team: TeamSummary,
    pub season: i32,
    pub games_considered: usize,
    pub line_records: usize,
    #[serde(flatten)]
    pub analysis: TeamAnalysis,
}

/// Assembles reports from the provider clients
pub struct ReportService {
    config: AppConfig,
    balldontlie: BallDontLieClient,
    odds: OddsApiClient,
    rapid: RapidApiClient,
    supabase: Option<SupabaseClient>,
}

impl ReportService {
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&config.http)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Build the service around an existing fetcher (and its transport)
    pub fn with_fetcher(config: AppConfig, fetcher: Fetcher) -> Self {
        Self {
            balldontlie: BallDontLieClient::new(fetcher.clone(), config.balldontlie_api_key.clone()),
            odds: OddsApiClient::new(fetcher.clone(), &config),
            rapid: RapidApiClient::new(fetcher, &config),
            supabase: SupabaseClient::from_config(&config),
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn balldontlie(&self) -> &BallDontLieClient {
        &self.balldontlie
    }

    pub fn odds(&self) -> &OddsApiClient {
        &self.odds
    }

    pub fn supabase(&self) -> Option<&SupabaseClient> {
        self.supabase.as_ref()
    }

    /// Look a team up by slug, abbreviation or name
    pub async fn resolve_team(&self, query: &str) -> Result<Team, ReportError> {
        self.balldontlie
            .team_lookup(&search_term(query))
            .await?
            .ok_or_else(|| ReportError::TeamNotFound(query.to_string()))
    }

    fn require_source(kind: &'static str, configured: &str, expected: &'static str) -> Result<(), ReportError> {
        if configured == expected {
            Ok(())
        } else {
            Err(ReportError::SourceDisabled {
                kind,
                source_name: configured.to_string(),
                expected,
            })
        }
    }

    /// Current odds, or nothing when odds come from another source
    pub async fn odds_for_games(&self) -> Result<Vec<OddsEvent>, ReportError> {
        if self.config.data_sources.odds != "the_odds_api" {
            info!(
                "Odds source is '{}', skipping The Odds API",
                self.config.data_sources.odds
            );
            return Ok(Vec::new());
        }
        Ok(self.odds.current_odds().await?)
    }

    /// Games, injuries and odds for a team, routed by the data source flags
    pub async fn simple_report(&self, query: &str) -> Result<SimpleReport, ReportError> {
        let sources = &self.config.data_sources;
        Self::require_source("games", &sources.games, "bdl")?;
        Self::require_source("injuries", &sources.injuries, "bdl")?;

        let team = self.resolve_team(query).await?;
        let mut games = self
            .balldontlie
            .games_by_team(team.id, Some(self.config.default_season), GAMES_PER_PAGE)
            .await?;
        games.truncate(REPORT_GAMES);
        let injuries = self
            .balldontlie
            .injuries_by_team(team.id, INJURIES_PER_PAGE)
            .await?;
        let odds = self.odds_for_games().await?;

        Ok(SimpleReport {
            team: query.to_string(),
            games,
            injuries,
            odds,
        })
    }

    /// Team details plus season games, injuries and the odds that mention the team
    pub async fn bdl_report(&self, query: &str) -> Result<BdlReport, ReportError> {
        let team = self.resolve_team(query).await?;
        let season = self.config.default_season;
        let games = self
            .balldontlie
            .games_by_team(team.id, Some(season), GAMES_PER_PAGE)
            .await?;
        let injuries = self
            .balldontlie
            .injuries_by_team(team.id, INJURIES_PER_PAGE)
            .await?;

        let events = match self.odds.current_odds().await {
            Ok(events) => events,
            Err(e) => {
                warn!("Odds unavailable for {}: {}", team.abbreviation, e);
                Vec::new()
            }
        };
        let odds = find_odds_for_matchup(&events, &team.name_tokens())
            .into_iter()
            .cloned()
            .collect();

        Ok(BdlReport {
            team: TeamSummary::from(&team),
            season,
            games,
            injuries,
            odds,
        })
    }

    /// Scoring averages, ATS/O-U rates and parlay legs for a team
    pub async fn team_analysis(&self, query: &str) -> Result<TeamAnalysisReport, ReportError> {
        let team = self.resolve_team(query).await?;
        let season = self.config.default_season;
        let games = self
            .balldontlie
            .games_by_team(team.id, Some(season), GAMES_PER_PAGE)
            .await?;
        let injuries = self
            .balldontlie
            .injuries_by_team(team.id, INJURIES_PER_PAGE)
            .await?;

        let results: Vec<GameResult> = games
            .iter()
            .map(|game| GameResult::from_game(game, team.id))
            .collect();
        let notes: Vec<InjuryNote> = injuries.iter().map(InjuryNote::from).collect();

        let lines: Vec<LineRecord> = match &self.supabase {
            // Extra rows leave room for duplicates stored before upserts
            Some(supabase) => match supabase.fetch_games_odds(&team.abbreviation, RATE_WINDOW * 2).await {
                Ok(rows) => line_records_from_history(&rows, RATE_WINDOW),
                Err(e) => {
                    warn!("Line history unavailable for {}: {:#}", team.abbreviation, e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Ok(TeamAnalysisReport {
            team: TeamSummary::from(&team),
            season,
            games_considered: results.iter().filter(|r| r.points().is_some()).count(),
            line_records: lines.len(),
            analysis: analyze_team(&results, &lines, &notes),
        })
    }

    pub async fn player_stats(&self, game_id: &str) -> Result<Vec<PlayerStatLine>, ReportError> {
        Ok(self.rapid.player_statistics(game_id).await?)
    }

    pub async fn fixture_scores(&self, fixture_id: &str) -> Result<ScoreSummary, ReportError> {
        Ok(self.rapid.scores(fixture_id).await?)
    }

    /// Stored reports, empty when persistence is not configured
    pub async fn stored_reports(
        &self,
        bearer: Option<&str>,
        filter: &ReportFilter,
    ) -> Result<Vec<StoredReport>, ReportError> {
        let Some(supabase) = &self.supabase else {
            return Ok(Vec::new());
        };
        supabase
            .fetch_reports(bearer, filter)
            .await
            .map_err(|e| ReportError::Persistence(format!("{:#}", e)))
    }

    /// Build the simple report for a slug and store it. Returns false when persistence is off.
    pub async fn refresh_report(&self, slug: &str) -> Result<bool, ReportError> {
        let Some(supabase) = &self.supabase else {
            return Ok(false);
        };
        let report = self.simple_report(slug).await?;
        let data = serde_json::to_value(&report)
            .map_err(|e| ReportError::Persistence(e.to_string()))?;
        supabase
            .save_report(slug, &data, None)
            .await
            .map_err(|e| ReportError::Persistence(format!("{:#}", e)))?;
        Ok(true)
    }
}
