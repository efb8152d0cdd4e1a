use crate::config::AppConfig;
use crate::models::{GameRow, GamesOddsRow, InjuryRow, OddsRow, StoredReport, TeamRow};
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(5);
const REPORT_TIMEOUT: Duration = Duration::from_secs(5);
/// Natural key of a `games_odds` row
const GAMES_ODDS_CONFLICT: &str = "team_abbr,game_date";

/// Filters for listing stored reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub team: Option<String>,
    /// ISO date, inclusive lower bound on `created_at`
    pub from: Option<String>,
    /// ISO date, inclusive upper bound on `created_at`
    pub to: Option<String>,
}

impl ReportFilter {
    /// PostgREST query parameters for this filter
    pub fn query(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        if let Some(team) = &self.team {
            params.push(("team".to_string(), format!("eq.{}", team)));
        }
        if let Some(from) = &self.from {
            params.push(("created_at".to_string(), format!("gte.{}", from)));
        }
        if let Some(to) = &self.to {
            params.push(("created_at".to_string(), format!("lte.{}", to)));
        }
        params
    }
}

#[derive(Debug, Serialize)]
struct ReportInsert<'a> {
    team: String,
    data: &'a serde_json::Value,
}

/// Supabase REST (PostgREST) client authenticated with the service key
pub struct SupabaseClient {
    client: reqwest::Client,
    url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(url: &str, service_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// `None` when the URL or service key is missing
    pub fn from_config(config: &AppConfig) -> Option<Self> {
        match (&config.supabase_url, &config.supabase_service_key) {
            (Some(url), Some(key)) => Some(Self::new(url, key)),
            _ => None,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    /// A caller's bearer token replaces the service token, the apikey header stays
    fn authorized(&self, builder: reqwest::RequestBuilder, bearer: Option<&str>) -> reqwest::RequestBuilder {
        let authorization = match bearer {
            Some(token) => token.to_string(),
            None => format!("Bearer {}", self.service_key),
        };
        builder
            .header("apikey", &self.service_key)
            .header("Authorization", authorization)
    }

    /// POST rows to a table, upserting on `on_conflict` when given
    pub async fn rest_post<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
        on_conflict: Option<&str>,
    ) -> Result<()> {
        if rows.is_empty() {
            debug!("No rows for {}, skipping insert", table);
            return Ok(());
        }

        let mut builder = self.client.post(self.table_url(table)).timeout(WRITE_TIMEOUT);
        let prefer = match on_conflict {
            Some(column) => {
                builder = builder.query(&[("on_conflict", column)]);
                "return=minimal,resolution=merge-duplicates"
            }
            None => "return=minimal",
        };

        let response = self
            .authorized(builder, None)
            .header("Prefer", prefer)
            .json(rows)
            .send()
            .await
            .with_context(|| format!("Failed to post to Supabase table {}", table))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Supabase insert into {} returned {}: {}", table, status, body);
        }

        info!("Stored {} rows in {}", rows.len(), table);
        Ok(())
    }

    pub async fn insert_teams(&self, teams: &[TeamRow]) -> Result<()> {
        self.rest_post("teams", teams, Some("id")).await
    }

    pub async fn insert_games(&self, games: &[GameRow]) -> Result<()> {
        self.rest_post("games", games, Some("id")).await
    }

    pub async fn insert_injuries(&self, injuries: &[InjuryRow]) -> Result<()> {
        self.rest_post("injuries", injuries, None).await
    }

    pub async fn insert_odds(&self, odds: &[OddsRow]) -> Result<()> {
        self.rest_post("odds", odds, None).await
    }

    pub async fn insert_games_odds(&self, rows: &[GamesOddsRow]) -> Result<()> {
        self.rest_post("games_odds", rows, Some(GAMES_ODDS_CONFLICT)).await
    }

    /// Store a report under the lower-cased team slug
    pub async fn save_report(
        &self,
        team: &str,
        data: &serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<()> {
        let payload = ReportInsert {
            team: team.to_lowercase(),
            data,
        };

        let builder = self.client.post(self.table_url("reports")).timeout(REPORT_TIMEOUT);
        let response = self
            .authorized(builder, bearer)
            .header("Prefer", "return=minimal")
            .json(&payload)
            .send()
            .await
            .context("Failed to save report to Supabase")?;

        if !response.status().is_success() {
            anyhow::bail!("Supabase report insert returned {}", response.status());
        }
        Ok(())
    }

    pub async fn fetch_reports(
        &self,
        bearer: Option<&str>,
        filter: &ReportFilter,
    ) -> Result<Vec<StoredReport>> {
        let builder = self
            .client
            .get(self.table_url("reports"))
            .query(&filter.query())
            .timeout(READ_TIMEOUT);

        let response = self
            .authorized(builder, bearer)
            .send()
            .await
            .context("Failed to fetch reports from Supabase")?;

        if !response.status().is_success() {
            anyhow::bail!("Supabase reports query returned {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse Supabase reports response")
    }

    /// Most recent `games_odds` rows with both results for a team, newest first
    pub async fn fetch_games_odds(&self, team_abbr: &str, limit: usize) -> Result<Vec<GamesOddsRow>> {
        let builder = self
            .client
            .get(self.table_url("games_odds"))
            .query(&games_odds_query(team_abbr, limit))
            .timeout(READ_TIMEOUT);

        let response = self
            .authorized(builder, None)
            .send()
            .await
            .context("Failed to fetch games_odds from Supabase")?;

        if !response.status().is_success() {
            anyhow::bail!("Supabase games_odds query returned {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse Supabase games_odds response")
    }
}

/// PostgREST query for graded `games_odds` rows. Filtering happens before `limit`.
fn games_odds_query(team_abbr: &str, limit: usize) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("team_abbr", format!("eq.{}", team_abbr)),
        ("ats_result", "not.is.null".to_string()),
        ("ou_result", "not.is.null".to_string()),
        ("order", "game_date.desc".to_string()),
        ("limit", limit.to_string()),
    ]
}
