use crate::api::fetch::{FetchRequest, Fetcher};
use crate::error::FetchError;
use crate::models::{Game, Page, PlayerInjury, Team};
use tracing::debug;

const BALLDONTLIE_BASE_URL: &str = "https://api.balldontlie.io/v1";

/// Client for teams, games and injuries from BallDontLie
pub struct BallDontLieClient {
    fetcher: Fetcher,
    api_key: Option<String>,
    base_url: String,
}

impl BallDontLieClient {
    pub fn new(fetcher: Fetcher, api_key: Option<String>) -> Self {
        Self {
            fetcher,
            api_key,
            base_url: BALLDONTLIE_BASE_URL.to_string(),
        }
    }

    fn request(&self, path: &str) -> FetchRequest {
        let request = FetchRequest::new(format!("{}/{}", self.base_url, path));
        match &self.api_key {
            // BallDontLie takes the bare key, no "Bearer" prefix
            Some(key) => request.header("Authorization", key),
            None => request,
        }
    }

    /// First team matching a name or abbreviation search
    pub async fn team_lookup(&self, query: &str) -> Result<Option<Team>, FetchError> {
        let request = self.request("teams").query("search", query);
        let page: Page<Team> = self.fetcher.get_json(&request).await?;
        debug!("Team search '{}' returned {} teams", query, page.data.len());
        Ok(page.data.into_iter().next())
    }

    pub async fn games_by_team(
        &self,
        team_id: i64,
        season: Option<i32>,
        per_page: u32,
    ) -> Result<Vec<Game>, FetchError> {
        let mut request = self
            .request("games")
            .query("team_ids[]", team_id)
            .query("per_page", per_page);
        if let Some(season) = season {
            request = request.query("seasons[]", season);
        }
        let page: Page<Game> = self.fetcher.get_json(&request).await?;
        Ok(page.data)
    }

    pub async fn injuries_by_team(
        &self,
        team_id: i64,
        per_page: u32,
    ) -> Result<Vec<PlayerInjury>, FetchError> {
        let request = self
            .request("player_injuries")
            .query("team_ids[]", team_id)
            .query("per_page", per_page);
        let page: Page<PlayerInjury> = self.fetcher.get_json(&request).await?;
        Ok(page.data)
    }
}
