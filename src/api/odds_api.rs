use crate::api::fetch::{FetchRequest, Fetcher};
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::OddsEvent;
use tracing::{info, warn};

const ODDS_API_BASE_URL: &str = "https://api.the-odds-api.com/v4";
const SPORT_KEY: &str = "basketball_nba";

pub struct OddsApiClient {
    fetcher: Fetcher,
    api_key: Option<String>,
    regions: String,
    markets: String,
}

impl OddsApiClient {
    pub fn new(fetcher: Fetcher, config: &AppConfig) -> Self {
        Self {
            fetcher,
            api_key: config.odds_api_key.clone(),
            regions: config.odds_regions.clone(),
            markets: config.odds_markets.clone(),
        }
    }

    /// Current NBA odds (h2h, spreads, totals by default) in decimal format
    pub async fn current_odds(&self) -> Result<Vec<OddsEvent>, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("ODDS_API_KEY"))?;

        let url = format!("{}/sports/{}/odds", ODDS_API_BASE_URL, SPORT_KEY);
        let request = FetchRequest::new(url.clone())
            .query("apiKey", api_key)
            .query("regions", &self.regions)
            .query("markets", &self.markets)
            .query("oddsFormat", "decimal");

        let body: serde_json::Value = self.fetcher.get_json(&request).await?;
        if !body.is_array() {
            warn!("Odds API returned a non-list body, treating as no events");
            return Ok(Vec::new());
        }

        let events: Vec<OddsEvent> =
            serde_json::from_value(body).map_err(|source| FetchError::Decode { url, source })?;
        info!("Fetched {} NBA odds events", events.len());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fetch::tests::{quiet_policy, ScriptedTransport};
    use crate::api::fetch::RawResponse;

    fn client(body: &str, key: Option<&str>) -> (OddsApiClient, std::sync::Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new(vec![Ok(RawResponse::ok(body))]);
        let mut pairs = vec![("ODDS_REGIONS", "us")];
        if let Some(key) = key {
            pairs.push(("ODDS_API_KEY", key));
        }
        let config = AppConfig::from_pairs(&pairs);
        let client = OddsApiClient::new(
            Fetcher::with_transport(transport.clone(), quiet_policy(1)),
            &config,
        );
        (client, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_odds_parses_events() {
        let body = r#"[{
            "id": "e912304de2b2ce35b473ce2ecd3d1502",
            "sport_key": "basketball_nba",
            "commence_time": "2025-01-06T00:10:00Z",
            "home_team": "Chicago Bulls",
            "away_team": "Boston Celtics",
            "bookmakers": [{
                "key": "draftkings", "title": "DraftKings", "last_update": "2025-01-05T21:00:00Z",
                "markets": [{"key": "totals", "outcomes": [
                    {"name": "Over", "price": 1.91, "point": 228.5},
                    {"name": "Under", "price": 1.91, "point": 228.5}
                ]}]
            }]
        }]"#;
        let (client, transport) = client(body, Some("key"));

        let events = client.current_odds().await.unwrap();
        assert_eq!(events.len(), 1);
        let totals = events[0].bookmakers[0].market("totals").unwrap();
        assert_eq!(totals.outcomes[0].point, Some(228.5));

        let requests = transport.requests.lock().unwrap();
        assert!(requests[0].url.ends_with("/sports/basketball_nba/odds"));
        assert!(requests[0]
            .query
            .contains(&("regions".to_string(), "us".to_string())));
        assert!(requests[0]
            .query
            .contains(&("oddsFormat".to_string(), "decimal".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_list_body_is_empty() {
        let (client, _) = client(r#"{"message": "quota"}"#, Some("key"));
        assert!(client.current_odds().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_key_is_not_configured() {
        let (client, transport) = client("[]", None);
        let result = client.current_odds().await;
        assert!(matches!(result, Err(FetchError::NotConfigured("ODDS_API_KEY"))));
        assert_eq!(transport.calls(), 0);
    }
}
