use crate::api::fetch::{FetchRequest, Fetcher};
use crate::config::AppConfig;
use crate::error::FetchError;
use crate::models::{PlayerStatLine, ScoreSummary};
use serde_json::Value;

/// RapidAPI-hosted providers: API-NBA box scores and an odds provider's fixture scores
pub struct RapidApiClient {
    fetcher: Fetcher,
    nba_key: Option<String>,
    nba_host: String,
    odds_key: Option<String>,
    odds_host: Option<String>,
}

impl RapidApiClient {
    pub fn new(fetcher: Fetcher, config: &AppConfig) -> Self {
        Self {
            fetcher,
            nba_key: config.rapidapi_key.clone(),
            nba_host: config.rapidapi_host.clone(),
            odds_key: config.odds_rapidapi_key.clone(),
            odds_host: config.odds_rapidapi_host.clone(),
        }
    }

    /// Per-player statistics for one API-NBA game
    pub async fn player_statistics(&self, game_id: &str) -> Result<Vec<PlayerStatLine>, FetchError> {
        let key = self
            .nba_key
            .as_deref()
            .ok_or(FetchError::NotConfigured("RAPIDAPI_KEY"))?;

        let request = FetchRequest::new(format!("https://{}/players/statistics", self.nba_host))
            .query("game", game_id)
            .header("x-rapidapi-key", key)
            .header("x-rapidapi-host", &self.nba_host);

        let body: Value = self.fetcher.get_json(&request).await?;
        let items = body
            .get("response")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(normalize_player).collect())
            .unwrap_or_default();
        Ok(items)
    }

    /// Score summary for a fixture from the odds provider
    pub async fn scores(&self, fixture_id: &str) -> Result<ScoreSummary, FetchError> {
        let (host, key) = match (&self.odds_host, &self.odds_key) {
            (Some(host), Some(key)) => (host, key),
            _ => return Err(FetchError::NotConfigured("ODDS_RAPIDAPI_HOST/ODDS_RAPIDAPI_KEY")),
        };

        let request = FetchRequest::new(format!("https://{}/scores", host))
            .query("fixtureId", fixture_id)
            .header("x-rapidapi-host", host)
            .header("x-rapidapi-key", key);

        let body: Value = self.fetcher.get_json(&request).await?;
        Ok(normalize_scores(fixture_id, body))
    }
}

/// Integer from a JSON number or numeric string, `None` otherwise
pub fn safe_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First key holding something other than null or ""
fn first_present<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| value.get(*k)).find(|v| is_present(v))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn normalize_player(item: &Value) -> PlayerStatLine {
    let empty = Value::Null;
    let player = item.get("player").unwrap_or(&empty);
    let team = item.get("team").unwrap_or(&empty);
    // Some responses embed stats at the top level
    let stats = item.get("statistics").filter(|v| v.is_object()).unwrap_or(item);

    let text = |v: &Value, key: &str| v.get(key).and_then(Value::as_str).unwrap_or("").trim().to_string();
    let full_name = format!("{} {}", text(player, "firstname"), text(player, "lastname"))
        .trim()
        .to_string();
    let player_name = if full_name.is_empty() {
        text(player, "name")
    } else {
        full_name
    };

    let stat = |keys: &[&str]| safe_int(first_present(stats, keys));

    PlayerStatLine {
        player_id: safe_int(player.get("id")),
        player: player_name,
        team: first_present(team, &["code", "name", "nickname"])
            .and_then(Value::as_str)
            .map(str::to_string),
        minutes: first_present(stats, &["min", "minutes"]).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        points: stat(&["points"]),
        rebounds: stat(&["totReb", "rebounds"]),
        assists: stat(&["assists"]),
        steals: stat(&["steals"]),
        blocks: stat(&["blocks"]),
        turnovers: stat(&["turnovers"]),
        fgm: stat(&["fgm"]),
        fga: stat(&["fga"]),
        tpm: stat(&["tpm", "threePointsMade"]),
        tpa: stat(&["tpa", "threePointsAttempted"]),
        ftm: stat(&["ftm"]),
        fta: stat(&["fta"]),
        plus_minus: stat(&["plusMinus", "plusminus"]),
    }
}

fn normalize_scores(fixture_id: &str, data: Value) -> ScoreSummary {
    let mut payload = match data.get("response") {
        Some(inner) if data.is_object() => inner.clone(),
        _ => data.clone(),
    };
    if let Value::Array(items) = &payload {
        if let Some(first) = items.first() {
            payload = first.clone();
        }
    }

    if !payload.is_object() {
        return ScoreSummary {
            fixture_id: fixture_id.to_string(),
            raw: Some(data),
            ..Default::default()
        };
    }

    let field = |key: &str, nested: &str| {
        first_present(&payload, &[key])
            .or_else(|| payload.pointer(nested).filter(|v| is_present(v)))
            .cloned()
    };

    ScoreSummary {
        fixture_id: fixture_id.to_string(),
        home: field("home", "/teams/home"),
        away: field("away", "/teams/away"),
        home_score: field("home_score", "/scores/home"),
        away_score: field("away_score", "/scores/away"),
        status: field("status", "/game/status"),
        date: field("date", "/game/date"),
        raw: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fetch::tests::{quiet_policy, ScriptedTransport};
    use crate::api::fetch::RawResponse;
    use serde_json::json;

    #[test]
    fn test_safe_int() {
        assert_eq!(safe_int(Some(&json!(12))), Some(12));
        assert_eq!(safe_int(Some(&json!(" 7 "))), Some(7));
        assert_eq!(safe_int(Some(&json!(""))), None);
        assert_eq!(safe_int(Some(&json!("--"))), None);
        assert_eq!(safe_int(Some(&Value::Null)), None);
        assert_eq!(safe_int(None), None);
    }

    #[test]
    fn test_normalize_player_nested_and_flat() {
        let nested = json!({
            "player": {"id": 265, "firstname": "Zach", "lastname": "LaVine"},
            "team": {"id": 6, "name": "Chicago Bulls", "code": "CHI"},
            "statistics": {"points": "31", "min": "36:12", "totReb": 5, "assists": 4, "plusMinus": "-3"}
        });
        let line = normalize_player(&nested);
        assert_eq!(line.player, "Zach LaVine");
        assert_eq!(line.team.as_deref(), Some("CHI"));
        assert_eq!(line.points, Some(31));
        assert_eq!(line.rebounds, Some(5));
        assert_eq!(line.minutes.as_deref(), Some("36:12"));
        assert_eq!(line.plus_minus, Some(-3));

        let flat = json!({
            "player": {"id": 1, "name": "Coby White"},
            "team": {"nickname": "Bulls"},
            "points": 18, "min": 30, "rebounds": 2
        });
        let line = normalize_player(&flat);
        assert_eq!(line.player, "Coby White");
        assert_eq!(line.team.as_deref(), Some("Bulls"));
        assert_eq!(line.minutes.as_deref(), Some("30"));
        assert_eq!(line.rebounds, Some(2));
        assert_eq!(line.steals, None);
    }

    #[test]
    fn test_normalize_scores_shapes() {
        let wrapped = json!({"response": [{
            "teams": {"home": "Bulls", "away": "Celtics"},
            "scores": {"home": 101, "away": 99},
            "game": {"status": "FT", "date": "2025-01-05"}
        }]});
        let summary = normalize_scores("77", wrapped);
        assert_eq!(summary.fixture_id, "77");
        assert_eq!(summary.home, Some(json!("Bulls")));
        assert_eq!(summary.home_score, Some(json!(101)));
        assert_eq!(summary.status, Some(json!("FT")));
        assert!(summary.raw.is_none());

        let odd = normalize_scores("78", json!(["not", "an", "object"]));
        assert_eq!(odd.raw, Some(json!(["not", "an", "object"])));
        assert!(odd.home.is_none());

        let serialized = serde_json::to_value(&summary).unwrap();
        assert_eq!(serialized["fixtureId"], "77");
        assert_eq!(serialized["home_score"], 101);
    }

    #[tokio::test(start_paused = true)]
    async fn test_player_statistics_request() {
        let transport = ScriptedTransport::new(vec![Ok(RawResponse::ok(
            r#"{"response": [{"player": {"id": 1, "firstname": "A", "lastname": "B"}, "points": 3}]}"#,
        ))]);
        let config = AppConfig::from_pairs(&[("RAPIDAPI_KEY", "k")]);
        let client = RapidApiClient::new(
            Fetcher::with_transport(transport.clone(), quiet_policy(1)),
            &config,
        );

        let lines = client.player_statistics("8133").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].points, Some(3));

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].url, "https://api-nba-v1.p.rapidapi.com/players/statistics");
        assert_eq!(requests[0].query, vec![("game".to_string(), "8133".to_string())]);
    }

    #[tokio::test]
    async fn test_unconfigured_providers() {
        let transport = ScriptedTransport::new(vec![]);
        let client = RapidApiClient::new(
            Fetcher::with_transport(transport.clone(), quiet_policy(1)),
            &AppConfig::from_pairs(&[]),
        );
        assert!(matches!(
            client.player_statistics("1").await,
            Err(FetchError::NotConfigured(_))
        ));
        assert!(matches!(client.scores("1").await, Err(FetchError::NotConfigured(_))));
        assert_eq!(transport.calls(), 0);
    }
}
