use std::collections::HashMap;
use std::time::Duration;
use tracing::{warn, Level};

/// Retry and timeout settings for outbound API calls
#[derive(Debug, Clone, PartialEq)]
pub struct HttpConfig {
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Base of the exponential backoff (`base * 2^(attempt-1)`)
    pub base_delay: Duration,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1200),
            timeout: Duration::from_secs(20),
        }
    }
}

/// Where games, injuries and odds come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSources {
    pub games: String,
    pub injuries: String,
    pub odds: String,
}

impl Default for DataSources {
    fn default() -> Self {
        Self {
            games: "bdl".to_string(),
            injuries: "bdl".to_string(),
            odds: "the_odds_api".to_string(),
        }
    }
}

/// Application configuration, read once and handed to constructors
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub balldontlie_api_key: Option<String>,
    pub odds_api_key: Option<String>,
    pub odds_regions: String,
    pub odds_markets: String,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: String,
    pub odds_rapidapi_key: Option<String>,
    pub odds_rapidapi_host: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub default_season: i32,
    pub data_sources: DataSources,
    pub http: HttpConfig,
    pub log_level: Level,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            balldontlie_api_key: None,
            odds_api_key: None,
            odds_regions: "eu,us".to_string(),
            odds_markets: "h2h,spreads,totals".to_string(),
            rapidapi_key: None,
            rapidapi_host: "api-nba-v1.p.rapidapi.com".to_string(),
            odds_rapidapi_key: None,
            odds_rapidapi_host: None,
            supabase_url: None,
            supabase_service_key: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            default_season: 2025,
            data_sources: DataSources::default(),
            http: HttpConfig::default(),
            log_level: Level::INFO,
        }
    }
}

impl AppConfig {
    /// Load `.env` and read the configuration from the process environment
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        // Empty values behave like unset ones
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_delay = parse_or(
            "FETCH_BASE_DELAY_SECS",
            get("FETCH_BASE_DELAY_SECS"),
            defaults.http.base_delay.as_secs_f64(),
        );
        let timeout = parse_or(
            "FETCH_TIMEOUT_SECS",
            get("FETCH_TIMEOUT_SECS"),
            defaults.http.timeout.as_secs(),
        );

        Self {
            balldontlie_api_key: get("BALLDONTLIE_API_KEY"),
            odds_api_key: get("ODDS_API_KEY"),
            odds_regions: get("ODDS_REGIONS").unwrap_or(defaults.odds_regions),
            odds_markets: get("ODDS_MARKETS").unwrap_or(defaults.odds_markets),
            rapidapi_key: get("RAPIDAPI_KEY"),
            rapidapi_host: get("RAPIDAPI_HOST").unwrap_or(defaults.rapidapi_host),
            odds_rapidapi_key: get("ODDS_RAPIDAPI_KEY"),
            odds_rapidapi_host: get("ODDS_RAPIDAPI_HOST"),
            supabase_url: get("SUPABASE_URL").map(|url| url.trim_end_matches('/').to_string()),
            supabase_service_key: get("SUPABASE_SERVICE_KEY"),
            server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", get("SERVER_PORT"), defaults.server_port),
            default_season: parse_or(
                "DEFAULT_NBA_SEASON",
                get("DEFAULT_NBA_SEASON"),
                defaults.default_season,
            ),
            data_sources: DataSources {
                games: get("DATA_SOURCE_GAMES")
                    .map(|v| v.to_lowercase())
                    .unwrap_or(defaults.data_sources.games),
                injuries: get("DATA_SOURCE_INJURIES")
                    .map(|v| v.to_lowercase())
                    .unwrap_or(defaults.data_sources.injuries),
                odds: get("DATA_SOURCE_ODDS")
                    .map(|v| v.to_lowercase())
                    .unwrap_or(defaults.data_sources.odds),
            },
            http: HttpConfig {
                max_attempts: parse_or(
                    "FETCH_MAX_ATTEMPTS",
                    get("FETCH_MAX_ATTEMPTS"),
                    defaults.http.max_attempts,
                )
                .max(1),
                base_delay: Duration::try_from_secs_f64(base_delay)
                    .unwrap_or(defaults.http.base_delay),
                timeout: Duration::from_secs(timeout),
            },
            log_level: get("LOG_LEVEL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_level),
        }
    }

    /// Whether both the Supabase URL and service key are present
    pub fn supabase_configured(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_service_key.is_some()
    }

    /// Build a configuration from literal pairs, used by tests and tools
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::from_lookup(|key| map.get(key).cloned())
    }
}

/// Initialise the fmt subscriber at the configured level
pub fn init_logging(config: &AppConfig) {
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => match raw.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("Ignoring unparseable {}={:?}", key, raw);
                default
            }
        },
        None => default,
    }
}
