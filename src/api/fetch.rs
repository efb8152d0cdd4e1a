use crate::config::HttpConfig;
use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, RETRY_AFTER};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118 Safari/537.36",
];

const THROTTLE_MIN: Duration = Duration::from_millis(400);
const THROTTLE_MAX: Duration = Duration::from_millis(1000);

/// A GET request: URL plus query parameters and extra headers
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }
}

/// What a single attempt produced before any retry decision
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            retry_after: None,
            body: String::new(),
        }
    }
}

/// Performs one GET attempt. Retrying is the [`Fetcher`]'s job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &FetchRequest) -> Result<RawResponse, FetchError>;
}

/// Production transport backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &FetchRequest) -> Result<RawResponse, FetchError> {
        let network_error = |e: reqwest::Error| FetchError::Network {
            url: request.url.clone(),
            message: e.to_string(),
        };

        let mut builder = self.client.get(&request.url).query(&request.query);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(network_error)?;

        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Attempt budget, backoff base and success throttle
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Uniform pause after every success, `None` disables it
    pub throttle: Option<(Duration, Duration)>,
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay,
            throttle: Some((THROTTLE_MIN, THROTTLE_MAX)),
        }
    }

    /// `base * 2^(attempt-1)` for a 1-based attempt number
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .checked_mul(2u32.pow(exponent))
            .unwrap_or(Duration::MAX)
    }

    /// Backoff scaled by a jitter factor in [0.7, 1.3)
    pub fn jittered_backoff(&self, attempt: u32) -> Duration {
        let factor = rand::thread_rng().gen_range(0.7..1.3);
        Duration::try_from_secs_f64(self.backoff(attempt).as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }

    fn throttle_delay(&self) -> Option<Duration> {
        let (min, max) = self.throttle?;
        if max <= min {
            return Some(min);
        }
        Some(rand::thread_rng().gen_range(min..max))
    }
}

/// Parse a `Retry-After` value given in (possibly fractional) seconds
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// GET-with-retry helper shared by every provider client
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout)?;
        Ok(Self::with_transport(
            Arc::new(transport),
            RetryPolicy::from_config(config),
        ))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// GET and decode a JSON body, retrying per the policy
    pub async fn get_json<T: DeserializeOwned>(&self, request: &FetchRequest) -> Result<T, FetchError> {
        let body = self.get_body(request).await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: request.url.clone(),
            source,
        })
    }

    async fn get_body(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("GET {} (attempt {}/{})", request.url, attempt, max_attempts);

            let error = match self.transport.get(request).await {
                Ok(response) if (200..300).contains(&response.status) => {
                    if let Some(pause) = self.policy.throttle_delay() {
                        sleep(pause).await;
                    }
                    return Ok(response.body);
                }
                Ok(response) if response.status == 401 => {
                    return Err(FetchError::Unauthorized {
                        url: request.url.clone(),
                    });
                }
                Ok(response) if response.status == 429 => {
                    if attempt >= max_attempts {
                        return Err(FetchError::RateLimited {
                            url: request.url.clone(),
                            attempts: attempt,
                        });
                    }
                    let wait = response
                        .retry_after
                        .as_deref()
                        .and_then(parse_retry_after)
                        .unwrap_or_else(|| self.policy.backoff(attempt));
                    warn!(
                        "Rate limited by {} (attempt {}/{}), waiting {:.2?}",
                        request.url, attempt, max_attempts, wait
                    );
                    sleep(wait).await;
                    continue;
                }
                Ok(response) => FetchError::Status {
                    status: response.status,
                    url: request.url.clone(),
                },
                Err(e) => e,
            };

            if !error.is_transient() || attempt >= max_attempts {
                return Err(error);
            }

            let delay = self.policy.jittered_backoff(attempt);
            warn!(
                "{} (attempt {}/{}), retrying in {:.2?}",
                error, attempt, max_attempts, delay
            );
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Replays canned outcomes in order and counts attempts
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<RawResponse, FetchError>>>,
        pub calls: AtomicU32,
        pub requests: Mutex<Vec<FetchRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<RawResponse, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicU32::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, request: &FetchRequest) -> Result<RawResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RawResponse::status(500)))
        }
    }

    pub(crate) fn quiet_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1200),
            throttle: None,
        }
    }

    fn network_error() -> FetchError {
        FetchError::Network {
            url: "https://example.com".into(),
            message: "connection reset".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_then_success_uses_failures_plus_one_attempts() {
        let transport = ScriptedTransport::new(vec![
            Ok(RawResponse::status(500)),
            Err(network_error()),
            Ok(RawResponse::status(503)),
            Ok(RawResponse::ok(r#"{"ok": true}"#)),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone(), quiet_policy(5));

        let start = Instant::now();
        let value: serde_json::Value = fetcher
            .get_json(&FetchRequest::new("https://example.com"))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(value["ok"], true);
        assert_eq!(transport.calls(), 4);
        // 1.2s * (1 + 2 + 4) scaled by jitter in [0.7, 1.3)
        assert!(elapsed >= Duration::from_secs_f64(8.4 * 0.7), "{:?}", elapsed);
        assert!(elapsed < Duration::from_secs_f64(8.4 * 1.3), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_fails_once_without_sleeping() {
        let transport = ScriptedTransport::new(vec![
            Ok(RawResponse::status(401)),
            Ok(RawResponse::ok("{}")),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone(), RetryPolicy::from_config(&HttpConfig::default()));

        let start = Instant::now();
        let result: Result<serde_json::Value, _> =
            fetcher.get_json(&FetchRequest::new("https://example.com")).await;

        assert!(matches!(result, Err(FetchError::Unauthorized { .. })));
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_propagate_last_error() {
        let transport = ScriptedTransport::new(vec![
            Ok(RawResponse::status(500)),
            Ok(RawResponse::status(502)),
            Ok(RawResponse::status(504)),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone(), quiet_policy(3));

        let result: Result<serde_json::Value, _> =
            fetcher.get_json(&FetchRequest::new("https://example.com")).await;

        match result {
            Err(FetchError::Status { status, .. }) => assert_eq!(status, 504),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_honors_retry_after() {
        let mut limited = RawResponse::status(429);
        limited.retry_after = Some("7".into());
        let transport = ScriptedTransport::new(vec![Ok(limited), Ok(RawResponse::ok("[1, 2]"))]);
        let fetcher = Fetcher::with_transport(transport.clone(), quiet_policy(5));

        let start = Instant::now();
        let value: Vec<i32> = fetcher
            .get_json(&FetchRequest::new("https://example.com"))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(value, vec![1, 2]);
        assert_eq!(transport.calls(), 2);
        assert!(elapsed >= Duration::from_secs(7));
        assert!(elapsed < Duration::from_millis(7010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_without_usable_header_uses_plain_backoff() {
        let mut limited = RawResponse::status(429);
        limited.retry_after = Some("soon".into());
        let transport = ScriptedTransport::new(vec![
            Ok(RawResponse::status(429)),
            Ok(limited),
            Ok(RawResponse::ok("{}")),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone(), quiet_policy(5));

        let start = Instant::now();
        let _: serde_json::Value = fetcher
            .get_json(&FetchRequest::new("https://example.com"))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        // 1.2s + 2.4s, no jitter on the 429 path
        assert!(elapsed >= Duration::from_millis(3600));
        assert!(elapsed < Duration::from_millis(3610));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_on_last_attempt_is_an_error() {
        let transport = ScriptedTransport::new(vec![
            Ok(RawResponse::status(429)),
            Ok(RawResponse::status(429)),
        ]);
        let fetcher = Fetcher::with_transport(transport.clone(), quiet_policy(2));

        let result: Result<serde_json::Value, _> =
            fetcher.get_json(&FetchRequest::new("https://example.com")).await;

        assert!(matches!(result, Err(FetchError::RateLimited { attempts: 2, .. })));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_body_is_not_retried() {
        let transport = ScriptedTransport::new(vec![Ok(RawResponse::ok("<html>"))]);
        let fetcher = Fetcher::with_transport(transport.clone(), quiet_policy(5));

        let result: Result<serde_json::Value, _> =
            fetcher.get_json(&FetchRequest::new("https://example.com")).await;

        assert!(matches!(result, Err(FetchError::Decode { .. })));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_throttled() {
        let transport = ScriptedTransport::new(vec![Ok(RawResponse::ok("{}"))]);
        let fetcher = Fetcher::with_transport(transport, RetryPolicy::from_config(&HttpConfig::default()));

        let start = Instant::now();
        let _: serde_json::Value = fetcher
            .get_json(&FetchRequest::new("https://example.com"))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= THROTTLE_MIN);
        assert!(elapsed <= THROTTLE_MAX);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = quiet_policy(5);
        assert_eq!(policy.backoff(1), Duration::from_millis(1200));
        assert_eq!(policy.backoff(2), Duration::from_millis(2400));
        assert_eq!(policy.backoff(4), Duration::from_millis(9600));
    }

    #[test]
    fn test_backoff_saturates_for_huge_base_delay() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1_000_000_000_000_000_000),
            throttle: None,
        };
        assert_eq!(policy.backoff(6), Duration::MAX);
        assert!(policy.jittered_backoff(6) >= Duration::from_secs(10_000_000_000_000_000_000));
        assert_eq!(policy.backoff(1), Duration::from_secs(1_000_000_000_000_000_000));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after(" 3 "), Some(Duration::from_secs(3)));
        assert_eq!(parse_retry_after("1.5"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-2"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[test]
    fn test_request_builder_collects_parameters() {
        let request = FetchRequest::new("https://api.example.com/games")
            .query("team_ids[]", 4)
            .query("per_page", 25)
            .header("Authorization", "key");
        assert_eq!(
            request.query,
            vec![
                ("team_ids[]".to_string(), "4".to_string()),
                ("per_page".to_string(), "25".to_string())
            ]
        );
        assert_eq!(request.headers.len(), 1);
    }
}
