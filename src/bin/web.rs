use anyhow::Context;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use nba_betting_report::config::init_logging;
use nba_betting_report::utils::teams::SUPPORTED_TEAMS;
use nba_betting_report::{AppConfig, FetchError, ReportError, ReportFilter, ReportService};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

struct TeamLink {
    slug: &'static str,
    abbr: &'static str,
}

#[derive(Template)]
#[template(path = "full.html")]
struct HomeTemplate {
    season: i32,
    teams: Vec<TeamLink>,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

/// Report errors as JSON with a matching status code
struct ApiError(ReportError);

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            ReportError::TeamNotFound(_) => (StatusCode::NOT_FOUND, "team_not_found"),
            ReportError::SourceDisabled { .. } => (StatusCode::SERVICE_UNAVAILABLE, "source_disabled"),
            ReportError::Fetch(FetchError::NotConfigured(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "not_configured")
            }
            ReportError::Fetch(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ReportError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "persistence_error"),
        };
        if status.is_server_error() {
            error!("{}", self.0);
        }
        (status, Json(json!({ "error": code, "message": self.0.to_string() }))).into_response()
    }
}

type SharedService = Arc<ReportService>;

#[derive(Debug, Deserialize)]
struct TeamQuery {
    team: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReportsQuery {
    team: Option<String>,
    from: Option<String>,
    to: Option<String>,
}

fn missing_param(name: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "bad_request", "message": format!("{} is required", name) })),
    )
        .into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn home(State(service): State<SharedService>) -> impl IntoResponse {
    let teams = SUPPORTED_TEAMS
        .iter()
        .map(|&(slug, abbr)| TeamLink { slug, abbr })
        .collect();

    HtmlTemplate(HomeTemplate {
        season: service.config().default_season,
        teams,
    })
}

async fn report(
    State(service): State<SharedService>,
    Query(query): Query<TeamQuery>,
) -> Result<Response, ApiError> {
    let Some(team) = non_empty(query.team) else {
        return Ok(missing_param("team"));
    };
    let report = service.simple_report(&team).await?;
    Ok(Json(report).into_response())
}

async fn report_bdl(
    State(service): State<SharedService>,
    Query(query): Query<TeamQuery>,
) -> Result<Response, ApiError> {
    let Some(team) = non_empty(query.team) else {
        return Ok(missing_param("team"));
    };
    let report = service.bdl_report(&team).await?;
    Ok(Json(report).into_response())
}

async fn analysis(
    State(service): State<SharedService>,
    Path(team): Path<String>,
) -> Result<Response, ApiError> {
    let report = service.team_analysis(&team).await?;
    Ok(Json(report).into_response())
}

async fn list_reports(
    State(service): State<SharedService>,
    Query(query): Query<ReportsQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let bearer = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let filter = ReportFilter {
        team: non_empty(query.team),
        from: non_empty(query.from),
        to: non_empty(query.to),
    };
    let reports = service.stored_reports(bearer, &filter).await?;
    Ok(Json(reports).into_response())
}

async fn game_players(
    State(service): State<SharedService>,
    Path(game_id): Path<String>,
) -> impl IntoResponse {
    let players = match service.player_stats(&game_id).await {
        Ok(players) => players,
        Err(e) => {
            warn!("Player statistics unavailable for game {}: {}", game_id, e);
            Vec::new()
        }
    };
    Json(json!({ "game_id": game_id, "players": players }))
}

async fn fixture_scores(
    State(service): State<SharedService>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let fixture_id = non_empty(query.get("fixtureId").or_else(|| query.get("fixtureid")).cloned());
    let Some(fixture_id) = fixture_id else {
        return missing_param("fixtureId");
    };

    match service.fixture_scores(&fixture_id).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            warn!("Scores unavailable for fixture {}: {}", fixture_id, e);
            Json(json!({ "fixtureId": fixture_id, "error": e.to_string() })).into_response()
        }
    }
}

async fn deprecated_report() -> impl IntoResponse {
    (
        StatusCode::GONE,
        Json(json!({
            "error": "deprecated",
            "message": "Use /report?team= or /api/report_bdl?team= for reports."
        })),
    )
}

async fn deprecated_refresh() -> impl IntoResponse {
    (
        StatusCode::GONE,
        Json(json!({
            "error": "deprecated",
            "message": "Refresh runs as a batch job, see the refresh binary."
        })),
    )
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not_found" })))
}

fn app(service: SharedService) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/full.html", get(home))
        .route("/index.html", get(home))
        .route("/report", get(report))
        .route("/api/report_bdl", get(report_bdl))
        .route("/api/analysis/:team", get(analysis))
        .route("/api/reports", get(list_reports))
        .route("/api/game/:game_id/players", get(game_players))
        .route("/api/odds/scores", get(fixture_scores))
        .route("/api/report/:team", get(deprecated_report))
        .route("/api/refresh/:team", get(deprecated_refresh))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let service = Arc::new(ReportService::from_config(config)?);
    if service.supabase().is_none() {
        warn!("SUPABASE_URL/SUPABASE_SERVICE_KEY not set, stored reports are disabled");
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Serving NBA reports at http://{}", addr);

    axum::serve(listener, app(service))
        .await
        .context("Server error")?;
    Ok(())
}
