use anyhow::Result;
use nba_betting_report::config::init_logging;
use nba_betting_report::utils::teams::SUPPORTED_TEAMS;
use nba_betting_report::{AppConfig, ReportService};
use tracing::{error, info, warn};

/// Rebuild and store the simple report for every supported team
#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_logging(&config);

    let service = ReportService::from_config(config)?;
    if service.supabase().is_none() {
        warn!("SUPABASE_URL/SUPABASE_SERVICE_KEY not set, nothing to refresh");
        return Ok(());
    }

    let mut stored = 0;
    for (slug, abbr) in SUPPORTED_TEAMS {
        match service.refresh_report(slug).await {
            Ok(true) => {
                stored += 1;
                info!("Stored report for {} ({})", slug, abbr);
            }
            Ok(false) => {}
            Err(e) => error!("Refresh failed for {}: {}", slug, e),
        }
    }

    info!("Refreshed {}/{} teams", stored, SUPPORTED_TEAMS.len());
    Ok(())
}
