use crate::models::{AtsOutcome, Game, GamesOddsRow, OddsEvent, OuOutcome, Outcome, Team};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Results this close to the line are a push
const PUSH_EPSILON: f64 = 0.01;

/// Spread point for the first outcome naming the team
pub fn parse_spread(outcomes: &[Outcome], team_name: &str) -> Option<f64> {
    let team = team_name.to_lowercase();
    outcomes
        .iter()
        .find(|o| !o.name.is_empty() && o.name.to_lowercase().contains(&team))
        .map(|o| o.point.unwrap_or(0.0))
}

/// Total points line from the "Over" outcome
pub fn parse_total(outcomes: &[Outcome]) -> Option<f64> {
    outcomes
        .iter()
        .find(|o| o.name.to_lowercase().contains("over"))
        .map(|o| o.point.unwrap_or(0.0))
}

/// Spread result from the team's perspective (negative spread = favored)
pub fn compute_ats(team_score: i64, opp_score: i64, spread: f64) -> AtsOutcome {
    let adjusted = (team_score - opp_score) as f64 + spread;
    if adjusted.abs() < PUSH_EPSILON {
        AtsOutcome::Push
    } else if adjusted > 0.0 {
        AtsOutcome::Win
    } else {
        AtsOutcome::Loss
    }
}

pub fn compute_ou(team_score: i64, opp_score: i64, total: f64) -> OuOutcome {
    let diff = (team_score + opp_score) as f64 - total;
    if diff.abs() < PUSH_EPSILON {
        OuOutcome::Push
    } else if diff > 0.0 {
        OuOutcome::Over
    } else {
        OuOutcome::Under
    }
}

/// Events whose home or away team contains any of the given name tokens
pub fn find_odds_for_matchup<'a>(events: &'a [OddsEvent], team_names: &[String]) -> Vec<&'a OddsEvent> {
    let tokens: Vec<String> = team_names
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    events
        .iter()
        .filter(|event| {
            let home = event.home_team.to_lowercase();
            let away = event.away_team.to_lowercase();
            tokens
                .iter()
                .any(|token| home.contains(token.as_str()) || away.contains(token.as_str()))
        })
        .collect()
}

/// The API id, or a stable digest of teams and start time when it is missing
pub fn event_id(event: &OddsEvent) -> String {
    if let Some(id) = event.id.as_deref().filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    let basis = serde_json::json!({
        "away": event.away_team,
        "home": event.home_team,
        "t": event.commence_time.map(|t| t.to_rfc3339()),
    });
    let digest = Sha256::digest(basis.to_string().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Calendar date of a BallDontLie game ("2025-01-05" or a full timestamp)
pub fn game_date(game: &Game) -> Option<NaiveDate> {
    let day = game.date.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Match a finished game to the first odds event featuring the team and compute its results
pub fn build_games_odds_row(team: &Team, game: &Game, events: &[OddsEvent]) -> Option<GamesOddsRow> {
    let date = game_date(game)?;
    let full_name = team.display_name().to_lowercase();
    let is_home = game.is_home(team.id);
    let (team_score, opp_score) = game.scores_for(team.id);

    let mut spread_line = None;
    let mut total_line = None;
    let mut h2h_team_odds = None;
    let mut h2h_opp_odds = None;

    let event = events.iter().find(|ev| {
        ev.home_team.to_lowercase().contains(&full_name) || ev.away_team.to_lowercase().contains(&full_name)
    });

    if let Some(bookmaker) = event.and_then(|ev| ev.bookmakers.first()) {
        for market in &bookmaker.markets {
            match market.key.as_str() {
                "spreads" => spread_line = parse_spread(&market.outcomes, team.display_name()),
                "totals" => total_line = parse_total(&market.outcomes),
                "h2h" => {
                    for outcome in &market.outcomes {
                        if outcome.name.to_lowercase().contains(&full_name) {
                            h2h_team_odds = Some(outcome.price);
                        } else {
                            h2h_opp_odds = Some(outcome.price);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    let played = team_score != 0 && opp_score != 0;

    Some(GamesOddsRow {
        team_abbr: team.abbreviation.clone(),
        opponent_abbr: game.opponent(team.id).abbreviation.clone(),
        game_date: date.to_string(),
        is_home,
        spread_line,
        total_line,
        h2h_team_odds,
        h2h_opp_odds,
        team_score: (team_score != 0).then_some(team_score),
        opp_score: (opp_score != 0).then_some(opp_score),
        ats_result: spread_line
            .filter(|_| played)
            .map(|spread| compute_ats(team_score, opp_score, spread)),
        ou_result: total_line
            .filter(|_| played)
            .map(|total| compute_ou(team_score, opp_score, total)),
    })
}
