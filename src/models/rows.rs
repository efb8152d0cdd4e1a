//! Row shapes written to and read from the Supabase REST tables.

use super::{AtsOutcome, Game, LineRecord, OddsEvent, OuOutcome, PlayerInjury, Team};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRow {
    pub id: i64,
    pub abbreviation: String,
    pub full_name: String,
    pub city: String,
    pub division: String,
    pub conference: String,
}

impl From<&Team> for TeamRow {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            abbreviation: team.abbreviation.clone(),
            full_name: team.display_name().to_string(),
            city: team.city.clone(),
            division: team.division.clone(),
            conference: team.conference.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRow {
    pub id: i64,
    pub season: i32,
    pub game_date: String,
    pub status: String,
    pub home_team_id: i64,
    pub visitor_team_id: i64,
    pub home_team_score: Option<i64>,
    pub visitor_team_score: Option<i64>,
}

impl From<&Game> for GameRow {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            season: game.season,
            game_date: game.date.clone(),
            status: game.status.clone(),
            home_team_id: game.home_team.id,
            visitor_team_id: game.visitor_team.id,
            home_team_score: game.home_team_score,
            visitor_team_score: game.visitor_team_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRow {
    pub player_id: i64,
    pub team_id: Option<i64>,
    pub status: Option<String>,
    pub description: Option<String>,
    pub return_date: Option<String>,
}

impl From<&PlayerInjury> for InjuryRow {
    fn from(injury: &PlayerInjury) -> Self {
        Self {
            player_id: injury.player.id,
            team_id: injury.player.team_id,
            status: injury.status.clone(),
            description: injury.description.clone(),
            return_date: injury.return_date.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsRow {
    pub id: String,
    pub sport_key: Option<String>,
    pub commence_time: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
    pub markets: serde_json::Value,
    pub raw: serde_json::Value,
}

impl OddsRow {
    pub fn from_event(event: &OddsEvent) -> Self {
        Self {
            id: crate::utils::lines::event_id(event),
            sport_key: event.sport_key.clone(),
            commence_time: event.commence_time,
            home_team: event.home_team.clone(),
            away_team: event.away_team.clone(),
            markets: serde_json::to_value(&event.bookmakers).unwrap_or_default(),
            raw: serde_json::to_value(event).unwrap_or_default(),
        }
    }
}

/// One game matched to its closing lines with computed results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamesOddsRow {
    pub team_abbr: String,
    pub opponent_abbr: String,
    pub game_date: String,
    pub is_home: bool,
    pub spread_line: Option<f64>,
    pub total_line: Option<f64>,
    pub h2h_team_odds: Option<f64>,
    pub h2h_opp_odds: Option<f64>,
    pub team_score: Option<i64>,
    pub opp_score: Option<i64>,
    pub ats_result: Option<AtsOutcome>,
    pub ou_result: Option<OuOutcome>,
}

impl GamesOddsRow {
    /// A line record when both results were computed
    pub fn line_record(&self) -> Option<LineRecord> {
        Some(LineRecord::new(self.ats_result?, self.ou_result?))
    }
}

/// Line records from newest-first history, one per game date, at most `limit`
pub fn line_records_from_history(rows: &[GamesOddsRow], limit: usize) -> Vec<LineRecord> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.game_date.as_str()))
        .filter_map(GamesOddsRow::line_record)
        .take(limit)
        .collect()
}

/// A saved team report from the `reports` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReport {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    pub team: String,
    pub data: serde_json::Value,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_record_requires_both_results() {
        let mut row = GamesOddsRow {
            team_abbr: "CHI".into(),
            opponent_abbr: "BOS".into(),
            game_date: "2025-01-05".into(),
            is_home: true,
            spread_line: Some(-3.5),
            total_line: None,
            h2h_team_odds: None,
            h2h_opp_odds: None,
            team_score: Some(110),
            opp_score: Some(100),
            ats_result: Some(AtsOutcome::Win),
            ou_result: None,
        };
        assert_eq!(row.line_record(), None);
        row.ou_result = Some(OuOutcome::Over);
        assert_eq!(
            row.line_record(),
            Some(LineRecord::new(AtsOutcome::Win, OuOutcome::Over))
        );
    }

    fn graded(date: &str, ats: AtsOutcome, ou: Option<OuOutcome>) -> GamesOddsRow {
        GamesOddsRow {
            team_abbr: "CHI".into(),
            opponent_abbr: "BOS".into(),
            game_date: date.into(),
            is_home: true,
            spread_line: Some(-3.5),
            total_line: Some(221.5),
            h2h_team_odds: None,
            h2h_opp_odds: None,
            team_score: Some(110),
            opp_score: Some(100),
            ats_result: Some(ats),
            ou_result: ou,
        }
    }

    #[test]
    fn test_history_counts_each_game_once() {
        use crate::models::AtsOutcome::{Loss, Win};
        use crate::models::OuOutcome::{Over, Under};

        let rows = vec![
            graded("2025-01-09", Win, Some(Over)),
            graded("2025-01-09", Win, Some(Over)),
            graded("2025-01-07", Loss, None),
            graded("2025-01-05", Loss, Some(Under)),
            graded("2025-01-05", Loss, Some(Under)),
            graded("2025-01-03", Win, Some(Under)),
        ];

        assert_eq!(
            line_records_from_history(&rows, 10),
            vec![
                LineRecord::new(Win, Over),
                LineRecord::new(Loss, Under),
                LineRecord::new(Win, Under),
            ]
        );
        assert_eq!(line_records_from_history(&rows, 2).len(), 2);
        assert!(line_records_from_history(&[], 10).is_empty());
    }

    #[test]
    fn test_stored_report_tolerates_extra_columns() {
        let report: StoredReport = serde_json::from_str(
            r#"{"id": 3, "team": "bulls", "data": {"games": []}, "created_at": "2025-01-05T10:00:00Z", "user_id": null}"#,
        )
        .unwrap();
        assert_eq!(report.team, "bulls");
        assert!(report.data["games"].is_array());
    }
}
