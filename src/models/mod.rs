pub mod rows;

pub use rows::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Paged list envelope used by BallDontLie (`{"data": [...]}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// An NBA team as BallDontLie describes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub conference: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub name: String,
}

impl Team {
    /// Full name when present, otherwise the short name
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.name
        } else {
            &self.full_name
        }
    }

    /// Non-empty full name, short name and abbreviation, used to match odds events
    pub fn name_tokens(&self) -> Vec<String> {
        [&self.full_name, &self.name, &self.abbreviation]
            .into_iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect()
    }

    /// `name_tokens` plus the city, for the broader ETL odds snapshot
    pub fn name_and_city_tokens(&self) -> Vec<String> {
        let mut tokens = self.name_tokens();
        if !self.city.is_empty() {
            tokens.push(self.city.clone());
        }
        tokens
    }
}

/// A game from BallDontLie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub season: i32,
    #[serde(default)]
    pub status: String,
    pub home_team: Team,
    pub visitor_team: Team,
    #[serde(default)]
    pub home_team_score: Option<i64>,
    #[serde(default)]
    pub visitor_team_score: Option<i64>,
}

impl Game {
    pub fn is_home(&self, team_id: i64) -> bool {
        self.home_team.id == team_id
    }

    /// (team score, opponent score) from one team's perspective, zero when unplayed
    pub fn scores_for(&self, team_id: i64) -> (i64, i64) {
        let home = self.home_team_score.unwrap_or(0);
        let visitor = self.visitor_team_score.unwrap_or(0);
        if self.is_home(team_id) {
            (home, visitor)
        } else {
            (visitor, home)
        }
    }

    pub fn opponent(&self, team_id: i64) -> &Team {
        if self.is_home(team_id) {
            &self.visitor_team
        } else {
            &self.home_team
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InjuredPlayer {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub team_id: Option<i64>,
}

impl InjuredPlayer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// A player injury entry from BallDontLie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerInjury {
    pub player: InjuredPlayer,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub return_date: Option<String>,
}

/// A single priced outcome in an Odds API market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub name: String,
    #[serde(default)]
    pub price: f64,
    /// Spread or total line, absent for h2h
    #[serde(default)]
    pub point: Option<f64>,
}

/// Market data (h2h, spreads, totals) from The Odds API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(default)]
    pub markets: Vec<Market>,
}

impl Bookmaker {
    pub fn market(&self, key: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.key == key)
    }
}

/// One upcoming game with bookmaker prices from The Odds API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sport_key: Option<String>,
    #[serde(default)]
    pub commence_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub home_team: String,
    #[serde(default)]
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

/// Per-player line for one game from API-NBA
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatLine {
    pub player_id: Option<i64>,
    pub player: String,
    pub team: Option<String>,
    pub minutes: Option<String>,
    pub points: Option<i64>,
    pub rebounds: Option<i64>,
    pub assists: Option<i64>,
    pub steals: Option<i64>,
    pub blocks: Option<i64>,
    pub turnovers: Option<i64>,
    pub fgm: Option<i64>,
    pub fga: Option<i64>,
    pub tpm: Option<i64>,
    pub tpa: Option<i64>,
    pub ftm: Option<i64>,
    pub fta: Option<i64>,
    pub plus_minus: Option<i64>,
}

/// Score summary for a fixture from the RapidAPI odds provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub fixture_id: String,
    pub home: Option<serde_json::Value>,
    pub away: Option<serde_json::Value>,
    #[serde(rename = "home_score")]
    pub home_score: Option<serde_json::Value>,
    #[serde(rename = "away_score")]
    pub away_score: Option<serde_json::Value>,
    pub status: Option<serde_json::Value>,
    pub date: Option<serde_json::Value>,
    /// Payload kept verbatim when it has no recognizable shape
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<serde_json::Value>,
}

/// Points for and against in one game, as strings straight from the source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub team_points: String,
    pub opp_points: String,
}

impl GameResult {
    pub fn new(team_points: impl Into<String>, opp_points: impl Into<String>) -> Self {
        Self {
            team_points: team_points.into(),
            opp_points: opp_points.into(),
        }
    }

    /// Build from a game for one team. Unplayed games (0-0) get empty scores.
    pub fn from_game(game: &Game, team_id: i64) -> Self {
        match game.scores_for(team_id) {
            (0, 0) => Self::default(),
            (team, opp) => Self::new(team.to_string(), opp.to_string()),
        }
    }

    /// Both scores as integers, `None` if either is malformed
    pub fn points(&self) -> Option<(i64, i64)> {
        let team = self.team_points.trim().parse().ok()?;
        let opp = self.opp_points.trim().parse().ok()?;
        Some((team, opp))
    }
}

/// Against-the-spread result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtsOutcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
    #[serde(rename = "P")]
    Push,
}

/// Over/under result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OuOutcome {
    #[serde(rename = "O")]
    Over,
    #[serde(rename = "U")]
    Under,
    #[serde(rename = "P")]
    Push,
}

/// Spread and total results for one past game, most recent first in lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub ats: AtsOutcome,
    pub ou: OuOutcome,
}

impl LineRecord {
    pub fn new(ats: AtsOutcome, ou: OuOutcome) -> Self {
        Self { ats, ou }
    }
}

/// Injured player name and status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjuryNote {
    pub player: String,
    pub status: String,
}

impl From<&PlayerInjury> for InjuryNote {
    fn from(injury: &PlayerInjury) -> Self {
        Self {
            player: injury.player.full_name(),
            status: injury.status.clone().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: i64, abbreviation: &str) -> Team {
        Team {
            id,
            abbreviation: abbreviation.to_string(),
            ..Default::default()
        }
    }

    fn game(home_score: Option<i64>, visitor_score: Option<i64>) -> Game {
        Game {
            id: 1,
            date: "2025-01-05".into(),
            season: 2024,
            status: "Final".into(),
            home_team: team(4, "CHI"),
            visitor_team: team(2, "BOS"),
            home_team_score: home_score,
            visitor_team_score: visitor_score,
        }
    }

    #[test]
    fn test_game_result_from_either_side() {
        let g = game(Some(110), Some(104));
        assert_eq!(GameResult::from_game(&g, 4), GameResult::new("110", "104"));
        assert_eq!(GameResult::from_game(&g, 2), GameResult::new("104", "110"));
        assert_eq!(g.opponent(4).abbreviation, "BOS");
    }

    #[test]
    fn test_unplayed_game_has_no_points() {
        let g = game(Some(0), None);
        assert_eq!(GameResult::from_game(&g, 4).points(), None);
    }

    #[test]
    fn test_points_parse_and_reject() {
        assert_eq!(GameResult::new(" 99", "101").points(), Some((99, 101)));
        assert_eq!(GameResult::new("N/A", "101").points(), None);
        assert_eq!(GameResult::new("99.5", "101").points(), None);
    }

    #[test]
    fn test_line_record_wire_format() {
        let record: LineRecord = serde_json::from_str(r#"{"ats": "W", "ou": "U"}"#).unwrap();
        assert_eq!(record, LineRecord::new(AtsOutcome::Win, OuOutcome::Under));
    }

    #[test]
    fn test_deserialize_balldontlie_game() {
        let json = r#"{
            "id": 15907925,
            "date": "2025-01-05",
            "season": 2024,
            "status": "Final",
            "period": 4,
            "home_team_score": 115,
            "visitor_team_score": 105,
            "home_team": {"id": 4, "abbreviation": "CHI", "city": "Chicago", "conference": "East",
                          "division": "Central", "full_name": "Chicago Bulls", "name": "Bulls"},
            "visitor_team": {"id": 2, "abbreviation": "BOS", "full_name": "Boston Celtics", "name": "Celtics"}
        }"#;
        let g: Game = serde_json::from_str(json).unwrap();
        assert_eq!(g.scores_for(2), (105, 115));
        assert_eq!(g.home_team.display_name(), "Chicago Bulls");
    }

    #[test]
    fn test_injury_note_from_injury() {
        let injury: PlayerInjury = serde_json::from_str(
            r#"{"player": {"id": 7, "first_name": "Lonzo", "last_name": "Ball"}, "status": "Out"}"#,
        )
        .unwrap();
        let note = InjuryNote::from(&injury);
        assert_eq!(note.player, "Lonzo Ball");
        assert_eq!(note.status, "Out");
    }

    #[test]
    fn test_team_name_tokens_skip_empty() {
        let t = Team {
            id: 4,
            abbreviation: "CHI".into(),
            full_name: "Chicago Bulls".into(),
            ..Default::default()
        };
        assert_eq!(t.name_tokens(), vec!["Chicago Bulls", "CHI"]);
    }

    #[test]
    fn test_city_only_in_etl_tokens() {
        let t = Team {
            id: 13,
            abbreviation: "LAC".into(),
            city: "LA".into(),
            full_name: "LA Clippers".into(),
            name: "Clippers".into(),
            ..Default::default()
        };
        assert_eq!(t.name_tokens(), vec!["LA Clippers", "Clippers", "LAC"]);
        assert_eq!(t.name_and_city_tokens(), vec!["LA Clippers", "Clippers", "LAC", "LA"]);
    }
}
