use crate::models::{AtsOutcome, GameResult, InjuryNote, LineRecord, OuOutcome};
use serde::{Deserialize, Serialize};

/// Line records considered for ATS/O-U rates
pub const RATE_WINDOW: usize = 10;
/// Line records considered for parlay suggestions
pub const SUGGESTION_WINDOW: usize = 5;
/// Hits within the suggestion window needed to back a side
const MAJORITY: usize = 3;

/// Average points for and against, `None` when there is nothing to average
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub avg_points_for: Option<f64>,
    pub avg_points_against: Option<f64>,
}

/// ATS and O/U records as "xW-yL" and "xO-yU"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtsOuRates {
    pub ats_rate: Option<String>,
    pub ou_rate: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegType {
    Total,
    Spread,
    PlayerProp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bet {
    Over,
    Under,
    Cover,
    Fade,
    #[serde(rename = "backup over")]
    BackupOver,
}

/// Fixed label attached by whichever rule produced the leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParlayLeg {
    #[serde(rename = "type")]
    pub leg_type: LegType,
    pub bet: Bet,
    pub confidence: Confidence,
    pub note: String,
}

impl ParlayLeg {
    fn new(leg_type: LegType, bet: Bet, confidence: Confidence, note: impl Into<String>) -> Self {
        Self {
            leg_type,
            bet,
            confidence,
            note: note.into(),
        }
    }
}

/// Everything the analysis endpoint returns for a team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAnalysis {
    #[serde(flatten)]
    pub metrics: BasicMetrics,
    #[serde(flatten)]
    pub rates: AtsOuRates,
    pub parlay_suggestions: Vec<ParlayLeg>,
}

/// Mean points for/against over the games whose scores both parse
pub fn calculate_basic_metrics(results: &[GameResult]) -> BasicMetrics {
    let (total_for, total_against, count) = results
        .iter()
        .filter_map(GameResult::points)
        .fold((0i128, 0i128, 0usize), |(pf, pa, n), (team, opp)| {
            (pf + i128::from(team), pa + i128::from(opp), n + 1)
        });

    if count == 0 {
        return BasicMetrics {
            avg_points_for: None,
            avg_points_against: None,
        };
    }

    BasicMetrics {
        avg_points_for: Some(total_for as f64 / count as f64),
        avg_points_against: Some(total_against as f64 / count as f64),
    }
}

/// ATS and O/U tallies over the most recent records. Pushes count on the losing/under side.
pub fn calculate_ats_ou_rates(lines: &[LineRecord]) -> AtsOuRates {
    if lines.is_empty() {
        return AtsOuRates {
            ats_rate: None,
            ou_rate: None,
        };
    }

    let recent = &lines[..lines.len().min(RATE_WINDOW)];
    let n = recent.len();
    let ats_wins = count_ats_wins(recent);
    let overs = count_overs(recent);

    AtsOuRates {
        ats_rate: Some(format!("{}W-{}L", ats_wins, n - ats_wins)),
        ou_rate: Some(format!("{}O-{}U", overs, n - overs)),
    }
}

/// Canned parlay legs from the last few line records and the injury list
pub fn generate_parlay_suggestions(lines: &[LineRecord], injuries: &[InjuryNote]) -> Vec<ParlayLeg> {
    let mut legs = Vec::new();

    if !lines.is_empty() {
        let recent = &lines[..lines.len().min(SUGGESTION_WINDOW)];

        if count_overs(recent) >= MAJORITY {
            legs.push(ParlayLeg::new(
                LegType::Total,
                Bet::Over,
                Confidence::Medium,
                "Team has hit the over in majority of last 5 games.",
            ));
        } else {
            legs.push(ParlayLeg::new(
                LegType::Total,
                Bet::Under,
                Confidence::Medium,
                "Team tends to stay under recently.",
            ));
        }

        if count_ats_wins(recent) >= MAJORITY {
            legs.push(ParlayLeg::new(
                LegType::Spread,
                Bet::Cover,
                Confidence::Medium,
                "Team has covered the spread frequently.",
            ));
        } else {
            legs.push(ParlayLeg::new(
                LegType::Spread,
                Bet::Fade,
                Confidence::Low,
                "Team struggles to cover the spread.",
            ));
        }
    }

    if !injuries.is_empty() {
        let names: Vec<&str> = injuries.iter().map(|i| i.player.as_str()).collect();
        legs.push(ParlayLeg::new(
            LegType::PlayerProp,
            Bet::BackupOver,
            Confidence::Low,
            format!(
                "Starters {} are out; consider backups over stats.",
                names.join(", ")
            ),
        ));
    }

    legs
}

/// Run all three aggregations
pub fn analyze_team(
    results: &[GameResult],
    lines: &[LineRecord],
    injuries: &[InjuryNote],
) -> TeamAnalysis {
    TeamAnalysis {
        metrics: calculate_basic_metrics(results),
        rates: calculate_ats_ou_rates(lines),
        parlay_suggestions: generate_parlay_suggestions(lines, injuries),
    }
}

fn count_ats_wins(lines: &[LineRecord]) -> usize {
    lines.iter().filter(|l| l.ats == AtsOutcome::Win).count()
}

fn count_overs(lines: &[LineRecord]) -> usize {
    lines.iter().filter(|l| l.ou == OuOutcome::Over).count()
}
