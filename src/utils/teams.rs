/// UI slug to three-letter abbreviation, grouped by division
pub const SUPPORTED_TEAMS: &[(&str, &str)] = &[
    // Atlantic
    ("celtics", "BOS"),
    ("nets", "BRK"),
    ("knicks", "NYK"),
    ("76ers", "PHI"),
    ("raptors", "TOR"),
    // Central
    ("bulls", "CHI"),
    ("cavaliers", "CLE"),
    ("pistons", "DET"),
    ("pacers", "IND"),
    ("bucks", "MIL"),
    // Southeast
    ("hawks", "ATL"),
    ("hornets", "CHA"),
    ("heat", "MIA"),
    ("magic", "ORL"),
    ("wizards", "WAS"),
    // Northwest
    ("nuggets", "DEN"),
    ("timberwolves", "MIN"),
    ("thunder", "OKC"),
    ("trail-blazers", "POR"),
    ("jazz", "UTA"),
    // Pacific
    ("warriors", "GSW"),
    ("clippers", "LAC"),
    ("lakers", "LAL"),
    ("suns", "PHX"),
    ("kings", "SAC"),
    // Southwest
    ("mavericks", "DAL"),
    ("rockets", "HOU"),
    ("grizzlies", "MEM"),
    ("pelicans", "NOP"),
    ("spurs", "SAS"),
];

/// Normalize a team input to (slug, abbreviation).
/// Known slugs map through the table; anything else (typically an
/// abbreviation like "chi") is uppercased as a best effort.
pub fn resolve_team(input: &str) -> (String, String) {
    let trimmed = input.trim();
    let slug = trimmed.to_lowercase();

    if let Some((_, abbr)) = SUPPORTED_TEAMS.iter().find(|(s, _)| *s == slug) {
        return (slug, abbr.to_string());
    }

    (slug, trimmed.to_uppercase())
}

/// Query to send to BallDontLie's team search for a slug or abbreviation
pub fn search_term(input: &str) -> String {
    let (slug, abbr) = resolve_team(input);
    if SUPPORTED_TEAMS.iter().any(|(s, _)| *s == slug) {
        // BallDontLie searches names, so slugs like "trail-blazers" need spaces
        slug.replace('-', " ")
    } else if abbr.len() == 3 {
        abbr
    } else {
        input.trim().to_string()
    }
}
