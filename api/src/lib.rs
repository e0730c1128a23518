pub mod client;
pub mod fixtures;
pub mod ladder;
pub mod scorers;
pub mod summary;
pub mod value;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

pub use value::StatValue;

// ---------------------------------------------------------------------------
// Domain types — clean model, independent of the Squadi/BasketballConnect
// wire formats (of which there are several historical variants)
// ---------------------------------------------------------------------------

/// One row of a competition ladder. Every numeric column tolerates the
/// upstream's mix of numbers and display strings; see [`StatValue`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderRow {
    /// First non-empty of `id`, `teamId`, `teamUniqueKey`, `team.id`,
    /// `teamName` — the identity key used everywhere downstream.
    pub id: Option<String>,
    pub name: Option<String>,
    pub rank: Option<StatValue>,
    pub played: Option<StatValue>,
    pub won: Option<StatValue>,
    pub lost: Option<StatValue>,
    pub points_for: Option<StatValue>,
    pub points_against: Option<StatValue>,
    pub points: Option<StatValue>,
    pub division_id: Option<i64>,
    pub division_name: Option<String>,
    /// Recent results, most recent last. Empty until merged from the
    /// ladder payload's recent-match section.
    pub form: Vec<FormCode>,
}

impl LadderRow {
    /// Numeric rank when the upstream sent one; display-text ranks don't
    /// participate in sorting.
    pub fn rank_value(&self) -> Option<f64> {
        self.rank.as_ref().and_then(StatValue::as_number)
    }
}

/// Single-letter recent-result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormCode {
    Win,
    Draw,
    Loss,
    /// Upstream sent a code we don't classify; first letter kept verbatim.
    Other(char),
    Unknown,
}

impl FormCode {
    pub fn letter(self) -> char {
        match self {
            FormCode::Win => 'W',
            FormCode::Draw => 'D',
            FormCode::Loss => 'L',
            FormCode::Other(c) => c,
            FormCode::Unknown => '–',
        }
    }
}

impl Serialize for FormCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.letter())
    }
}

/// One scheduled or completed match, flattened out of the rounds tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    pub id: Option<String>,
    pub round_name: Option<String>,
    pub team1: FixtureTeam,
    pub team2: FixtureTeam,
    /// Scores pass through only when the wire value is a JSON number.
    /// String scores are treated as absent, never coerced.
    pub team1_score: Option<f64>,
    pub team2_score: Option<f64>,
    /// Raw ISO-8601 start time (`startTime` falling back to
    /// `originalStartTime`); parsed lazily so unparseable values keep
    /// their "treat as upcoming" classification.
    pub start_time: Option<String>,
    pub result_status: Option<String>,
    pub venue: Option<String>,
    pub court: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FixtureTeam {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Fixture {
    /// Completed iff both scores arrived as numbers.
    pub fn is_completed(&self) -> bool {
        self.team1_score.is_some() && self.team2_score.is_some()
    }

    pub fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_time
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Not completed, and the start time is either unparseable/missing
    /// (counted as upcoming) or at/after `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        if self.is_completed() {
            return false;
        }
        match self.start_timestamp() {
            Some(ts) => ts >= now,
            None => true,
        }
    }

    pub fn involves_team(&self, team_id: &str) -> bool {
        self.team1.id.as_deref() == Some(team_id) || self.team2.id.as_deref() == Some(team_id)
    }
}

/// Per-player scoring line, normalized from the paginated statistics
/// endpoint or a static snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatEntry {
    pub id: Option<String>,
    pub name: String,
    pub team_id: String,
    pub team_name: Option<String>,
    pub division: Option<String>,
    pub gp: Option<f64>,
    pub pts: Option<f64>,
    pub ppg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMeta {
    pub name: Option<String>,
    pub division: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPlayerStats {
    pub team_id: String,
    pub team: TeamMeta,
    /// Ranked by the canonical ordering: ppg desc, pts desc, name asc.
    pub players: Vec<PlayerStatEntry>,
}

/// Derived aggregate over normalized ladder + fixture data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub last_updated: DateTime<Utc>,
    pub totals: SummaryTotals,
    /// At most three entries.
    pub leaders: Vec<LeaderEntry>,
    pub points_avg: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub games_upcoming: u32,
    pub games_completed: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderEntry {
    pub id: Option<String>,
    pub name: String,
    pub rank: Option<f64>,
}

/// A user-pinned team, persisted across sessions. Identity is the
/// string-normalized `id`; saving an already-saved id updates in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTeam {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_unique_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competition_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_name: Option<String>,
}

/// Competition list entry. The upstream addresses competitions by up to
/// four interchangeable identifiers; we keep the numeric-ish id and the
/// unique key and match against either.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    pub id: Option<String>,
    pub unique_key: Option<String>,
    pub name: Option<String>,
}

impl Competition {
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.id.as_deref().into_iter().chain(self.unique_key.as_deref())
    }

    /// Case- and whitespace-insensitive identifier match, used when
    /// resolving a configured default competition.
    pub fn matches_identifier(&self, wanted: &str) -> bool {
        let wanted = wanted.trim().to_lowercase();
        self.identifiers().any(|id| id.trim().to_lowercase() == wanted)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unnamed competition")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: i64,
    pub name: Option<String>,
}
