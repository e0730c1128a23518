//! Player scoring statistics: aggregation of raw per-player records into a
//! per-team index plus a global leaderboard.
//!
//! Records arrive either as a flat list from the paginated statistics
//! endpoint or as a static snapshot document with a `playerStats` map
//! keyed by team id. Team linkage is unreliable across API versions, so
//! the index supports lookup by id with a normalized-name fallback.

use crate::value::{pick_number, pick_string, resolve};
use crate::{PlayerStatEntry, TeamMeta, TeamPlayerStats};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Candidate locations for the row array in a statistics page.
const ROW_SOURCES: &[&[&str]] = &[
    &["players"],
    &["playerStatistics"],
    &["playerStats"],
    &["statistics"],
    &["data", "players"],
    &["data", "playerStatistics"],
];

const TEAM_ID_FIELDS: &[&[&str]] = &[&["actualPlayerTeamId"], &["teamId"], &["teamUniqueKey"]];
const TEAM_NAME_FIELDS: &[&[&str]] = &[&["teamName"], &["team"], &["teamDisplayName"]];
const DIVISION_FIELDS: &[&[&str]] = &[&["divisionName"], &["division"], &["poolName"]];
const PLAYER_ID_FIELDS: &[&[&str]] = &[&["playerId"], &["id"]];
const GP_FIELDS: &[&[&str]] = &[&["gamesPlayed"], &["games"], &["played"], &["matchesPlayed"]];
const PTS_FIELDS: &[&[&str]] = &[
    &["totalPoints"],
    &["points"],
    &["pointsScored"],
    &["pointsTotal"],
];
const PPG_FIELDS: &[&[&str]] = &[
    &["averagePoints"],
    &["avgPoints"],
    &["pointsAverage"],
    &["avg"],
];

/// Name fields probed, in order, when falling back to name-based team
/// lookup.
const TEAM_LOOKUP_NAME_FIELDS: &[&[&str]] = &[
    &["name"],
    &["teamName"],
    &["team", "name"],
    &["clubName"],
];

/// Trim, collapse inner whitespace, lowercase — the key for name-based
/// team matching.
pub fn normalize_team_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The row array of one statistics page, wherever the payload keeps it.
/// Whole-payload arrays are accepted as a last resort.
pub fn player_rows(raw: &Value) -> &[Value] {
    for path in ROW_SOURCES {
        if let Some(rows) = resolve(raw, path).and_then(Value::as_array) {
            return rows;
        }
    }
    raw.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Per-team player statistics with id and normalized-name lookup plus a
/// global leaderboard.
#[derive(Debug, Clone, Default)]
pub struct PlayerStatsIndex {
    teams: Vec<TeamPlayerStats>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    leaders: Vec<PlayerStatEntry>,
    has_data: bool,
}

impl PlayerStatsIndex {
    pub fn teams(&self) -> &[TeamPlayerStats] {
        &self.teams
    }

    /// All players across all teams in canonical ranking order.
    pub fn leaders(&self) -> &[PlayerStatEntry] {
        &self.leaders
    }

    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn team_by_id(&self, team_id: &str) -> Option<&TeamPlayerStats> {
        self.by_id.get(team_id).map(|&i| &self.teams[i])
    }

    /// Lookup by team name; the given name is normalized first.
    pub fn team_by_name(&self, name: &str) -> Option<&TeamPlayerStats> {
        self.by_name
            .get(&normalize_team_name(name))
            .map(|&i| &self.teams[i])
    }

    /// Id lookup with a name-based fallback: when `team_id` misses, probe
    /// the candidate name fields off `team_like` (a ladder row or similar
    /// record) in order. `None` when nothing matches; never errors.
    pub fn stats_for_team(
        &self,
        team_id: Option<&str>,
        team_like: Option<&Value>,
    ) -> Option<&TeamPlayerStats> {
        if let Some(id) = team_id
            && let Some(team) = self.team_by_id(id)
        {
            return Some(team);
        }
        let team_like = team_like?;
        for path in TEAM_LOOKUP_NAME_FIELDS {
            if let Some(name) = pick_string(team_like, &[*path])
                && let Some(team) = self.team_by_name(&name)
            {
                return Some(team);
            }
        }
        None
    }
}

/// Build the index from a flat list of raw per-player records (pages
/// already concatenated).
pub fn build_player_stats_index(entries: &[Value]) -> PlayerStatsIndex {
    let mut builder = IndexBuilder::default();
    for item in entries {
        if !item.is_object() {
            continue;
        }
        let team_name = pick_string(item, TEAM_NAME_FIELDS);
        // Last resort: teams without any id field are keyed by their
        // normalized name so their players still group together.
        let Some(team_id) = pick_string(item, TEAM_ID_FIELDS)
            .or_else(|| team_name.as_deref().map(normalize_team_name))
        else {
            continue;
        };
        let division = pick_string(item, DIVISION_FIELDS);
        let entry = map_player(item, &team_id, team_name.as_deref(), division.as_deref());
        builder.push(team_id, team_name, division, entry);
    }
    builder.finish()
}

/// Build the index from a static snapshot document:
/// `{ "playerStats": { "<teamId>": [records…] }, "teams": [meta…] }`.
pub fn build_from_static(doc: &Value) -> PlayerStatsIndex {
    let team_meta: HashMap<String, (Option<String>, Option<String>)> = doc
        .get("teams")
        .and_then(Value::as_array)
        .map(|teams| {
            teams
                .iter()
                .filter_map(|team| {
                    let id = pick_string(team, &[&["id"], &["teamId"], &["teamUniqueKey"]])?;
                    let name = pick_string(team, &[&["name"], &["teamName"]]);
                    let division = pick_string(team, DIVISION_FIELDS);
                    Some((id, (name, division)))
                })
                .collect()
        })
        .unwrap_or_default();

    let mut builder = IndexBuilder::default();
    if let Some(stats) = doc.get("playerStats").and_then(Value::as_object) {
        for (team_id, records) in stats {
            let (name, division) = team_meta.get(team_id).cloned().unwrap_or_default();
            let Some(records) = records.as_array() else {
                continue;
            };
            for item in records {
                if !item.is_object() {
                    continue;
                }
                let team_name = pick_string(item, TEAM_NAME_FIELDS).or_else(|| name.clone());
                let division = pick_string(item, DIVISION_FIELDS).or_else(|| division.clone());
                let entry =
                    map_player(item, team_id, team_name.as_deref(), division.as_deref());
                builder.push(team_id.clone(), team_name, division, entry);
            }
        }
    }
    builder.finish()
}

fn map_player(
    item: &Value,
    team_id: &str,
    team_name: Option<&str>,
    division: Option<&str>,
) -> PlayerStatEntry {
    PlayerStatEntry {
        id: pick_string(item, PLAYER_ID_FIELDS),
        name: player_name(item),
        team_id: team_id.to_owned(),
        team_name: team_name.map(str::to_owned),
        division: division.map(str::to_owned),
        gp: pick_number(item, GP_FIELDS),
        pts: pick_number(item, PTS_FIELDS),
        ppg: pick_number(item, PPG_FIELDS),
    }
}

/// Display name resolution: full name, then shirt number, then player id,
/// then a fixed placeholder.
fn player_name(item: &Value) -> String {
    let first = pick_string(item, &[&["firstName"]]);
    let last = pick_string(item, &[&["lastName"]]);
    let full = [first, last]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    let full = full.trim();
    if !full.is_empty() {
        return full.to_owned();
    }
    if let Some(shirt) = pick_string(item, &[&["shirtNumber"]]) {
        return format!("#{shirt}");
    }
    if let Some(player_id) = pick_string(item, &[&["playerId"]]) {
        return format!("Player {player_id}");
    }
    "Unknown player".to_owned()
}

/// Canonical ranking: ppg descending (absent as 0), then pts descending
/// (absent as 0), then name ascending. Stable.
pub fn rank_players(players: &mut [PlayerStatEntry]) {
    players.sort_by(compare_players);
}

fn compare_players(a: &PlayerStatEntry, b: &PlayerStatEntry) -> Ordering {
    b.ppg
        .unwrap_or(0.0)
        .total_cmp(&a.ppg.unwrap_or(0.0))
        .then_with(|| b.pts.unwrap_or(0.0).total_cmp(&a.pts.unwrap_or(0.0)))
        .then_with(|| a.name.cmp(&b.name))
}

#[derive(Default)]
struct IndexBuilder {
    teams: Vec<TeamPlayerStats>,
    by_id: HashMap<String, usize>,
    player_count: usize,
}

impl IndexBuilder {
    fn push(
        &mut self,
        team_id: String,
        team_name: Option<String>,
        division: Option<String>,
        entry: PlayerStatEntry,
    ) {
        let index = match self.by_id.get(&team_id) {
            Some(&i) => i,
            None => {
                self.teams.push(TeamPlayerStats {
                    team_id: team_id.clone(),
                    team: TeamMeta { name: None, division: None },
                    players: Vec::new(),
                });
                self.by_id.insert(team_id, self.teams.len() - 1);
                self.teams.len() - 1
            }
        };
        let team = &mut self.teams[index];
        // First record to carry metadata wins; later rows only fill gaps.
        if team.team.name.is_none() {
            team.team.name = team_name;
        }
        if team.team.division.is_none() {
            team.team.division = division;
        }
        team.players.push(entry);
        self.player_count += 1;
    }

    fn finish(self) -> PlayerStatsIndex {
        let IndexBuilder { mut teams, by_id, player_count } = self;

        let mut leaders = Vec::with_capacity(player_count);
        for team in &mut teams {
            rank_players(&mut team.players);
            leaders.extend(team.players.iter().cloned());
        }
        rank_players(&mut leaders);

        let by_name = teams
            .iter()
            .enumerate()
            .filter_map(|(i, team)| {
                team.team
                    .name
                    .as_deref()
                    .map(|name| (normalize_team_name(name), i))
            })
            .collect();

        PlayerStatsIndex {
            teams,
            by_id,
            by_name,
            leaders,
            has_data: player_count > 0,
        }
    }
}
