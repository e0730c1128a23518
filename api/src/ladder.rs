//! Ladder and recent-form normalization.
//!
//! The public-ladder and teams/ladder/v2 endpoints (and their historical
//! versions) nest the row array in different places and name the columns
//! differently. The candidate tables below are the single source of truth
//! for both; changing the accepted shapes is a one-line diff here.

use crate::value::{pick_first, pick_number, pick_stat, pick_string, resolve};
use crate::{FormCode, LadderRow};
use serde_json::Value;
use std::collections::HashMap;

/// Candidate locations for the row array, in priority order. The first
/// candidate that IS an array wins, even when empty — candidates are
/// never merged.
const ROW_SOURCES: &[&[&str]] = &[
    &["ladder"],
    &["ladderData", "ladder"],
    &["data", "ladder"],
    &["ladders"],
    &["rows"],
];

/// Candidate locations for the recent-results array.
const RECENT_SOURCES: &[&[&str]] = &[
    &["lastResults"],
    &["recentMatchData", "lastResults"],
    &["recentMatches"],
    &["ladderRecentMatchData", "lastResults"],
];

const ID_FIELDS: &[&[&str]] = &[
    &["id"],
    &["teamId"],
    &["teamUniqueKey"],
    &["team", "id"],
    &["teamName"],
];
const NAME_FIELDS: &[&[&str]] = &[&["name"], &["teamName"], &["team", "name"]];
const RANK_FIELDS: &[&[&str]] = &[&["rk"], &["rank"], &["position"]];
const PLAYED_FIELDS: &[&[&str]] = &[&["P"], &["played"], &["playedGames"]];
const WON_FIELDS: &[&[&str]] = &[&["W"], &["won"], &["wins"]];
const LOST_FIELDS: &[&[&str]] = &[&["L"], &["lost"], &["losses"]];
const FOR_FIELDS: &[&[&str]] = &[&["F"], &["for"], &["forPoints"]];
const AGAINST_FIELDS: &[&[&str]] = &[&["A"], &["against"], &["againstPoints"]];
const POINTS_FIELDS: &[&[&str]] = &[&["PTS"], &["points"], &["totalPoints"]];
const DIVISION_NAME_FIELDS: &[&[&str]] = &[&["divisionName"], &["poolName"]];

/// Which team a recent-results entry belongs to.
const RECENT_TEAM_FIELDS: &[&[&str]] = &[&["teamId"], &["team", "id"], &["teamUniqueKey"]];
/// Where an entry keeps its run of result codes.
const RECENT_CODE_FIELDS: &[&[&str]] = &[&["last5"], &["form"]];
const CODE_FIELDS: &[&[&str]] = &[&["code"], &["result"], &["outcome"]];

/// Extract the row array from whichever shape the payload uses.
fn ladder_rows(raw: &Value) -> Option<&Vec<Value>> {
    for path in ROW_SOURCES {
        if let Some(rows) = resolve(raw, path).and_then(Value::as_array) {
            return Some(rows);
        }
    }
    raw.as_array()
}

/// Normalize a ladder payload of unknown shape into canonical rows.
/// Unrecognized payloads yield an empty list, never an error; the `form`
/// column stays empty (see [`build_ladder`] for the merged variant).
pub fn normalize_ladder(raw: &Value) -> Vec<LadderRow> {
    let Some(rows) = ladder_rows(raw) else {
        return Vec::new();
    };
    rows.iter().map(map_row).collect()
}

fn map_row(row: &Value) -> LadderRow {
    LadderRow {
        id: pick_string(row, ID_FIELDS),
        name: pick_string(row, NAME_FIELDS),
        rank: pick_stat(row, RANK_FIELDS),
        played: pick_stat(row, PLAYED_FIELDS),
        won: pick_stat(row, WON_FIELDS),
        lost: pick_stat(row, LOST_FIELDS),
        points_for: pick_stat(row, FOR_FIELDS),
        points_against: pick_stat(row, AGAINST_FIELDS),
        points: pick_stat(row, POINTS_FIELDS),
        division_id: pick_number(row, &[&["divisionId"]]).map(|n| n as i64),
        division_name: pick_string(row, DIVISION_NAME_FIELDS),
        form: Vec::new(),
    }
}

/// The recent-results array, wherever the payload keeps it. `[]` when the
/// payload carries none.
pub fn normalize_recent_results(raw: &Value) -> &[Value] {
    for path in RECENT_SOURCES {
        if let Some(results) = resolve(raw, path).and_then(Value::as_array) {
            return results;
        }
    }
    &[]
}

/// Classify one raw result entry — a bare string code or an object with a
/// `code`/`result`/`outcome` field — into a single-letter form code.
pub fn form_code(entry: &Value) -> FormCode {
    let code = match entry {
        Value::String(s) => Some(s.clone()),
        _ => pick_string(entry, CODE_FIELDS),
    };
    let Some(code) = code else {
        return FormCode::Unknown;
    };
    match code.to_uppercase().chars().next() {
        Some('W') => FormCode::Win,
        Some('D') => FormCode::Draw,
        Some('L') => FormCode::Loss,
        Some(c) => FormCode::Other(c),
        None => FormCode::Unknown,
    }
}

/// Index recent form by team id, ready to merge onto ladder rows.
pub fn recent_form_by_team(raw: &Value) -> HashMap<String, Vec<FormCode>> {
    let mut by_team = HashMap::new();
    for entry in normalize_recent_results(raw) {
        let Some(team_id) = pick_string(entry, RECENT_TEAM_FIELDS) else {
            continue;
        };
        let codes = pick_first(entry, RECENT_CODE_FIELDS)
            .and_then(Value::as_array)
            .map(|results| results.iter().map(form_code).collect())
            .unwrap_or_default();
        by_team.insert(team_id, codes);
    }
    by_team
}

/// Rows plus recent form, merged by team id. This is what the client hands
/// to callers.
pub fn build_ladder(raw: &Value) -> Vec<LadderRow> {
    let form = recent_form_by_team(raw);
    let mut rows = normalize_ladder(raw);
    for row in &mut rows {
        if let Some(id) = &row.id
            && let Some(codes) = form.get(id)
        {
            row.form = codes.clone();
        }
    }
    rows
}
