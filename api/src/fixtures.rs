//! Fixture normalization: flattens the rounds → matches tree into a flat
//! match list with canonical score and start-time fields.

use crate::value::{pick_string, resolve};
use crate::{Fixture, FixtureTeam};
use serde_json::Value;

const START_TIME_FIELDS: &[&[&str]] = &[&["startTime"], &["originalStartTime"]];
const TEAM1_ID_FIELDS: &[&[&str]] = &[&["team1", "id"], &["team1Id"]];
const TEAM1_NAME_FIELDS: &[&[&str]] = &[&["team1", "name"], &["team1Name"]];
const TEAM2_ID_FIELDS: &[&[&str]] = &[&["team2", "id"], &["team2Id"]];
const TEAM2_NAME_FIELDS: &[&[&str]] = &[&["team2", "name"], &["team2Name"]];

/// Flatten all matches across all rounds. Each match carries its own
/// round name when it has one, otherwise the containing round's.
pub fn normalize_fixtures(raw: &Value) -> Vec<Fixture> {
    let Some(rounds) = raw.get("rounds").and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut fixtures = Vec::new();
    for round in rounds {
        let round_name = pick_string(round, &[&["name"]]);
        let Some(matches) = round.get("matches").and_then(Value::as_array) else {
            continue;
        };
        for m in matches {
            fixtures.push(map_match(m, round_name.as_deref()));
        }
    }
    fixtures
}

fn map_match(m: &Value, containing_round: Option<&str>) -> Fixture {
    let round_name = match m.get("round").filter(|r| !r.is_null()) {
        Some(round) => pick_string(round, &[&["name"]]),
        None => containing_round.map(str::to_owned),
    };

    Fixture {
        id: pick_string(m, &[&["id"]]),
        round_name,
        team1: FixtureTeam {
            id: pick_string(m, TEAM1_ID_FIELDS),
            name: pick_string(m, TEAM1_NAME_FIELDS),
        },
        team2: FixtureTeam {
            id: pick_string(m, TEAM2_ID_FIELDS),
            name: pick_string(m, TEAM2_NAME_FIELDS),
        },
        // Only wire numbers count as scores; string scores stay absent.
        team1_score: m.get("team1Score").and_then(Value::as_f64),
        team2_score: m.get("team2Score").and_then(Value::as_f64),
        start_time: pick_string(m, START_TIME_FIELDS),
        result_status: pick_string(m, &[&["resultStatus"]]),
        venue: resolve(m, &["venueCourt", "venue", "name"])
            .and_then(Value::as_str)
            .map(str::to_owned),
        court: resolve(m, &["venueCourt", "name"])
            .and_then(Value::as_str)
            .map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn string_scores_become_absent_and_round_name_is_inherited() {
        let raw = json!({"rounds": [{
            "name": "R1",
            "matches": [{"id": 1, "team1Score": "10", "team2Score": null}],
        }]});
        let fixtures = normalize_fixtures(&raw);
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].team1_score, None);
        assert_eq!(fixtures[0].team2_score, None);
        assert_eq!(fixtures[0].round_name.as_deref(), Some("R1"));
        assert!(!fixtures[0].is_completed());
    }

    #[test]
    fn a_matchs_own_round_beats_the_containing_round() {
        let raw = json!({"rounds": [{
            "name": "Round 3",
            "matches": [{"id": 1, "round": {"name": "Round 3 (replay)"}}],
        }]});
        let fixtures = normalize_fixtures(&raw);
        assert_eq!(fixtures[0].round_name.as_deref(), Some("Round 3 (replay)"));
    }

    #[test]
    fn start_time_falls_back_to_original_start_time() {
        let raw = json!({"rounds": [{"name": "R1", "matches": [
            {"id": 1, "originalStartTime": "2026-08-01T09:00:00Z"},
            {"id": 2, "startTime": "", "originalStartTime": "2026-08-02T09:00:00Z"},
        ]}]});
        let fixtures = normalize_fixtures(&raw);
        assert_eq!(
            fixtures[0].start_time.as_deref(),
            Some("2026-08-01T09:00:00Z")
        );
        assert_eq!(
            fixtures[1].start_time.as_deref(),
            Some("2026-08-02T09:00:00Z")
        );
    }

    #[test]
    fn rounds_flatten_in_order_with_scores_passed_through() {
        let raw = json!({"rounds": [
            {"name": "R1", "matches": [
                {"id": 1, "team1Score": 44, "team2Score": 31,
                 "team1": {"id": 7, "name": "Hawks"}, "team2": {"id": 8, "name": "Tigers"},
                 "venueCourt": {"name": "Court 2", "venue": {"name": "City Stadium"}}},
            ]},
            {"name": "R2", "matches": [{"id": 2}]},
        ]});
        let fixtures = normalize_fixtures(&raw);
        assert_eq!(fixtures.len(), 2);
        assert_eq!(fixtures[0].team1_score, Some(44.0));
        assert_eq!(fixtures[0].team2_score, Some(31.0));
        assert!(fixtures[0].is_completed());
        assert_eq!(fixtures[0].team1.name.as_deref(), Some("Hawks"));
        assert_eq!(fixtures[0].venue.as_deref(), Some("City Stadium"));
        assert_eq!(fixtures[0].court.as_deref(), Some("Court 2"));
        assert_eq!(fixtures[1].round_name.as_deref(), Some("R2"));
    }

    #[test]
    fn payloads_without_rounds_yield_empty() {
        assert!(normalize_fixtures(&json!({"message": "oops"})).is_empty());
        assert!(normalize_fixtures(&json!(null)).is_empty());
    }

    #[test]
    fn upcoming_uses_at_or_after_now_and_treats_unparseable_as_upcoming() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let at_boundary = Fixture {
            start_time: Some("2026-08-07T12:00:00Z".into()),
            ..Default::default()
        };
        let past = Fixture {
            start_time: Some("2026-08-07T11:59:59Z".into()),
            ..Default::default()
        };
        let unparseable = Fixture {
            start_time: Some("next tuesday".into()),
            ..Default::default()
        };
        let missing = Fixture::default();
        assert!(at_boundary.is_upcoming(now));
        assert!(!past.is_upcoming(now));
        assert!(unparseable.is_upcoming(now));
        assert!(missing.is_upcoming(now));
    }

    #[test]
    fn completed_matches_are_never_upcoming() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let done = Fixture {
            team1_score: Some(50.0),
            team2_score: Some(40.0),
            start_time: Some("2026-09-01T12:00:00Z".into()),
            ..Default::default()
        };
        assert!(!done.is_upcoming(now));
    }
}
