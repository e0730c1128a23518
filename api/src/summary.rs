//! Derived aggregates over normalized ladder and fixture data.

use crate::{Fixture, LadderRow, LeaderEntry, StatsSummary, SummaryTotals};
use chrono::{DateTime, Utc};

/// Single pass over the match list: completed games accumulate combined
/// points; games with a parseable, strictly-future start time count as
/// upcoming. (This totals counter deliberately keeps the strict policy —
/// `Fixture::is_upcoming` is the lenient display classifier.)
pub fn compute_summary(
    ladder: &[LadderRow],
    matches: &[Fixture],
    now: DateTime<Utc>,
) -> StatsSummary {
    let mut completed = 0u32;
    let mut upcoming = 0u32;
    let mut total_points = 0.0f64;
    let mut games_with_points = 0u32;

    for m in matches {
        if let (Some(s1), Some(s2)) = (m.team1_score, m.team2_score) {
            completed += 1;
            total_points += s1 + s2;
            games_with_points += 1;
        } else if m.start_timestamp().is_some_and(|ts| ts > now) {
            upcoming += 1;
        }
    }

    let points_avg = (games_with_points > 0)
        .then(|| round2(total_points / f64::from(games_with_points)));

    StatsSummary {
        last_updated: now,
        totals: SummaryTotals {
            games_upcoming: upcoming,
            games_completed: completed,
        },
        leaders: compute_leaders(ladder, matches),
        points_avg,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Top three teams. Ranked ladder rows win (missing ranks sort last);
/// without any rank data the first three named rows stand in; with an
/// empty ladder the first three distinct team names seen across the match
/// list do, in list order.
pub fn compute_leaders(ladder: &[LadderRow], matches: &[Fixture]) -> Vec<LeaderEntry> {
    let mut named: Vec<&LadderRow> = ladder.iter().filter(|row| row.name.is_some()).collect();
    if !named.is_empty() {
        if named.iter().any(|row| row.rank_value().is_some()) {
            named.sort_by(|a, b| {
                a.rank_value()
                    .unwrap_or(f64::INFINITY)
                    .total_cmp(&b.rank_value().unwrap_or(f64::INFINITY))
            });
        }
        return named
            .iter()
            .take(3)
            .map(|row| LeaderEntry {
                id: row.id.clone(),
                name: row.name.clone().unwrap_or_default(),
                rank: row.rank_value(),
            })
            .collect();
    }

    let mut seen = Vec::new();
    for m in matches {
        for name in [&m.team1.name, &m.team2.name].into_iter().flatten() {
            if !seen.contains(name) {
                seen.push(name.clone());
                if seen.len() == 3 {
                    return leaders_from_names(seen);
                }
            }
        }
    }
    leaders_from_names(seen)
}

fn leaders_from_names(names: Vec<String>) -> Vec<LeaderEntry> {
    names
        .into_iter()
        .map(|name| LeaderEntry {
            id: Some(name.clone()),
            name,
            rank: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FixtureTeam, StatValue};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap()
    }

    fn completed(s1: f64, s2: f64) -> Fixture {
        Fixture {
            team1_score: Some(s1),
            team2_score: Some(s2),
            ..Default::default()
        }
    }

    fn row(name: &str, rank: Option<f64>) -> LadderRow {
        LadderRow {
            id: Some(name.to_lowercase()),
            name: Some(name.to_owned()),
            rank: rank.map(StatValue::Number),
            ..Default::default()
        }
    }

    #[test]
    fn empty_inputs_produce_zero_totals_and_no_leaders() {
        let summary = compute_summary(&[], &[], now());
        assert_eq!(summary.totals.games_upcoming, 0);
        assert_eq!(summary.totals.games_completed, 0);
        assert_eq!(summary.points_avg, None);
        assert!(summary.leaders.is_empty());
    }

    #[test]
    fn completed_games_average_their_combined_points() {
        let matches = vec![completed(40.0, 35.0), completed(38.0, 37.0)];
        let summary = compute_summary(&[], &matches, now());
        assert_eq!(summary.totals.games_completed, 2);
        assert_eq!(summary.points_avg, Some(75.0));
    }

    #[test]
    fn points_average_rounds_to_two_decimals() {
        let matches = vec![
            completed(10.0, 10.0),
            completed(10.0, 10.0),
            completed(10.0, 11.0),
        ];
        // 61 points over 3 games.
        let summary = compute_summary(&[], &matches, now());
        assert_eq!(summary.points_avg, Some(20.33));
    }

    #[test]
    fn upcoming_requires_a_parseable_strictly_future_start() {
        let future = Fixture {
            start_time: Some("2026-08-07T12:00:01Z".into()),
            ..Default::default()
        };
        let boundary = Fixture {
            start_time: Some("2026-08-07T12:00:00Z".into()),
            ..Default::default()
        };
        let unparseable = Fixture {
            start_time: Some("soon".into()),
            ..Default::default()
        };
        let summary = compute_summary(&[], &[future, boundary, unparseable], now());
        assert_eq!(summary.totals.games_upcoming, 1);
        assert_eq!(summary.totals.games_completed, 0);
    }

    #[test]
    fn leaders_sort_by_rank_with_missing_ranks_last() {
        let ladder = vec![
            row("Unranked", None),
            row("Second", Some(2.0)),
            row("First", Some(1.0)),
            row("Third", Some(3.0)),
        ];
        let leaders = compute_leaders(&ladder, &[]);
        let names: Vec<_> = leaders.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
        assert_eq!(leaders[0].rank, Some(1.0));
    }

    #[test]
    fn leaders_without_rank_data_keep_ladder_order() {
        let ladder = vec![row("A", None), row("B", None), row("C", None), row("D", None)];
        let leaders = compute_leaders(&ladder, &[]);
        let names: Vec<_> = leaders.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert!(leaders.iter().all(|l| l.rank.is_none()));
    }

    #[test]
    fn leaders_fall_back_to_distinct_match_team_names() {
        let matches = vec![
            Fixture {
                team1: FixtureTeam { id: None, name: Some("Hawks".into()) },
                team2: FixtureTeam { id: None, name: Some("Tigers".into()) },
                ..Default::default()
            },
            Fixture {
                team1: FixtureTeam { id: None, name: Some("Hawks".into()) },
                team2: FixtureTeam { id: None, name: Some("Lions".into()) },
                ..Default::default()
            },
        ];
        let leaders = compute_leaders(&[], &matches);
        let names: Vec<_> = leaders.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Hawks", "Tigers", "Lions"]);
        assert_eq!(leaders[0].id.as_deref(), Some("Hawks"));
    }
}
