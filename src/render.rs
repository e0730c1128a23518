//! Plain-text views of the normalized data. Absent values render as `–`;
//! stat columns that arrived as unparseable text render verbatim.

use bc_api::scorers::PlayerStatsIndex;
use bc_api::{Fixture, LadderRow, SavedTeam, StatValue, StatsSummary};
use chrono::{DateTime, Local, Utc};
use std::fmt::Write as _;

const ABSENT: &str = "–";

fn stat(value: &Option<StatValue>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| ABSENT.to_owned())
}

fn number(value: Option<f64>) -> String {
    value
        .map(|n| format!("{n}"))
        .unwrap_or_else(|| ABSENT.to_owned())
}

pub fn ladder_table(rows: &[LadderRow]) -> String {
    if rows.is_empty() {
        return "No ladder data available.\n".to_owned();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<28} {:>4} {:>4} {:>4} {:>6} {:>6} {:>5}  {}",
        "#", "Team", "P", "W", "L", "F", "A", "Pts", "Form"
    );
    for row in rows {
        let form: String = if row.form.is_empty() {
            ABSENT.to_owned()
        } else {
            row.form
                .iter()
                .map(|code| code.letter().to_string())
                .collect::<Vec<_>>()
                .join(" ")
        };
        let _ = writeln!(
            out,
            "{:>3}  {:<28} {:>4} {:>4} {:>4} {:>6} {:>6} {:>5}  {}",
            stat(&row.rank),
            row.name.as_deref().unwrap_or("Unknown team"),
            stat(&row.played),
            stat(&row.won),
            stat(&row.lost),
            stat(&row.points_for),
            stat(&row.points_against),
            stat(&row.points),
            form,
        );
    }
    out
}

pub fn fixtures_view(matches: &[&Fixture], now: DateTime<Utc>) -> String {
    if matches.is_empty() {
        return "No fixtures available.\n".to_owned();
    }

    let results: Vec<&&Fixture> = matches.iter().filter(|m| m.is_completed()).collect();
    let upcoming: Vec<&&Fixture> = matches.iter().filter(|m| m.is_upcoming(now)).collect();

    let mut out = String::new();
    if !results.is_empty() {
        out.push_str("Results\n");
        for m in &results {
            out.push_str(&match_line(m));
        }
    }
    if !upcoming.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("Upcoming fixtures\n");
        for m in &upcoming {
            out.push_str(&match_line(m));
        }
    }
    if results.is_empty() && upcoming.is_empty() {
        out.push_str("No matches in this round.\n");
    }
    out
}

fn match_line(m: &Fixture) -> String {
    let when = m
        .start_timestamp()
        .map(|ts| ts.with_timezone(&Local).format("%a %d %b %H:%M").to_string())
        .or_else(|| m.start_time.clone())
        .unwrap_or_else(|| "Date TBA".to_owned());
    let round = m
        .round_name
        .as_deref()
        .map(|name| format!("{name} · "))
        .unwrap_or_default();

    let mut line = format!(
        "  {round}{when}  {} {} – {} {}",
        m.team1.name.as_deref().unwrap_or("TBD"),
        number(m.team1_score),
        number(m.team2_score),
        m.team2.name.as_deref().unwrap_or("TBD"),
    );
    if let Some(status) = &m.result_status {
        let _ = write!(line, "  [{status}]");
    }
    if let Some(venue) = &m.venue {
        let _ = write!(line, "  @ {venue}");
        if let Some(court) = &m.court {
            let _ = write!(line, " · {court}");
        }
    }
    line.push('\n');
    line
}

pub fn scorers_table(index: &PlayerStatsIndex, limit: usize) -> String {
    if !index.has_data() {
        return "No scorer data available.\n".to_owned();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<24} {:<24} {:>6} {:>7} {:>7}",
        "Rank", "Player", "Team", "GP", "Pts", "PPG"
    );
    for (i, player) in index.leaders().iter().take(limit).enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<24} {:<24} {:>6} {:>7} {:>7}",
            i + 1,
            player.name,
            player.team_name.as_deref().unwrap_or(ABSENT),
            number(player.gp),
            number(player.pts),
            number(player.ppg),
        );
    }
    out
}

/// One team's player lines, already in canonical ranking order.
pub fn team_scorers(team: &bc_api::TeamPlayerStats) -> String {
    let mut out = format!(
        "Players — {}\n",
        team.team.name.as_deref().unwrap_or(&team.team_id)
    );
    for player in &team.players {
        let _ = writeln!(
            out,
            "  {:<24} {:>6} {:>7} {:>7}",
            player.name,
            number(player.gp),
            number(player.pts),
            number(player.ppg),
        );
    }
    out
}

pub fn summary_block(summary: &StatsSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Last updated: {}",
        summary
            .last_updated
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Upcoming games:  {}", summary.totals.games_upcoming);
    let _ = writeln!(out, "Completed games: {}", summary.totals.games_completed);
    let _ = writeln!(
        out,
        "Avg points (completed): {}",
        number(summary.points_avg)
    );
    if summary.leaders.is_empty() {
        let _ = writeln!(out, "Leaders: not currently available");
    } else {
        let _ = writeln!(out, "Leaders:");
        for leader in &summary.leaders {
            let rank = leader
                .rank
                .map(|r| format!(" (rank {r})"))
                .unwrap_or_default();
            let _ = writeln!(out, "  {}{rank}", leader.name);
        }
    }
    out
}

pub fn saved_teams_view(teams: &[SavedTeam]) -> String {
    if teams.is_empty() {
        return String::new();
    }
    let mut out = String::from("Saved teams\n");
    for team in teams {
        let mut line = format!("  ★ {}", team.name);
        if let Some(competition) = &team.competition_name {
            let _ = write!(line, " — {competition}");
        }
        if let Some(division) = &team.division_name {
            let _ = write!(line, " · {division}");
        }
        line.push('\n');
        out.push_str(&line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_api::{FixtureTeam, FormCode, SummaryTotals};
    use chrono::TimeZone;

    #[test]
    fn ladder_table_renders_absent_stats_and_text_stats() {
        let rows = vec![LadderRow {
            id: Some("t1".into()),
            name: Some("Hawks".into()),
            rank: Some(StatValue::Number(1.0)),
            played: Some(StatValue::Text("BYE".into())),
            form: vec![FormCode::Win, FormCode::Unknown],
            ..Default::default()
        }];
        let table = ladder_table(&rows);
        assert!(table.contains("Hawks"));
        assert!(table.contains("BYE"));
        assert!(table.contains("W –"));
        assert!(table.contains(ABSENT));
    }

    #[test]
    fn fixtures_view_splits_results_and_upcoming() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap();
        let done = Fixture {
            team1: FixtureTeam { id: None, name: Some("Hawks".into()) },
            team2: FixtureTeam { id: None, name: Some("Tigers".into()) },
            team1_score: Some(50.0),
            team2_score: Some(40.0),
            ..Default::default()
        };
        let soon = Fixture {
            team1: FixtureTeam { id: None, name: Some("Lions".into()) },
            team2: FixtureTeam { id: None, name: Some("Bears".into()) },
            start_time: Some("2026-09-01T10:00:00Z".into()),
            ..Default::default()
        };
        let text = fixtures_view(&[&done, &soon], now);
        assert!(text.contains("Results"));
        assert!(text.contains("Upcoming fixtures"));
        assert!(text.contains("Hawks 50 – 40 Tigers"));
        assert!(text.contains("Lions"));
    }

    #[test]
    fn summary_block_mentions_every_total() {
        let summary = StatsSummary {
            last_updated: Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).unwrap(),
            totals: SummaryTotals { games_upcoming: 3, games_completed: 5 },
            leaders: vec![],
            points_avg: Some(75.5),
        };
        let text = summary_block(&summary);
        assert!(text.contains("Upcoming games:  3"));
        assert!(text.contains("Completed games: 5"));
        assert!(text.contains("75.5"));
        assert!(text.contains("not currently available"));
    }
}
