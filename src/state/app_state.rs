use bc_api::scorers::PlayerStatsIndex;
use bc_api::{Competition, Division, Fixture, LadderRow, SavedTeam, StatsSummary};
use std::cmp::Ordering;

/// The active competition/division/team/round selection. Team and round
/// are display filters; competition and division drive what gets fetched.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub competition_id: Option<String>,
    pub division_id: Option<i64>,
    pub team_id: Option<String>,
    pub round_name: Option<String>,
}

/// A saved-team selection that should be applied once the matching
/// division/ladder data arrives (e.g. jumping to a favourite from another
/// division).
#[derive(Debug, Clone, Default)]
pub struct PendingSelection {
    pub division_id: Option<i64>,
    pub team_id: Option<String>,
}

#[derive(Debug, Default)]
pub struct AppState {
    pub competitions: Vec<Competition>,
    pub divisions: Vec<Division>,
    pub ladder: Vec<LadderRow>,
    pub matches: Vec<Fixture>,
    pub player_stats: Option<PlayerStatsIndex>,
    pub summary: Option<StatsSummary>,
    pub saved_teams: Vec<SavedTeam>,
    pub selection: Selection,
    pub pending: PendingSelection,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Loading — called as network responses arrive
    // -----------------------------------------------------------------------

    /// Store the competition list and resolve the active competition: the
    /// configured default when any of its identifiers match, else the
    /// first entry.
    pub fn load_competitions(&mut self, competitions: Vec<Competition>, default_id: Option<&str>) {
        let preferred = default_id
            .filter(|wanted| !wanted.trim().is_empty())
            .and_then(|wanted| competitions.iter().find(|c| c.matches_identifier(wanted)));
        let chosen = preferred.or_else(|| competitions.first());
        self.selection.competition_id = chosen.and_then(|c| {
            c.id.clone().or_else(|| c.unique_key.clone())
        });
        self.competitions = competitions;
        self.divisions.clear();
        self.selection.division_id = None;
    }

    /// Store the division list, honoring a pending division selection
    /// when it exists in the new list; otherwise the first division.
    pub fn load_divisions(&mut self, divisions: Vec<Division>) {
        let pending_division = self.pending.division_id.take();
        let next = pending_division
            .filter(|id| divisions.iter().any(|d| d.id == *id))
            .or_else(|| divisions.first().map(|d| d.id));
        self.selection.division_id = next;
        if self.pending.team_id.is_none() {
            self.selection.team_id = None;
        }
        self.divisions = divisions;
    }

    /// Store a fresh ladder and re-resolve the selected team: a pending
    /// selection wins when its team is present; the current selection
    /// survives when still present; `remembered` (the persisted id) is
    /// tried last. Anything else clears the selection.
    pub fn load_ladder(&mut self, rows: Vec<LadderRow>, remembered: Option<&str>) {
        self.last_error = None;
        self.ladder = rows;

        let pending_team = self.pending.team_id.take();
        let next = [
            pending_team.as_deref(),
            self.selection.team_id.as_deref(),
            remembered,
        ]
        .into_iter()
        .flatten()
        .find(|id| self.ladder_team(id).is_some())
        .map(str::to_owned);
        self.selection.team_id = next;
    }

    pub fn load_matches(&mut self, matches: Vec<Fixture>) {
        self.last_error = None;
        self.matches = matches;
        // Drop a round filter that no longer exists in the new data.
        let stale = match &self.selection.round_name {
            Some(round) => !self.available_rounds().iter().any(|r| r == round),
            None => false,
        };
        if stale {
            self.selection.round_name = None;
        }
    }

    pub fn load_player_stats(&mut self, index: PlayerStatsIndex) {
        self.last_error = None;
        self.player_stats = Some(index);
    }

    pub fn load_summary(&mut self, summary: StatsSummary) {
        self.last_error = None;
        self.summary = Some(summary);
    }

    pub fn on_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn selected_competition(&self) -> Option<&Competition> {
        let wanted = self.selection.competition_id.as_deref()?;
        self.competitions.iter().find(|c| c.matches_identifier(wanted))
    }

    pub fn selected_division(&self) -> Option<&Division> {
        let wanted = self.selection.division_id?;
        self.divisions.iter().find(|d| d.id == wanted)
    }

    pub fn select_team(&mut self, team_id: Option<&str>) {
        self.selection.team_id = team_id.map(str::to_owned);
    }

    pub fn select_round(&mut self, round_name: Option<&str>) {
        self.selection.round_name = round_name.map(str::to_owned);
    }

    /// Jump to a saved team, possibly in another division: the division
    /// and team are remembered as pending and applied when their data
    /// arrives.
    pub fn select_saved_team(&mut self, team: &SavedTeam) {
        if let Some(competition) = &team.competition_id {
            self.selection.competition_id = Some(competition.clone());
        } else if let Some(key) = &team.competition_unique_key {
            self.selection.competition_id = Some(key.clone());
        }
        self.pending = PendingSelection {
            division_id: team.division_id,
            team_id: Some(team.id.clone()),
        };
        if let Some(division_id) = team.division_id {
            self.selection.division_id = Some(division_id);
        }
        self.selection.team_id = Some(team.id.clone());
    }

    pub fn ladder_team(&self, team_id: &str) -> Option<&LadderRow> {
        self.ladder
            .iter()
            .find(|row| row.id.as_deref() == Some(team_id))
    }

    pub fn selected_team(&self) -> Option<&LadderRow> {
        self.ladder_team(self.selection.team_id.as_deref()?)
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    /// Matches restricted by the selected team and round filters.
    pub fn filtered_matches(&self) -> Vec<&Fixture> {
        self.matches
            .iter()
            .filter(|m| match self.selection.team_id.as_deref() {
                Some(team_id) => m.involves_team(team_id),
                None => true,
            })
            .filter(|m| match self.selection.round_name.as_deref() {
                Some(round) => m.round_name.as_deref().map(str::trim) == Some(round),
                None => true,
            })
            .collect()
    }

    /// Distinct round names across the team-filtered matches, sorted with
    /// numeric awareness so "Round 10" follows "Round 9".
    pub fn available_rounds(&self) -> Vec<String> {
        let mut rounds: Vec<String> = Vec::new();
        for m in self.matches.iter().filter(|m| {
            match self.selection.team_id.as_deref() {
                Some(team_id) => m.involves_team(team_id),
                None => true,
            }
        }) {
            if let Some(name) = m.round_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
                && !rounds.iter().any(|r| r == name)
            {
                rounds.push(name.to_owned());
            }
        }
        rounds.sort_by(|a, b| natural_cmp(a, b));
        rounds
    }

    /// Player stats for a ladder team, id lookup with name fallback.
    pub fn player_stats_for(&self, row: &LadderRow) -> Option<&bc_api::TeamPlayerStats> {
        let index = self.player_stats.as_ref()?;
        let team_like = serde_json::json!({ "name": row.name });
        index.stats_for_team(row.id.as_deref(), Some(&team_like))
    }

    /// Saved teams enriched with whatever the current ladder/competition/
    /// division data knows about them.
    pub fn enriched_saved_teams(&self) -> Vec<SavedTeam> {
        self.saved_teams
            .iter()
            .filter(|team| !team.id.is_empty())
            .map(|team| {
                let ladder_row = self.ladder_team(&team.id);
                let name = ladder_row
                    .and_then(|row| row.name.clone())
                    .unwrap_or_else(|| {
                        if team.name.is_empty() {
                            format!("Team {}", team.id)
                        } else {
                            team.name.clone()
                        }
                    });
                let competition_name = team.competition_name.clone().or_else(|| {
                    team.competition_id
                        .as_deref()
                        .into_iter()
                        .chain(team.competition_unique_key.as_deref())
                        .find_map(|id| {
                            self.competitions
                                .iter()
                                .find(|c| c.matches_identifier(id))
                                .and_then(|c| c.name.clone())
                        })
                });
                let division_name = team
                    .division_name
                    .clone()
                    .or_else(|| {
                        team.division_id.and_then(|id| {
                            self.divisions
                                .iter()
                                .find(|d| d.id == id)
                                .and_then(|d| d.name.clone())
                        })
                    })
                    .or_else(|| ladder_row.and_then(|row| row.division_name.clone()));

                SavedTeam {
                    name,
                    competition_name,
                    division_name,
                    ..team.clone()
                }
            })
            .collect()
    }

    /// Saved teams that belong to the current competition/division
    /// selection and are present in the current ladder.
    pub fn saved_teams_for_selection(&self) -> Vec<SavedTeam> {
        let selection_ids: Vec<String> = self
            .selection
            .competition_id
            .iter()
            .cloned()
            .chain(self.selected_competition().into_iter().flat_map(|c| {
                c.identifiers().map(str::to_owned).collect::<Vec<_>>()
            }))
            .collect();

        self.enriched_saved_teams()
            .into_iter()
            .filter(|team| {
                let in_ladder = self.ladder_team(&team.id).is_some();
                if !in_ladder {
                    return false;
                }
                let matches_competition = team
                    .competition_id
                    .iter()
                    .chain(team.competition_unique_key.iter())
                    .any(|id| selection_ids.contains(id));
                if !matches_competition {
                    return false;
                }
                match self.selection.division_id {
                    None => true,
                    Some(selected) => {
                        team.division_id == Some(selected)
                            || self
                                .ladder_team(&team.id)
                                .and_then(|row| row.division_id)
                                == Some(selected)
                    }
                }
            })
            .collect()
    }
}

/// Compare strings segment-wise, treating digit runs as numbers, so round
/// labels sort the way people expect.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let na = take_number(&mut a_chars);
                    let nb = take_number(&mut b_chars);
                    match na.cmp(&nb) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    match ca
                        .to_lowercase()
                        .cmp(cb.to_lowercase())
                        .then_with(|| ca.cmp(&cb))
                    {
                        Ordering::Equal => {
                            a_chars.next();
                            b_chars.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u64 {
    let mut value = 0u64;
    while let Some(c) = chars.peek().copied() {
        let Some(digit) = c.to_digit(10) else { break };
        value = value.saturating_mul(10).saturating_add(u64::from(digit));
        chars.next();
    }
    value
}
