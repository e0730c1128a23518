use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::favourites::{Favourites, KeyValueStore, StorageScope};
use crate::state::messages::NetworkResponse;
use bc_api::client::DivisionScope;
use bc_api::{LadderRow, SavedTeam};
use log::error;

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    favourites: Favourites,
}

impl App {
    pub fn new(settings: AppSettings, store: Box<dyn KeyValueStore + Send>) -> Self {
        Self {
            settings,
            state: AppState::new(),
            favourites: Favourites::new(store),
        }
    }

    // -----------------------------------------------------------------------
    // Network response handlers
    // -----------------------------------------------------------------------

    pub fn apply(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::CompetitionsLoaded { competitions } => {
                self.state.load_competitions(
                    competitions,
                    self.settings.default_competition_id.as_deref(),
                );
                self.reload_favourites();
            }
            NetworkResponse::DivisionsLoaded { divisions } => {
                self.state.load_divisions(divisions);
                self.reload_favourites();
            }
            NetworkResponse::LadderLoaded { rows } => {
                let remembered = self.favourites.selected_team(&self.storage_scope());
                self.state.load_ladder(rows, remembered.as_deref());
            }
            NetworkResponse::FixturesLoaded { matches } => self.state.load_matches(matches),
            NetworkResponse::PlayerStatsLoaded { index } => self.state.load_player_stats(index),
            NetworkResponse::SummaryLoaded { summary } => self.state.load_summary(summary),
            NetworkResponse::Error { message } => {
                error!("Network error: {message}");
                self.state.on_error(message);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Selection + favourites
    // -----------------------------------------------------------------------

    /// The storage key context for the current selection.
    pub fn storage_scope(&self) -> StorageScope {
        StorageScope {
            organisation_key: self.settings.organisation_key.clone(),
            competition_id: self.state.selection.competition_id.clone(),
            division_id: self.state.selection.division_id,
        }
    }

    /// The fetch scope for the current selection, once a competition with
    /// a unique key and a division are resolved.
    pub fn division_scope(&self) -> Option<DivisionScope> {
        let competition = self.state.selected_competition()?;
        let unique_key = competition
            .unique_key
            .clone()
            .or_else(|| competition.id.clone())?;
        Some(DivisionScope {
            organisation_key: self.settings.organisation_key.clone(),
            year_ref_id: self.settings.year_ref_id,
            competition_id: competition.id.clone(),
            competition_unique_key: unique_key,
            division_id: self.state.selection.division_id?,
        })
    }

    pub fn reload_favourites(&mut self) {
        self.state.saved_teams = self.favourites.load(&self.storage_scope());
    }

    pub fn select_team(&mut self, team_id: Option<&str>) {
        self.state.select_team(team_id);
        self.favourites
            .set_selected_team(&self.storage_scope(), team_id);
    }

    /// Pin/unpin a ladder team, capturing the current competition and
    /// division context on the stored record.
    pub fn toggle_favourite(&mut self, row: &LadderRow) {
        let Some(id) = row.id.clone() else {
            return;
        };
        let competition = self.state.selected_competition();
        let record = SavedTeam {
            name: row
                .name
                .clone()
                .unwrap_or_else(|| format!("Team {id}")),
            id,
            competition_id: competition.and_then(|c| c.id.clone()),
            competition_unique_key: competition.and_then(|c| c.unique_key.clone()),
            competition_name: competition.and_then(|c| c.name.clone()),
            division_id: self
                .state
                .selection
                .division_id
                .or(row.division_id),
            division_name: self
                .state
                .selected_division()
                .and_then(|d| d.name.clone())
                .or_else(|| row.division_name.clone()),
        };
        self.state.saved_teams = self.favourites.toggle(&self.storage_scope(), record);
    }

    pub fn remove_favourite(&mut self, team_id: &str) {
        self.state.saved_teams = self.favourites.remove(&self.storage_scope(), team_id);
        if self.state.selection.team_id.as_deref() == Some(team_id) {
            self.select_team(None);
        }
        if self.state.pending.team_id.as_deref() == Some(team_id) {
            self.state.pending.team_id = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::favourites::MemoryStore;
    use bc_api::Competition;

    fn settings() -> AppSettings {
        AppSettings {
            organisation_key: "org-1".into(),
            year_ref_id: 2026,
            default_competition_id: None,
            refresh_secs: 30,
        }
    }

    fn app() -> App {
        App::new(settings(), Box::new(MemoryStore::default()))
    }

    fn row(id: &str, name: &str) -> LadderRow {
        LadderRow {
            id: Some(id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn favourite_toggle_captures_the_selection_context() {
        let mut app = app();
        app.apply(NetworkResponse::CompetitionsLoaded {
            competitions: vec![Competition {
                id: Some("31".into()),
                unique_key: Some("comp-key".into()),
                name: Some("Winter League".into()),
            }],
        });
        app.apply(NetworkResponse::DivisionsLoaded {
            divisions: vec![bc_api::Division { id: 7, name: Some("U18".into()) }],
        });

        app.toggle_favourite(&row("t1", "Hawks"));
        assert_eq!(app.state.saved_teams.len(), 1);
        let saved = &app.state.saved_teams[0];
        assert_eq!(saved.competition_id.as_deref(), Some("31"));
        assert_eq!(saved.competition_unique_key.as_deref(), Some("comp-key"));
        assert_eq!(saved.division_id, Some(7));
        assert_eq!(saved.division_name.as_deref(), Some("U18"));

        app.toggle_favourite(&row("t1", "Hawks"));
        assert!(app.state.saved_teams.is_empty());
    }

    #[test]
    fn selected_team_survives_a_ladder_reload_via_storage() {
        let mut app = app();
        app.apply(NetworkResponse::CompetitionsLoaded {
            competitions: vec![Competition {
                id: Some("31".into()),
                unique_key: Some("comp-key".into()),
                name: None,
            }],
        });
        app.apply(NetworkResponse::DivisionsLoaded {
            divisions: vec![bc_api::Division { id: 7, name: None }],
        });
        app.apply(NetworkResponse::LadderLoaded {
            rows: vec![row("t1", "Hawks"), row("t2", "Tigers")],
        });

        app.select_team(Some("t2"));
        // A fresh state (same storage) re-resolves the persisted id.
        app.state.selection.team_id = None;
        app.apply(NetworkResponse::LadderLoaded {
            rows: vec![row("t1", "Hawks"), row("t2", "Tigers")],
        });
        assert_eq!(app.state.selection.team_id.as_deref(), Some("t2"));
    }

    #[test]
    fn division_scope_requires_a_resolved_selection() {
        let mut app = app();
        assert!(app.division_scope().is_none());
        app.apply(NetworkResponse::CompetitionsLoaded {
            competitions: vec![Competition {
                id: Some("31".into()),
                unique_key: Some("comp-key".into()),
                name: None,
            }],
        });
        assert!(app.division_scope().is_none());
        app.apply(NetworkResponse::DivisionsLoaded {
            divisions: vec![bc_api::Division { id: 7, name: None }],
        });
        let scope = app.division_scope().unwrap();
        assert_eq!(scope.competition_unique_key, "comp-key");
        assert_eq!(scope.division_id, 7);
    }

    #[test]
    fn removing_a_favourite_clears_a_matching_selection() {
        let mut app = app();
        app.apply(NetworkResponse::LadderLoaded { rows: vec![row("t1", "Hawks")] });
        app.toggle_favourite(&row("t1", "Hawks"));
        app.select_team(Some("t1"));
        app.remove_favourite("t1");
        assert!(app.state.saved_teams.is_empty());
        assert_eq!(app.state.selection.team_id, None);
    }
}
