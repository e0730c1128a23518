//! Persisted favourite teams.
//!
//! Storage is an injected key-value interface rather than a module-level
//! cache, so the favourites logic is testable against an in-memory store
//! and the on-disk layout stays in one place. Keys are derived from the
//! organisation/competition/division context so favourites saved in one
//! division never leak into another.

use bc_api::SavedTeam;
use log::warn;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Minimal string key-value store, the localStorage stand-in.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// File-backed store: one JSON object per file, loaded eagerly and
/// rewritten on every mutation. Unreadable or corrupt files start empty —
/// favourites are a convenience, never worth failing startup over.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("could not create storage dir {}: {e}", parent.display());
            return;
        }
        match serde_json::to_string_pretty(&self.entries) {
            Ok(payload) => {
                if let Err(e) = std::fs::write(&self.path, payload) {
                    warn!("could not persist storage {}: {e}", self.path.display());
                }
            }
            Err(e) => warn!("could not serialize storage: {e}"),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_owned(), value);
        self.persist();
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.persist();
    }
}

/// Default storage location: `$XDG_CONFIG_HOME/hoopshub/storage.json`,
/// then `~/.config/hoopshub/storage.json`, then the working directory.
pub fn default_storage_path() -> PathBuf {
    if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME")
        && !config_dir.trim().is_empty()
    {
        return Path::new(&config_dir).join("hoopshub").join("storage.json");
    }
    if let Ok(home) = std::env::var("HOME")
        && !home.trim().is_empty()
    {
        return Path::new(&home)
            .join(".config")
            .join("hoopshub")
            .join("storage.json");
    }
    PathBuf::from("storage.json")
}

/// The organisation/competition/division context a favourites list is
/// keyed by. Absent parts keep their slot in the key, empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageScope {
    pub organisation_key: String,
    pub competition_id: Option<String>,
    pub division_id: Option<i64>,
}

impl StorageScope {
    fn suffix(&self) -> String {
        format!(
            "{}:{}:{}",
            self.organisation_key,
            self.competition_id.as_deref().unwrap_or(""),
            self.division_id.map(|id| id.to_string()).unwrap_or_default(),
        )
    }

    pub fn favourites_key(&self) -> String {
        format!("bc:favouriteTeams:{}", self.suffix())
    }

    pub fn selected_team_key(&self) -> String {
        format!("bc:selectedTeam:{}", self.suffix())
    }
}

/// Favourite-team persistence with upsert-by-id semantics.
pub struct Favourites {
    store: Box<dyn KeyValueStore + Send>,
}

impl Favourites {
    pub fn new(store: Box<dyn KeyValueStore + Send>) -> Self {
        Self { store }
    }

    /// Load the saved teams for a scope. Entries without an id and
    /// payloads that don't parse are dropped silently.
    pub fn load(&self, scope: &StorageScope) -> Vec<SavedTeam> {
        let Some(raw) = self.store.get(&scope.favourites_key()) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<SavedTeam>>(&raw) {
            Ok(teams) => teams.into_iter().filter(|t| !t.id.is_empty()).collect(),
            Err(e) => {
                warn!("discarding unreadable favourites for {}: {e}", scope.favourites_key());
                Vec::new()
            }
        }
    }

    fn save(&mut self, scope: &StorageScope, teams: &[SavedTeam]) {
        match serde_json::to_string(teams) {
            Ok(payload) => self.store.set(&scope.favourites_key(), payload),
            Err(e) => warn!("could not serialize favourites: {e}"),
        }
    }

    /// Insert or update by id; an existing record keeps its position.
    pub fn upsert(&mut self, scope: &StorageScope, team: SavedTeam) -> Vec<SavedTeam> {
        let mut teams = self.load(scope);
        match teams.iter_mut().find(|t| t.id == team.id) {
            Some(existing) => *existing = team,
            None => teams.push(team),
        }
        self.save(scope, &teams);
        teams
    }

    /// Remove a saved team; unknown ids are a no-op.
    pub fn remove(&mut self, scope: &StorageScope, team_id: &str) -> Vec<SavedTeam> {
        let mut teams = self.load(scope);
        teams.retain(|t| t.id != team_id);
        self.save(scope, &teams);
        teams
    }

    /// Save when absent, remove when present.
    pub fn toggle(&mut self, scope: &StorageScope, team: SavedTeam) -> Vec<SavedTeam> {
        let teams = self.load(scope);
        if teams.iter().any(|t| t.id == team.id) {
            self.remove(scope, &team.id)
        } else {
            self.upsert(scope, team)
        }
    }

    pub fn selected_team(&self, scope: &StorageScope) -> Option<String> {
        self.store
            .get(&scope.selected_team_key())
            .filter(|id| !id.is_empty())
    }

    pub fn set_selected_team(&mut self, scope: &StorageScope, team_id: Option<&str>) {
        match team_id {
            Some(id) => self.store.set(&scope.selected_team_key(), id.to_owned()),
            None => self.store.remove(&scope.selected_team_key()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> StorageScope {
        StorageScope {
            organisation_key: "org-1".into(),
            competition_id: Some("31".into()),
            division_id: Some(7),
        }
    }

    fn team(id: &str, name: &str) -> SavedTeam {
        SavedTeam {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn keys_embed_the_full_scope() {
        assert_eq!(scope().favourites_key(), "bc:favouriteTeams:org-1:31:7");
        let partial = StorageScope {
            organisation_key: "org-1".into(),
            ..Default::default()
        };
        assert_eq!(partial.favourites_key(), "bc:favouriteTeams:org-1::");
    }

    #[test]
    fn upsert_updates_in_place_by_id() {
        let mut favourites = Favourites::new(Box::new(MemoryStore::default()));
        favourites.upsert(&scope(), team("t1", "Hawks"));
        favourites.upsert(&scope(), team("t2", "Tigers"));
        let updated = favourites.upsert(&scope(), team("t1", "Hawks (new)"));
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].name, "Hawks (new)");
        assert_eq!(updated[1].id, "t2");
    }

    #[test]
    fn scopes_are_isolated() {
        let mut favourites = Favourites::new(Box::new(MemoryStore::default()));
        favourites.upsert(&scope(), team("t1", "Hawks"));
        let other = StorageScope {
            division_id: Some(8),
            ..scope()
        };
        assert!(favourites.load(&other).is_empty());
        assert_eq!(favourites.load(&scope()).len(), 1);
    }

    #[test]
    fn toggle_round_trips() {
        let mut favourites = Favourites::new(Box::new(MemoryStore::default()));
        let after_add = favourites.toggle(&scope(), team("t1", "Hawks"));
        assert_eq!(after_add.len(), 1);
        let after_remove = favourites.toggle(&scope(), team("t1", "Hawks"));
        assert!(after_remove.is_empty());
    }

    #[test]
    fn corrupt_payloads_load_as_empty() {
        let mut store = MemoryStore::default();
        store.set(&scope().favourites_key(), "not json".into());
        let favourites = Favourites::new(Box::new(store));
        assert!(favourites.load(&scope()).is_empty());
    }

    #[test]
    fn selected_team_persists_and_clears() {
        let mut favourites = Favourites::new(Box::new(MemoryStore::default()));
        favourites.set_selected_team(&scope(), Some("t1"));
        assert_eq!(favourites.selected_team(&scope()).as_deref(), Some("t1"));
        favourites.set_selected_team(&scope(), None);
        assert!(favourites.selected_team(&scope()).is_none());
    }
}
