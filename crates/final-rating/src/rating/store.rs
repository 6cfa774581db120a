use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::config::{ConfigId, FinalRatingConfig, RatingRules};

/// Validated payload for creating or replacing a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub rules: RatingRules,
}

/// Storage port for rating configurations.
///
/// Implementations own the singleton-active invariant: [`ConfigStore::activate`]
/// must replace the active configuration in one step, and `is_active` on every
/// returned record reflects that single pointer.
pub trait ConfigStore: Send + Sync {
    fn list(&self) -> Result<Vec<FinalRatingConfig>, StoreError>;
    fn get(&self, id: ConfigId) -> Result<Option<FinalRatingConfig>, StoreError>;
    fn active(&self) -> Result<Option<FinalRatingConfig>, StoreError>;
    fn create(&self, config: NewConfig) -> Result<FinalRatingConfig, StoreError>;
    /// Replaces name, description and rules, bumping `version`.
    fn update(&self, id: ConfigId, config: NewConfig) -> Result<FinalRatingConfig, StoreError>;
    fn delete(&self, id: ConfigId) -> Result<(), StoreError>;
    fn activate(&self, id: ConfigId) -> Result<FinalRatingConfig, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("config {0} not found")]
    NotFound(ConfigId),
    #[error("config {0} is active and cannot be deleted")]
    ActiveConfig(ConfigId),
    #[error("a config named '{0}' already exists")]
    DuplicateName(String),
    #[error("config store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default)]
struct ConfigTable {
    configs: BTreeMap<ConfigId, FinalRatingConfig>,
    next_id: u64,
    active: Option<ConfigId>,
}

impl ConfigTable {
    fn view(&self, config: &FinalRatingConfig) -> FinalRatingConfig {
        let mut config = config.clone();
        config.is_active = self.active == Some(config.id);
        config
    }

    fn name_taken(&self, name: &str, except: Option<ConfigId>) -> bool {
        self.configs
            .values()
            .any(|config| Some(config.id) != except && config.name.eq_ignore_ascii_case(name))
    }
}

/// Process-local store. Every operation runs under one lock, so activation
/// can never expose zero or two active configurations.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    table: Mutex<ConfigTable>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, ConfigTable>, StoreError> {
        self.table
            .lock()
            .map_err(|_| StoreError::Unavailable("config table lock poisoned".to_string()))
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn list(&self) -> Result<Vec<FinalRatingConfig>, StoreError> {
        let table = self.table()?;
        Ok(table.configs.values().map(|config| table.view(config)).collect())
    }

    fn get(&self, id: ConfigId) -> Result<Option<FinalRatingConfig>, StoreError> {
        let table = self.table()?;
        Ok(table.configs.get(&id).map(|config| table.view(config)))
    }

    fn active(&self) -> Result<Option<FinalRatingConfig>, StoreError> {
        let table = self.table()?;
        Ok(table
            .active
            .and_then(|id| table.configs.get(&id))
            .map(|config| table.view(config)))
    }

    fn create(&self, config: NewConfig) -> Result<FinalRatingConfig, StoreError> {
        let mut table = self.table()?;
        if table.name_taken(&config.name, None) {
            return Err(StoreError::DuplicateName(config.name));
        }

        table.next_id += 1;
        let now = Utc::now();
        let stored = FinalRatingConfig {
            id: ConfigId(table.next_id),
            name: config.name,
            description: config.description,
            version: 1,
            is_active: false,
            rules: config.rules,
            created_at: now,
            updated_at: now,
        };
        table.configs.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn update(&self, id: ConfigId, config: NewConfig) -> Result<FinalRatingConfig, StoreError> {
        let mut table = self.table()?;
        if table.name_taken(&config.name, Some(id)) {
            return Err(StoreError::DuplicateName(config.name));
        }

        let stored = table.configs.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        stored.name = config.name;
        stored.description = config.description;
        stored.rules = config.rules;
        stored.version += 1;
        stored.updated_at = Utc::now();

        let stored = stored.clone();
        Ok(table.view(&stored))
    }

    fn delete(&self, id: ConfigId) -> Result<(), StoreError> {
        let mut table = self.table()?;
        if table.active == Some(id) {
            return Err(StoreError::ActiveConfig(id));
        }
        table
            .configs
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    fn activate(&self, id: ConfigId) -> Result<FinalRatingConfig, StoreError> {
        let mut table = self.table()?;
        if !table.configs.contains_key(&id) {
            return Err(StoreError::NotFound(id));
        }
        table.active = Some(id);
        let config = table.configs.get(&id).ok_or(StoreError::NotFound(id))?;
        Ok(table.view(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn new_config(name: &str) -> NewConfig {
        NewConfig {
            name: name.to_string(),
            description: None,
            rules: RatingRules::default_structure(),
        }
    }

    #[test]
    fn creation_does_not_activate() {
        let store = InMemoryConfigStore::new();
        let created = store.create(new_config("Q1")).expect("created");

        assert_eq!(created.version, 1);
        assert!(!created.is_active);
        assert!(store.active().expect("readable").is_none());
    }

    #[test]
    fn activation_moves_the_single_active_flag() {
        let store = InMemoryConfigStore::new();
        let first = store.create(new_config("Q1")).expect("created");
        let second = store.create(new_config("Q2")).expect("created");

        store.activate(first.id).expect("activated");
        store.activate(second.id).expect("activated");

        let active: Vec<ConfigId> = store
            .list()
            .expect("listed")
            .into_iter()
            .filter(|config| config.is_active)
            .map(|config| config.id)
            .collect();
        assert_eq!(active, vec![second.id]);
    }

    #[test]
    fn concurrent_activation_leaves_exactly_one_active() {
        let store = Arc::new(InMemoryConfigStore::new());
        let ids: Vec<ConfigId> = (0..8)
            .map(|n| store.create(new_config(&format!("cfg-{n}"))).expect("created").id)
            .collect();

        thread::scope(|scope| {
            for id in &ids {
                let store = Arc::clone(&store);
                scope.spawn(move || store.activate(*id).expect("activated"));
            }
        });

        let active = store
            .list()
            .expect("listed")
            .iter()
            .filter(|config| config.is_active)
            .count();
        assert_eq!(active, 1);
    }

    #[test]
    fn update_bumps_version() {
        let store = InMemoryConfigStore::new();
        let created = store.create(new_config("Q1")).expect("created");

        let mut replacement = new_config("Q1 revised");
        replacement.rules.tickets_resolved.points_per_ticket = 3.0;
        let updated = store.update(created.id, replacement).expect("updated");

        assert_eq!(updated.version, 2);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.rules.tickets_resolved.points_per_ticket, 3.0);
    }

    #[test]
    fn active_config_cannot_be_deleted() {
        let store = InMemoryConfigStore::new();
        let created = store.create(new_config("Q1")).expect("created");
        store.activate(created.id).expect("activated");

        assert!(matches!(
            store.delete(created.id),
            Err(StoreError::ActiveConfig(_))
        ));
        assert!(matches!(
            store.delete(ConfigId(99)),
            Err(StoreError::NotFound(ConfigId(99)))
        ));
    }

    #[test]
    fn names_are_unique_case_insensitively() {
        let store = InMemoryConfigStore::new();
        store.create(new_config("Quarterly")).expect("created");
        assert!(matches!(
            store.create(new_config("quarterly")),
            Err(StoreError::DuplicateName(_))
        ));
    }
}
