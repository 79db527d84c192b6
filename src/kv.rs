use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{error, warn};

pub const NAMESPACE: &str = "rc_";

pub mod keys {
    pub const USER_PROFILE: &str = "user_profile";
    pub const CHECKLIST_PREFIX: &str = "checklist_";
    pub const CUSTOM_ITEMS: &str = "custom_items";
    pub const GOALS: &str = "goals";
    pub const GOAL_LOGS_PREFIX: &str = "goal_logs_";
    pub const PRAYER_CACHE_PREFIX: &str = "prayer_";
    pub const BOOKMARKED_INSIGHTS: &str = "bookmarked_insights";
    pub const INSIGHT_OF_DAY_PREFIX: &str = "insight_of_day_";
    pub const SETTINGS: &str = "settings";
    pub const ZIKR_PREFIX: &str = "zikr_";
}

#[derive(Debug, Clone)]
pub struct KvStore {
    namespace: String,
    entries: BTreeMap<String, Value>,
}

impl KvStore {
    pub fn new() -> Self {
        Self::with_entries(BTreeMap::new())
    }

    pub fn with_entries(entries: BTreeMap<String, Value>) -> Self {
        Self {
            namespace: NAMESPACE.to_string(),
            entries,
        }
    }

    pub fn entries(&self) -> &BTreeMap<String, Value> {
        &self.entries
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full = self.full_key(key);
        let value = self.entries.get(&full)?;
        match serde_json::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                warn!("ignoring unreadable entry {full}: {err}");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        let full = self.full_key(key);
        match serde_json::to_value(value) {
            Ok(json) => {
                self.entries.insert(full, json);
            }
            Err(err) => error!("failed to encode entry {full}: {err}"),
        }
    }

    pub fn delete(&mut self, key: &str) {
        let full = self.full_key(key);
        self.entries.remove(&full);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&self.full_key(key))
    }

    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let full_prefix = self.full_key(prefix);
        self.entries
            .range(full_prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&full_prefix))
            .map(|(key, _)| key[self.namespace.len()..].to_string())
            .collect()
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }
}

impl Default for KvStore {
    fn default() -> Self {
        Self::new()
    }
}
