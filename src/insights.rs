use crate::kv::{KvStore, keys};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Hadith,
    Quran,
    NamesOfAllah,
    Seerah,
    RamadhanFact,
    Dua,
    Quote,
}

impl InsightKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Hadith => "📜 Hadith",
            Self::Quran => "📖 Quran",
            Self::NamesOfAllah => "✨ Names of Allah",
            Self::Seerah => "📚 Seerah",
            Self::RamadhanFact => "🌙 Ramadhan Fact",
            Self::Dua => "🤲 Du'a",
            Self::Quote => "💬 Quote",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    pub id: String,
    pub kind: InsightKind,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arabic_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transliteration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
}

pub async fn load_catalog(path: &Path) -> Vec<Insight> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<Vec<Insight>>(&bytes) {
            Ok(catalog) => {
                info!("loaded {} insights from {}", catalog.len(), path.display());
                catalog
            }
            Err(err) => {
                warn!("failed to parse insight catalog: {err}");
                Vec::new()
            }
        },
        Err(err) => {
            warn!("insight catalog unavailable at {}: {err}", path.display());
            Vec::new()
        }
    }
}

fn day_key(date: NaiveDate) -> String {
    format!("{}{}", keys::INSIGHT_OF_DAY_PREFIX, date.format("%Y-%m-%d"))
}

pub fn pinned_id(store: &KvStore, today: NaiveDate) -> Option<String> {
    store.get(&day_key(today))
}

pub fn daily_insight<'a>(
    store: &mut KvStore,
    catalog: &'a [Insight],
    observance_day: u32,
    today: NaiveDate,
) -> Option<&'a Insight> {
    if let Some(saved) = pinned_id(store, today) {
        if let Some(found) = catalog.iter().find(|insight| insight.id == saved) {
            return Some(found);
        }
    }

    if catalog.is_empty() {
        return None;
    }
    let index = (observance_day.max(1) as usize - 1) % catalog.len();
    let selected = &catalog[index];
    store.set(&day_key(today), &selected.id);
    Some(selected)
}

pub fn bookmarked_ids(store: &KvStore) -> Vec<String> {
    store.get(keys::BOOKMARKED_INSIGHTS).unwrap_or_default()
}

pub fn toggle_bookmark(store: &mut KvStore, insight_id: &str) -> bool {
    let mut ids = bookmarked_ids(store);
    let now_bookmarked = match ids.iter().position(|id| id == insight_id) {
        Some(index) => {
            ids.remove(index);
            false
        }
        None => {
            ids.push(insight_id.to_string());
            true
        }
    };
    store.set(keys::BOOKMARKED_INSIGHTS, &ids);
    now_bookmarked
}

pub fn bookmarked<'a>(store: &KvStore, catalog: &'a [Insight]) -> Vec<&'a Insight> {
    let ids = bookmarked_ids(store);
    catalog
        .iter()
        .filter(|insight| ids.contains(&insight.id))
        .collect()
}
