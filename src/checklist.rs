use crate::kv::{KvStore, keys};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_ITEMS: [(&str, &str, &str); 12] = [
    ("fajr", "Fajr Prayer", "🌙"),
    ("dhuhr", "Dhuhr Prayer", "☀️"),
    ("asr", "Asr Prayer", "🌤️"),
    ("maghrib", "Maghrib Prayer", "🌅"),
    ("isha", "Isha Prayer", "🌃"),
    ("tarawih", "Tarawih Prayer", "⭐"),
    ("quran", "Recite Quran", "📖"),
    ("zikr", "Zikr / Dhikr", "📿"),
    ("suhoor", "Suhoor", "🍽️"),
    ("iftar", "Iftar", "🌙"),
    ("sadaqah", "Sadaqah", "💚"),
    ("dua", "Personal Du'a", "🤲"),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomData {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChecklistItemRecord {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub custom_data: Option<CustomData>,
    pub is_custom: bool,
    pub order: usize,
}

impl ChecklistItemRecord {
    fn mark_completed(&mut self, now: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(now);
    }

    fn mark_open(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyChecklistRecord {
    pub date: NaiveDate,
    pub items: Vec<ChecklistItemRecord>,
}

impl DailyChecklistRecord {
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    pub fn item(&self, id: &str) -> Option<&ChecklistItemRecord> {
        self.items.iter().find(|item| item.id == id)
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut ChecklistItemRecord> {
        self.items.iter_mut().find(|item| item.id == id)
    }
}

pub fn record_key(date: NaiveDate) -> String {
    format!("{}{}", keys::CHECKLIST_PREFIX, date.format("%Y-%m-%d"))
}

pub fn load_record(store: &KvStore, date: NaiveDate) -> Option<DailyChecklistRecord> {
    store
        .get::<DailyChecklistRecord>(&record_key(date))
        .filter(|record| record.date == date)
}

pub fn custom_templates(store: &KvStore) -> Vec<ChecklistItemRecord> {
    store.get(keys::CUSTOM_ITEMS).unwrap_or_default()
}

fn next_order(items: &[ChecklistItemRecord]) -> usize {
    items.iter().map(|item| item.order).max().map_or(0, |max| max + 1)
}

fn default_record(date: NaiveDate, templates: &[ChecklistItemRecord]) -> DailyChecklistRecord {
    let defaults = DEFAULT_ITEMS
        .iter()
        .enumerate()
        .map(|(order, (id, label, icon))| ChecklistItemRecord {
            id: id.to_string(),
            label: label.to_string(),
            icon: icon.to_string(),
            completed: false,
            completed_at: None,
            custom_data: None,
            is_custom: false,
            order,
        });

    let customs = templates
        .iter()
        .enumerate()
        .map(|(index, template)| ChecklistItemRecord {
            completed: false,
            completed_at: None,
            custom_data: None,
            is_custom: true,
            order: DEFAULT_ITEMS.len() + index,
            ..template.clone()
        });

    DailyChecklistRecord {
        date,
        items: defaults.chain(customs).collect(),
    }
}

#[derive(Debug, Default)]
pub struct ChecklistStore {
    today: Option<DailyChecklistRecord>,
}

impl ChecklistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> Option<&DailyChecklistRecord> {
        self.today.as_ref()
    }

    pub fn load_today(&mut self, store: &mut KvStore, today: NaiveDate) -> &DailyChecklistRecord {
        let record = match load_record(store, today) {
            Some(existing) => existing,
            None => {
                let created = default_record(today, &custom_templates(store));
                debug!(date = %today, items = created.items.len(), "created checklist record");
                store.set(&record_key(today), &created);
                created
            }
        };
        self.today.insert(record)
    }

    pub fn toggle_item(&mut self, store: &mut KvStore, id: &str, now: DateTime<Utc>) -> bool {
        self.mutate(store, |record| {
            let Some(item) = record.item_mut(id) else {
                return false;
            };
            if item.completed {
                item.mark_open();
            } else {
                item.mark_completed(now);
            }
            true
        })
    }

    pub fn update_item_data(
        &mut self,
        store: &mut KvStore,
        id: &str,
        value: f64,
        unit: &str,
        now: DateTime<Utc>,
    ) -> bool {
        self.mutate(store, |record| {
            let Some(item) = record.item_mut(id) else {
                return false;
            };
            item.custom_data = Some(CustomData {
                value,
                unit: unit.to_string(),
            });
            item.mark_completed(now);
            true
        })
    }

    pub fn add_custom_item(
        &mut self,
        store: &mut KvStore,
        label: &str,
        icon: &str,
        now: DateTime<Utc>,
    ) -> ChecklistItemRecord {
        let mut templates = custom_templates(store);
        let item = ChecklistItemRecord {
            id: unique_custom_id(&templates, self.today.as_ref(), now),
            label: label.to_string(),
            icon: icon.to_string(),
            completed: false,
            completed_at: None,
            custom_data: None,
            is_custom: true,
            order: next_order(&templates).max(DEFAULT_ITEMS.len()),
        };
        templates.push(item.clone());
        store.set(keys::CUSTOM_ITEMS, &templates);

        self.mutate(store, |record| {
            let mut live = item.clone();
            live.order = next_order(&record.items);
            record.items.push(live);
            true
        });
        item
    }

    pub fn remove_custom_item(&mut self, store: &mut KvStore, id: &str) -> bool {
        if !self.is_custom(store, id) {
            return false;
        }

        let mut templates = custom_templates(store);
        let before = templates.len();
        templates.retain(|template| template.id != id);
        let template_removed = templates.len() != before;
        if template_removed {
            store.set(keys::CUSTOM_ITEMS, &templates);
        }

        let live_removed = self.mutate(store, |record| {
            let before = record.items.len();
            record.items.retain(|item| !(item.is_custom && item.id == id));
            record.items.len() != before
        });
        template_removed || live_removed
    }

    pub fn rename_custom_item(&mut self, store: &mut KvStore, id: &str, new_label: &str) -> bool {
        if !self.is_custom(store, id) {
            return false;
        }

        let mut templates = custom_templates(store);
        let template_renamed = match templates.iter_mut().find(|template| template.id == id) {
            Some(template) => {
                template.label = new_label.to_string();
                true
            }
            None => false,
        };
        if template_renamed {
            store.set(keys::CUSTOM_ITEMS, &templates);
        }

        let live_renamed = self.mutate(store, |record| match record.item_mut(id) {
            Some(item) => {
                item.label = new_label.to_string();
                true
            }
            None => false,
        });
        template_renamed || live_renamed
    }

    pub fn completed_count(&self) -> usize {
        self.today.as_ref().map_or(0, DailyChecklistRecord::completed_count)
    }

    pub fn total_count(&self) -> usize {
        self.today.as_ref().map_or(0, DailyChecklistRecord::total_count)
    }

    fn is_custom(&self, store: &KvStore, id: &str) -> bool {
        if DEFAULT_ITEMS.iter().any(|(default_id, _, _)| *default_id == id) {
            return false;
        }
        let in_templates = custom_templates(store).iter().any(|template| template.id == id);
        let in_today = self
            .today
            .as_ref()
            .and_then(|record| record.item(id))
            .is_some_and(|item| item.is_custom);
        in_templates || in_today
    }

    fn mutate<F>(&mut self, store: &mut KvStore, change: F) -> bool
    where
        F: FnOnce(&mut DailyChecklistRecord) -> bool,
    {
        let Some(record) = self.today.as_mut() else {
            return false;
        };
        if !change(record) {
            return false;
        }
        store.set(&record_key(record.date), &*record);
        true
    }
}

fn unique_custom_id(
    templates: &[ChecklistItemRecord],
    today: Option<&DailyChecklistRecord>,
    now: DateTime<Utc>,
) -> String {
    let taken = |candidate: &str| {
        templates.iter().any(|template| template.id == candidate)
            || today.is_some_and(|record| record.item(candidate).is_some())
    };

    let mut millis = now.timestamp_millis();
    loop {
        let candidate = format!("custom_{millis}");
        if !taken(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap()
    }

    fn assert_completion_consistent(record: &DailyChecklistRecord) {
        for item in &record.items {
            assert_eq!(item.completed, item.completed_at.is_some(), "item {}", item.id);
        }
    }

    #[test]
    fn default_record_has_twelve_open_items() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        let record = checklist.load_today(&mut store, day(1)).clone();

        assert_eq!(record.items.len(), 12);
        assert_eq!(record.items[0].id, "fajr");
        assert_eq!(record.items[11].id, "dua");
        assert!(record.items.iter().enumerate().all(|(i, item)| item.order == i));
        assert_eq!(checklist.completed_count(), 0);
        assert_eq!(checklist.total_count(), 12);
        assert!(store.contains(&record_key(day(1))));
    }

    #[test]
    fn load_today_is_idempotent() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));
        checklist.toggle_item(&mut store, "quran", at(5));
        let first = checklist.load_today(&mut store, day(1)).clone();
        let second = checklist.load_today(&mut store, day(1)).clone();

        assert_eq!(first, second);
        assert!(first.item("quran").unwrap().completed);
    }

    #[test]
    fn toggling_fajr_twice_restores_count() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));

        assert!(checklist.toggle_item(&mut store, "fajr", at(5)));
        assert_eq!(checklist.completed_count(), 1);
        assert_eq!(
            checklist.record().unwrap().item("fajr").unwrap().completed_at,
            Some(at(5))
        );
        assert_completion_consistent(checklist.record().unwrap());

        assert!(checklist.toggle_item(&mut store, "fajr", at(6)));
        assert_eq!(checklist.completed_count(), 0);
        assert_completion_consistent(checklist.record().unwrap());

        let persisted = load_record(&store, day(1)).unwrap();
        assert_eq!(persisted.completed_count(), 0);
    }

    #[test]
    fn unknown_ids_and_missing_record_are_ignored() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        assert!(!checklist.toggle_item(&mut store, "fajr", at(5)));
        assert!(store.entries().is_empty());

        checklist.load_today(&mut store, day(1));
        assert!(!checklist.toggle_item(&mut store, "nope", at(5)));
        assert!(!checklist.update_item_data(&mut store, "nope", 3.0, "pages", at(5)));
        assert_eq!(checklist.completed_count(), 0);
    }

    #[test]
    fn update_item_data_forces_completion() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));
        checklist.toggle_item(&mut store, "quran", at(4));

        assert!(checklist.update_item_data(&mut store, "quran", 12.0, "pages", at(9)));
        let item = checklist.record().unwrap().item("quran").unwrap().clone();
        assert!(item.completed);
        assert_eq!(item.completed_at, Some(at(9)));
        assert_eq!(
            item.custom_data,
            Some(CustomData {
                value: 12.0,
                unit: "pages".to_string()
            })
        );
        assert_completion_consistent(checklist.record().unwrap());
    }

    #[test]
    fn custom_items_reach_future_days_but_not_past_ones() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));

        let mut next = ChecklistStore::new();
        next.load_today(&mut store, day(2));
        let added = next.add_custom_item(&mut store, "Read tafsir", "✅", at(10));
        assert!(added.is_custom);
        assert_eq!(next.total_count(), 13);

        let past = load_record(&store, day(1)).unwrap();
        assert_eq!(past.total_count(), 12);

        let mut later = ChecklistStore::new();
        let future = later.load_today(&mut store, day(3)).clone();
        assert_eq!(future.total_count(), 13);
        let custom = future.item(&added.id).unwrap();
        assert_eq!(custom.order, 12);
        assert!(!custom.completed);
    }

    #[test]
    fn custom_ids_are_unique_within_the_same_millisecond() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));
        let first = checklist.add_custom_item(&mut store, "One", "✅", at(10));
        let second = checklist.add_custom_item(&mut store, "Two", "✅", at(10));
        assert_ne!(first.id, second.id);
        assert_eq!(custom_templates(&store).len(), 2);
    }

    #[test]
    fn removing_default_item_is_rejected() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));

        assert!(!checklist.remove_custom_item(&mut store, "fajr"));
        assert!(!checklist.rename_custom_item(&mut store, "fajr", "Dawn"));
        assert_eq!(checklist.total_count(), 12);
        assert_eq!(checklist.record().unwrap().item("fajr").unwrap().label, "Fajr Prayer");
    }

    #[test]
    fn rename_and_remove_custom_item() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));
        let added = checklist.add_custom_item(&mut store, "Walk", "🚶", at(7));

        assert!(checklist.rename_custom_item(&mut store, &added.id, "Evening walk"));
        assert_eq!(custom_templates(&store)[0].label, "Evening walk");
        assert_eq!(
            load_record(&store, day(1)).unwrap().item(&added.id).unwrap().label,
            "Evening walk"
        );

        assert!(checklist.remove_custom_item(&mut store, &added.id));
        assert!(custom_templates(&store).is_empty());
        assert_eq!(checklist.total_count(), 12);
        assert!(!checklist.remove_custom_item(&mut store, &added.id));
    }

    #[test]
    fn custom_item_added_after_removal_gets_fresh_order() {
        let mut store = KvStore::new();
        let mut checklist = ChecklistStore::new();
        checklist.load_today(&mut store, day(1));
        let first = checklist.add_custom_item(&mut store, "Walk", "🚶", at(7));
        let second = checklist.add_custom_item(&mut store, "Call parents", "📞", at(8));
        assert!(checklist.remove_custom_item(&mut store, &first.id));

        let third = checklist.add_custom_item(&mut store, "Read tafsir", "📘", at(9));
        let record = checklist.record().unwrap();
        let second_order = record.item(&second.id).unwrap().order;
        let third_order = record.item(&third.id).unwrap().order;
        assert!(third_order > second_order);

        let mut orders: Vec<usize> = record.items.iter().map(|item| item.order).collect();
        orders.sort_unstable();
        orders.dedup();
        assert_eq!(orders.len(), record.items.len());
        assert!(third.order > second.order);
    }

    #[test]
    fn record_with_mismatched_date_is_recreated() {
        let mut store = KvStore::new();
        let stale = default_record(day(1) - Duration::days(1), &[]);
        store.set(&record_key(day(1)), &stale);

        let mut checklist = ChecklistStore::new();
        let record = checklist.load_today(&mut store, day(1));
        assert_eq!(record.date, day(1));
    }
}
