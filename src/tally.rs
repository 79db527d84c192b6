use crate::kv::{KvStore, keys};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const PHASE_TARGETS: [u32; 3] = [33, 33, 34];
pub const PHASE_NAMES: [&str; 3] = ["subhanallah", "alhamdulillah", "allahuakbar"];
pub const TOTAL_TARGET: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TallyRecord {
    pub date: NaiveDate,
    pub subhanallah: u32,
    pub alhamdulillah: u32,
    pub allahuakbar: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TallyRecord {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            subhanallah: 0,
            alhamdulillah: 0,
            allahuakbar: 0,
            completed: false,
            completed_at: None,
        }
    }

    pub fn count(&self, phase: usize) -> u32 {
        match phase {
            0 => self.subhanallah,
            1 => self.alhamdulillah,
            _ => self.allahuakbar,
        }
    }

    fn count_mut(&mut self, phase: usize) -> &mut u32 {
        match phase {
            0 => &mut self.subhanallah,
            1 => &mut self.alhamdulillah,
            _ => &mut self.allahuakbar,
        }
    }

    pub fn total(&self) -> u32 {
        self.subhanallah
            .saturating_add(self.alhamdulillah)
            .saturating_add(self.allahuakbar)
    }
}

/// Phase implied by the counts. Counts above target (corrupted storage)
/// still land in phase 2.
pub fn derive_phase(record: &TallyRecord) -> usize {
    if record.subhanallah < PHASE_TARGETS[0] {
        0
    } else if record.alhamdulillah < PHASE_TARGETS[1] {
        1
    } else {
        2
    }
}

fn derive_completed(record: &TallyRecord) -> bool {
    derive_phase(record) == 2 && record.allahuakbar >= PHASE_TARGETS[2]
}

pub fn record_key(date: NaiveDate) -> String {
    format!("{}{}", keys::ZIKR_PREFIX, date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IncrementOutcome {
    Counted,
    PhaseAdvanced { to: usize },
    Completed,
    Rejected,
}

#[derive(Debug, Default)]
pub struct TallyEngine {
    record: Option<TallyRecord>,
    phase: usize,
}

impl TallyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> Option<&TallyRecord> {
        self.record.as_ref()
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    pub fn is_completed(&self) -> bool {
        self.record.as_ref().is_some_and(|record| record.completed)
    }

    pub fn load_day(&mut self, store: &KvStore, date: NaiveDate) -> &TallyRecord {
        let mut record = store
            .get::<TallyRecord>(&record_key(date))
            .filter(|record| record.date == date)
            .unwrap_or_else(|| TallyRecord::empty(date));

        record.completed = derive_completed(&record);
        if !record.completed {
            record.completed_at = None;
        }
        self.phase = derive_phase(&record);
        self.record.insert(record)
    }

    pub fn increment(&mut self, store: &mut KvStore, now: DateTime<Utc>) -> IncrementOutcome {
        let Some(record) = self.record.as_mut() else {
            return IncrementOutcome::Rejected;
        };
        if record.completed {
            return IncrementOutcome::Rejected;
        }

        let phase = self.phase;
        let count = record.count_mut(phase);
        *count = count.saturating_add(1);
        let reached = *count >= PHASE_TARGETS[phase];

        let outcome = if !reached {
            IncrementOutcome::Counted
        } else if phase < 2 {
            self.phase = phase + 1;
            debug!(phase = self.phase, "zikr phase advanced");
            IncrementOutcome::PhaseAdvanced { to: self.phase }
        } else {
            record.completed = true;
            record.completed_at = Some(now);
            info!(date = %record.date, "zikr completed for the day");
            IncrementOutcome::Completed
        };

        store.set(&record_key(record.date), &*record);
        outcome
    }

    pub fn reset(&mut self, store: &mut KvStore) {
        let Some(record) = self.record.as_mut() else {
            return;
        };
        *record = TallyRecord::empty(record.date);
        self.phase = 0;
        store.set(&record_key(record.date), &*record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 20, 0, 0).unwrap()
    }

    fn loaded(store: &KvStore) -> TallyEngine {
        let mut engine = TallyEngine::new();
        engine.load_day(store, day());
        engine
    }

    #[test]
    fn full_cycle_advances_phases_and_completes() {
        let mut store = KvStore::new();
        let mut engine = loaded(&store);

        for _ in 0..32 {
            assert_eq!(engine.increment(&mut store, now()), IncrementOutcome::Counted);
        }
        assert_eq!(
            engine.increment(&mut store, now()),
            IncrementOutcome::PhaseAdvanced { to: 1 }
        );
        assert_eq!(engine.phase(), 1);

        for _ in 0..33 {
            engine.increment(&mut store, now());
        }
        assert_eq!(engine.phase(), 2);
        assert!(!engine.is_completed());

        for _ in 0..33 {
            engine.increment(&mut store, now());
        }
        assert_eq!(engine.increment(&mut store, now()), IncrementOutcome::Completed);
        assert!(engine.is_completed());

        let before = engine.record().cloned();
        assert_eq!(engine.increment(&mut store, now()), IncrementOutcome::Rejected);
        assert_eq!(engine.record().cloned(), before);

        let record = engine.record().unwrap();
        assert_eq!(record.total(), TOTAL_TARGET);
        assert_eq!(record.completed_at, Some(now()));
    }

    #[test]
    fn every_increment_is_persisted() {
        let mut store = KvStore::new();
        let mut engine = loaded(&store);
        engine.increment(&mut store, now());
        engine.increment(&mut store, now());

        let stored: TallyRecord = store.get(&record_key(day())).unwrap();
        assert_eq!(stored.subhanallah, 2);
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = KvStore::new();
        let mut engine = loaded(&store);
        for _ in 0..100 {
            engine.increment(&mut store, now());
        }
        assert!(engine.is_completed());

        engine.reset(&mut store);
        let record = engine.record().unwrap();
        assert_eq!(record.total(), 0);
        assert!(!record.completed);
        assert_eq!(record.completed_at, None);
        assert_eq!(engine.phase(), 0);

        let stored: TallyRecord = store.get(&record_key(day())).unwrap();
        assert_eq!(stored, TallyRecord::empty(day()));
    }

    #[test]
    fn one_short_of_completion_loads_in_last_phase() {
        let mut store = KvStore::new();
        store.set(
            &record_key(day()),
            &TallyRecord {
                subhanallah: 33,
                alhamdulillah: 33,
                allahuakbar: 33,
                ..TallyRecord::empty(day())
            },
        );

        let mut engine = loaded(&store);
        assert_eq!(engine.phase(), 2);
        assert!(!engine.is_completed());
        assert_eq!(engine.increment(&mut store, now()), IncrementOutcome::Completed);
    }

    #[test]
    fn corrupted_counts_clamp_to_last_phase() {
        let mut store = KvStore::new();
        store.set(
            &record_key(day()),
            &TallyRecord {
                subhanallah: 90,
                alhamdulillah: 40,
                allahuakbar: 2,
                completed: true,
                ..TallyRecord::empty(day())
            },
        );

        let engine = loaded(&store);
        assert_eq!(engine.phase(), 2);
        assert!(!engine.is_completed());
    }

    #[test]
    fn completion_never_set_out_of_phase_order() {
        let mut store = KvStore::new();
        store.set(
            &record_key(day()),
            &TallyRecord {
                subhanallah: 5,
                allahuakbar: 50,
                completed: true,
                ..TallyRecord::empty(day())
            },
        );

        let engine = loaded(&store);
        assert_eq!(engine.phase(), 0);
        assert!(!engine.is_completed());
    }

    #[test]
    fn unloaded_engine_rejects_increment() {
        let mut store = KvStore::new();
        let mut engine = TallyEngine::new();
        assert_eq!(engine.increment(&mut store, now()), IncrementOutcome::Rejected);
        engine.reset(&mut store);
        assert!(store.entries().is_empty());
    }
}
