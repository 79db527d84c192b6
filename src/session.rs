use crate::checklist::ChecklistStore;
use crate::insights::Insight;
use crate::kv::KvStore;
use crate::profile;
use crate::tally::TallyEngine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::info;

#[derive(Debug)]
pub struct Session {
    pub store: KvStore,
    pub checklist: ChecklistStore,
    pub tally: TallyEngine,
    pub insights: Vec<Insight>,
    day: Option<NaiveDate>,
}

impl Session {
    pub fn new(store: KvStore, insights: Vec<Insight>) -> Self {
        Self {
            store,
            checklist: ChecklistStore::new(),
            tally: TallyEngine::new(),
            insights,
            day: None,
        }
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }

    pub fn roll_to(&mut self, today: NaiveDate) -> bool {
        if self.day == Some(today) {
            return false;
        }
        if let Some(previous) = self.day {
            info!(%previous, %today, "day changed, loading fresh records");
        }
        self.checklist.load_today(&mut self.store, today);
        self.tally.load_day(&self.store, today);
        self.day = Some(today);
        true
    }

    pub fn roll_to_today(&mut self) -> bool {
        let today = self.today();
        self.roll_to(today)
    }

    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        profile::local_now(profile::profile(&self.store).as_ref(), now)
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now(Utc::now()).date()
    }

    pub fn observance_day(&self, today: NaiveDate) -> u32 {
        profile::profile(&self.store)
            .map(|user| profile::observance_day(&user.ramadhan_start_date, today))
            .unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_over_loads_new_day() {
        let mut session = Session::new(KvStore::new(), Vec::new());
        let day1 = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();

        assert!(session.roll_to(day1));
        session.checklist.toggle_item(&mut session.store, "fajr", Utc::now());
        session.tally.increment(&mut session.store, Utc::now());
        assert!(!session.roll_to(day1));
        assert_eq!(session.checklist.completed_count(), 1);

        assert!(session.roll_to(day2));
        assert_eq!(session.day(), Some(day2));
        assert_eq!(session.checklist.completed_count(), 0);
        assert_eq!(session.tally.record().unwrap().total(), 0);

        assert!(session.roll_to(day1));
        assert_eq!(session.checklist.completed_count(), 1);
        assert_eq!(session.tally.record().unwrap().subhanallah, 1);
    }

    #[test]
    fn local_clock_uses_stored_offset() {
        let mut session = Session::new(KvStore::new(), Vec::new());
        let now = DateTime::parse_from_rfc3339("2026-03-01T22:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let user = profile::UserProfile {
            id: "u1".to_string(),
            name: "Aisha".to_string(),
            city: "Jakarta".to_string(),
            country: "Indonesia".to_string(),
            latitude: -6.2,
            longitude: 106.8,
            timezone: "+07:00".to_string(),
            calculation_method: 20,
            madhab: profile::Madhab::Shafii,
            ramadhan_start_date: "2026-02-18".to_string(),
            created_at: now,
        };
        profile::set_profile(&mut session.store, &user);

        let local = session.local_now(now);
        assert_eq!(local.date(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(session.observance_day(local.date()), 13);
    }

    #[test]
    fn observance_day_defaults_without_profile() {
        let session = Session::new(KvStore::new(), Vec::new());
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(session.observance_day(today), 1);
    }
}
