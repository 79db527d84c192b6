use crate::kv::{KvStore, keys};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub const OBSERVANCE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Madhab {
    Hanafi,
    Shafii,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub calculation_method: u32,
    pub madhab: Madhab,
    pub ramadhan_start_date: String,
    pub created_at: DateTime<Utc>,
}

pub fn profile(store: &KvStore) -> Option<UserProfile> {
    store.get(keys::USER_PROFILE)
}

pub fn set_profile(store: &mut KvStore, profile: &UserProfile) {
    store.set(keys::USER_PROFILE, profile);
}

pub fn clear_profile(store: &mut KvStore) {
    store.delete(keys::USER_PROFILE);
}

pub fn is_onboarded(store: &KvStore) -> bool {
    profile(store).is_some()
}

/// Accepts `UTC`, `Z` or `±HH[:MM]`.
pub fn utc_offset(timezone: &str) -> Option<FixedOffset> {
    let raw = timezone.trim();
    if raw.eq_ignore_ascii_case("utc") || raw == "Z" {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some((hours, minutes)) => (hours, minutes),
        None if rest.len() == 4 => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Wall-clock time for the user: the profile's offset when it has one,
/// otherwise the server's local zone.
pub fn local_now(profile: Option<&UserProfile>, now: DateTime<Utc>) -> NaiveDateTime {
    match profile.and_then(|user| utc_offset(&user.timezone)) {
        Some(offset) => now.with_timezone(&offset).naive_local(),
        None => now.with_timezone(&Local).naive_local(),
    }
}

/// 1-based day of the observance period, clamped to `1..=30`.
pub fn observance_day(start_date: &str, today: NaiveDate) -> u32 {
    let Ok(start) = NaiveDate::parse_from_str(start_date.trim(), "%Y-%m-%d") else {
        return 1;
    };
    let day = (today - start).num_days() + 1;
    day.clamp(1, OBSERVANCE_DAYS) as u32
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    Auto,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    Id,
    Ar,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistResetAt {
    Midnight,
    Fajr,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSettings {
    pub suhoor: bool,
    pub fajr: bool,
    pub dhuhr: bool,
    pub asr: bool,
    pub iftar_warning: bool,
    pub iftar: bool,
    pub isha: bool,
    pub checklist_reminder: bool,
    pub goal_milestone: bool,
    pub daily_insight: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub theme: Theme,
    pub language: Language,
    pub checklist_reset_at: ChecklistResetAt,
    pub tarawih_rakat: u8,
    pub notifications: NotificationSettings,
    pub notification_minutes_before: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            language: Language::En,
            checklist_reset_at: ChecklistResetAt::Midnight,
            tarawih_rakat: 20,
            notifications: NotificationSettings {
                suhoor: true,
                fajr: true,
                dhuhr: false,
                asr: false,
                iftar_warning: true,
                iftar: true,
                isha: false,
                checklist_reminder: true,
                goal_milestone: true,
                daily_insight: true,
            },
            notification_minutes_before: 10,
        }
    }
}

pub fn settings(store: &KvStore) -> AppSettings {
    store.get(keys::SETTINGS).unwrap_or_default()
}

pub fn update_settings(store: &mut KvStore, settings: &AppSettings) {
    store.set(keys::SETTINGS, settings);
}

pub fn reset_settings(store: &mut KvStore) {
    store.delete(keys::SETTINGS);
}
