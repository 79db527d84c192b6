use crate::kv::{KvStore, keys};
use crate::profile::{Madhab, UserProfile};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PrayerTimings {
    pub imsak: String,
    pub fajr: String,
    pub sunrise: String,
    pub dhuhr: String,
    pub asr: String,
    pub sunset: String,
    pub maghrib: String,
    pub isha: String,
    pub midnight: String,
}

impl PrayerTimings {
    pub fn schedule(&self) -> [(&'static str, &str); 7] {
        [
            ("Imsak", self.imsak.as_str()),
            ("Fajr", self.fajr.as_str()),
            ("Sunrise", self.sunrise.as_str()),
            ("Dhuhr", self.dhuhr.as_str()),
            ("Asr", self.asr.as_str()),
            ("Maghrib", self.maghrib.as_str()),
            ("Isha", self.isha.as_str()),
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedPrayerTimes {
    pub date: NaiveDate,
    pub hijri_date: String,
    pub hijri_month: String,
    pub location: Location,
    pub timings: PrayerTimings,
    pub method: u32,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrayerQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub method: u32,
    pub school: u32,
}

impl PrayerQuery {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            latitude: profile.latitude,
            longitude: profile.longitude,
            method: profile.calculation_method,
            school: match profile.madhab {
                Madhab::Hanafi => 1,
                Madhab::Shafii => 0,
            },
        }
    }

    fn params(&self) -> [(&'static str, String); 4] {
        [
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("method", self.method.to_string()),
            ("school", self.school.to_string()),
        ]
    }
}

pub fn cache_key(date: NaiveDate, lat: f64, lng: f64) -> String {
    format!(
        "{}{}_{:.2}_{:.2}",
        keys::PRAYER_CACHE_PREFIX,
        date.format("%Y-%m-%d"),
        lat,
        lng
    )
}

pub fn cached(store: &KvStore, date: NaiveDate, lat: f64, lng: f64) -> Option<CachedPrayerTimes> {
    store.get(&cache_key(date, lat, lng))
}

pub fn store_times(store: &mut KvStore, times: &CachedPrayerTimes) {
    store.set(
        &cache_key(times.date, times.location.lat, times.location.lng),
        times,
    );
}

pub fn store_month(store: &mut KvStore, days: &[CachedPrayerTimes]) -> usize {
    let mut added = 0;
    for times in days {
        let key = cache_key(times.date, times.location.lat, times.location.lng);
        if store.contains(&key) {
            continue;
        }
        store.set(&key, times);
        added += 1;
    }
    added
}

#[derive(Debug, Deserialize)]
struct DayPayload {
    timings: RawTimings,
    date: ApiDate,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawTimings {
    #[serde(default)]
    imsak: String,
    #[serde(default)]
    fajr: String,
    #[serde(default)]
    sunrise: String,
    #[serde(default)]
    dhuhr: String,
    #[serde(default)]
    asr: String,
    #[serde(default)]
    sunset: String,
    #[serde(default)]
    maghrib: String,
    #[serde(default)]
    isha: String,
    #[serde(default)]
    midnight: String,
}

#[derive(Debug, Deserialize)]
struct ApiDate {
    hijri: HijriDate,
    gregorian: Option<GregorianDate>,
}

#[derive(Debug, Deserialize)]
struct HijriDate {
    day: String,
    month: NamedMonth,
    year: String,
}

#[derive(Debug, Deserialize)]
struct NamedMonth {
    en: String,
}

#[derive(Debug, Deserialize)]
struct GregorianDate {
    day: String,
    month: NumberedMonth,
    year: String,
}

#[derive(Debug, Deserialize)]
struct NumberedMonth {
    number: u32,
}

/// "04:31 (WIB)" -> "04:31"
fn clock_token(raw: &str) -> String {
    raw.split_whitespace().next().unwrap_or_default().to_string()
}

impl DayPayload {
    fn into_cached(self, date: NaiveDate, query: &PrayerQuery, now: DateTime<Utc>) -> CachedPrayerTimes {
        let t = self.timings;
        let hijri = self.date.hijri;
        CachedPrayerTimes {
            date,
            hijri_date: format!("{} {} {} H", hijri.day, hijri.month.en, hijri.year),
            hijri_month: hijri.month.en,
            location: Location {
                lat: query.latitude,
                lng: query.longitude,
            },
            timings: PrayerTimings {
                imsak: clock_token(&t.imsak),
                fajr: clock_token(&t.fajr),
                sunrise: clock_token(&t.sunrise),
                dhuhr: clock_token(&t.dhuhr),
                asr: clock_token(&t.asr),
                sunset: clock_token(&t.sunset),
                maghrib: clock_token(&t.maghrib),
                isha: clock_token(&t.isha),
                midnight: clock_token(&t.midnight),
            },
            method: query.method,
            cached_at: now,
        }
    }
}

fn successful_data(body: Value) -> Option<Value> {
    let code = body.get("code").and_then(Value::as_u64);
    if code != Some(200) {
        warn!(?code, "prayer API returned an error status");
        return None;
    }
    body.get("data").cloned()
}

pub fn parse_day_response(
    body: Value,
    date: NaiveDate,
    query: &PrayerQuery,
    now: DateTime<Utc>,
) -> Option<CachedPrayerTimes> {
    let data = successful_data(body)?;
    match serde_json::from_value::<DayPayload>(data) {
        Ok(payload) => Some(payload.into_cached(date, query, now)),
        Err(err) => {
            warn!("failed to parse prayer times: {err}");
            None
        }
    }
}

pub fn parse_month_response(
    body: Value,
    query: &PrayerQuery,
    now: DateTime<Utc>,
) -> Vec<CachedPrayerTimes> {
    let Some(data) = successful_data(body) else {
        return Vec::new();
    };
    let days = match serde_json::from_value::<Vec<DayPayload>>(data) {
        Ok(days) => days,
        Err(err) => {
            warn!("failed to parse prayer calendar: {err}");
            return Vec::new();
        }
    };

    days.into_iter()
        .filter_map(|day| {
            let gregorian = day.date.gregorian.as_ref()?;
            let date = NaiveDate::from_ymd_opt(
                gregorian.year.parse().ok()?,
                gregorian.month.number,
                gregorian.day.parse().ok()?,
            )?;
            Some(day.into_cached(date, query, now))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PrayerClient {
    http: reqwest::Client,
    base_url: String,
}

impl PrayerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn fetch_day(&self, query: &PrayerQuery, date: NaiveDate) -> Option<CachedPrayerTimes> {
        let timestamp = date.and_hms_opt(12, 0, 0)?.and_utc().timestamp();
        let url = format!("{}/timings/{timestamp}", self.base_url);
        debug!(%url, "fetching prayer times");
        let body = self.get_json(&url, query).await?;
        parse_day_response(body, date, query, Utc::now())
    }

    pub async fn fetch_month(&self, query: &PrayerQuery, year: i32, month: u32) -> Vec<CachedPrayerTimes> {
        let url = format!("{}/calendar/{year}/{month}", self.base_url);
        debug!(%url, "prefetching prayer calendar");
        match self.get_json(&url, query).await {
            Some(body) => parse_month_response(body, query, Utc::now()),
            None => Vec::new(),
        }
    }

    async fn get_json(&self, url: &str, query: &PrayerQuery) -> Option<Value> {
        let response = match self.http.get(url).query(&query.params()).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("prayer API request failed: {err}");
                return None;
            }
        };
        match response.json::<Value>().await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!("prayer API returned unreadable body: {err}");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrayerStatus {
    Past,
    Next,
    Upcoming,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub name: &'static str,
    pub time: String,
    pub status: PrayerStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
}

pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// First scheduled prayer strictly after `now`; `None` once Isha has passed.
pub fn next_prayer(timings: &PrayerTimings, now: NaiveTime) -> Option<&'static str> {
    timings
        .schedule()
        .into_iter()
        .find(|(_, time)| parse_clock(time).is_some_and(|at| at > now))
        .map(|(name, _)| name)
}

/// Unparsable times are reported as past.
pub fn timeline(timings: &PrayerTimings, now: NaiveTime) -> Vec<TimelineEntry> {
    let next = next_prayer(timings, now);
    timings
        .schedule()
        .into_iter()
        .map(|(name, time)| {
            let status = if Some(name) == next {
                PrayerStatus::Next
            } else if parse_clock(time).is_some_and(|at| at > now) {
                PrayerStatus::Upcoming
            } else {
                PrayerStatus::Past
            };
            TimelineEntry {
                name,
                time: time.to_string(),
                status,
            }
        })
        .collect()
}

pub fn seconds_until(time: &str, now: NaiveTime) -> i64 {
    match parse_clock(time) {
        Some(target) if target > now => (target - now).num_seconds(),
        _ => 0,
    }
}

pub fn format_countdown(total_seconds: i64) -> Countdown {
    let total = total_seconds.max(0);
    Countdown {
        hours: format!("{:02}", total / 3600),
        minutes: format!("{:02}", (total % 3600) / 60),
        seconds: format!("{:02}", total % 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn query() -> PrayerQuery {
        PrayerQuery {
            latitude: -6.2088,
            longitude: 106.8456,
            method: 20,
            school: 0,
        }
    }

    fn timings() -> PrayerTimings {
        PrayerTimings {
            imsak: "04:22".into(),
            fajr: "04:32".into(),
            sunrise: "05:47".into(),
            dhuhr: "11:58".into(),
            asr: "15:10".into(),
            sunset: "18:02".into(),
            maghrib: "18:04".into(),
            isha: "19:13".into(),
            midnight: "23:55".into(),
        }
    }

    fn clock(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day_body(day: &str) -> Value {
        json!({
            "timings": {
                "Imsak": "04:22 (WIB)", "Fajr": "04:32 (WIB)", "Sunrise": "05:47 (WIB)",
                "Dhuhr": "11:58 (WIB)", "Asr": "15:10 (WIB)", "Sunset": "18:02 (WIB)",
                "Maghrib": "18:04 (WIB)", "Isha": "19:13 (WIB)", "Midnight": "23:55 (WIB)"
            },
            "date": {
                "hijri": { "day": "10", "month": { "en": "Ramaḍān" }, "year": "1447" },
                "gregorian": { "day": day, "month": { "number": 3 }, "year": "2026" }
            }
        })
    }

    #[test]
    fn cache_key_rounds_location() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(
            cache_key(date, -6.2088, 106.8456),
            "prayer_2026-03-01_-6.21_106.85"
        );
    }

    #[test]
    fn parses_day_response() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let body = json!({ "code": 200, "status": "OK", "data": day_body("01") });

        let parsed = parse_day_response(body, date, &query(), now).unwrap();
        assert_eq!(parsed.timings, timings());
        assert_eq!(parsed.hijri_date, "10 Ramaḍān 1447 H");
        assert_eq!(parsed.hijri_month, "Ramaḍān");
        assert_eq!(parsed.method, 20);
    }

    #[test]
    fn error_status_yields_none() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let body = json!({ "code": 400, "status": "BAD_REQUEST", "data": "Invalid date" });
        assert!(parse_day_response(body, date, &query(), Utc::now()).is_none());
    }

    #[test]
    fn month_prefetch_skips_cached_days() {
        let body = json!({ "code": 200, "data": [day_body("01"), day_body("02"), day_body("xx")] });
        let days = parse_month_response(body, &query(), Utc::now());
        assert_eq!(days.len(), 2);
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());

        let mut store = KvStore::new();
        store_times(&mut store, &days[0]);
        assert_eq!(store_month(&mut store, &days), 1);
        assert!(cached(&store, days[1].date, -6.2088, 106.8456).is_some());
    }

    #[test]
    fn next_prayer_follows_clock() {
        let t = timings();
        assert_eq!(next_prayer(&t, clock(3, 0)), Some("Imsak"));
        assert_eq!(next_prayer(&t, clock(12, 0)), Some("Asr"));
        assert_eq!(next_prayer(&t, clock(15, 10)), Some("Maghrib"));
        assert_eq!(next_prayer(&t, clock(20, 0)), None);
    }

    #[test]
    fn timeline_classifies_entries() {
        let entries = timeline(&timings(), clock(12, 0));
        let statuses: Vec<_> = entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![
                PrayerStatus::Past,
                PrayerStatus::Past,
                PrayerStatus::Past,
                PrayerStatus::Past,
                PrayerStatus::Next,
                PrayerStatus::Upcoming,
                PrayerStatus::Upcoming,
            ]
        );
    }

    #[test]
    fn countdown_formatting() {
        assert_eq!(seconds_until("18:04", clock(17, 0)), 3840);
        assert_eq!(seconds_until("18:04", clock(19, 0)), 0);
        assert_eq!(seconds_until("bogus", clock(1, 0)), 0);
        assert_eq!(
            format_countdown(3840),
            Countdown {
                hours: "01".into(),
                minutes: "04".into(),
                seconds: "00".into()
            }
        );
        assert_eq!(format_countdown(-5).hours, "00");
    }
}
