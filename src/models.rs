use crate::checklist::DailyChecklistRecord;
use crate::insights::Insight;
use crate::prayer::{CachedPrayerTimes, Countdown, TimelineEntry};
use crate::tally::{IncrementOutcome, PHASE_NAMES, PHASE_TARGETS, TallyRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemDataRequest {
    pub id: String,
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomItemRequest {
    pub label: String,
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub value: f64,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChecklistResponse {
    pub record: DailyChecklistRecord,
    pub completed_count: usize,
    pub total_count: usize,
}

impl ChecklistResponse {
    pub fn new(record: DailyChecklistRecord) -> Self {
        Self {
            completed_count: record.completed_count(),
            total_count: record.total_count(),
            record,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TallyResponse {
    pub date: String,
    pub subhanallah: u32,
    pub alhamdulillah: u32,
    pub allahuakbar: u32,
    pub phase: usize,
    pub phase_name: String,
    pub phase_count: u32,
    pub phase_target: u32,
    pub total: u32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TallyResponse {
    pub fn new(record: &TallyRecord, phase: usize) -> Self {
        Self {
            date: record.date.to_string(),
            subhanallah: record.subhanallah,
            alhamdulillah: record.alhamdulillah,
            allahuakbar: record.allahuakbar,
            phase,
            phase_name: PHASE_NAMES[phase].to_string(),
            phase_count: record.count(phase),
            phase_target: PHASE_TARGETS[phase],
            total: record.total(),
            completed: record.completed,
            completed_at: record.completed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IncrementResponse {
    #[serde(flatten)]
    pub outcome: IncrementOutcome,
    pub tally: TallyResponse,
}

#[derive(Debug, Serialize)]
pub struct NamedCountdown {
    pub name: &'static str,
    pub time: String,
    pub seconds: i64,
    pub display: Countdown,
}

#[derive(Debug, Serialize)]
pub struct PrayerTodayResponse {
    pub times: CachedPrayerTimes,
    pub next: Option<&'static str>,
    pub timeline: Vec<TimelineEntry>,
    pub next_countdown: Option<NamedCountdown>,
    pub iftar_countdown: NamedCountdown,
}

#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub observance_day: u32,
    pub kind_label: &'static str,
    pub bookmarked: bool,
    pub insight: Insight,
}

#[derive(Debug, Serialize)]
pub struct BookmarkResponse {
    pub id: String,
    pub bookmarked: bool,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub label: String,
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Serialize)]
pub struct WeekHighlights {
    pub top_percentage: u32,
    pub avg_percentage: u32,
    pub great_days: usize,
    pub total_tasks: usize,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub days_tracked: u8,
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub highlights: WeekHighlights,
    pub weekly_totals: Vec<WeeklyPoint>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_prayers: usize,
    pub days_fasted: usize,
    pub quran_pages: f64,
    pub total_zikr: u64,
    pub goals_achieved: usize,
    pub total_goals: usize,
    pub days_tracked: usize,
}
