use crate::checklist::{DailyChecklistRecord, load_record};
use crate::goals::goals;
use crate::kv::{KvStore, keys};
use crate::models::{DailyPoint, StatsResponse, SummaryResponse, WeekHighlights, WeeklyPoint};
use crate::tally::TallyRecord;
use chrono::{Datelike, Duration, NaiveDate};

const PRAYER_IDS: [&str; 6] = ["fajr", "dhuhr", "asr", "maghrib", "isha", "tarawih"];
const GREAT_DAY_PERCENT: u32 = 80;

pub fn build_stats_at(today: NaiveDate, store: &KvStore) -> StatsResponse {
    const WEEK_COUNT: usize = 8;

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        let (completed, total) = day_counts(store, date);
        last_7_days.push(DailyPoint {
            date: date.to_string(),
            label: if offset == 0 {
                "Today".to_string()
            } else {
                date.format("%a").to_string()
            },
            completed,
            total,
            percentage: percentage(completed, total),
        });
    }

    let highlights = WeekHighlights {
        top_percentage: last_7_days.iter().map(|day| day.percentage).max().unwrap_or(0),
        avg_percentage: (f64::from(last_7_days.iter().map(|day| day.percentage).sum::<u32>())
            / 7.0)
            .round() as u32,
        great_days: last_7_days
            .iter()
            .filter(|day| day.percentage >= GREAT_DAY_PERCENT)
            .count(),
        total_tasks: last_7_days.iter().map(|day| day.completed).sum(),
    };

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut completed_sum = 0usize;
        let mut total_sum = 0usize;
        let mut days_tracked = 0u8;
        for day_offset in 0..7 {
            let date = start + Duration::days(day_offset);
            if let Some(record) = load_record(store, date) {
                completed_sum += record.completed_count();
                total_sum += record.total_count();
                days_tracked += 1;
            }
        }

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: start.to_string(),
            end_date: end.to_string(),
            days_tracked,
            completed: completed_sum,
            total: total_sum,
            percentage: percentage(completed_sum, total_sum),
        });
    }

    StatsResponse {
        last_7_days,
        highlights,
        weekly_totals,
    }
}

pub fn build_summary(store: &KvStore) -> SummaryResponse {
    let checklist_keys = store.keys_with_prefix(keys::CHECKLIST_PREFIX);

    let mut total_prayers = 0;
    let mut days_fasted = 0;
    let mut quran_pages = 0.0;
    for key in &checklist_keys {
        let Some(record) = store.get::<DailyChecklistRecord>(key) else {
            continue;
        };
        let completed = |id: &str| record.item(id).is_some_and(|item| item.completed);

        total_prayers += PRAYER_IDS.iter().filter(|&&id| completed(id)).count();
        if completed("suhoor") || completed("fajr") {
            days_fasted += 1;
        }
        if let Some(data) = record.item("quran").and_then(|item| item.custom_data.as_ref()) {
            quran_pages += data.value;
        }
    }

    let total_zikr = store
        .keys_with_prefix(keys::ZIKR_PREFIX)
        .iter()
        .filter_map(|key| store.get::<TallyRecord>(key))
        .map(|record| u64::from(record.total()))
        .sum();

    let all_goals = goals(store);
    SummaryResponse {
        total_prayers,
        days_fasted,
        quran_pages,
        total_zikr,
        goals_achieved: all_goals.iter().filter(|goal| goal.is_completed).count(),
        total_goals: all_goals.len(),
        days_tracked: checklist_keys.len(),
    }
}

fn day_counts(store: &KvStore, date: NaiveDate) -> (usize, usize) {
    load_record(store, date)
        .map(|record| (record.completed_count(), record.total_count()))
        .unwrap_or((0, 0))
}

fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as u32
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}
