use crate::errors::AppError;
use crate::goals::{self, Goal, GoalLog, NewGoal, ProgressLogged};
use crate::insights::{self, Insight};
use crate::models::{
    BookmarkResponse, ChecklistResponse, CustomItemRequest, IncrementResponse, InsightResponse,
    ItemDataRequest, NamedCountdown, PrayerTodayResponse, ProgressRequest, RenameRequest,
    ResetRequest, StatsResponse, SummaryResponse, TallyResponse, ToggleRequest,
};
use crate::prayer::{self, PrayerQuery};
use crate::profile::{self, AppSettings, UserProfile};
use crate::session::Session;
use crate::state::AppState;
use crate::stats::{build_stats_at, build_summary};
use crate::storage::persist_data;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    Json,
};
use chrono::{Datelike, NaiveDate, NaiveTime, Utc};
use tracing::info;

const DEFAULT_CUSTOM_ICON: &str = "✅";

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    if session.roll_to_today() {
        persist_data(&state.data_path, &session.store).await?;
    }
    let (checklist, tally) = today_views(session)?;
    Ok(Html(render_index(&checklist, &tally)))
}

pub async fn get_checklist(
    State(state): State<AppState>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    if session.roll_to_today() {
        persist_data(&state.data_path, &session.store).await?;
    }
    Ok(Json(checklist_view(session)?))
}

pub async fn toggle_item(
    State(state): State<AppState>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<ChecklistResponse>, AppError> {
    apply_toggle(&state, payload.id.trim()).await.map(Json)
}

pub async fn toggle_item_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    apply_toggle(&state, &id).await?;
    Ok(Redirect::to("/"))
}

async fn apply_toggle(state: &AppState, id: &str) -> Result<ChecklistResponse, AppError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    let rolled = session.roll_to_today();
    let changed = session
        .checklist
        .toggle_item(&mut session.store, id, Utc::now());
    if rolled || changed {
        persist_data(&state.data_path, &session.store).await?;
    }
    checklist_view(session)
}

pub async fn update_item_data(
    State(state): State<AppState>,
    Json(payload): Json<ItemDataRequest>,
) -> Result<Json<ChecklistResponse>, AppError> {
    if !payload.value.is_finite() || payload.value < 0.0 {
        return Err(AppError::bad_request("value must be a non-negative number"));
    }
    let unit = payload.unit.trim();
    if unit.is_empty() {
        return Err(AppError::bad_request("unit must not be empty"));
    }

    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    let rolled = session.roll_to_today();
    let changed = session.checklist.update_item_data(
        &mut session.store,
        payload.id.trim(),
        payload.value,
        unit,
        Utc::now(),
    );
    if rolled || changed {
        persist_data(&state.data_path, &session.store).await?;
    }
    Ok(Json(checklist_view(session)?))
}

pub async fn add_custom_item(
    State(state): State<AppState>,
    Json(payload): Json<CustomItemRequest>,
) -> Result<(StatusCode, Json<ChecklistResponse>), AppError> {
    let label = required_label(&payload.label)?;
    let icon = payload
        .icon
        .as_deref()
        .map(str::trim)
        .filter(|icon| !icon.is_empty())
        .unwrap_or(DEFAULT_CUSTOM_ICON);

    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    session.roll_to_today();
    let item = session
        .checklist
        .add_custom_item(&mut session.store, label, icon, Utc::now());
    info!(id = %item.id, "custom checklist item added");
    persist_data(&state.data_path, &session.store).await?;
    Ok((StatusCode::CREATED, Json(checklist_view(session)?)))
}

pub async fn rename_custom_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RenameRequest>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let label = required_label(&payload.label)?;

    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    let rolled = session.roll_to_today();
    let changed = session
        .checklist
        .rename_custom_item(&mut session.store, &id, label);
    if rolled || changed {
        persist_data(&state.data_path, &session.store).await?;
    }
    if !changed {
        return Err(AppError::not_found(format!("no custom item with id {id}")));
    }
    Ok(Json(checklist_view(session)?))
}

pub async fn remove_custom_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    let rolled = session.roll_to_today();
    let changed = session.checklist.remove_custom_item(&mut session.store, &id);
    if rolled || changed {
        persist_data(&state.data_path, &session.store).await?;
    }
    if !changed {
        return Err(AppError::not_found(format!("no custom item with id {id}")));
    }
    Ok(Json(checklist_view(session)?))
}

pub async fn get_tally(State(state): State<AppState>) -> Result<Json<TallyResponse>, AppError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    if session.roll_to_today() {
        persist_data(&state.data_path, &session.store).await?;
    }
    Ok(Json(tally_view(session)?))
}

pub async fn increment_tally(
    State(state): State<AppState>,
) -> Result<Json<IncrementResponse>, AppError> {
    apply_increment(&state).await.map(Json)
}

pub async fn increment_tally_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_increment(&state).await?;
    Ok(Redirect::to("/"))
}

async fn apply_increment(state: &AppState) -> Result<IncrementResponse, AppError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    session.roll_to_today();
    let outcome = session.tally.increment(&mut session.store, Utc::now());
    persist_data(&state.data_path, &session.store).await?;
    Ok(IncrementResponse {
        outcome,
        tally: tally_view(session)?,
    })
}

pub async fn reset_tally(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<TallyResponse>, AppError> {
    if !payload.confirm {
        return Err(AppError::bad_request("reset must be confirmed"));
    }

    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    session.roll_to_today();
    session.tally.reset(&mut session.store);
    info!("zikr counter reset");
    persist_data(&state.data_path, &session.store).await?;
    Ok(Json(tally_view(session)?))
}

pub async fn list_goals(State(state): State<AppState>) -> Json<Vec<Goal>> {
    let session = state.session.lock().await;
    Json(goals::goals(&session.store))
}

pub async fn add_goal(
    State(state): State<AppState>,
    Json(payload): Json<NewGoal>,
) -> Result<(StatusCode, Json<Goal>), AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title must not be empty"));
    }
    if !payload.target_value.is_finite() || payload.target_value <= 0.0 {
        return Err(AppError::bad_request("target_value must be greater than zero"));
    }
    if payload.end_date < payload.start_date {
        return Err(AppError::bad_request("end_date must not precede start_date"));
    }

    let mut session = state.session.lock().await;
    let goal = goals::add_goal(&mut session.store, payload, Utc::now());
    persist_data(&state.data_path, &session.store).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let mut session = state.session.lock().await;
    if !goals::delete_goal(&mut session.store, &id) {
        return Err(AppError::not_found(format!("no goal with id {id}")));
    }
    persist_data(&state.data_path, &session.store).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn log_goal_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<ProgressLogged>, AppError> {
    if !payload.value.is_finite() || payload.value <= 0.0 {
        return Err(AppError::bad_request("value must be greater than zero"));
    }

    let mut session = state.session.lock().await;
    let logged = goals::log_progress(
        &mut session.store,
        &id,
        payload.value,
        payload.note.trim(),
        Utc::now(),
    )
    .ok_or_else(|| AppError::not_found(format!("no goal with id {id}")))?;
    if let Some(milestone) = logged.milestone {
        info!(goal = %id, milestone, "goal milestone reached");
    }
    persist_data(&state.data_path, &session.store).await?;
    Ok(Json(logged))
}

pub async fn goal_logs(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<Vec<GoalLog>> {
    let session = state.session.lock().await;
    Json(goals::goal_logs(&session.store, &id))
}

pub async fn get_prayer_today(
    State(state): State<AppState>,
) -> Result<Json<PrayerTodayResponse>, AppError> {
    let (now, query, cached) = {
        let session = state.session.lock().await;
        let now = session.local_now(Utc::now());
        let date = now.date();
        let user = profile::profile(&session.store)
            .ok_or_else(|| AppError::bad_request("profile not set; complete onboarding first"))?;
        let query = PrayerQuery::from_profile(&user);
        let cached = prayer::cached(&session.store, date, query.latitude, query.longitude);
        (now, query, cached)
    };
    let date = now.date();

    let times = match cached {
        Some(times) => times,
        None => {
            let fetched = state
                .prayer
                .fetch_day(&query, date)
                .await
                .ok_or_else(|| AppError::bad_gateway("could not load prayer times"))?;
            let month = state.prayer.fetch_month(&query, date.year(), date.month()).await;

            let mut session = state.session.lock().await;
            prayer::store_times(&mut session.store, &fetched);
            let added = prayer::store_month(&mut session.store, &month);
            info!(date = %date, prefetched = added, "prayer times cached");
            persist_data(&state.data_path, &session.store).await?;
            fetched
        }
    };

    Ok(Json(prayer_view(times, now.time())))
}

fn prayer_view(times: prayer::CachedPrayerTimes, now: NaiveTime) -> PrayerTodayResponse {
    let timings = &times.timings;
    let next = prayer::next_prayer(timings, now);
    let next_countdown = next.and_then(|name| {
        timings
            .schedule()
            .into_iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(name, time)| named_countdown(name, time, now))
    });

    PrayerTodayResponse {
        next,
        timeline: prayer::timeline(timings, now),
        next_countdown,
        iftar_countdown: named_countdown("Maghrib", &timings.maghrib, now),
        times,
    }
}

fn named_countdown(name: &'static str, time: &str, now: NaiveTime) -> NamedCountdown {
    let seconds = prayer::seconds_until(time, now);
    NamedCountdown {
        name,
        time: time.to_string(),
        seconds,
        display: prayer::format_countdown(seconds),
    }
}

pub async fn get_insight_today(
    State(state): State<AppState>,
) -> Result<Json<InsightResponse>, AppError> {
    let mut guard = state.session.lock().await;
    let session = &mut *guard;
    let today = session.today();

    let observance_day = session.observance_day(today);
    let pinned_before = insights::pinned_id(&session.store, today);
    let insight = insights::daily_insight(
        &mut session.store,
        &session.insights,
        observance_day,
        today,
    )
    .cloned()
    .ok_or_else(|| AppError::not_found("no insights available"))?;

    if pinned_before.as_deref() != Some(insight.id.as_str()) {
        persist_data(&state.data_path, &session.store).await?;
    }

    Ok(Json(InsightResponse {
        observance_day,
        kind_label: insight.kind.label(),
        bookmarked: insights::bookmarked_ids(&session.store).contains(&insight.id),
        insight,
    }))
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookmarkResponse>, AppError> {
    let mut session = state.session.lock().await;
    if !session.insights.iter().any(|insight| insight.id == id) {
        return Err(AppError::not_found(format!("no insight with id {id}")));
    }
    let bookmarked = insights::toggle_bookmark(&mut session.store, &id);
    persist_data(&state.data_path, &session.store).await?;
    Ok(Json(BookmarkResponse { id, bookmarked }))
}

pub async fn list_bookmarks(State(state): State<AppState>) -> Json<Vec<Insight>> {
    let session = state.session.lock().await;
    Json(
        insights::bookmarked(&session.store, &session.insights)
            .into_iter()
            .cloned()
            .collect(),
    )
}

pub async fn get_profile(State(state): State<AppState>) -> Result<Json<UserProfile>, AppError> {
    let session = state.session.lock().await;
    profile::profile(&session.store)
        .map(Json)
        .ok_or_else(|| AppError::not_found("profile not set"))
}

pub async fn put_profile(
    State(state): State<AppState>,
    Json(payload): Json<UserProfile>,
) -> Result<Json<UserProfile>, AppError> {
    if !(-90.0..=90.0).contains(&payload.latitude) || !(-180.0..=180.0).contains(&payload.longitude)
    {
        return Err(AppError::bad_request("latitude/longitude out of range"));
    }
    if profile::utc_offset(&payload.timezone).is_none() {
        return Err(AppError::bad_request("timezone must be a UTC offset such as +07:00"));
    }
    if NaiveDate::parse_from_str(&payload.ramadhan_start_date, "%Y-%m-%d").is_err() {
        return Err(AppError::bad_request("ramadhan_start_date must be YYYY-MM-DD"));
    }

    let mut session = state.session.lock().await;
    profile::set_profile(&mut session.store, &payload);
    persist_data(&state.data_path, &session.store).await?;
    Ok(Json(payload))
}

pub async fn delete_profile(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    let mut session = state.session.lock().await;
    profile::clear_profile(&mut session.store);
    persist_data(&state.data_path, &session.store).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_settings(State(state): State<AppState>) -> Json<AppSettings> {
    let session = state.session.lock().await;
    Json(profile::settings(&session.store))
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(payload): Json<AppSettings>,
) -> Result<Json<AppSettings>, AppError> {
    if payload.tarawih_rakat != 8 && payload.tarawih_rakat != 20 {
        return Err(AppError::bad_request("tarawih_rakat must be 8 or 20"));
    }

    let mut session = state.session.lock().await;
    profile::update_settings(&mut session.store, &payload);
    persist_data(&state.data_path, &session.store).await?;
    Ok(Json(payload))
}

pub async fn reset_settings(
    State(state): State<AppState>,
) -> Result<Json<AppSettings>, AppError> {
    let mut session = state.session.lock().await;
    profile::reset_settings(&mut session.store);
    persist_data(&state.data_path, &session.store).await?;
    Ok(Json(profile::settings(&session.store)))
}

pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let session = state.session.lock().await;
    Json(build_stats_at(session.today(), &session.store))
}

pub async fn get_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    let session = state.session.lock().await;
    Json(build_summary(&session.store))
}

fn required_label(raw: &str) -> Result<&str, AppError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(AppError::bad_request("label must not be empty"));
    }
    Ok(label)
}

fn checklist_view(session: &Session) -> Result<ChecklistResponse, AppError> {
    session
        .checklist
        .record()
        .cloned()
        .map(ChecklistResponse::new)
        .ok_or_else(|| AppError::not_found("no checklist loaded for today"))
}

fn tally_view(session: &Session) -> Result<TallyResponse, AppError> {
    session
        .tally
        .record()
        .map(|record| TallyResponse::new(record, session.tally.phase()))
        .ok_or_else(|| AppError::not_found("no zikr record loaded for today"))
}

fn today_views(session: &Session) -> Result<(ChecklistResponse, TallyResponse), AppError> {
    Ok((checklist_view(session)?, tally_view(session)?))
}
