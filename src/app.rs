use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/checklist/toggle/:id", post(handlers::toggle_item_form))
        .route("/zikr/tap", post(handlers::increment_tally_form))
        .route("/api/checklist/today", get(handlers::get_checklist))
        .route("/api/checklist/toggle", post(handlers::toggle_item))
        .route("/api/checklist/data", post(handlers::update_item_data))
        .route("/api/checklist/custom", post(handlers::add_custom_item))
        .route(
            "/api/checklist/custom/:id",
            put(handlers::rename_custom_item).delete(handlers::remove_custom_item),
        )
        .route("/api/zikr/today", get(handlers::get_tally))
        .route("/api/zikr/increment", post(handlers::increment_tally))
        .route("/api/zikr/reset", post(handlers::reset_tally))
        .route("/api/goals", get(handlers::list_goals).post(handlers::add_goal))
        .route("/api/goals/:id", delete(handlers::delete_goal))
        .route("/api/goals/:id/progress", post(handlers::log_goal_progress))
        .route("/api/goals/:id/logs", get(handlers::goal_logs))
        .route("/api/prayer/today", get(handlers::get_prayer_today))
        .route("/api/insight/today", get(handlers::get_insight_today))
        .route("/api/insight/bookmarks", get(handlers::list_bookmarks))
        .route("/api/insight/:id/bookmark", post(handlers::toggle_bookmark))
        .route(
            "/api/profile",
            get(handlers::get_profile)
                .put(handlers::put_profile)
                .delete(handlers::delete_profile),
        )
        .route(
            "/api/settings",
            get(handlers::get_settings)
                .put(handlers::put_settings)
                .delete(handlers::reset_settings),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/summary", get(handlers::get_summary))
        .with_state(state)
}
