pub mod app;
pub mod checklist;
pub mod config;
pub mod errors;
pub mod goals;
pub mod handlers;
pub mod insights;
pub mod kv;
pub mod models;
pub mod prayer;
pub mod profile;
pub mod session;
pub mod state;
pub mod stats;
pub mod storage;
pub mod tally;
pub mod ui;

pub use app::router;
pub use config::AppConfig;
pub use session::Session;
pub use state::AppState;
pub use storage::{load_data, resolve_data_path};
