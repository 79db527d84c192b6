use crate::storage::resolve_data_path;
use std::{env, path::PathBuf};

pub const DEFAULT_PRAYER_API_BASE: &str = "https://api.aladhan.com/v1";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub insights_path: PathBuf,
    pub prayer_api_base: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, std::io::Error> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let insights_path = env::var("APP_INSIGHTS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data/insights.json"));

        let prayer_api_base = env::var("PRAYER_API_BASE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_PRAYER_API_BASE.to_string());

        Ok(Self {
            port,
            data_path: resolve_data_path()?,
            insights_path,
            prayer_api_base,
        })
    }
}
