use crate::errors::AppError;
use crate::kv::KvStore;
use serde_json::Value;
use std::collections::BTreeMap;
use std::{env, path::Path, path::PathBuf};
use tokio::fs;
use tracing::{debug, error};
use uuid::Uuid;

pub fn resolve_data_path() -> Result<PathBuf, std::io::Error> {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return Ok(PathBuf::from(path));
    }

    Ok(PathBuf::from("data/state.json"))
}

pub async fn load_data(path: &Path) -> Result<KvStore, std::io::Error> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(KvStore::new()),
        Err(err) => return Err(err),
    };

    match serde_json::from_slice::<BTreeMap<String, Value>>(&bytes) {
        Ok(entries) => {
            debug!("loaded {} entries from {}", entries.len(), path.display());
            Ok(KvStore::with_entries(entries))
        }
        Err(err) => {
            let backup = quarantine(path).await?;
            error!(
                "failed to parse data file: {err}; moved it to {} and starting empty",
                backup.display()
            );
            Ok(KvStore::new())
        }
    }
}

pub async fn persist_data(path: &Path, store: &KvStore) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(store.entries()).map_err(AppError::internal)?;
    let temp_path = sibling(path, &format!("{}.tmp", Uuid::new_v4().simple()));
    fs::write(&temp_path, payload).await?;
    if let Err(err) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(err.into());
    }
    Ok(())
}

async fn quarantine(path: &Path) -> Result<PathBuf, std::io::Error> {
    let mut backup = sibling(path, "corrupt");
    if fs::try_exists(&backup).await? {
        backup = sibling(path, &format!("corrupt.{}", Uuid::new_v4().simple()));
    }
    fs::rename(path, &backup).await?;
    Ok(backup)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
