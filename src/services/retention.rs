//! Output retention sweeper

use crate::config::RetentionPolicy;
use crate::error::{GatewayError, Result};
use crate::services::store::{is_valid_output_name, FileStore};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Delete generated outputs last modified before `now - max_age`
///
/// Only names that pass [`is_valid_output_name`] are considered, so anything
/// an operator drops into the directory is left alone. Returns the number of
/// files removed.
pub async fn sweep_expired(output_dir: &Path, max_age: Duration) -> Result<usize> {
    let max_age = chrono::Duration::from_std(max_age)
        .map_err(|e| GatewayError::invalid_config(format!("Retention max age out of range: {e}")))?;
    let cutoff = Utc::now() - max_age;

    let mut entries = tokio::fs::read_dir(output_dir)
        .await
        .map_err(|e| GatewayError::file_io_error("read output directory", output_dir, &e))?;

    let mut removed = 0;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| GatewayError::file_io_error("read output directory", output_dir, &e))?
    {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !is_valid_output_name(name) {
            continue;
        }

        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => DateTime::<Utc>::from(modified),
            Err(e) => {
                tracing::warn!(file = name, error = %e, "Skipping output with unreadable metadata");
                continue;
            },
        };

        if modified < cutoff && FileStore::cleanup(&entry.path()).await {
            removed += 1;
        }
    }

    Ok(removed)
}

/// Start the periodic sweeper for `policy`; `None` when outputs are kept
pub fn spawn_sweeper(output_dir: PathBuf, policy: RetentionPolicy) -> Option<JoinHandle<()>> {
    let RetentionPolicy::MaxAge {
        max_age,
        sweep_interval,
    } = policy
    else {
        tracing::info!("Output retention: keeping generated files indefinitely");
        return None;
    };

    tracing::info!(
        max_age_secs = max_age.as_secs(),
        sweep_interval_secs = sweep_interval.as_secs(),
        "Output retention: deleting expired files periodically"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match sweep_expired(&output_dir, max_age).await {
                Ok(0) => tracing::trace!("Retention sweep found nothing to delete"),
                Ok(removed) => tracing::info!(removed, "Retention sweep deleted expired outputs"),
                Err(e) => tracing::warn!(error = %e, "Retention sweep failed"),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::output_filename;
    use std::time::SystemTime;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn write_aged(path: &Path, age: Duration) {
        std::fs::write(path, b"png").unwrap();
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired_outputs() {
        let temp_dir = tempdir().unwrap();
        let old_output = temp_dir.path().join(output_filename(Uuid::new_v4()));
        let fresh_output = temp_dir.path().join(output_filename(Uuid::new_v4()));
        let old_foreign = temp_dir.path().join("operator-notes.png");

        write_aged(&old_output, Duration::from_secs(7200));
        write_aged(&fresh_output, Duration::from_secs(10));
        write_aged(&old_foreign, Duration::from_secs(7200));

        let removed = sweep_expired(temp_dir.path(), Duration::from_secs(3600))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(!old_output.exists());
        assert!(fresh_output.exists());
        assert!(old_foreign.exists());
    }

    #[tokio::test]
    async fn test_sweep_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let result = sweep_expired(&temp_dir.path().join("gone"), Duration::from_secs(60)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_keep_policy_spawns_nothing() {
        let temp_dir = tempdir().unwrap();
        assert!(spawn_sweeper(temp_dir.path().to_path_buf(), RetentionPolicy::Keep).is_none());
    }

    #[tokio::test]
    async fn test_max_age_policy_sweeps_on_start() {
        let temp_dir = tempdir().unwrap();
        let old_output = temp_dir.path().join(output_filename(Uuid::new_v4()));
        write_aged(&old_output, Duration::from_secs(7200));

        let handle = spawn_sweeper(
            temp_dir.path().to_path_buf(),
            RetentionPolicy::MaxAge {
                max_age: Duration::from_secs(3600),
                sweep_interval: Duration::from_secs(3600),
            },
        )
        .unwrap();

        // The first tick fires immediately
        for _ in 0..50 {
            if !old_output.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();

        assert!(!old_output.exists());
    }
}
