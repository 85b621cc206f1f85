//! Setup completion marker.
//!
//! A finished run leaves a marker in the data directory so the next launch can
//! skip straight to the backend instead of running setup again.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::paths::{ensure_data_dir, marker_path, validate_file_name};
use crate::phase::SetupPhase;
use crate::progress::SetupProgress;

/// What the frontend should do on launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "camelCase")]
pub enum SetupStatus {
    BackendFullyVerifiedAndReady,
    FullSetupRequired { reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct MarkerRecord {
    completed_at: String,
}

pub fn check_setup_status(data_dir: &Path, marker_file: &str) -> SetupStatus {
    if let Err(e) = validate_file_name(marker_file) {
        log::warn!("Refusing to read setup marker: {}", e);
        return SetupStatus::FullSetupRequired {
            reason: format!("Setup marker name is invalid: {}", e),
        };
    }

    let path = marker_path(data_dir, marker_file);
    if !path.exists() {
        return SetupStatus::FullSetupRequired {
            reason: "New installation or previous setup incomplete.".to_string(),
        };
    }

    let record = fs::read_to_string(&path)
        .map_err(AppError::from)
        .and_then(|content| toml::from_str::<MarkerRecord>(&content).map_err(AppError::from));
    match record {
        Ok(record) => {
            log::info!("Setup marker found, completed at {}", record.completed_at);
            SetupStatus::BackendFullyVerifiedAndReady
        }
        Err(e) => {
            log::warn!("Setup marker at {:?} is unreadable: {}", path, e);
            SetupStatus::FullSetupRequired {
                reason: format!("Setup marker is corrupted: {}", e),
            }
        }
    }
}

/// Record that the run in `progress` finished. Only a `complete` snapshot
/// may be marked.
pub fn mark_setup_complete(
    data_dir: &Path,
    marker_file: &str,
    progress: &SetupProgress,
) -> Result<()> {
    validate_file_name(marker_file)?;
    if progress.phase != SetupPhase::Complete {
        return Err(AppError::other(format!(
            "Setup has not completed (phase {})",
            progress.phase.wire_name()
        )));
    }

    ensure_data_dir(data_dir)?;
    let record = MarkerRecord {
        completed_at: chrono::Utc::now().to_rfc3339(),
    };
    let content = toml::to_string(&record)?;
    fs::write(marker_path(data_dir, marker_file), content)
        .map_err(|e| AppError::io(format!("Failed to write setup marker: {}", e)))
}

/// Remove the marker so the next launch runs setup again. Returns whether a
/// marker was present.
pub fn invalidate_marker(data_dir: &Path, marker_file: &str) -> Result<bool> {
    validate_file_name(marker_file)?;
    let path = marker_path(data_dir, marker_file);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(&path)
        .map_err(|e| AppError::io(format!("Failed to remove setup marker {:?}: {}", path, e)))?;
    log::info!("Setup marker removed: {:?}", path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ProgressTracker, SetupEvent};

    const MARKER: &str = "setup_complete.marker";

    fn scratch_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("setup-status-{}", uuid::Uuid::new_v4()))
    }

    fn finished_run() -> SetupProgress {
        let tracker = ProgressTracker::default();
        let started = tracker
            .apply_event(
                &tracker.initialize(),
                SetupEvent::PhaseStarted {
                    phase: SetupPhase::StartingBackend,
                },
            )
            .progress;
        tracker
            .apply_event(
                &started,
                SetupEvent::PhaseCompleted {
                    phase: SetupPhase::StartingBackend,
                },
            )
            .progress
    }

    #[test]
    fn marker_lifecycle() {
        let dir = scratch_dir();
        assert!(matches!(
            check_setup_status(&dir, MARKER),
            SetupStatus::FullSetupRequired { .. }
        ));

        mark_setup_complete(&dir, MARKER, &finished_run()).unwrap();
        assert_eq!(
            check_setup_status(&dir, MARKER),
            SetupStatus::BackendFullyVerifiedAndReady
        );

        assert!(invalidate_marker(&dir, MARKER).unwrap());
        assert!(!invalidate_marker(&dir, MARKER).unwrap());
        assert!(matches!(
            check_setup_status(&dir, MARKER),
            SetupStatus::FullSetupRequired { .. }
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unfinished_run_cannot_be_marked() {
        let dir = scratch_dir();
        let err = mark_setup_complete(&dir, MARKER, &ProgressTracker::default().initialize())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Other);
        assert!(!dir.join(MARKER).exists());
    }

    #[test]
    fn corrupted_marker_requires_full_setup() {
        let dir = scratch_dir();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MARKER), "not = [valid").unwrap();

        let status = check_setup_status(&dir, MARKER);
        assert!(matches!(
            status,
            SetupStatus::FullSetupRequired { ref reason } if reason.starts_with("Setup marker is corrupted")
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn marker_outside_data_dir_is_not_read() {
        let base = scratch_dir();
        let data_dir = base.join("data");
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(base.join("outside.marker"), "completed_at = \"x\"\n").unwrap();

        let status = check_setup_status(&data_dir, "../outside.marker");
        assert!(matches!(
            status,
            SetupStatus::FullSetupRequired { ref reason } if reason.starts_with("Setup marker name is invalid")
        ));

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn status_serializes_as_tagged_event() {
        let ready = serde_json::to_value(SetupStatus::BackendFullyVerifiedAndReady).unwrap();
        assert_eq!(ready["type"], "backendFullyVerifiedAndReady");

        let required = serde_json::to_value(SetupStatus::FullSetupRequired {
            reason: "first launch".to_string(),
        })
        .unwrap();
        assert_eq!(required["type"], "fullSetupRequired");
        assert_eq!(required["data"]["reason"], "first launch");
    }
}
