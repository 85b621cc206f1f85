//! Setup progress state: snapshot, inbound events and the reducer over them.

mod hub;
mod resolver;
mod tracker;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, Result};
use crate::phase::SetupPhase;

pub use hub::{pump, ProgressHub, ProgressView};
pub use resolver::{resolve, step_states, StepState};
pub use tracker::ProgressTracker;

/// Default capacity of the snapshot broadcast channel.
pub const DEFAULT_EVENT_BUFFER: usize = 128;

/// Failure reported by the installation agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub recoverable: bool,
}

/// Everything the setup screen needs to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupProgress {
    pub phase: SetupPhase,
    pub step_label: String,
    pub detail_message: String,
    /// 0-100
    pub phase_progress_percent: f64,
    /// 0-100, derived from the weight table
    pub overall_progress_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time_remaining: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_info: Option<ErrorInfo>,
    /// Most recent non-error phase; survives entry into `error`.
    pub last_active_phase: SetupPhase,
}

/// Inbound event pushed by the installation agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "camelCase")]
pub enum SetupEvent {
    PhaseStarted {
        phase: SetupPhase,
    },
    PhaseProgress {
        phase: SetupPhase,
        percent: f64,
        #[serde(default)]
        detail: Option<String>,
    },
    PhaseCompleted {
        phase: SetupPhase,
    },
    EstimatedTime {
        duration: String,
    },
    Error {
        message: String,
        recoverable: bool,
    },
}

impl SetupEvent {
    /// Short name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PhaseStarted { .. } => "phase_started",
            Self::PhaseProgress { .. } => "phase_progress",
            Self::PhaseCompleted { .. } => "phase_completed",
            Self::EstimatedTime { .. } => "estimated_time",
            Self::Error { .. } => "error",
        }
    }
}

/// Why an event left the snapshot untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidTransition,
    StaleEvent,
    AlreadyComplete,
}

impl RejectReason {
    pub fn kind(self) -> ErrorKind {
        match self {
            Self::InvalidTransition => ErrorKind::InvalidTransition,
            Self::StaleEvent => ErrorKind::StaleEvent,
            Self::AlreadyComplete => ErrorKind::AlreadyComplete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ApplyOutcome {
    Applied,
    Rejected(RejectReason),
}

impl ApplyOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Result of reducing one event: always a valid snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub progress: SetupProgress,
    pub outcome: ApplyOutcome,
}

/// Decode an event delivered as raw JSON by the desktop bridge.
pub fn decode_event(json: &str) -> Result<SetupEvent> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tagged_events() {
        let event = decode_event(
            r#"{"type":"phaseProgress","data":{"phase":"downloading-dependencies","percent":42.5,"detail":"torch"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            SetupEvent::PhaseProgress {
                phase: SetupPhase::DownloadingDependencies,
                percent: 42.5,
                detail: Some("torch".to_string()),
            }
        );

        let event = decode_event(r#"{"type":"error","data":{"message":"disk full","recoverable":false}}"#)
            .unwrap();
        assert_eq!(event.label(), "error");
    }

    #[test]
    fn progress_detail_is_optional() {
        let event = decode_event(
            r#"{"type":"phaseProgress","data":{"phase":"checking-environment","percent":5}}"#,
        )
        .unwrap();
        assert!(matches!(event, SetupEvent::PhaseProgress { detail: None, .. }));
    }

    #[test]
    fn rejects_unknown_event_shapes() {
        let err = decode_event(r#"{"type":"phaseSkipped","data":{}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(decode_event(r#"{"type":"phaseStarted","data":{"phase":"python_setup"}}"#).is_err());
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let snapshot = ProgressTracker::default().initialize();
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["phase"], "checking-environment");
        assert_eq!(value["lastActivePhase"], "checking-environment");
        assert_eq!(value["overallProgressPercent"], 0.0);
        assert!(value.get("errorInfo").is_none());
    }

    #[test]
    fn outcome_serializes_with_reason() {
        let value = serde_json::to_value(ApplyOutcome::Rejected(RejectReason::StaleEvent)).unwrap();
        assert_eq!(value["status"], "rejected");
        assert_eq!(value["reason"], "stale_event");
        assert_eq!(RejectReason::StaleEvent.kind().code(), 1002);
    }
}
