//! Owner of the current setup snapshot and its subscribers.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::config::SetupConfig;
use crate::error::{AppError, Result};
use crate::phase::{ordered_phases, SetupPhase};

use super::{
    decode_event, resolve, Applied, ApplyOutcome, ProgressTracker, RejectReason, SetupEvent,
    SetupProgress,
};

/// Read-only view published to rendering components after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub run_id: String,
    pub started_at: String,
    pub progress: SetupProgress,
    /// Position in the phase strip, see [`resolve`].
    pub active_index: usize,
}

#[derive(Debug, Clone)]
struct RunState {
    run_id: String,
    started_at: String,
    progress: SetupProgress,
}

impl RunState {
    fn fresh(tracker: &ProgressTracker) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            progress: tracker.initialize(),
        }
    }

    fn view(&self) -> ProgressView {
        ProgressView {
            run_id: self.run_id.clone(),
            started_at: self.started_at.clone(),
            progress: self.progress.clone(),
            active_index: resolve(&self.progress, ordered_phases()),
        }
    }
}

/// Single writer of the setup snapshot.
///
/// Events are applied one at a time under the write lock, so concurrent
/// callers are serialized in arrival order. Readers only ever see complete
/// snapshots.
pub struct ProgressHub {
    tracker: ProgressTracker,
    state: RwLock<RunState>,
    views: broadcast::Sender<ProgressView>,
}

impl ProgressHub {
    pub fn new(tracker: ProgressTracker, capacity: usize) -> Self {
        let (views, _) = broadcast::channel(capacity.max(1));
        let state = RwLock::new(RunState::fresh(&tracker));
        Self {
            tracker,
            state,
            views,
        }
    }

    pub fn from_config(config: &SetupConfig) -> Self {
        Self::new(ProgressTracker::new(config.weights), config.event_buffer)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressView> {
        self.views.subscribe()
    }

    pub fn snapshot(&self) -> SetupProgress {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.progress.clone()
    }

    pub fn view(&self) -> ProgressView {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.view()
    }

    pub fn run_id(&self) -> String {
        let state = self.state.read().unwrap_or_else(|e| e.into_inner());
        state.run_id.clone()
    }

    /// Apply an event to the current run and notify subscribers if it changed
    /// anything.
    pub fn apply(&self, event: SetupEvent) -> ApplyOutcome {
        let label = event.label();
        let target = match &event {
            SetupEvent::PhaseStarted { phase } => Some(*phase),
            _ => None,
        };
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let previous = state.progress.phase;
        let Applied { progress, outcome } = self.tracker.apply_event(&state.progress, event);
        if outcome.is_applied() {
            state.progress = progress;
        }
        let view = state.view();
        drop(state);

        match outcome {
            ApplyOutcome::Applied => {
                log_transition(&view, previous);
                let _ = self.views.send(view);
            }
            ApplyOutcome::Rejected(RejectReason::InvalidTransition) => {
                let err = AppError::invalid_transition(
                    view.progress.last_active_phase.wire_name(),
                    target.map_or("", SetupPhase::wire_name),
                );
                log::warn!("Setup run {} rejected {}: {}", view.run_id, label, err);
            }
            ApplyOutcome::Rejected(reason) => {
                log::debug!(
                    "Setup run {} ignored {} ({:?}) in phase {}",
                    view.run_id,
                    label,
                    reason,
                    view.progress.phase.wire_name()
                );
            }
        }

        outcome
    }

    /// Decode and apply an event delivered as raw JSON.
    pub fn apply_json(&self, json: &str) -> Result<ApplyOutcome> {
        let event = decode_event(json)?;
        Ok(self.apply(event))
    }

    /// Discard the current run and start a fresh one.
    pub fn reset(&self) -> ProgressView {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        let previous_run = std::mem::replace(&mut *state, RunState::fresh(&self.tracker));
        let view = state.view();
        drop(state);

        log::info!(
            "Setup run {} replaced by {} (previous phase {})",
            previous_run.run_id,
            view.run_id,
            previous_run.progress.phase.wire_name()
        );
        let _ = self.views.send(view.clone());
        view
    }
}

fn log_transition(view: &ProgressView, previous: SetupPhase) {
    let progress = &view.progress;
    if progress.phase == previous {
        return;
    }
    match (&progress.phase, &progress.error_info) {
        (SetupPhase::Error, Some(info)) => log::error!(
            "Setup run {} failed during {}: {}",
            view.run_id,
            progress.last_active_phase.wire_name(),
            AppError::agent(info.message.as_str(), info.recoverable)
        ),
        (phase, _) => log::info!(
            "Setup run {} entered {} at {:.1}%",
            view.run_id,
            phase.wire_name(),
            progress.overall_progress_percent
        ),
    }
}

/// Apply events from the agent stream strictly in arrival order until the
/// sender side is dropped. Returns the final snapshot.
pub async fn pump(hub: Arc<ProgressHub>, mut rx: mpsc::Receiver<SetupEvent>) -> SetupProgress {
    while let Some(event) = rx.recv().await {
        hub.apply(event);
    }
    log::debug!("Setup event stream closed for run {}", hub.run_id());
    hub.snapshot()
}
