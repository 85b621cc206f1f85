//! Pure reducer from `(snapshot, event)` to the next snapshot.

use crate::phase::{first_phase, SetupPhase, WeightTable};

use super::{Applied, ApplyOutcome, ErrorInfo, RejectReason, SetupEvent, SetupProgress};

/// Reduces agent events into progress snapshots using a fixed weight table.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    weights: WeightTable,
}

impl ProgressTracker {
    pub fn new(weights: WeightTable) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Zeroed snapshot for a fresh run.
    pub fn initialize(&self) -> SetupProgress {
        let phase = first_phase();
        SetupProgress {
            phase,
            step_label: phase.display_name().to_string(),
            detail_message: String::new(),
            phase_progress_percent: 0.0,
            overall_progress_percent: 0.0,
            estimated_time_remaining: None,
            error_info: None,
            last_active_phase: phase,
        }
    }

    /// Apply one event. Never fails: a rejected event returns `current`
    /// unchanged together with the reason.
    pub fn apply_event(&self, current: &SetupProgress, event: SetupEvent) -> Applied {
        if current.phase.is_terminal() {
            return rejected(current, RejectReason::AlreadyComplete);
        }

        match event {
            SetupEvent::PhaseStarted { phase } => self.start_phase(current, phase),
            SetupEvent::PhaseProgress {
                phase,
                percent,
                detail,
            } => self.report_progress(current, phase, percent, detail),
            SetupEvent::PhaseCompleted { phase } => self.complete_phase(current, phase),
            SetupEvent::EstimatedTime { duration } => {
                let mut next = current.clone();
                next.estimated_time_remaining = Some(duration);
                applied(next)
            }
            SetupEvent::Error {
                message,
                recoverable,
            } => {
                let mut next = current.clone();
                next.phase = SetupPhase::Error;
                next.error_info = Some(ErrorInfo {
                    message,
                    recoverable,
                });
                applied(next)
            }
        }
    }

    /// Overall percentage for `snapshot`, never below `floor`.
    pub fn overall_percent(&self, snapshot: &SetupProgress, floor: f64) -> f64 {
        let phase = snapshot.phase;
        let computed = if phase.is_terminal() {
            100.0
        } else {
            f64::from(self.weights.weight_before(phase))
                + f64::from(self.weights.weight(phase)) * snapshot.phase_progress_percent / 100.0
        };
        clamp_percent(computed).max(floor)
    }

    fn start_phase(&self, current: &SetupProgress, phase: SetupPhase) -> Applied {
        if phase.is_overlay() || phase.precedes(current.last_active_phase) {
            return rejected(current, RejectReason::InvalidTransition);
        }

        let mut next = current.clone();
        next.phase = phase;
        next.last_active_phase = phase;
        next.step_label = phase.display_name().to_string();
        next.phase_progress_percent = if phase.is_terminal() { 100.0 } else { 0.0 };
        next.error_info = None;
        next.overall_progress_percent =
            self.overall_percent(&next, current.overall_progress_percent);
        applied(next)
    }

    fn report_progress(
        &self,
        current: &SetupProgress,
        phase: SetupPhase,
        percent: f64,
        detail: Option<String>,
    ) -> Applied {
        if phase != current.phase || phase.is_overlay() {
            return rejected(current, RejectReason::StaleEvent);
        }

        let mut next = current.clone();
        next.phase_progress_percent = clamp_percent(percent);
        if let Some(detail) = detail {
            next.detail_message = detail;
        }
        next.overall_progress_percent =
            self.overall_percent(&next, current.overall_progress_percent);
        applied(next)
    }

    fn complete_phase(&self, current: &SetupProgress, phase: SetupPhase) -> Applied {
        if phase != current.phase || phase.is_overlay() {
            return rejected(current, RejectReason::StaleEvent);
        }

        // Completion hands over to the next declared phase.
        let following = phase.next().unwrap_or(SetupPhase::Complete);
        let mut next = current.clone();
        next.phase = following;
        next.last_active_phase = following;
        next.step_label = following.display_name().to_string();
        if following.is_terminal() {
            next.phase_progress_percent = 100.0;
            next.estimated_time_remaining = None;
        } else {
            next.phase_progress_percent = 0.0;
        }
        next.overall_progress_percent =
            self.overall_percent(&next, current.overall_progress_percent);
        applied(next)
    }
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

fn applied(progress: SetupProgress) -> Applied {
    Applied {
        progress,
        outcome: ApplyOutcome::Applied,
    }
}

fn rejected(current: &SetupProgress, reason: RejectReason) -> Applied {
    Applied {
        progress: current.clone(),
        outcome: ApplyOutcome::Rejected(reason),
    }
}
