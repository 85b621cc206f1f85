//! Maps a snapshot onto a position in the phase strip.

use serde::Serialize;

use crate::phase::SetupPhase;

use super::SetupProgress;

/// Rendering state of one entry in the phase strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Complete,
    Active,
    Failed,
    Pending,
}

/// The working phase the snapshot stands at; `error` maps back to the phase
/// where the failure happened.
fn current_phase(snapshot: &SetupProgress) -> SetupPhase {
    match snapshot.phase {
        SetupPhase::Error => snapshot.last_active_phase,
        phase => phase,
    }
}

/// Index of the entry the snapshot is currently at.
///
/// `complete` always resolves to the final entry and `error` resolves to the
/// phase that was active when the failure happened. When a strip leaves that
/// phase out, the nearest earlier entry is used; 0 only when every entry comes
/// later.
pub fn resolve(snapshot: &SetupProgress, ordered: &[SetupPhase]) -> usize {
    if snapshot.phase.is_terminal() {
        return ordered.len().saturating_sub(1);
    }
    let target = current_phase(snapshot);
    ordered
        .iter()
        .rposition(|p| !target.precedes(*p))
        .unwrap_or(0)
}

/// Per-entry state, decided by declared order so that entries missing from
/// a custom strip never take the blame for a failure elsewhere.
pub fn step_states(snapshot: &SetupProgress, ordered: &[SetupPhase]) -> Vec<StepState> {
    let finished = snapshot.phase.is_terminal();
    let failed = snapshot.phase.is_overlay();
    let target = current_phase(snapshot);

    ordered
        .iter()
        .map(|phase| {
            if finished || phase.precedes(target) {
                StepState::Complete
            } else if *phase == target && failed {
                StepState::Failed
            } else if *phase == target {
                StepState::Active
            } else {
                StepState::Pending
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::phase::ordered_phases;
    use crate::progress::{ProgressTracker, SetupEvent};

    fn apply_all(events: Vec<SetupEvent>) -> SetupProgress {
        let tracker = ProgressTracker::default();
        events.into_iter().fold(tracker.initialize(), |snapshot, event| {
            tracker.apply_event(&snapshot, event).progress
        })
    }

    #[test]
    fn initial_snapshot_resolves_to_first_entry() {
        let snapshot = apply_all(Vec::new());
        assert_eq!(resolve(&snapshot, ordered_phases()), 0);
    }

    #[test]
    fn complete_resolves_to_last_entry_even_when_phases_were_skipped() {
        let snapshot = apply_all(vec![
            SetupEvent::PhaseStarted {
                phase: SetupPhase::StartingBackend,
            },
            SetupEvent::PhaseCompleted {
                phase: SetupPhase::StartingBackend,
            },
        ]);
        assert_eq!(snapshot.phase, SetupPhase::Complete);
        assert_eq!(resolve(&snapshot, ordered_phases()), ordered_phases().len() - 1);
    }

    #[test]
    fn error_resolves_to_phase_where_it_occurred() {
        let snapshot = apply_all(vec![
            SetupEvent::PhaseStarted {
                phase: SetupPhase::InstallingDependencies,
            },
            SetupEvent::PhaseProgress {
                phase: SetupPhase::InstallingDependencies,
                percent: 35.0,
                detail: None,
            },
            SetupEvent::Error {
                message: "wheel build failed".to_string(),
                recoverable: true,
            },
        ]);
        let index = resolve(&snapshot, ordered_phases());
        assert_eq!(ordered_phases()[index], SetupPhase::InstallingDependencies);
        assert_ne!(index, 0);
    }

    #[test]
    fn step_states_mark_failure_at_active_entry() {
        let snapshot = apply_all(vec![
            SetupEvent::PhaseStarted {
                phase: SetupPhase::DownloadingDependencies,
            },
            SetupEvent::Error {
                message: "connection reset".to_string(),
                recoverable: true,
            },
        ]);
        assert_eq!(
            step_states(&snapshot, ordered_phases()),
            vec![
                StepState::Complete,
                StepState::Failed,
                StepState::Pending,
                StepState::Pending,
                StepState::Pending,
                StepState::Pending,
            ]
        );
    }

    #[test]
    fn step_states_all_complete_when_finished() {
        let snapshot = apply_all(vec![
            SetupEvent::PhaseStarted {
                phase: SetupPhase::StartingBackend,
            },
            SetupEvent::PhaseCompleted {
                phase: SetupPhase::StartingBackend,
            },
        ]);
        assert!(step_states(&snapshot, ordered_phases())
            .iter()
            .all(|s| *s == StepState::Complete));
    }

    #[test]
    fn subset_strip_resolves_to_nearest_earlier_entry() {
        let snapshot = apply_all(vec![SetupEvent::PhaseStarted {
            phase: SetupPhase::ConfiguringBackend,
        }]);
        let strip = [
            SetupPhase::CheckingEnvironment,
            SetupPhase::InstallingDependencies,
            SetupPhase::StartingBackend,
        ];
        assert_eq!(resolve(&snapshot, &strip), 1);

        let later_only = [SetupPhase::StartingBackend, SetupPhase::Complete];
        assert_eq!(resolve(&snapshot, &later_only), 0);
    }

    #[test]
    fn failure_outside_subset_strip_marks_no_entry_failed() {
        let snapshot = apply_all(vec![
            SetupEvent::PhaseStarted {
                phase: SetupPhase::ConfiguringBackend,
            },
            SetupEvent::Error {
                message: "port 8188 in use".to_string(),
                recoverable: true,
            },
        ]);
        let strip = [SetupPhase::CheckingEnvironment, SetupPhase::StartingBackend];
        assert_eq!(
            step_states(&snapshot, &strip),
            vec![StepState::Complete, StepState::Pending]
        );
    }
}
