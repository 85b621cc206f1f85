//! Progress model for the generative-AI backend setup screen.
//!
//! The installation agent pushes [`SetupEvent`]s; [`ProgressTracker`] reduces
//! them into [`SetupProgress`] snapshots and [`ProgressHub`] publishes the
//! result to whatever is rendering the setup screen.

mod config;
mod error;
mod paths;
mod phase;
mod progress;
mod status;

pub use config::{load_config_from, save_config_to, SetupConfig};
pub use error::{AppError, ErrorKind, Result};
pub use paths::{config_path, get_data_dir};
pub use phase::{
    first_phase, last_working_phase, ordered_phases, phase_info, PhaseInfo, SetupPhase,
    WeightTable,
};
pub use progress::{
    decode_event, pump, resolve, step_states, Applied, ApplyOutcome, ErrorInfo, ProgressHub,
    ProgressTracker, ProgressView, RejectReason, SetupEvent, SetupProgress, StepState,
    DEFAULT_EVENT_BUFFER,
};
pub use status::{check_setup_status, invalidate_marker, mark_setup_complete, SetupStatus};
