//! Setup phases and their share of overall progress.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A stage of the backend installation pipeline.
///
/// Variant order is the declared display order. `Error` is an overlay on top
/// of whichever phase was active and never occupies a slot of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SetupPhase {
    CheckingEnvironment,
    DownloadingDependencies,
    InstallingDependencies,
    ConfiguringBackend,
    StartingBackend,
    Complete,
    Error,
}

/// Static display data and weight for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseInfo {
    pub display_name: &'static str,
    pub weight: u8,
    pub icon_key: &'static str,
}

const ORDERED: [SetupPhase; 6] = [
    SetupPhase::CheckingEnvironment,
    SetupPhase::DownloadingDependencies,
    SetupPhase::InstallingDependencies,
    SetupPhase::ConfiguringBackend,
    SetupPhase::StartingBackend,
    SetupPhase::Complete,
];

impl SetupPhase {
    /// Identifier used on the wire and in config files.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::CheckingEnvironment => "checking-environment",
            Self::DownloadingDependencies => "downloading-dependencies",
            Self::InstallingDependencies => "installing-dependencies",
            Self::ConfiguringBackend => "configuring-backend",
            Self::StartingBackend => "starting-backend",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }

    pub fn display_name(self) -> &'static str {
        phase_info(self).display_name
    }

    pub fn icon_key(self) -> &'static str {
        phase_info(self).icon_key
    }

    /// Position in the declared order. `Error` sorts after everything.
    pub fn ordinal(self) -> usize {
        match self {
            Self::CheckingEnvironment => 0,
            Self::DownloadingDependencies => 1,
            Self::InstallingDependencies => 2,
            Self::ConfiguringBackend => 3,
            Self::StartingBackend => 4,
            Self::Complete => 5,
            Self::Error => 6,
        }
    }

    /// Whether `self` comes strictly before `other` in declared order.
    pub fn precedes(self, other: Self) -> bool {
        self.ordinal() < other.ordinal()
    }

    /// The phase declared right after this one, if any.
    pub fn next(self) -> Option<Self> {
        ORDERED.get(self.ordinal() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn is_overlay(self) -> bool {
        matches!(self, Self::Error)
    }

    /// Parse a wire identifier (e.g. from the frontend) into a `SetupPhase`.
    pub fn from_str_id(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|p| p.wire_name() == s)
    }

    /// All phases, including the `error` overlay.
    pub fn all() -> &'static [Self] {
        &[
            Self::CheckingEnvironment,
            Self::DownloadingDependencies,
            Self::InstallingDependencies,
            Self::ConfiguringBackend,
            Self::StartingBackend,
            Self::Complete,
            Self::Error,
        ]
    }
}

/// Static table entry for a phase.
pub fn phase_info(phase: SetupPhase) -> PhaseInfo {
    match phase {
        SetupPhase::CheckingEnvironment => PhaseInfo {
            display_name: "Checking environment",
            weight: 10,
            icon_key: "search",
        },
        SetupPhase::DownloadingDependencies => PhaseInfo {
            display_name: "Downloading dependencies",
            weight: 40,
            icon_key: "download",
        },
        SetupPhase::InstallingDependencies => PhaseInfo {
            display_name: "Installing dependencies",
            weight: 30,
            icon_key: "package",
        },
        SetupPhase::ConfiguringBackend => PhaseInfo {
            display_name: "Configuring backend",
            weight: 15,
            icon_key: "settings",
        },
        SetupPhase::StartingBackend => PhaseInfo {
            display_name: "Starting backend",
            weight: 5,
            icon_key: "play",
        },
        SetupPhase::Complete => PhaseInfo {
            display_name: "Setup complete",
            weight: 0,
            icon_key: "check",
        },
        SetupPhase::Error => PhaseInfo {
            display_name: "Setup failed",
            weight: 0,
            icon_key: "alert",
        },
    }
}

/// The phase every run starts in.
pub fn first_phase() -> SetupPhase {
    ORDERED[0]
}

/// The declared display sequence, without the `error` overlay.
pub fn ordered_phases() -> &'static [SetupPhase] {
    &ORDERED
}

/// The final phase that does real work; completing it finishes the run.
pub fn last_working_phase() -> SetupPhase {
    SetupPhase::StartingBackend
}

/// Per-phase weights used to derive overall progress. Always sums to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightTable {
    pub checking_environment: u8,
    pub downloading_dependencies: u8,
    pub installing_dependencies: u8,
    pub configuring_backend: u8,
    pub starting_backend: u8,
}

impl WeightTable {
    pub fn new(
        checking_environment: u8,
        downloading_dependencies: u8,
        installing_dependencies: u8,
        configuring_backend: u8,
        starting_backend: u8,
    ) -> Result<Self> {
        let table = Self {
            checking_environment,
            downloading_dependencies,
            installing_dependencies,
            configuring_backend,
            starting_backend,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        let total = self.total();
        if total != 100 {
            return Err(AppError::config(format!(
                "phase weights must sum to 100, got {}",
                total
            )));
        }
        Ok(())
    }

    pub fn weight(&self, phase: SetupPhase) -> u8 {
        match phase {
            SetupPhase::CheckingEnvironment => self.checking_environment,
            SetupPhase::DownloadingDependencies => self.downloading_dependencies,
            SetupPhase::InstallingDependencies => self.installing_dependencies,
            SetupPhase::ConfiguringBackend => self.configuring_backend,
            SetupPhase::StartingBackend => self.starting_backend,
            SetupPhase::Complete | SetupPhase::Error => 0,
        }
    }

    /// Sum of the weights of every phase declared before `phase`.
    pub fn weight_before(&self, phase: SetupPhase) -> u32 {
        ordered_phases()
            .iter()
            .take_while(|p| p.precedes(phase))
            .map(|p| u32::from(self.weight(*p)))
            .sum()
    }

    fn total(&self) -> u32 {
        ordered_phases()
            .iter()
            .map(|p| u32::from(self.weight(*p)))
            .sum()
    }
}

impl Default for WeightTable {
    fn default() -> Self {
        let w = |p| phase_info(p).weight;
        Self {
            checking_environment: w(SetupPhase::CheckingEnvironment),
            downloading_dependencies: w(SetupPhase::DownloadingDependencies),
            installing_dependencies: w(SetupPhase::InstallingDependencies),
            configuring_backend: w(SetupPhase::ConfiguringBackend),
            starting_backend: w(SetupPhase::StartingBackend),
        }
    }
}
