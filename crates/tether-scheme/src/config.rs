//! Scheme configuration, validation, and sentinel constants.
//!
//! [`SchemeConfig`] is the builder-input for constructing a
//! [`CouplingScheme`](crate::CouplingScheme). [`validate()`](SchemeConfig::validate)
//! checks the structural invariants at startup; every limit uses a
//! sentinel constant to mean "disabled".

use std::error::Error;
use std::fmt;

use tether_core::math;

// ── Sentinels ──────────────────────────────────────────────────────

/// Does not define a time limit for the coupled simulation.
pub const UNDEFINED_TIME: f64 = -1.0;

/// Does not define a limit on time windows for the coupled simulation.
pub const UNDEFINED_TIME_WINDOWS: i32 = -1;

/// The time window size is determined dynamically during the coupling.
pub const UNDEFINED_TIME_WINDOW_SIZE: f64 = -1.0;

/// Iterate without an upper bound (implicit coupling).
pub const INFINITE_MAX_ITERATIONS: i32 = -1;

/// No minimum iteration count is configured (explicit coupling).
pub const UNDEFINED_MIN_ITERATIONS: i32 = -1;

/// No maximum iteration count is configured (explicit coupling).
pub const UNDEFINED_MAX_ITERATIONS: i32 = -1;

// ── Enums ──────────────────────────────────────────────────────────

/// Whether a time window is exchanged once or iterated until convergence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouplingMode {
    /// Exchange once per window and proceed.
    Explicit,
    /// Repeat the window until the convergence measures agree.
    Implicit,
}

/// Execution arrangement of the two participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CouplingArrangement {
    /// Staggered execution: the first participant computes a window, then
    /// the second computes the same window with the fresh data.
    Serial,
    /// Both participants compute the same window concurrently and swap
    /// results at the boundary.
    Parallel,
}

/// How the time window size is determined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimesteppingMethod {
    /// A fixed window size is configured on both participants.
    FixedTimeWindowSize,
    /// The first participant's solver step defines each window; the size
    /// is sent ahead of the data. Serial schemes only.
    FirstParticipantSetsDt,
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SchemeConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// `max_time` is defined but negative.
    NegativeMaxTime {
        /// The configured value.
        value: f64,
    },
    /// `max_time_windows` is defined but negative.
    NegativeMaxTimeWindows {
        /// The configured value.
        value: i32,
    },
    /// `time_window_size` is defined but negative.
    NegativeTimeWindowSize {
        /// The configured value.
        value: f64,
    },
    /// The fixed-window-size method requires a window size.
    MissingTimeWindowSize,
    /// The first-participant method only works for serial arrangements.
    FirstParticipantRequiresSerial,
    /// A window size was configured although the first participant
    /// dictates it.
    UnexpectedTimeWindowSize {
        /// The configured value.
        value: f64,
    },
    /// Iteration limits are an implicit-coupling concept.
    IterationLimitsOnExplicit,
    /// Implicit coupling needs a positive minimum iteration count.
    MinIterationsNotPositive {
        /// The configured value.
        value: i32,
    },
    /// `max_iterations` must be positive or [`INFINITE_MAX_ITERATIONS`].
    MaxIterationsNotPositive {
        /// The configured value.
        value: i32,
    },
    /// The minimum iteration count exceeds the maximum.
    MinIterationsExceedMax {
        /// The configured minimum.
        min: i32,
        /// The configured maximum.
        max: i32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeMaxTime { value } => {
                write!(f, "maximum time has to be larger than zero, got {value}")
            }
            Self::NegativeMaxTimeWindows { value } => {
                write!(
                    f,
                    "maximum number of time windows has to be larger than zero, got {value}"
                )
            }
            Self::NegativeTimeWindowSize { value } => {
                write!(f, "time window size has to be larger than zero, got {value}")
            }
            Self::MissingTimeWindowSize => {
                write!(
                    f,
                    "a time window size has to be given when the fixed time window size method is used"
                )
            }
            Self::FirstParticipantRequiresSerial => {
                write!(
                    f,
                    "the first-participant timestepping method is only available for serial coupling"
                )
            }
            Self::UnexpectedTimeWindowSize { value } => {
                write!(
                    f,
                    "time window size {value} must not be configured when the first participant sets it"
                )
            }
            Self::IterationLimitsOnExplicit => {
                write!(f, "iteration limits are not allowed for explicit coupling")
            }
            Self::MinIterationsNotPositive { value } => {
                write!(
                    f,
                    "minimal iteration limit has to be larger than zero, got {value}"
                )
            }
            Self::MaxIterationsNotPositive { value } => {
                write!(
                    f,
                    "maximal iteration limit has to be larger than zero or -1 (unlimited), got {value}"
                )
            }
            Self::MinIterationsExceedMax { min, max } => {
                write!(
                    f,
                    "minimal iteration limit {min} has to be smaller or equal to the maximal iteration limit {max}"
                )
            }
        }
    }
}

impl Error for ConfigError {}

// ── SchemeConfig ───────────────────────────────────────────────────

/// Complete configuration for constructing a coupling scheme.
///
/// All limits default to their sentinel; `validate()` checks the
/// invariants without mutating anything.
#[derive(Clone, Debug)]
pub struct SchemeConfig {
    /// Name of the participant driving this scheme instance; identifies
    /// log filenames.
    pub local_participant: String,
    /// Name of the peer participant.
    pub remote_participant: String,
    /// Whether this participant takes the first-step role: it sends first
    /// under serial coupling and receives the convergence flag under
    /// implicit coupling.
    pub does_first_step: bool,
    /// Explicit or implicit coupling.
    pub mode: CouplingMode,
    /// Serial or parallel participant arrangement.
    pub arrangement: CouplingArrangement,
    /// How window sizes are determined.
    pub dt_method: TimesteppingMethod,
    /// Simulation end time, or [`UNDEFINED_TIME`]. May truncate the last
    /// window.
    pub max_time: f64,
    /// Maximum number of time windows, or [`UNDEFINED_TIME_WINDOWS`].
    pub max_time_windows: i32,
    /// Fixed window size, or [`UNDEFINED_TIME_WINDOW_SIZE`] for dynamic
    /// sizes.
    pub time_window_size: f64,
    /// Lower bound on iterations per window (implicit only), or
    /// [`UNDEFINED_MIN_ITERATIONS`].
    pub min_iterations: i32,
    /// Upper bound on iterations per window (implicit only);
    /// [`INFINITE_MAX_ITERATIONS`] iterates without bound.
    pub max_iterations: i32,
}

impl SchemeConfig {
    /// Whether a simulation end time is configured.
    pub fn has_max_time(&self) -> bool {
        !math::equals(self.max_time, UNDEFINED_TIME)
    }

    /// Whether a fixed window size is configured.
    pub fn has_time_window_size(&self) -> bool {
        !math::equals(self.time_window_size, UNDEFINED_TIME_WINDOW_SIZE)
    }

    /// Check all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.has_max_time() && self.max_time < 0.0 {
            return Err(ConfigError::NegativeMaxTime {
                value: self.max_time,
            });
        }
        if self.max_time_windows != UNDEFINED_TIME_WINDOWS && self.max_time_windows < 0 {
            return Err(ConfigError::NegativeMaxTimeWindows {
                value: self.max_time_windows,
            });
        }
        if self.has_time_window_size() && self.time_window_size < 0.0 {
            return Err(ConfigError::NegativeTimeWindowSize {
                value: self.time_window_size,
            });
        }

        match self.dt_method {
            TimesteppingMethod::FixedTimeWindowSize => {
                if !self.has_time_window_size() {
                    return Err(ConfigError::MissingTimeWindowSize);
                }
            }
            TimesteppingMethod::FirstParticipantSetsDt => {
                if self.arrangement != CouplingArrangement::Serial {
                    return Err(ConfigError::FirstParticipantRequiresSerial);
                }
                if self.has_time_window_size() {
                    return Err(ConfigError::UnexpectedTimeWindowSize {
                        value: self.time_window_size,
                    });
                }
            }
        }

        match self.mode {
            CouplingMode::Explicit => {
                if self.min_iterations != UNDEFINED_MIN_ITERATIONS
                    || self.max_iterations != UNDEFINED_MAX_ITERATIONS
                {
                    return Err(ConfigError::IterationLimitsOnExplicit);
                }
            }
            CouplingMode::Implicit => {
                if self.min_iterations <= 0 {
                    return Err(ConfigError::MinIterationsNotPositive {
                        value: self.min_iterations,
                    });
                }
                if self.max_iterations != INFINITE_MAX_ITERATIONS && self.max_iterations <= 0 {
                    return Err(ConfigError::MaxIterationsNotPositive {
                        value: self.max_iterations,
                    });
                }
                if self.max_iterations != INFINITE_MAX_ITERATIONS
                    && self.min_iterations > self.max_iterations
                {
                    return Err(ConfigError::MinIterationsExceedMax {
                        min: self.min_iterations,
                        max: self.max_iterations,
                    });
                }
            }
        }

        Ok(())
    }
}
