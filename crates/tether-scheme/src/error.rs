//! Usage errors surfaced by the coupling scheme at run time.

use std::error::Error;
use std::fmt;
use std::io;

use tether_core::{Action, ChannelError};
use tether_wire::WireError;

/// Errors returned by scheme operations after construction.
///
/// All of these are fatal to the run; the scheme has no retry semantics.
/// A non-converged implicit window is *not* an error — it is a normal
/// rewind driven by the read-checkpoint action.
#[derive(Debug)]
pub enum SchemeError {
    /// The underlying transport failed.
    Channel(ChannelError),
    /// Packing or unpacking exchanged samples failed.
    Wire(WireError),
    /// Writing a log table failed.
    Log(io::Error),
    /// An operation requires `initialize()` to have been called.
    NotInitialized {
        /// The operation that was attempted.
        operation: &'static str,
    },
    /// `add_computed_time` was called although the simulation already
    /// ended.
    CouplingEnded,
    /// The solver reported a time step larger than the remaining window.
    TimeStepTooLarge {
        /// The reported step.
        dt: f64,
        /// The maximum allowed step at the time of the call.
        max: f64,
    },
    /// A datum was registered for sending and for receiving.
    ConflictingDirection {
        /// Name of the offending datum.
        data: String,
    },
    /// A synchronization point was reached with unfulfilled actions.
    UnfulfilledActions {
        /// The required actions that were not fulfilled.
        missing: Vec<Action>,
    },
    /// An action was marked fulfilled without being required.
    ActionNotRequired {
        /// The offending action.
        action: Action,
    },
    /// A strict convergence measure did not converge within the allowed
    /// iterations.
    StrictMeasureDidNotConverge {
        /// Name of the measured datum.
        data: String,
    },
}

impl fmt::Display for SchemeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(e) => write!(f, "channel: {e}"),
            Self::Wire(e) => write!(f, "wire: {e}"),
            Self::Log(e) => write!(f, "log writer: {e}"),
            Self::NotInitialized { operation } => {
                write!(
                    f,
                    "called {operation}() before the coupling scheme was initialized via initialize()"
                )
            }
            Self::CouplingEnded => {
                write!(f, "invalid call of add_computed_time() after simulation end")
            }
            Self::TimeStepTooLarge { dt, max } => {
                write!(
                    f,
                    "the time step size {dt} exceeds the maximum allowed time step size {max} \
                     in the remainder of this time window; restrict your solver step to \
                     dt = min(scheme_dt, solver_dt)"
                )
            }
            Self::ConflictingDirection { data } => {
                write!(
                    f,
                    "data \"{data}\" cannot be added for sending and for receiving; \
                     remove one of the two exchange declarations"
                )
            }
            Self::UnfulfilledActions { missing } => {
                write!(f, "the required actions ")?;
                for (i, action) in missing.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{action}")?;
                }
                write!(
                    f,
                    " are not fulfilled; did you forget to query \
                     requires-writing-checkpoint or requires-reading-checkpoint?"
                )
            }
            Self::ActionNotRequired { action } => {
                write!(f, "action {action} was marked fulfilled but is not required")
            }
            Self::StrictMeasureDidNotConverge { data } => {
                write!(
                    f,
                    "the strict convergence measure for data \"{data}\" did not converge within \
                     the maximum allowed iterations, which terminates the simulation; to avoid \
                     this forced termination do not mark the convergence measure as strict"
                )
            }
        }
    }
}

impl Error for SchemeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Channel(e) => Some(e),
            Self::Wire(e) => Some(e),
            Self::Log(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChannelError> for SchemeError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

impl From<WireError> for SchemeError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}

impl From<io::Error> for SchemeError {
    fn from(e: io::Error) -> Self {
        Self::Log(e)
    }
}
