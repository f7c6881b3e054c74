//! Error types for sample serialization.

use std::error::Error;
use std::fmt;

use tether_core::ChannelError;

/// Errors that can occur while packing or unpacking sample trajectories.
#[derive(Debug, PartialEq, Eq)]
pub enum WireError {
    /// The underlying transport failed.
    Channel(ChannelError),
    /// A datum reached an exchange point with no stored samples.
    EmptyTrajectory {
        /// Name of the offending datum.
        data: String,
    },
    /// The peer announced a non-positive sub-step count.
    NonPositiveTimeStepCount {
        /// Name of the offending datum.
        data: String,
        /// The announced count.
        count: i32,
    },
    /// Received trajectory times are not strictly ascending.
    TimesNotAscending {
        /// Name of the offending datum.
        data: String,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(e) => write!(f, "channel: {e}"),
            Self::EmptyTrajectory { data } => {
                write!(f, "data \"{data}\" has no samples to exchange")
            }
            Self::NonPositiveTimeStepCount { data, count } => {
                write!(
                    f,
                    "received non-positive sub-step count {count} for data \"{data}\""
                )
            }
            Self::TimesNotAscending { data } => {
                write!(
                    f,
                    "received trajectory times for data \"{data}\" are not strictly ascending"
                )
            }
        }
    }
}

impl Error for WireError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Channel(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ChannelError> for WireError {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}
