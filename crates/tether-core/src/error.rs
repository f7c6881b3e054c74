//! Transport error type shared by all channel implementations.

use std::error::Error;
use std::fmt;

/// Errors surfaced by a point-to-point [`Channel`](crate::Channel).
///
/// The coupling scheme does not retry or recover from transport faults;
/// they propagate to the participant unchanged.
#[derive(Debug, PartialEq, Eq)]
pub enum ChannelError {
    /// The peer endpoint is gone.
    Disconnected,
    /// The peer sent a differently-typed message than expected.
    ///
    /// Both participants must drive their schemes through the same
    /// sequence of exchanges; a type mismatch means the two state
    /// machines disagree about the protocol position.
    TypeMismatch {
        /// The message type this endpoint expected.
        expected: &'static str,
        /// The message type that actually arrived.
        found: &'static str,
    },
    /// A received vector does not match the local buffer length.
    SizeMismatch {
        /// Length of the local buffer.
        expected: usize,
        /// Length of the received vector.
        found: usize,
    },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "peer disconnected"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected {expected} message, received {found}")
            }
            Self::SizeMismatch { expected, found } => {
                write!(
                    f,
                    "received vector of length {found}, local buffer has length {expected}"
                )
            }
        }
    }
}

impl Error for ChannelError {}
