//! Collaborator traits: the transport channel, convergence measures, and
//! the acceleration post-processor.
//!
//! The scheme consumes all three through narrow object-safe interfaces;
//! concrete implementations live outside the coupling core.

use crate::data::CouplingData;
use crate::error::ChannelError;

/// Point-to-point transport between the two participants.
///
/// All operations block in a distributed sense: a send or receive
/// suspends the caller until the peer is ready. There is no cancellation;
/// a stuck peer stalls the scheme unless the transport itself times out.
///
/// # Object safety
///
/// The scheme stores the channel as `Box<dyn Channel>`.
pub trait Channel: Send {
    /// Whether the peer endpoint is reachable.
    fn is_connected(&self) -> bool;

    /// Send a single integer.
    fn send_int(&mut self, value: i32) -> Result<(), ChannelError>;

    /// Send a single scalar.
    fn send_scalar(&mut self, value: f64) -> Result<(), ChannelError>;

    /// Send a single boolean.
    fn send_bool(&mut self, value: bool) -> Result<(), ChannelError>;

    /// Send a dense vector.
    fn send_vector(&mut self, values: &[f64]) -> Result<(), ChannelError>;

    /// Receive a single integer.
    fn receive_int(&mut self) -> Result<i32, ChannelError>;

    /// Receive a single scalar.
    fn receive_scalar(&mut self) -> Result<f64, ChannelError>;

    /// Receive a single boolean.
    fn receive_bool(&mut self) -> Result<bool, ChannelError>;

    /// Receive a dense vector into `values`.
    ///
    /// The received length must equal `values.len()`; a mismatch is a
    /// [`ChannelError::SizeMismatch`].
    fn receive_vector(&mut self, values: &mut [f64]) -> Result<(), ChannelError>;
}

/// One convergence criterion evaluated each implicit iteration.
///
/// `measure()` compares the previous iterate against the current one;
/// the verdict and residual stay readable until the next call.
/// [`new_measurement_series`](Self::new_measurement_series) is invoked at
/// every converged window so implementations can clear history.
pub trait ConvergenceMeasure: Send {
    /// Compare the previous iterate against the current values.
    fn measure(&mut self, previous: &[f64], current: &[f64]);

    /// Verdict of the last [`measure`](Self::measure) call.
    fn is_convergence(&self) -> bool;

    /// Residual norm of the last [`measure`](Self::measure) call, for
    /// logging.
    fn norm_residual(&self) -> f64;

    /// Begin a new measurement series; called once per converged window.
    fn new_measurement_series(&mut self);

    /// One-line state description for a datum, for the run log.
    fn state_line(&self, data_name: &str) -> String {
        format!(
            "{} convergence measure: residual = {:.6e}, converged = {}",
            data_name,
            self.norm_residual(),
            self.is_convergence()
        )
    }
}

/// Opaque acceleration operator applied between implicit iterations.
///
/// The scheme snapshots end-of-window values into the working samples,
/// hands the data set to [`perform_acceleration`](Self::perform_acceleration),
/// and writes the (possibly modified) samples back into storage. On a
/// converged window [`iterations_converged`](Self::iterations_converged)
/// lets the operator reset its history (e.g. quasi-Newton columns).
pub trait Acceleration: Send {
    /// Reserve internal state for the given data set. Called once, at
    /// scheme initialization, by the participant that decides convergence.
    fn initialize(&mut self, data: &mut [&mut CouplingData]);

    /// Post-process the current iterates in place.
    fn perform_acceleration(&mut self, data: &mut [&mut CouplingData]);

    /// The current window converged; reset per-window history.
    fn iterations_converged(&mut self, data: &mut [&mut CouplingData]);

    /// Number of active least-squares columns, for the iterations log.
    fn ls_system_columns(&self) -> i32 {
        0
    }

    /// Columns deleted in the last iteration, for the iterations log.
    fn deleted_columns(&self) -> i32 {
        0
    }

    /// Columns dropped from the history limit, for the iterations log.
    fn dropped_columns(&self) -> i32 {
        0
    }
}
