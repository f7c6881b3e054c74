//! Exchange strategies: the variant-specific send/receive orders.
//!
//! The scheme state machine is shared; what differs between the four
//! coupling variants is *who* sends *when* during the three exchange
//! points of the lifecycle. Each variant implements the capability set
//! `{exchange_initial_data, exchange_first_data, exchange_second_data}`
//! as a stateless strategy over the scheme core.

use crate::config::{CouplingArrangement, CouplingMode};
use crate::error::SchemeError;
use crate::parallel::{ParallelExplicit, ParallelImplicit};
use crate::scheme::SchemeCore;
use crate::serial::{SerialExplicit, SerialImplicit};

/// The three exchange points a coupling variant fills in.
///
/// Strategies are stateless; all scheme state lives in [`SchemeCore`].
pub(crate) trait ExchangeStrategy: Send {
    /// Exchange initialized data during `initialize()`.
    fn exchange_initial_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError>;

    /// First data exchange at a window boundary.
    fn exchange_first_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError>;

    /// Second data exchange at a window boundary, including the
    /// convergence protocol for implicit variants.
    fn exchange_second_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError>;

    /// Receive the peer's first window result right after `initialize()`.
    ///
    /// Only the trailing participant of a serial scheme does this; the
    /// default is an invariant violation.
    fn receive_result_of_first_advance(&self, _core: &mut SchemeCore) -> Result<(), SchemeError> {
        panic!(
            "only the trailing participant of a serial scheme receives the result of the first advance"
        );
    }
}

/// Select the strategy for a mode/arrangement combination.
pub(crate) fn strategy_for(
    mode: CouplingMode,
    arrangement: CouplingArrangement,
) -> Box<dyn ExchangeStrategy> {
    match (arrangement, mode) {
        (CouplingArrangement::Serial, CouplingMode::Explicit) => Box::new(SerialExplicit),
        (CouplingArrangement::Serial, CouplingMode::Implicit) => Box::new(SerialImplicit),
        (CouplingArrangement::Parallel, CouplingMode::Explicit) => Box::new(ParallelExplicit),
        (CouplingArrangement::Parallel, CouplingMode::Implicit) => Box::new(ParallelImplicit),
    }
}
