//! Parallel coupling: both participants compute the same window
//! concurrently and swap results at the boundary.
//!
//! Wire pairing per cycle — the first-step participant sends in the first
//! exchange and receives in the second; the other participant mirrors it.
//! Under implicit coupling the non-first-step participant decides
//! convergence and sends the flag ahead of its data.

use crate::error::SchemeError;
use crate::scheme::SchemeCore;
use crate::strategy::ExchangeStrategy;

fn exchange_initial(core: &mut SchemeCore) -> Result<(), SchemeError> {
    if core.does_first_step {
        if core.sends_initialized_data {
            let ids = core.send_ids();
            core.send_data(&ids)?;
        }
        if core.receives_initialized_data {
            let ids = core.receive_ids();
            core.receive_data(&ids)?;
        }
    } else {
        if core.receives_initialized_data {
            let ids = core.receive_ids();
            core.receive_data(&ids)?;
        }
        if core.sends_initialized_data {
            let ids = core.send_ids();
            core.send_data(&ids)?;
        }
    }
    Ok(())
}

fn exchange_first(core: &mut SchemeCore) -> Result<(), SchemeError> {
    if core.does_first_step {
        let ids = core.send_ids();
        core.send_data(&ids)
    } else {
        let ids = core.receive_ids();
        core.receive_data(&ids)
    }
}

/// Parallel arrangement, one exchange per window.
pub(crate) struct ParallelExplicit;

impl ExchangeStrategy for ParallelExplicit {
    fn exchange_initial_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        exchange_initial(core)
    }

    fn exchange_first_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        exchange_first(core)
    }

    fn exchange_second_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        if core.does_first_step {
            let ids = core.receive_ids();
            core.receive_data(&ids)?;
        } else {
            let ids = core.send_ids();
            core.send_data(&ids)?;
        }
        core.move_to_next_window();
        Ok(())
    }
}

/// Parallel arrangement, windows iterated until convergence.
pub(crate) struct ParallelImplicit;

impl ExchangeStrategy for ParallelImplicit {
    fn exchange_initial_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        exchange_initial(core)
    }

    fn exchange_first_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        exchange_first(core)
    }

    fn exchange_second_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        if core.does_first_step {
            core.receive_convergence()?;
        } else {
            core.do_implicit_step()?;
            core.send_convergence()?;
        }

        if core.has_converged {
            core.move_to_next_window();
        }
        core.store_iteration();

        if core.does_first_step {
            let ids = core.receive_ids();
            core.receive_data(&ids)?;
        } else {
            let ids = core.send_ids();
            core.send_data(&ids)?;
        }
        Ok(())
    }
}
