//! Serial coupling: staggered execution where the first participant
//! computes a window, sends its result, and the trailing participant
//! computes the same window with the fresh data.
//!
//! Wire pairing per cycle — the first-step participant sends in the first
//! exchange (preceded by the window size under the first-participant
//! method) and receives window-end data in the second; the trailing
//! participant sends in the second exchange and then, while the coupling
//! is ongoing (or the window is repeated), receives the first
//! participant's *next* result. The trailing participant's very first
//! receive happens right after `initialize()` via
//! `receive_result_of_first_advance`.
//!
//! The guards on the trailing receive evaluate identically on both sides
//! — both state machines see the same counters — so every send pairs
//! with exactly one receive and the protocol cannot deadlock.

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
        core.send_time_window_size()?;
        let ids = core.send_ids();
        core.send_data(&ids)?;
    }
    // The trailing participant is silent in the first exchange: its
    // receive of this data happens at the end of its own second exchange
    // (or right after initialize), where the send/receive order stays
    // deadlock-free.
    Ok(())
}

fn receive_first_advance_result(core: &mut SchemeCore) -> Result<(), SchemeError> {
    assert!(
        !core.does_first_step,
        "the first participant computes the first advance; it cannot receive it"
    );
    // The initial-data exchange may already have received this cycle;
    // this receive overrides those buffers and restarts the cycle flag.
    core.has_data_been_received = false;
    core.receive_and_set_time_window_size()?;
    let ids = core.receive_ids();
    core.receive_data_for_window_end(&ids)?;
    Ok(())
}

/// Serial arrangement, one exchange per window.
pub(crate) struct SerialExplicit;

impl ExchangeStrategy for SerialExplicit {
    fn exchange_initial_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        exchange_initial(core)
    }

    fn exchange_first_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        exchange_first(core)
    }

    fn exchange_second_data(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        if core.does_first_step {
            let ids = core.receive_ids();
            core.receive_data_for_window_end(&ids)?;
        } else {
            let ids = core.send_ids();
            core.send_data(&ids)?;
            if core.is_coupling_ongoing() {
                core.receive_and_set_time_window_size()?;
                let ids = core.receive_ids();
                core.receive_data_for_window_end(&ids)?;
            }
        }
        core.move_to_next_window();
        Ok(())
    }

    fn receive_result_of_first_advance(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        receive_first_advance_result(core)
    }
}

/// Serial arrangement, windows iterated until convergence.
pub(crate) struct SerialImplicit;

impl ExchangeStrategy for SerialImplicit {
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
            core.receive_data_for_window_end(&ids)?;
        } else {
            let ids = core.send_ids();
            core.send_data(&ids)?;
            // A repeated window needs the first participant's next
            // iterate even when the simulated time looks exhausted.
            if !core.has_converged || core.is_coupling_ongoing() {
                core.receive_and_set_time_window_size()?;
                let ids = core.receive_ids();
                core.receive_data_for_window_end(&ids)?;
            }
        }
        Ok(())
    }

    fn receive_result_of_first_advance(&self, core: &mut SchemeCore) -> Result<(), SchemeError> {
        receive_first_advance_result(core)
    }
}
