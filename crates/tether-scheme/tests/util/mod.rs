//! Shared two-participant harness for the coupled-run tests.

#![allow(dead_code)]

use tether_core::data::{DataDirection, DataSpec};
use tether_core::DataId;
use tether_scheme::{
    CouplingArrangement, CouplingMode, SchemeConfig, TimesteppingMethod,
    UNDEFINED_MAX_ITERATIONS, UNDEFINED_MIN_ITERATIONS, UNDEFINED_TIME, UNDEFINED_TIME_WINDOWS,
    UNDEFINED_TIME_WINDOW_SIZE,
};

/// Base configuration with every limit disabled; tests fill in what they
/// exercise.
pub fn base_config(
    mode: CouplingMode,
    arrangement: CouplingArrangement,
    first: bool,
) -> SchemeConfig {
    SchemeConfig {
        local_participant: if first { "one" } else { "two" }.into(),
        remote_participant: if first { "two" } else { "one" }.into(),
        does_first_step: first,
        mode,
        arrangement,
        dt_method: TimesteppingMethod::FixedTimeWindowSize,
        max_time: UNDEFINED_TIME,
        max_time_windows: UNDEFINED_TIME_WINDOWS,
        time_window_size: UNDEFINED_TIME_WINDOW_SIZE,
        min_iterations: UNDEFINED_MIN_ITERATIONS,
        max_iterations: UNDEFINED_MAX_ITERATIONS,
    }
}

/// A scalar datum without gradients.
pub fn scalar(id: u32, name: &str, direction: DataDirection) -> DataSpec {
    DataSpec {
        id: DataId(id),
        name: name.into(),
        size: 1,
        mesh_dimensions: 2,
        has_gradient: false,
        requires_initialization: false,
        exchange_substeps: false,
        direction,
    }
}

/// Run the two participant closures on their own threads, as a real
/// coupled simulation would, and join both results.
pub fn run_coupled<A, B, RA, RB>(first: A, second: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    std::thread::scope(|scope| {
        let a = scope.spawn(first);
        let b = scope.spawn(second);
        (
            a.join().expect("first participant panicked"),
            b.join().expect("second participant panicked"),
        )
    })
}
