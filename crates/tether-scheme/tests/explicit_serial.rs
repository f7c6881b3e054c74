//! Coupled runs of the explicit serial scheme: window truncation by the
//! end time, sub-stepped windows, and deterministic window boundaries.

mod util;

use tether_core::data::DataDirection;
use tether_core::{math, DataId};
use tether_scheme::{CouplingArrangement, CouplingMode, CouplingScheme, SchemeConfig};
use tether_test_utils::{channel_pair, InProcChannel};
use util::{base_config, run_coupled, scalar};

fn scheme_for(
    mut config: SchemeConfig,
    channel: InProcChannel,
    first: bool,
    max_time: f64,
    window_size: f64,
) -> (CouplingScheme, DataId, DataId) {
    config.max_time = max_time;
    config.time_window_size = window_size;
    let mut scheme = CouplingScheme::new(config, Box::new(channel)).unwrap();
    // The first participant sends "flux" and receives "pressure".
    let (send_name, receive_name) = if first {
        ("flux", "pressure")
    } else {
        ("pressure", "flux")
    };
    let send_id = if first { 0 } else { 1 };
    let receive_id = if first { 1 } else { 0 };
    let send = scheme
        .add_coupling_data(scalar(send_id, send_name, DataDirection::Send))
        .unwrap();
    let receive = scheme
        .add_coupling_data(scalar(receive_id, receive_name, DataDirection::Receive))
        .unwrap();
    (scheme, send, receive)
}

struct RunRecord {
    max_step_sizes: Vec<f64>,
    windows_completed: u32,
    final_time: f64,
    boundary_bits: Vec<(u64, u64)>,
}

/// One participant of a serial explicit run: step to each window
/// boundary (optionally in sub-steps), write the send datum, advance.
fn run_participant(first: bool, max_time: f64, window_size: f64, step_cap: f64, channel: InProcChannel) -> RunRecord {
    let (mut scheme, send, _receive) =
        scheme_for(base_config(CouplingMode::Explicit, CouplingArrangement::Serial, first), channel, first, max_time, window_size);

    scheme.initialize(0.0, 1).unwrap();
    if !first {
        scheme.receive_result_of_first_advance().unwrap();
    }

    let mut record = RunRecord {
        max_step_sizes: Vec::new(),
        windows_completed: 0,
        final_time: 0.0,
        boundary_bits: Vec::new(),
    };

    while scheme.is_coupling_ongoing() {
        let max_size = scheme.next_time_step_max_size();
        if math::equals(scheme.time(), scheme.window_start_time()) {
            record.max_step_sizes.push(max_size);
        }
        let dt = max_size.min(step_cap);

        // "Solve" one step: the send value is the time at the end of it.
        let t = scheme.time() + dt;
        {
            let data = scheme.data_mut(send).unwrap();
            data.values_mut()[0] = t;
            data.store_sample_at_time(t);
        }

        scheme.add_computed_time(dt).unwrap();
        scheme.advance().unwrap();
        if scheme.is_time_window_complete() {
            record.windows_completed += 1;
            record
                .boundary_bits
                .push((scheme.time().to_bits(), scheme.window_start_time().to_bits()));
        }
    }
    record.final_time = scheme.time();
    scheme.finalize().unwrap();
    record
}

#[test]
fn nonfitting_windows_truncate_to_max_time() {
    // max-time 1.0 with window size 0.75: the second window is truncated
    // to 0.25 and the run ends at exactly 1.0.
    let (a, b) = channel_pair();
    let (one, two) = run_coupled(
        || run_participant(true, 1.0, 0.75, f64::MAX, a),
        || run_participant(false, 1.0, 0.75, f64::MAX, b),
    );

    for record in [&one, &two] {
        assert_eq!(record.max_step_sizes, vec![0.75, 0.25]);
        assert_eq!(record.windows_completed, 2);
        assert_eq!(record.final_time, 1.0);
    }
}

#[test]
fn fitting_windows_complete_without_truncation() {
    let (a, b) = channel_pair();
    let (one, two) = run_coupled(
        || run_participant(true, 1.0, 0.25, f64::MAX, a),
        || run_participant(false, 1.0, 0.25, f64::MAX, b),
    );
    for record in [&one, &two] {
        assert_eq!(record.max_step_sizes, vec![0.25; 4]);
        assert_eq!(record.windows_completed, 4);
        assert_eq!(record.final_time, 1.0);
    }
}

#[test]
fn trailing_participant_receives_each_window_result() {
    // The first participant writes its end-of-step time; the trailing
    // participant must see the first participant's window-end value right
    // from its first window.
    let (a, b) = channel_pair();
    let ((), received) = run_coupled(
        || {
            run_participant(true, 0.5, 0.25, f64::MAX, a);
        },
        || {
            let (mut scheme, send, receive) = scheme_for(
                base_config(CouplingMode::Explicit, CouplingArrangement::Serial, false),
                b,
                false,
                0.5,
                0.25,
            );
            scheme.initialize(0.0, 1).unwrap();
            scheme.receive_result_of_first_advance().unwrap();
            assert!(scheme.has_data_been_received());

            let mut received = Vec::new();
            while scheme.is_coupling_ongoing() {
                let dt = scheme.next_time_step_max_size();
                received.push(scheme.data(receive).unwrap().values()[0]);
                let t = scheme.time() + dt;
                {
                    let data = scheme.data_mut(send).unwrap();
                    data.values_mut()[0] = -t;
                    data.store_sample_at_time(t);
                }
                scheme.add_computed_time(dt).unwrap();
                scheme.advance().unwrap();
            }
            scheme.finalize().unwrap();
            received
        },
    );
    // Window-end values of the first participant: 0.25, then 0.5.
    assert_eq!(received, vec![0.25, 0.5]);
}

#[test]
fn substepped_boundaries_are_exact_and_reproducible() {
    // Ten windows of 0.1, each crossed in uneven sub-steps. The window
    // boundaries must land on the accumulated start times exactly enough
    // for the boundary test, and two identical runs must be bit-identical.
    let run = || {
        let (a, b) = channel_pair();
        run_coupled(
            || run_participant(true, 1.0, 0.1, 0.013, a),
            || run_participant(false, 1.0, 0.1, 0.013, b),
        )
    };
    let (one_a, two_a) = run();
    let (one_b, two_b) = run();

    for record in [&one_a, &two_a] {
        assert_eq!(record.windows_completed, 10);
        assert!(math::equals(record.final_time, 1.0));
        for (k, &(time_bits, start_bits)) in record.boundary_bits.iter().enumerate() {
            let boundary = f64::from_bits(time_bits);
            assert!(
                math::equals(boundary, 0.1 * (k + 1) as f64),
                "window {k} ended at {boundary}"
            );
            assert_eq!(time_bits, start_bits, "time was not reset to the window start");
        }
    }

    assert_eq!(one_a.boundary_bits, one_b.boundary_bits);
    assert_eq!(two_a.boundary_bits, two_b.boundary_bits);
}
