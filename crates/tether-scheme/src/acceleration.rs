//! The acceleration adapter.
//!
//! Bridges between trajectory storage and the opaque accelerator: values
//! live in per-window stample storage, but the accelerator works on the
//! flat working samples. Only the end-of-window samples are accelerated;
//! in-window stamples are left untouched.

use tether_core::{Acceleration, DataId};

use crate::registry::DataRegistry;

/// Non-convergence path: load each datum's end-of-window sample, run the
/// accelerator, and stamp the (possibly modified) samples back into
/// storage at `time`.
pub(crate) fn on_non_convergence(
    acceleration: &mut dyn Acceleration,
    registry: &mut DataRegistry,
    ids: &[DataId],
    time: f64,
) {
    for &id in ids {
        registry
            .get_mut(id)
            .expect("accelerated data is registered")
            .load_last_stample();
    }

    let mut views = registry.data_views_mut(ids);
    acceleration.perform_acceleration(&mut views);
    drop(views);

    for &id in ids {
        registry
            .get_mut(id)
            .expect("accelerated data is registered")
            .store_sample_at_time(time);
    }
}

/// Convergence path: let the accelerator reset its per-window history
/// (e.g. quasi-Newton columns).
pub(crate) fn on_convergence(
    acceleration: &mut dyn Acceleration,
    registry: &mut DataRegistry,
    ids: &[DataId],
) {
    let mut views = registry.data_views_mut(ids);
    acceleration.iterations_converged(&mut views);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::data::{DataDirection, DataSpec};
    use tether_test_utils::ConstantRelaxation;

    fn registry() -> (DataRegistry, DataId) {
        let mut registry = DataRegistry::new();
        let id = registry
            .add(DataSpec {
                id: DataId(0),
                name: "displacement".into(),
                size: 2,
                mesh_dimensions: 2,
                has_gradient: false,
                requires_initialization: false,
                exchange_substeps: false,
                direction: DataDirection::Send,
            })
            .unwrap();
        (registry, id)
    }

    #[test]
    fn non_convergence_accelerates_the_window_end_sample() {
        let (mut registry, id) = registry();
        {
            let data = registry.get_mut(id).unwrap();
            data.store_iteration(); // previous iterate: zeros
            data.values_mut().copy_from_slice(&[0.5, 0.5]);
            data.store_sample_at_time(0.5);
            data.values_mut().copy_from_slice(&[1.0, 2.0]);
            data.store_sample_at_time(1.0);
            // Working sample diverges from storage; acceleration must act
            // on the stored window end, not on this buffer.
            data.values_mut().copy_from_slice(&[9.0, 9.0]);
        }

        let mut relaxation = ConstantRelaxation::new(0.5);
        on_non_convergence(&mut relaxation, &mut registry, &[id], 1.0);

        let data = registry.get(id).unwrap();
        // previous + 0.5 * (end - previous) = 0 + 0.5 * [1, 2]
        assert_eq!(data.values(), &[0.5, 1.0]);
        // The accelerated sample replaced the end-of-window stample.
        let last = data.stamples().last().unwrap();
        assert_eq!(last.time, 1.0);
        assert_eq!(last.sample.values, vec![0.5, 1.0]);
        // The in-window stample is untouched.
        assert_eq!(data.stamples()[0].sample.values, vec![0.5, 0.5]);
        assert_eq!(relaxation.performed(), 1);
    }

    #[test]
    fn convergence_only_notifies_the_accelerator() {
        let (mut registry, id) = registry();
        registry
            .get_mut(id)
            .unwrap()
            .values_mut()
            .copy_from_slice(&[1.0, 1.0]);

        let mut relaxation = ConstantRelaxation::new(0.5);
        on_convergence(&mut relaxation, &mut registry, &[id]);
        assert_eq!(relaxation.performed(), 0);
        assert_eq!(relaxation.converged_windows(), 1);
        assert_eq!(registry.get(id).unwrap().values(), &[1.0, 1.0]);
    }
}
