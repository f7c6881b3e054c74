//! Constant under-relaxation, the simplest acceleration operator.

use tether_core::{Acceleration, CouplingData};

/// Blends the current iterate with the previous one:
/// `x <- previous + omega * (x - previous)`.
///
/// Tracks how often each hook ran so tests can assert the adapter's
/// call pattern.
#[derive(Debug)]
pub struct ConstantRelaxation {
    omega: f64,
    performed: u32,
    converged_windows: u32,
}

impl ConstantRelaxation {
    /// Create an under-relaxation operator with factor `omega`.
    pub fn new(omega: f64) -> Self {
        Self {
            omega,
            performed: 0,
            converged_windows: 0,
        }
    }

    /// How many times `perform_acceleration` ran.
    pub fn performed(&self) -> u32 {
        self.performed
    }

    /// How many converged windows were signalled.
    pub fn converged_windows(&self) -> u32 {
        self.converged_windows
    }
}

impl Acceleration for ConstantRelaxation {
    fn initialize(&mut self, _data: &mut [&mut CouplingData]) {}

    fn perform_acceleration(&mut self, data: &mut [&mut CouplingData]) {
        self.performed += 1;
        for datum in data.iter_mut() {
            let previous = datum.previous_iteration().values.clone();
            for (value, old) in datum.values_mut().iter_mut().zip(previous) {
                *value = old + self.omega * (*value - old);
            }
        }
    }

    fn iterations_converged(&mut self, _data: &mut [&mut CouplingData]) {
        self.converged_windows += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::data::{DataDirection, DataSpec};
    use tether_core::DataId;

    #[test]
    fn relaxation_blends_toward_the_new_iterate() {
        let mut data = CouplingData::new(DataSpec {
            id: DataId(0),
            name: "displacement".into(),
            size: 2,
            mesh_dimensions: 2,
            has_gradient: false,
            requires_initialization: false,
            exchange_substeps: false,
            direction: DataDirection::Receive,
        });
        data.values_mut().copy_from_slice(&[0.0, 0.0]);
        data.store_iteration();
        data.values_mut().copy_from_slice(&[1.0, 2.0]);

        let mut relaxation = ConstantRelaxation::new(0.5);
        relaxation.perform_acceleration(&mut [&mut data]);
        assert_eq!(data.values(), &[0.5, 1.0]);
        assert_eq!(relaxation.performed(), 1);
    }
}
