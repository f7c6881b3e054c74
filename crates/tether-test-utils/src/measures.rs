//! Reference convergence-measure kernels.

use tether_core::ConvergenceMeasure;

fn l2_norm(values: impl Iterator<Item = f64>) -> f64 {
    values.map(|v| v * v).sum::<f64>().sqrt()
}

/// Converges when the L2 norm of the iterate difference drops below an
/// absolute limit.
#[derive(Debug)]
pub struct AbsoluteConvergenceMeasure {
    limit: f64,
    residual: f64,
    converged: bool,
}

impl AbsoluteConvergenceMeasure {
    /// Create a measure with the given absolute limit.
    pub fn new(limit: f64) -> Self {
        Self {
            limit,
            residual: f64::INFINITY,
            converged: false,
        }
    }
}

impl ConvergenceMeasure for AbsoluteConvergenceMeasure {
    fn measure(&mut self, previous: &[f64], current: &[f64]) {
        self.residual = l2_norm(
            previous
                .iter()
                .zip(current.iter())
                .map(|(p, c)| c - p),
        );
        self.converged = self.residual <= self.limit;
    }

    fn is_convergence(&self) -> bool {
        self.converged
    }

    fn norm_residual(&self) -> f64 {
        self.residual
    }

    fn new_measurement_series(&mut self) {
        self.residual = f64::INFINITY;
        self.converged = false;
    }
}

/// Converges when the iterate difference is small relative to the current
/// iterate.
#[derive(Debug)]
pub struct RelativeConvergenceMeasure {
    limit: f64,
    residual: f64,
    converged: bool,
}

impl RelativeConvergenceMeasure {
    /// Create a measure with the given relative limit.
    pub fn new(limit: f64) -> Self {
        Self {
            limit,
            residual: f64::INFINITY,
            converged: false,
        }
    }
}

impl ConvergenceMeasure for RelativeConvergenceMeasure {
    fn measure(&mut self, previous: &[f64], current: &[f64]) {
        let difference = l2_norm(
            previous
                .iter()
                .zip(current.iter())
                .map(|(p, c)| c - p),
        );
        let scale = l2_norm(current.iter().copied());
        self.residual = if scale > 0.0 {
            difference / scale
        } else {
            difference
        };
        self.converged = self.residual <= self.limit;
    }

    fn is_convergence(&self) -> bool {
        self.converged
    }

    fn norm_residual(&self) -> f64 {
        self.residual
    }

    fn new_measurement_series(&mut self) {
        self.residual = f64::INFINITY;
        self.converged = false;
    }
}
