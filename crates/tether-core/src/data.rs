//! Coupling-data descriptors and per-window sample storage.
//!
//! A [`CouplingData`] owns one exchanged quantity: a working sample (dense
//! values plus optional gradients), the time-stamped trajectory of samples
//! within the current window ([`SampleStorage`]), and the snapshot of the
//! previous iteration used by convergence measures under implicit
//! coupling.

use crate::id::DataId;
use crate::math;

/// Direction of a coupling datum, fixed at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataDirection {
    /// Produced by the local solver, sent to the peer.
    Send,
    /// Produced by the peer, received into local storage.
    Receive,
}

/// One dense sample: values and, if the datum carries them, gradients.
///
/// `values` has the datum's size; `gradients` is a flattened
/// `mesh_dimensions x size` matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Dense vector of the sample.
    pub values: Vec<f64>,
    /// Flattened gradient matrix, present iff the datum has gradients.
    pub gradients: Option<Vec<f64>>,
}

impl Sample {
    /// A zero sample of the given size, with zero gradients if requested.
    pub fn zeros(size: usize, mesh_dimensions: usize, with_gradient: bool) -> Self {
        Self {
            values: vec![0.0; size],
            gradients: with_gradient.then(|| vec![0.0; size * mesh_dimensions]),
        }
    }
}

/// A time-stamped sample within a window.
#[derive(Clone, Debug, PartialEq)]
pub struct Stample {
    /// Absolute time of the sample.
    pub time: f64,
    /// The sample itself.
    pub sample: Sample,
}

/// Ordered trajectory of samples within the current time window.
///
/// Times are kept strictly ascending. Storing at an existing time
/// overwrites; storing at an earlier time than some stored samples drops
/// the later ones first — a rewound window invalidates everything past
/// the rewind point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleStorage {
    stamples: Vec<Stample>,
}

impl SampleStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored trajectory, ascending in time.
    pub fn stamples(&self) -> &[Stample] {
        &self.stamples
    }

    /// Number of stored samples.
    pub fn n_times(&self) -> usize {
        self.stamples.len()
    }

    /// The stored times, ascending.
    pub fn times(&self) -> Vec<f64> {
        self.stamples.iter().map(|s| s.time).collect()
    }

    /// The sample with the largest time, if any.
    pub fn last(&self) -> Option<&Stample> {
        self.stamples.last()
    }

    /// Store `sample` at `time`, truncating any later part of the
    /// trajectory.
    pub fn set_sample_at_time(&mut self, time: f64, sample: Sample) {
        self.stamples.retain(|s| !math::greater(s.time, time));
        match self.stamples.last_mut() {
            Some(last) if math::equals(last.time, time) => last.sample = sample,
            _ => self.stamples.push(Stample { time, sample }),
        }
    }

    /// Drop everything but the last sample, which seeds the next window.
    pub fn move_to_next_window(&mut self) {
        if let Some(last) = self.stamples.pop() {
            self.stamples.clear();
            self.stamples.push(last);
        }
    }

    /// Whether the trajectory is empty.
    pub fn is_empty(&self) -> bool {
        self.stamples.is_empty()
    }
}

/// Registration-time description of a coupling datum.
#[derive(Clone, Debug)]
pub struct DataSpec {
    /// Stable identifier; also the wire ordering key.
    pub id: DataId,
    /// Human-readable name for error messages and log headers.
    pub name: String,
    /// Number of values in one sample.
    pub size: usize,
    /// Spatial dimensionality of the underlying mesh.
    pub mesh_dimensions: usize,
    /// Whether the datum carries gradients alongside values.
    pub has_gradient: bool,
    /// Whether the participant must provide data before the first exchange.
    pub requires_initialization: bool,
    /// Whether the full sub-step trajectory is exchanged instead of the
    /// end-of-window sample.
    pub exchange_substeps: bool,
    /// Send or receive, immutable after registration.
    pub direction: DataDirection,
}

/// One exchanged quantity owned by the coupling scheme's registry.
#[derive(Clone, Debug)]
pub struct CouplingData {
    spec: DataSpec,
    sample: Sample,
    storage: SampleStorage,
    previous_iteration: Sample,
}

impl CouplingData {
    /// Create a zero-initialized datum from its registration spec.
    pub fn new(spec: DataSpec) -> Self {
        let sample = Sample::zeros(spec.size, spec.mesh_dimensions, spec.has_gradient);
        Self {
            previous_iteration: sample.clone(),
            sample,
            storage: SampleStorage::new(),
            spec,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> DataId {
        self.spec.id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Send or receive.
    pub fn direction(&self) -> DataDirection {
        self.spec.direction
    }

    /// Number of values in one sample.
    pub fn size(&self) -> usize {
        self.spec.size
    }

    /// Spatial dimensionality of the underlying mesh.
    pub fn mesh_dimensions(&self) -> usize {
        self.spec.mesh_dimensions
    }

    /// Whether the datum carries gradients.
    pub fn has_gradient(&self) -> bool {
        self.spec.has_gradient
    }

    /// Whether the participant must provide initial data.
    pub fn requires_initialization(&self) -> bool {
        self.spec.requires_initialization
    }

    /// Whether the sub-step trajectory is exchanged.
    pub fn exchange_substeps(&self) -> bool {
        self.spec.exchange_substeps
    }

    /// Current working values.
    pub fn values(&self) -> &[f64] {
        &self.sample.values
    }

    /// Mutable working values.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.sample.values
    }

    /// Current working gradients, if present.
    pub fn gradients(&self) -> Option<&[f64]> {
        self.sample.gradients.as_deref()
    }

    /// Mutable working gradients, if present.
    pub fn gradients_mut(&mut self) -> Option<&mut [f64]> {
        self.sample.gradients.as_deref_mut()
    }

    /// The whole working sample.
    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    /// Replace the working sample.
    ///
    /// # Panics
    ///
    /// If the replacement has a different size or gradient presence.
    pub fn set_sample(&mut self, sample: Sample) {
        assert_eq!(sample.values.len(), self.spec.size, "sample size mismatch");
        assert_eq!(
            sample.gradients.is_some(),
            self.spec.has_gradient,
            "sample gradient presence mismatch"
        );
        self.sample = sample;
    }

    /// The per-window trajectory.
    pub fn stamples(&self) -> &[Stample] {
        self.storage.stamples()
    }

    /// Direct access to the trajectory storage.
    pub fn storage(&self) -> &SampleStorage {
        &self.storage
    }

    /// Store the working sample into the trajectory at `time`.
    pub fn store_sample_at_time(&mut self, time: f64) {
        self.storage.set_sample_at_time(time, self.sample.clone());
    }

    /// Store an explicit sample into the trajectory at `time` and adopt it
    /// as the working sample.
    pub fn set_sample_at_time(&mut self, time: f64, sample: Sample) {
        self.set_sample(sample.clone());
        self.storage.set_sample_at_time(time, sample);
    }

    /// Load the end-of-window sample from the trajectory into the working
    /// sample.
    ///
    /// # Panics
    ///
    /// If the trajectory is empty — every exchange point requires at least
    /// one stored sample.
    pub fn load_last_stample(&mut self) {
        let last = self
            .storage
            .last()
            .unwrap_or_else(|| panic!("data \"{}\" has no stored samples", self.spec.name));
        self.sample = last.sample.clone();
    }

    /// Rebuild the trajectory from parallel `times`/`samples` sequences.
    pub fn replace_trajectory(&mut self, stamples: Vec<Stample>) {
        debug_assert!(
            stamples.windows(2).all(|w| w[0].time < w[1].time),
            "trajectory times must be strictly ascending"
        );
        self.storage = SampleStorage { stamples };
        if let Some(last) = self.storage.last() {
            self.sample = last.sample.clone();
        }
    }

    /// Advance the trajectory into the next window.
    pub fn move_to_next_window(&mut self) {
        self.storage.move_to_next_window();
    }

    /// Snapshot the working sample for the next iteration's convergence
    /// comparison.
    pub fn store_iteration(&mut self) {
        self.previous_iteration = self.sample.clone();
    }

    /// The snapshot taken by the last [`store_iteration`](Self::store_iteration).
    pub fn previous_iteration(&self) -> &Sample {
        &self.previous_iteration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_spec(id: u32, direction: DataDirection) -> DataSpec {
        DataSpec {
            id: DataId(id),
            name: format!("data-{id}"),
            size: 3,
            mesh_dimensions: 2,
            has_gradient: false,
            requires_initialization: false,
            exchange_substeps: false,
            direction,
        }
    }

    fn sample(values: &[f64]) -> Sample {
        Sample {
            values: values.to_vec(),
            gradients: None,
        }
    }

    #[test]
    fn new_datum_is_zeroed() {
        let data = CouplingData::new(scalar_spec(0, DataDirection::Send));
        assert_eq!(data.values(), &[0.0, 0.0, 0.0]);
        assert!(data.gradients().is_none());
        assert!(data.stamples().is_empty());
    }

    #[test]
    fn storage_keeps_times_ascending() {
        let mut storage = SampleStorage::new();
        storage.set_sample_at_time(0.5, sample(&[1.0]));
        storage.set_sample_at_time(1.0, sample(&[2.0]));
        assert_eq!(storage.times(), vec![0.5, 1.0]);
        assert_eq!(storage.last().unwrap().sample.values, vec![2.0]);
    }

    #[test]
    fn storing_at_existing_time_overwrites() {
        let mut storage = SampleStorage::new();
        storage.set_sample_at_time(1.0, sample(&[2.0]));
        storage.set_sample_at_time(1.0, sample(&[3.0]));
        assert_eq!(storage.n_times(), 1);
        assert_eq!(storage.last().unwrap().sample.values, vec![3.0]);
    }

    #[test]
    fn storing_earlier_drops_later_samples() {
        // A rewound window re-steps from the window start; anything the
        // previous iteration stored past the rewind point is stale.
        let mut storage = SampleStorage::new();
        storage.set_sample_at_time(0.25, sample(&[1.0]));
        storage.set_sample_at_time(0.5, sample(&[2.0]));
        storage.set_sample_at_time(1.0, sample(&[3.0]));
        storage.set_sample_at_time(0.5, sample(&[9.0]));
        assert_eq!(storage.times(), vec![0.25, 0.5]);
        assert_eq!(storage.last().unwrap().sample.values, vec![9.0]);
    }

    #[test]
    fn move_to_next_window_keeps_only_the_boundary_sample() {
        let mut storage = SampleStorage::new();
        storage.set_sample_at_time(0.5, sample(&[1.0]));
        storage.set_sample_at_time(1.0, sample(&[2.0]));
        storage.move_to_next_window();
        assert_eq!(storage.times(), vec![1.0]);
    }

    #[test]
    fn store_iteration_snapshots_the_working_sample() {
        let mut data = CouplingData::new(scalar_spec(0, DataDirection::Receive));
        data.values_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        data.store_iteration();
        data.values_mut().copy_from_slice(&[4.0, 5.0, 6.0]);
        assert_eq!(data.previous_iteration().values, vec![1.0, 2.0, 3.0]);
        assert_eq!(data.values(), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn load_last_stample_restores_the_window_end() {
        let mut data = CouplingData::new(scalar_spec(0, DataDirection::Send));
        data.values_mut().copy_from_slice(&[1.0, 1.0, 1.0]);
        data.store_sample_at_time(0.5);
        data.values_mut().copy_from_slice(&[7.0, 7.0, 7.0]);
        data.store_sample_at_time(1.0);
        data.values_mut().copy_from_slice(&[0.0, 0.0, 0.0]);
        data.load_last_stample();
        assert_eq!(data.values(), &[7.0, 7.0, 7.0]);
    }

    #[test]
    #[should_panic(expected = "no stored samples")]
    fn load_last_stample_panics_on_empty_trajectory() {
        let mut data = CouplingData::new(scalar_spec(0, DataDirection::Send));
        data.load_last_stample();
    }

    #[test]
    fn gradient_sample_has_mesh_dim_times_size_entries() {
        let spec = DataSpec {
            has_gradient: true,
            ..scalar_spec(1, DataDirection::Send)
        };
        let data = CouplingData::new(spec);
        assert_eq!(data.gradients().unwrap().len(), 6);
    }
}
