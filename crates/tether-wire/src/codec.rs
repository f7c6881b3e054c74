//! Trajectory packing and the channel-driving send/receive functions.

use tether_core::data::{CouplingData, Sample, Stample};
use tether_core::Channel;

use crate::error::WireError;

// ── SerializedSamples ───────────────────────────────────────────

/// A trajectory flattened into contiguous buffers for the channel.
///
/// `values` holds the per-time-step samples concatenated in time order;
/// `gradients` does the same for gradient matrices when the datum
/// carries them.
#[derive(Debug, PartialEq)]
pub struct SerializedSamples {
    n_time_steps: usize,
    values: Vec<f64>,
    gradients: Option<Vec<f64>>,
}

impl SerializedSamples {
    /// Flatten a datum's current trajectory.
    ///
    /// Fails with [`WireError::EmptyTrajectory`] if nothing has been
    /// stored — every exchange point requires at least one sample.
    pub fn serialize(data: &CouplingData) -> Result<Self, WireError> {
        let stamples = data.stamples();
        if stamples.is_empty() {
            return Err(WireError::EmptyTrajectory {
                data: data.name().to_string(),
            });
        }

        let n = stamples.len();
        let mut values = Vec::with_capacity(n * data.size());
        for stample in stamples {
            values.extend_from_slice(&stample.sample.values);
        }

        let gradients = if data.has_gradient() {
            let mut buf = Vec::with_capacity(n * data.size() * data.mesh_dimensions());
            for stample in stamples {
                let g = stample
                    .sample
                    .gradients
                    .as_deref()
                    .expect("gradient-carrying datum stored a sample without gradients");
                buf.extend_from_slice(g);
            }
            Some(buf)
        } else {
            None
        };

        Ok(Self {
            n_time_steps: n,
            values,
            gradients,
        })
    }

    /// Allocate zeroed buffers sized for `n_time_steps` samples of `data`.
    pub fn empty(n_time_steps: usize, data: &CouplingData) -> Self {
        Self {
            n_time_steps,
            values: vec![0.0; n_time_steps * data.size()],
            gradients: data
                .has_gradient()
                .then(|| vec![0.0; n_time_steps * data.size() * data.mesh_dimensions()]),
        }
    }

    /// Number of serialized time steps.
    pub fn n_time_steps(&self) -> usize {
        self.n_time_steps
    }

    /// Flattened values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Mutable flattened values, for filling from the channel.
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Flattened gradients, if the datum carries them.
    pub fn gradients(&self) -> Option<&[f64]> {
        self.gradients.as_deref()
    }

    /// Mutable flattened gradients.
    pub fn gradients_mut(&mut self) -> Option<&mut [f64]> {
        self.gradients.as_deref_mut()
    }

    /// Rebuild `data`'s trajectory from `times` and the flat buffers.
    ///
    /// The last sample becomes the datum's working sample. Times must be
    /// strictly ascending.
    pub fn deserialize_into(
        &self,
        times: &[f64],
        data: &mut CouplingData,
    ) -> Result<(), WireError> {
        debug_assert_eq!(times.len(), self.n_time_steps);
        if times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(WireError::TimesNotAscending {
                data: data.name().to_string(),
            });
        }

        let size = data.size();
        let gradient_size = size * data.mesh_dimensions();
        let stamples = times
            .iter()
            .enumerate()
            .map(|(i, &time)| Stample {
                time,
                sample: Sample {
                    values: self.values[i * size..(i + 1) * size].to_vec(),
                    gradients: self
                        .gradients
                        .as_ref()
                        .map(|g| g[i * gradient_size..(i + 1) * gradient_size].to_vec()),
                },
            })
            .collect();
        data.replace_trajectory(stamples);
        Ok(())
    }
}

// ── Channel framing ─────────────────────────────────────────────

/// Send a datum's full sub-step trajectory.
///
/// Wire order: `N`, ascending times, flattened values, flattened
/// gradients (if present).
pub fn send_trajectory(channel: &mut dyn Channel, data: &CouplingData) -> Result<(), WireError> {
    let serialized = SerializedSamples::serialize(data)?;
    let times = data.storage().times();
    debug_assert!(
        times.windows(2).all(|w| w[0] < w[1]),
        "stored trajectory times must be strictly ascending"
    );

    channel.send_int(serialized.n_time_steps() as i32)?;
    channel.send_vector(&times)?;
    channel.send_vector(serialized.values())?;
    if let Some(gradients) = serialized.gradients() {
        channel.send_vector(gradients)?;
    }
    Ok(())
}

/// Receive a full sub-step trajectory into `data`, replacing its stored
/// trajectory.
pub fn receive_trajectory(
    channel: &mut dyn Channel,
    data: &mut CouplingData,
) -> Result<(), WireError> {
    let count = channel.receive_int()?;
    if count <= 0 {
        return Err(WireError::NonPositiveTimeStepCount {
            data: data.name().to_string(),
            count,
        });
    }
    let n = count as usize;

    let mut times = vec![0.0; n];
    channel.receive_vector(&mut times)?;

    let mut serialized = SerializedSamples::empty(n, data);
    channel.receive_vector(serialized.values_mut())?;
    if let Some(gradients) = serialized.gradients_mut() {
        channel.receive_vector(gradients)?;
    }

    serialized.deserialize_into(&times, data)
}

/// Send only the end-of-window sample.
///
/// The datum's working sample is first overwritten with the last stored
/// sample, so the peer sees the value at the window boundary.
pub fn send_window_end(
    channel: &mut dyn Channel,
    data: &mut CouplingData,
) -> Result<(), WireError> {
    if data.stamples().is_empty() {
        return Err(WireError::EmptyTrajectory {
            data: data.name().to_string(),
        });
    }
    data.load_last_stample();
    channel.send_vector(data.values())?;
    if let Some(gradients) = data.gradients() {
        channel.send_vector(gradients)?;
    }
    Ok(())
}

/// Receive an end-of-window sample into `data`, stamping it into the
/// trajectory at `stamp_time`.
pub fn receive_window_end(
    channel: &mut dyn Channel,
    data: &mut CouplingData,
    stamp_time: f64,
) -> Result<(), WireError> {
    channel.receive_vector(data.values_mut())?;
    if let Some(gradients) = data.gradients_mut() {
        channel.receive_vector(gradients)?;
    }
    data.store_sample_at_time(stamp_time);
    Ok(())
}

/// Send a datum using the framing selected by its `exchange_substeps`
/// flag.
pub fn send_coupling_data(
    channel: &mut dyn Channel,
    data: &mut CouplingData,
) -> Result<(), WireError> {
    if data.exchange_substeps() {
        send_trajectory(channel, data)
    } else {
        send_window_end(channel, data)
    }
}

/// Receive a datum using the framing selected by its `exchange_substeps`
/// flag. `stamp_time` is only used by the end-of-window framing.
pub fn receive_coupling_data(
    channel: &mut dyn Channel,
    data: &mut CouplingData,
    stamp_time: f64,
) -> Result<(), WireError> {
    if data.exchange_substeps() {
        receive_trajectory(channel, data)
    } else {
        receive_window_end(channel, data, stamp_time)
    }
}
