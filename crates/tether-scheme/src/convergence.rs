//! The convergence-measure runner.
//!
//! Each implicit iteration evaluates every configured measure and folds
//! the per-measure verdicts into one decision:
//!
//! `reached_min_iterations && (all_converged || (one_suffices && !one_strict))`
//!
//! A `strict` measure that fails to converge overrides any sufficing
//! measure in the same iteration, and terminates the run once the
//! iteration cap is reached. The minimum iteration count is a hard floor
//! even when every measure already converged.

use tracing::info;

use tether_core::{ConvergenceMeasure, DataId};

use crate::config::INFINITE_MAX_ITERATIONS;
use crate::error::SchemeError;
use crate::registry::DataRegistry;
use crate::table::{Cell, TableWriter};

/// One configured measure with its combination flags.
pub(crate) struct MeasureContext {
    pub(crate) data: DataId,
    pub(crate) data_name: String,
    /// Convergence of this measure alone completes the window.
    pub(crate) suffices: bool,
    /// Non-convergence of this measure at the iteration cap is fatal.
    pub(crate) strict: bool,
    /// Whether the residual is written to the convergence log.
    pub(crate) does_logging: bool,
    pub(crate) measure: Box<dyn ConvergenceMeasure>,
}

impl MeasureContext {
    /// Column header in the convergence log.
    pub(crate) fn log_header(&self) -> String {
        format!("ResNorm({})", self.data_name)
    }
}

/// Evaluate all measures once and combine their verdicts.
///
/// Writes one row per call to the convergence log, if one is configured.
pub(crate) fn run_measures(
    measures: &mut [MeasureContext],
    registry: &DataRegistry,
    writer: Option<&mut TableWriter>,
    time_windows: i32,
    iterations: i32,
    min_iterations: i32,
    max_iterations: i32,
) -> Result<bool, SchemeError> {
    let mut row = vec![
        Cell::Int(i64::from(time_windows - 1)),
        Cell::Int(i64::from(iterations)),
    ];

    if measures.is_empty() {
        info!("no convergence measures defined");
        if let Some(writer) = writer {
            writer.write_row(&row)?;
        }
        return Ok(false);
    }

    let mut all_converged = true;
    let mut one_suffices = false;
    let mut one_strict = false;
    let reached_min_iterations = iterations >= min_iterations;

    for context in measures.iter_mut() {
        let data = registry
            .get(context.data)
            .expect("measured data is registered");
        let previous = &data.previous_iteration().values;
        debug_assert_eq!(previous.len(), data.values().len());
        context.measure.measure(previous, data.values());

        if context.does_logging {
            row.push(Cell::Double(context.measure.norm_residual()));
        }

        if !context.measure.is_convergence() {
            all_converged = false;
            if context.strict {
                debug_assert!(max_iterations > 0, "strict measures need an iteration cap");
                one_strict = true;
                if max_iterations != INFINITE_MAX_ITERATIONS && iterations >= max_iterations {
                    return Err(SchemeError::StrictMeasureDidNotConverge {
                        data: context.data_name.clone(),
                    });
                }
            }
        } else if context.suffices {
            one_suffices = true;
        }

        info!("{}", context.measure.state_line(&context.data_name));
    }

    if let Some(writer) = writer {
        writer.write_row(&row)?;
    }

    let suffix = if reached_min_iterations {
        ""
    } else {
        " but has not yet reached the minimal amount of iterations"
    };
    if all_converged {
        info!("all converged{suffix}");
    } else if one_suffices && !one_strict {
        info!("sufficient measures converged{suffix}");
    }

    Ok(reached_min_iterations && (all_converged || (one_suffices && !one_strict)))
}
