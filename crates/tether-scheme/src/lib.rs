//! Coupling-scheme engine for partitioned multi-physics simulations.
//!
//! Two solvers (participants) advance their own time integration; the
//! scheme orchestrates *when* they exchange data, *what* they exchange,
//! and — for implicit schemes — whether a time window must be repeated
//! until convergence. Four variants cover the serial/parallel and
//! explicit/implicit combinations; they share one state machine and
//! differ only in their exchange strategies.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod acceleration;
pub mod config;
mod convergence;
pub mod error;
mod parallel;
mod registry;
pub mod scheme;
mod serial;
mod strategy;
mod table;

pub use config::{
    ConfigError, CouplingArrangement, CouplingMode, SchemeConfig, TimesteppingMethod,
    INFINITE_MAX_ITERATIONS, UNDEFINED_MAX_ITERATIONS, UNDEFINED_MIN_ITERATIONS, UNDEFINED_TIME,
    UNDEFINED_TIME_WINDOWS, UNDEFINED_TIME_WINDOW_SIZE,
};
pub use error::SchemeError;
pub use scheme::{CouplingScheme, LogSinkFactory};
