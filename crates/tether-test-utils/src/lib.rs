//! Test utilities for Tether development.
//!
//! Provides an in-process [`Channel`] pair backed by crossbeam queues, a
//! pair of reference convergence measures, a constant under-relaxation
//! accelerator, and a shareable in-memory log sink. Everything here is a
//! stand-in for the real collaborators (network transport, measure
//! kernels, quasi-Newton acceleration) that live outside the coupling
//! core.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

mod channel;
mod measures;
mod relaxation;
mod sink;

pub use channel::{channel_pair, InProcChannel};
pub use measures::{AbsoluteConvergenceMeasure, RelativeConvergenceMeasure};
pub use relaxation::ConstantRelaxation;
pub use sink::SharedSink;
