//! Sample serialization for the coupling channel.
//!
//! Translates between a datum's in-memory trajectory and the on-wire
//! sequence of typed channel messages. Two framings exist, selected
//! per-datum by its `exchange_substeps` flag:
//!
//! - **Trajectory framing** — the full sub-step trajectory:
//!   `[i32 N] [f64 x N ascending times] [f64 x size x N values]`
//!   and, for gradient-carrying data,
//!   `[f64 x size x meshDim x N gradients]`.
//! - **End-of-window framing** — only the sample at the window boundary:
//!   `[f64 x size values]` and optionally `[f64 x size x meshDim gradients]`.
//!
//! Counts and dimensions are not negotiated: both participants must
//! register matching data. A disagreement surfaces as a channel-level
//! fault, not here.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;

pub use codec::{
    receive_coupling_data, receive_trajectory, receive_window_end, send_coupling_data,
    send_trajectory, send_window_end, SerializedSamples,
};
pub use error::WireError;
