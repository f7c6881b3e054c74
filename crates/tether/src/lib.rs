//! Tether: partitioned multi-physics coupling orchestration.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tether sub-crates. For most users, adding `tether` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```no_run
//! use tether::prelude::*;
//!
//! # fn connect() -> Box<dyn Channel> { unimplemented!() }
//! // Configure an explicit serial scheme for the first participant.
//! let config = SchemeConfig {
//!     local_participant: "fluid".into(),
//!     remote_participant: "solid".into(),
//!     does_first_step: true,
//!     mode: CouplingMode::Explicit,
//!     arrangement: CouplingArrangement::Serial,
//!     dt_method: TimesteppingMethod::FixedTimeWindowSize,
//!     max_time: 1.0,
//!     max_time_windows: UNDEFINED_TIME_WINDOWS,
//!     time_window_size: 0.25,
//!     min_iterations: UNDEFINED_MIN_ITERATIONS,
//!     max_iterations: UNDEFINED_MAX_ITERATIONS,
//! };
//!
//! let channel: Box<dyn Channel> = connect();
//! let mut scheme = CouplingScheme::new(config, channel).unwrap();
//! let force = scheme
//!     .add_coupling_data(DataSpec {
//!         id: DataId(0),
//!         name: "force".into(),
//!         size: 3,
//!         mesh_dimensions: 3,
//!         has_gradient: false,
//!         requires_initialization: false,
//!         exchange_substeps: false,
//!         direction: DataDirection::Send,
//!     })
//!     .unwrap();
//!
//! scheme.initialize(0.0, 1).unwrap();
//! while scheme.is_coupling_ongoing() {
//!     let dt = scheme.next_time_step_max_size();
//!     // ... solve one step, write `force` samples ...
//!     # let _ = force;
//!     scheme.add_computed_time(dt).unwrap();
//!     scheme.advance().unwrap();
//! }
//! scheme.finalize().unwrap();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tether-core` | IDs, coupling data, accumulator, ledger, traits |
//! | [`wire`] | `tether-wire` | Sample-trajectory serialization |
//! | [`scheme`] | `tether-scheme` | Configuration and the coupling scheme |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`tether-core`).
///
/// Contains the coupling-data model, the compensated time accumulator,
/// the action ledger, and the collaborator traits ([`types::Channel`],
/// [`types::ConvergenceMeasure`], [`types::Acceleration`]).
pub use tether_core as types;

/// Sample-trajectory serialization (`tether-wire`).
///
/// Packs per-window sample trajectories into the typed channel messages
/// both participants agree on.
pub use tether_wire as wire;

/// Scheme configuration and state machine (`tether-scheme`).
///
/// [`scheme::CouplingScheme`] is the main entry point.
pub use tether_scheme as scheme;

/// Common imports for typical Tether usage.
///
/// ```
/// use tether::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use tether_core::{
        Acceleration, Action, Channel, ChannelError, ConvergenceMeasure, CouplingData, DataId,
        KahanAccumulator,
    };
    pub use tether_core::data::{DataDirection, DataSpec, Sample, SampleStorage, Stample};

    // Errors
    pub use tether_scheme::{ConfigError, SchemeError};
    pub use tether_wire::WireError;

    // Scheme
    pub use tether_scheme::{
        CouplingArrangement, CouplingMode, CouplingScheme, SchemeConfig, TimesteppingMethod,
        INFINITE_MAX_ITERATIONS, UNDEFINED_MAX_ITERATIONS, UNDEFINED_MIN_ITERATIONS,
        UNDEFINED_TIME, UNDEFINED_TIME_WINDOWS, UNDEFINED_TIME_WINDOW_SIZE,
    };
}
