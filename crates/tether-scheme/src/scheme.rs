//! The coupling-scheme state machine.
//!
//! [`CouplingScheme`] drives initialize → repeated advance cycles → finalize
//! and owns every time and window counter. An advance cycle decomposes
//! into four phases — first synchronization, first exchange, second
//! synchronization, second exchange — so a participant wrapper can
//! interleave its own work between them. The variant-specific send and
//! receive orders live in the exchange strategies; everything shared is
//! here.
//!
//! # Ownership model
//!
//! The scheme is single-threaded cooperative: the participant thread calls
//! operations in program order, and the only suspension points are the
//! blocking channel operations inside the exchanges. All mutating methods
//! take `&mut self`; data borrows handed out by [`data_mut`](CouplingScheme::data_mut)
//! end before the next scheme call.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use tracing::{debug, info};

use tether_core::data::DataSpec;
use tether_core::{
    math, Acceleration, Action, ActionLedger, Channel, ConvergenceMeasure, CouplingData, DataId,
    KahanAccumulator,
};

use crate::acceleration;
use crate::config::{
    ConfigError, CouplingMode, SchemeConfig, TimesteppingMethod, INFINITE_MAX_ITERATIONS,
    UNDEFINED_MAX_ITERATIONS, UNDEFINED_MIN_ITERATIONS, UNDEFINED_TIME, UNDEFINED_TIME_WINDOWS,
    UNDEFINED_TIME_WINDOW_SIZE,
};
use crate::convergence::{run_measures, MeasureContext};
use crate::error::SchemeError;
use crate::registry::DataRegistry;
use crate::strategy::{strategy_for, ExchangeStrategy};
use crate::table::{Cell, ColumnKind, TableWriter};

/// Produces a log sink for a given file name.
///
/// The default factory creates buffered files in the working directory;
/// tests inject in-memory sinks instead.
pub type LogSinkFactory = Box<dyn FnMut(&str) -> io::Result<Box<dyn Write + Send>> + Send>;

// ── SchemeCore ──────────────────────────────────────────────────

/// Shared scheme state and the operations the exchange strategies compose.
pub(crate) struct SchemeCore {
    pub(crate) mode: CouplingMode,
    pub(crate) dt_method: TimesteppingMethod,
    pub(crate) local_participant: String,
    pub(crate) remote_participant: String,
    pub(crate) does_first_step: bool,
    pub(crate) max_time: f64,
    pub(crate) max_time_windows: i32,
    pub(crate) time_window_size: f64,
    pub(crate) next_time_window_size: f64,
    pub(crate) min_iterations: i32,
    pub(crate) max_iterations: i32,
    pub(crate) time: KahanAccumulator,
    pub(crate) window_start_time: KahanAccumulator,
    pub(crate) time_windows: i32,
    pub(crate) iterations: i32,
    pub(crate) total_iterations: i32,
    pub(crate) is_initialized: bool,
    pub(crate) is_time_window_complete: bool,
    pub(crate) has_data_been_received: bool,
    pub(crate) has_converged: bool,
    pub(crate) sends_initialized_data: bool,
    pub(crate) receives_initialized_data: bool,
    pub(crate) actions: ActionLedger,
    pub(crate) registry: DataRegistry,
    pub(crate) measures: Vec<MeasureContext>,
    pub(crate) acceleration: Option<Box<dyn Acceleration>>,
    pub(crate) channel: Box<dyn Channel>,
    pub(crate) iterations_writer: Option<TableWriter>,
    pub(crate) convergence_writer: Option<TableWriter>,
    pub(crate) log_sink_factory: LogSinkFactory,
}

impl SchemeCore {
    pub(crate) fn is_implicit(&self) -> bool {
        self.mode == CouplingMode::Implicit
    }

    pub(crate) fn has_max_time(&self) -> bool {
        !math::equals(self.max_time, UNDEFINED_TIME)
    }

    pub(crate) fn has_time_window_size(&self) -> bool {
        !math::equals(self.time_window_size, UNDEFINED_TIME_WINDOW_SIZE)
    }

    pub(crate) fn is_coupling_ongoing(&self) -> bool {
        let time_left =
            !self.has_max_time() || math::greater(self.max_time, self.time.read());
        let windows_left = self.max_time_windows == UNDEFINED_TIME_WINDOWS
            || self.time_windows <= self.max_time_windows;
        time_left && windows_left
    }

    /// Whether the accumulated time sits on the current window boundary.
    ///
    /// Without a window size every step closes a window — this participant
    /// dictates the size and the peer follows. A window reaching past
    /// `max_time` is truncated, and the boundary becomes `max_time` itself.
    pub(crate) fn reached_end_of_time_window(&self) -> bool {
        if !self.has_time_window_size() {
            return true;
        }
        let window_end = self.window_start_time.read() + self.time_window_size;
        if self.has_max_time() && math::smaller(self.max_time, window_end) {
            return math::equals(self.time.read(), self.max_time);
        }
        math::equals(self.time.read(), window_end)
    }

    /// Maximum time step the solver may take next.
    pub(crate) fn next_time_step_max_size(&self) -> f64 {
        if !self.is_coupling_ongoing() {
            return 0.0;
        }
        if self.has_time_window_size() {
            let max_dt = self.window_start_time.read() + self.time_window_size - self.time.read();
            if self.has_max_time() {
                max_dt.min(self.max_time - self.time.read())
            } else {
                max_dt
            }
        } else if self.has_max_time() {
            self.max_time - self.time.read()
        } else {
            f64::MAX
        }
    }

    pub(crate) fn send_ids(&self) -> Vec<DataId> {
        self.registry.send_ids()
    }

    pub(crate) fn receive_ids(&self) -> Vec<DataId> {
        self.registry.receive_ids()
    }

    fn notify_data_has_been_received(&mut self) {
        assert!(
            !self.has_data_been_received,
            "data may only be received once within one coupling iteration"
        );
        self.has_data_been_received = true;
    }

    /// Send the given data in ascending ID order.
    pub(crate) fn send_data(&mut self, ids: &[DataId]) -> Result<(), SchemeError> {
        debug_assert!(self.channel.is_connected());
        debug!(count = ids.len(), "sending data");
        for &id in ids {
            let data = self.registry.get_mut(id).expect("registered data");
            tether_wire::send_coupling_data(self.channel.as_mut(), data)?;
        }
        Ok(())
    }

    fn receive_data_at(&mut self, ids: &[DataId], stamp_time: f64) -> Result<(), SchemeError> {
        debug_assert!(self.channel.is_connected());
        debug!(count = ids.len(), stamp_time, "receiving data");
        for &id in ids {
            let data = self.registry.get_mut(id).expect("registered data");
            tether_wire::receive_coupling_data(self.channel.as_mut(), data, stamp_time)?;
        }
        if !ids.is_empty() {
            self.notify_data_has_been_received();
        }
        Ok(())
    }

    /// Receive data stamped at the current scheme time.
    pub(crate) fn receive_data(&mut self, ids: &[DataId]) -> Result<(), SchemeError> {
        let time = self.time.read();
        self.receive_data_at(ids, time)
    }

    /// Receive data stamped at the end of the window, regardless of the
    /// current in-cycle time.
    pub(crate) fn receive_data_for_window_end(
        &mut self,
        ids: &[DataId],
    ) -> Result<(), SchemeError> {
        let stamp_time = if self.has_time_window_size() {
            self.window_start_time.read() + self.next_time_window_size
        } else {
            self.time.read()
        };
        self.receive_data_at(ids, stamp_time)
    }

    /// Send the convergence flag; only the participant that decides
    /// convergence is allowed to.
    pub(crate) fn send_convergence(&mut self) -> Result<(), SchemeError> {
        assert!(self.is_implicit());
        assert!(
            !self.does_first_step,
            "the sending participant of the convergence flag is never the first one"
        );
        self.channel.send_bool(self.has_converged)?;
        Ok(())
    }

    /// Receive the convergence flag; only the first-step participant does.
    pub(crate) fn receive_convergence(&mut self) -> Result<(), SchemeError> {
        assert!(self.is_implicit());
        assert!(
            self.does_first_step,
            "the receiving participant of the convergence flag is always the first one"
        );
        self.has_converged = self.channel.receive_bool()?;
        Ok(())
    }

    /// Under the first-participant method, send the size of the window
    /// just performed ahead of the data.
    pub(crate) fn send_time_window_size(&mut self) -> Result<(), SchemeError> {
        if self.dt_method == TimesteppingMethod::FirstParticipantSetsDt && self.does_first_step {
            let performed = self.time.read() - self.window_start_time.read();
            debug!(performed, "sending time window size");
            self.channel.send_scalar(performed)?;
        }
        Ok(())
    }

    /// Under the first-participant method, adopt the peer-dictated window
    /// size.
    pub(crate) fn receive_and_set_time_window_size(&mut self) -> Result<(), SchemeError> {
        if self.dt_method == TimesteppingMethod::FirstParticipantSetsDt && !self.does_first_step {
            let size = self.channel.receive_scalar()?;
            debug!(size, "received time window size");
            self.next_time_window_size = size;
            if !self.has_time_window_size() {
                self.time_window_size = size;
            }
        }
        Ok(())
    }

    /// Advance every datum's trajectory into the next window.
    pub(crate) fn move_to_next_window(&mut self) {
        debug!(time_windows = self.time_windows, "moving data to next window");
        for data in self.registry.values_mut() {
            data.move_to_next_window();
        }
    }

    /// Snapshot every datum for the next iteration's convergence
    /// comparison.
    pub(crate) fn store_iteration(&mut self) {
        debug_assert!(self.is_implicit());
        for data in self.registry.values_mut() {
            data.store_iteration();
        }
    }

    /// Run the convergence measures and the acceleration adapter for one
    /// implicit iteration.
    ///
    /// A strict measure failing at the iteration cap is fatal and fires
    /// *before* the forced-convergence cap below: hitting `max_iterations`
    /// without strict failure forces `has_converged`.
    pub(crate) fn do_implicit_step(&mut self) -> Result<(), SchemeError> {
        debug_assert!(
            !self.does_first_step,
            "convergence is decided by the participant that does not take the first step"
        );
        debug!("measuring convergence of the coupling iteration");
        self.has_converged = run_measures(
            &mut self.measures,
            &self.registry,
            self.convergence_writer.as_mut(),
            self.time_windows,
            self.iterations,
            self.min_iterations,
            self.max_iterations,
        )?;
        if self.max_iterations != INFINITE_MAX_ITERATIONS && self.iterations == self.max_iterations
        {
            self.has_converged = true;
        }

        let ids = self.registry.all_ids();
        if self.has_converged {
            if let Some(accel) = self.acceleration.as_deref_mut() {
                acceleration::on_convergence(accel, &mut self.registry, &ids);
            }
            for context in &mut self.measures {
                context.measure.new_measurement_series();
            }
        } else if let Some(accel) = self.acceleration.as_deref_mut() {
            acceleration::on_non_convergence(accel, &mut self.registry, &ids, self.time.read());
        }
        Ok(())
    }

    fn check_completeness_required_actions(&mut self) -> Result<(), SchemeError> {
        self.actions
            .check_completeness()
            .map_err(|missing| SchemeError::UnfulfilledActions { missing })
    }

    /// Store a zero sample at the start time for every receive datum so
    /// its trajectory is never empty before the first exchange.
    fn initialize_receive_data_storage(&mut self) {
        let time = self.time.read();
        for id in self.receive_ids() {
            let data = self.registry.get_mut(id).expect("registered data");
            debug!(data = data.name(), "initializing receive storage with zeros");
            data.store_sample_at_time(time);
        }
    }

    fn initialize_log_writers(&mut self) -> Result<(), SchemeError> {
        let mut columns = vec![
            ("TimeWindow".to_string(), ColumnKind::Int),
            ("TotalIterations".to_string(), ColumnKind::Int),
            ("Iterations".to_string(), ColumnKind::Int),
            ("Convergence".to_string(), ColumnKind::Int),
        ];
        if !self.does_first_step && self.acceleration.is_some() {
            columns.push(("QNColumns".to_string(), ColumnKind::Int));
            columns.push(("DeletedQNColumns".to_string(), ColumnKind::Int));
            columns.push(("DroppedQNColumns".to_string(), ColumnKind::Int));
        }
        let name = format!("precice-{}-iterations.log", self.local_participant);
        let sink = (self.log_sink_factory)(&name)?;
        self.iterations_writer = Some(TableWriter::new(sink, columns)?);

        if !self.does_first_step {
            let mut columns = vec![
                ("TimeWindow".to_string(), ColumnKind::Int),
                ("Iteration".to_string(), ColumnKind::Int),
            ];
            for context in &self.measures {
                if context.does_logging {
                    columns.push((context.log_header(), ColumnKind::Double));
                }
            }
            let name = format!("precice-{}-convergence.log", self.local_participant);
            let sink = (self.log_sink_factory)(&name)?;
            self.convergence_writer = Some(TableWriter::new(sink, columns)?);
        }
        Ok(())
    }

    /// Append one row to the iterations log for a completed window.
    fn advance_log_writers(&mut self) -> Result<(), SchemeError> {
        if let Some(writer) = &mut self.iterations_writer {
            let converged = self.iterations >= self.min_iterations
                && (self.max_iterations < 0 || self.iterations < self.max_iterations);
            let mut row = vec![
                Cell::Int(i64::from(self.time_windows - 1)),
                Cell::Int(i64::from(self.total_iterations)),
                Cell::Int(i64::from(self.iterations)),
                Cell::Int(i64::from(converged)),
            ];
            if !self.does_first_step {
                if let Some(accel) = &self.acceleration {
                    row.push(Cell::Int(i64::from(accel.ls_system_columns())));
                    row.push(Cell::Int(i64::from(accel.deleted_columns())));
                    row.push(Cell::Int(i64::from(accel.dropped_columns())));
                }
            }
            writer.write_row(&row)?;
        }
        Ok(())
    }
}

// ── CouplingScheme ──────────────────────────────────────────────

/// A coupling scheme instance driven by one participant.
///
/// Construction order: [`new`](CouplingScheme::new), register data with
/// [`add_coupling_data`](CouplingScheme::add_coupling_data), configure
/// measures and acceleration (implicit schemes), then
/// [`initialize`](CouplingScheme::initialize). Afterwards the participant
/// repeats [`add_computed_time`](CouplingScheme::add_computed_time) and
/// [`advance`](CouplingScheme::advance) until
/// [`is_coupling_ongoing`](CouplingScheme::is_coupling_ongoing) turns
/// false, and ends with [`finalize`](CouplingScheme::finalize).
pub struct CouplingScheme {
    core: SchemeCore,
    strategy: Box<dyn ExchangeStrategy>,
}

impl CouplingScheme {
    /// Construct a scheme from a validated configuration and a connected
    /// channel to the peer participant.
    pub fn new(config: SchemeConfig, channel: Box<dyn Channel>) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategy = strategy_for(config.mode, config.arrangement);
        Ok(Self {
            core: SchemeCore {
                mode: config.mode,
                dt_method: config.dt_method,
                local_participant: config.local_participant,
                remote_participant: config.remote_participant,
                does_first_step: config.does_first_step,
                max_time: config.max_time,
                max_time_windows: config.max_time_windows,
                time_window_size: config.time_window_size,
                next_time_window_size: config.time_window_size,
                min_iterations: config.min_iterations,
                max_iterations: config.max_iterations,
                time: KahanAccumulator::new(),
                window_start_time: KahanAccumulator::new(),
                time_windows: 1,
                iterations: 1,
                total_iterations: 0,
                is_initialized: false,
                is_time_window_complete: false,
                has_data_been_received: false,
                has_converged: false,
                sends_initialized_data: false,
                receives_initialized_data: false,
                actions: ActionLedger::new(),
                registry: DataRegistry::new(),
                measures: Vec::new(),
                acceleration: None,
                channel,
                iterations_writer: None,
                convergence_writer: None,
                log_sink_factory: Box::new(|name| {
                    Ok(Box::new(BufWriter::new(File::create(name)?)))
                }),
            },
            strategy,
        })
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a coupling datum, or look up an already-registered one.
    ///
    /// A datum requiring initialization raises the
    /// [`InitializeData`](Action::InitializeData) action on the sending
    /// side and flags initialized data on the receiving side.
    pub fn add_coupling_data(&mut self, spec: DataSpec) -> Result<DataId, SchemeError> {
        assert!(
            !self.core.is_initialized,
            "data must be registered before initialize()"
        );
        let direction = spec.direction;
        let requires_initialization = spec.requires_initialization;
        let id = self.core.registry.add(spec)?;
        if requires_initialization {
            match direction {
                tether_core::data::DataDirection::Send => {
                    self.core.sends_initialized_data = true;
                    self.core.actions.require(Action::InitializeData);
                }
                tether_core::data::DataDirection::Receive => {
                    self.core.receives_initialized_data = true;
                }
            }
        }
        Ok(id)
    }

    /// Attach a convergence measure to a registered datum.
    ///
    /// # Panics
    ///
    /// On explicit schemes, or if `data` is not registered.
    pub fn add_convergence_measure(
        &mut self,
        data: DataId,
        suffices: bool,
        strict: bool,
        does_logging: bool,
        measure: Box<dyn ConvergenceMeasure>,
    ) {
        assert!(
            self.core.is_implicit(),
            "convergence measures are an implicit-coupling concept"
        );
        let data_name = self
            .core
            .registry
            .get(data)
            .expect("data with the given ID must exist")
            .name()
            .to_string();
        self.core.measures.push(MeasureContext {
            data,
            data_name,
            suffices,
            strict,
            does_logging,
            measure,
        });
    }

    /// Attach the acceleration post-processor.
    ///
    /// # Panics
    ///
    /// On explicit schemes.
    pub fn set_acceleration(&mut self, acceleration: Box<dyn Acceleration>) {
        assert!(
            self.core.is_implicit(),
            "acceleration is an implicit-coupling concept"
        );
        self.core.acceleration = Some(acceleration);
    }

    /// Replace the factory used to open log sinks.
    ///
    /// By default logs go to `precice-<participant>-iterations.log` and
    /// `precice-<participant>-convergence.log` in the working directory.
    pub fn set_log_sink_factory(&mut self, factory: LogSinkFactory) {
        self.core.log_sink_factory = factory;
    }

    // ── Lifecycle ───────────────────────────────────────────────

    /// Initialize the scheme and exchange initial data with the peer.
    ///
    /// # Panics
    ///
    /// If called twice, or with a negative start time or window.
    pub fn initialize(&mut self, start_time: f64, start_window: i32) -> Result<(), SchemeError> {
        assert!(!self.core.is_initialized, "initialize() called twice");
        assert!(
            math::greater_equals(start_time, 0.0),
            "start time must be non-negative, got {start_time}"
        );
        assert!(start_window >= 0, "start window must be non-negative");
        debug!(start_time, start_window, "initializing coupling scheme");

        let core = &mut self.core;
        core.time.reset();
        core.time.add(start_time);
        core.window_start_time.reset();
        core.window_start_time.add(start_time);
        core.time_windows = start_window;
        core.has_data_been_received = false;
        core.initialize_receive_data_storage();

        if core.is_implicit() {
            core.store_iteration();
            if !core.does_first_step {
                if let Some(accel) = core.acceleration.as_deref_mut() {
                    let ids = core.registry.all_ids();
                    let mut views = core.registry.data_views_mut(&ids);
                    accel.initialize(&mut views);
                }
            }
            core.actions.require(Action::WriteCheckpoint);
            core.initialize_log_writers()?;
        }

        self.strategy.exchange_initial_data(&mut self.core)?;
        self.core.is_initialized = true;
        Ok(())
    }

    /// Serial schemes only: the trailing participant receives the first
    /// participant's first window result right after
    /// [`initialize`](Self::initialize), overriding the receive buffers.
    ///
    /// # Panics
    ///
    /// On parallel schemes, or in the first-step role.
    pub fn receive_result_of_first_advance(&mut self) -> Result<(), SchemeError> {
        assert!(
            self.core.is_initialized,
            "receive_result_of_first_advance() requires initialize()"
        );
        self.strategy.receive_result_of_first_advance(&mut self.core)
    }

    /// Accumulate newly computed solver time. Must be called before every
    /// [`advance`](Self::advance).
    ///
    /// Returns whether the accumulated time reached the window boundary.
    pub fn add_computed_time(&mut self, time_to_add: f64) -> Result<bool, SchemeError> {
        debug!(time_to_add, time = self.core.time.read(), "adding computed time");
        if !self.core.is_coupling_ongoing() {
            return Err(SchemeError::CouplingEnded);
        }
        let max_allowed = self.core.next_time_step_max_size();
        self.core.time.add(time_to_add);
        if !math::greater_equals(max_allowed, time_to_add) {
            return Err(SchemeError::TimeStepTooLarge {
                dt: time_to_add,
                max: max_allowed,
            });
        }
        Ok(self.core.reached_end_of_time_window())
    }

    /// Exchange data and update the scheme state.
    ///
    /// Does not necessarily advance in time: away from the window
    /// boundary this is a no-op, and a non-converged implicit window is
    /// rewound instead of completed.
    pub fn advance(&mut self) -> Result<(), SchemeError> {
        self.first_synchronization();
        self.first_exchange()?;
        self.second_synchronization();
        self.second_exchange()?;
        Ok(())
    }

    /// First synchronization point of the cycle. Reserved for mesh
    /// reconfiguration, which the scheme core does not handle.
    pub fn first_synchronization(&mut self) {}

    /// First data exchange of the cycle.
    pub fn first_exchange(&mut self) -> Result<(), SchemeError> {
        let core = &mut self.core;
        core.check_completeness_required_actions()?;
        if !core.is_initialized {
            return Err(SchemeError::NotInitialized { operation: "advance" });
        }
        debug!(
            time_windows = core.time_windows,
            time = core.time.read(),
            "first exchange"
        );
        core.has_data_been_received = false;
        core.is_time_window_complete = false;

        if core.reached_end_of_time_window() {
            // Provisional: rewound again if the window does not converge.
            core.time_windows += 1;
            self.strategy.exchange_first_data(&mut self.core)?;
        }
        Ok(())
    }

    /// Second synchronization point of the cycle. Reserved for mesh
    /// reconfiguration, which the scheme core does not handle.
    pub fn second_synchronization(&mut self) {}

    /// Second data exchange of the cycle: convergence decision, window
    /// completion or rewind, and time bookkeeping.
    pub fn second_exchange(&mut self) -> Result<(), SchemeError> {
        self.core.check_completeness_required_actions()?;
        if !self.core.is_initialized {
            return Err(SchemeError::NotInitialized { operation: "advance" });
        }
        debug_assert!(
            !self.core.is_time_window_complete,
            "second_exchange ran twice within one cycle"
        );

        if !self.core.reached_end_of_time_window() {
            return Ok(());
        }

        self.strategy.exchange_second_data(&mut self.core)?;

        let core = &mut self.core;
        if core.is_implicit() {
            core.total_iterations += 1;
            if !core.has_converged {
                debug!("no convergence achieved");
                core.actions.require(Action::ReadCheckpoint);
                assert!(
                    math::greater(core.time.read(), core.window_start_time.read()),
                    "a coupling iteration must have performed time"
                );
                core.time_windows -= 1;
                core.iterations += 1;
            } else {
                debug!("convergence achieved");
                core.advance_log_writers()?;
                info!("time window completed");
                core.is_time_window_complete = true;
                if core.is_coupling_ongoing() {
                    core.actions.require(Action::WriteCheckpoint);
                }
                core.iterations = 1;
            }
        } else {
            info!("time window completed");
            core.is_time_window_complete = true;
        }

        if core.is_coupling_ongoing() {
            assert!(
                core.has_data_been_received,
                "no data received within the coupling cycle"
            );
        }

        if core.is_time_window_complete {
            let performed = core.time.read() - core.window_start_time.read();
            if core.has_time_window_size() && math::equals(performed, core.time_window_size) {
                core.window_start_time.add(core.time_window_size);
            } else if !core.has_time_window_size() {
                // This participant dictates the window size; the performed
                // step is the window.
                core.window_start_time.add(performed);
            } else {
                // The final window was truncated because the window size
                // is not a divider of max-time.
                core.window_start_time.add(performed);
                assert!(core.has_max_time());
                assert!(math::equals(core.max_time, core.time.read()));
            }
        }
        // Move time to the start of the updated window: a reset for a
        // repeated iteration, or the start of the next window.
        core.time.reset();
        let window_start = core.window_start_time.read();
        core.time.add(window_start);
        core.time_window_size = core.next_time_window_size;
        Ok(())
    }

    /// Finalize the coupling.
    ///
    /// The scheme must be initialized and all required actions fulfilled.
    pub fn finalize(&mut self) -> Result<(), SchemeError> {
        if !self.core.is_initialized {
            return Err(SchemeError::NotInitialized {
                operation: "finalize",
            });
        }
        self.core.check_completeness_required_actions()?;
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Whether [`initialize`](Self::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.core.is_initialized
    }

    /// Whether this participant sends initialized data.
    pub fn sends_initialized_data(&self) -> bool {
        self.core.sends_initialized_data
    }

    /// Whether this participant receives initialized data.
    pub fn receives_initialized_data(&self) -> bool {
        self.core.receives_initialized_data
    }

    /// The currently computed time of the scheme.
    pub fn time(&self) -> f64 {
        self.core.time.read()
    }

    /// The start time of the current window.
    pub fn window_start_time(&self) -> f64 {
        self.core.window_start_time.read()
    }

    /// The current window counter.
    pub fn time_windows(&self) -> i32 {
        self.core.time_windows
    }

    /// Whether the scheme prescribes a window size.
    pub fn has_time_window_size(&self) -> bool {
        self.core.has_time_window_size()
    }

    /// The prescribed window size.
    ///
    /// # Panics
    ///
    /// If no window size is prescribed; check
    /// [`has_time_window_size`](Self::has_time_window_size) first.
    pub fn time_window_size(&self) -> f64 {
        assert!(self.core.has_time_window_size());
        self.core.time_window_size
    }

    /// The window size that takes effect at the next window boundary.
    pub fn next_time_window_size(&self) -> f64 {
        self.core.next_time_window_size
    }

    /// Remaining time within the current window, or `0.0` when no window
    /// size is prescribed.
    pub fn this_time_window_remainder(&self) -> f64 {
        if !self.core.has_time_window_size() {
            return 0.0;
        }
        self.core.window_start_time.read() + self.core.time_window_size - self.core.time.read()
    }

    /// Maximal length of the next time step to be computed.
    pub fn next_time_step_max_size(&self) -> f64 {
        self.core.next_time_step_max_size()
    }

    /// Whether data will be exchanged by the upcoming advance, given the
    /// length of the solver step about to be taken.
    pub fn will_data_be_exchanged(&self, last_solver_time_step: f64) -> bool {
        let remainder = self.core.next_time_step_max_size() - last_solver_time_step;
        !math::greater(remainder, 0.0)
    }

    /// Whether data was received in the last advance (or at
    /// initialization).
    pub fn has_data_been_received(&self) -> bool {
        self.core.has_data_been_received
    }

    /// Whether the coupled simulation is still ongoing.
    pub fn is_coupling_ongoing(&self) -> bool {
        self.core.is_coupling_ongoing()
    }

    /// Whether the participant can move on to the next window.
    pub fn is_time_window_complete(&self) -> bool {
        self.core.is_time_window_complete
    }

    /// Whether this scheme iterates windows until convergence.
    pub fn is_implicit_coupling_scheme(&self) -> bool {
        self.core.is_implicit()
    }

    /// False iff the scheme is implicit and the current window has not
    /// converged.
    pub fn has_converged(&self) -> bool {
        !self.core.is_implicit() || self.core.has_converged
    }

    /// Whether this participant takes the first-step role.
    pub fn does_first_step(&self) -> bool {
        self.core.does_first_step
    }

    /// Iteration counter within the current window (implicit, 1-based).
    pub fn iterations(&self) -> i32 {
        self.core.iterations
    }

    /// Total iterations performed across all windows.
    pub fn total_iterations(&self) -> i32 {
        self.core.total_iterations
    }

    /// Names of the coupling partners.
    pub fn coupling_partners(&self) -> Vec<String> {
        vec![self.core.remote_participant.clone()]
    }

    /// True iff any send datum exchanges its sub-step trajectory.
    pub fn requires_substeps(&self) -> bool {
        self.core.registry.requires_substeps()
    }

    // ── Actions ─────────────────────────────────────────────────

    /// Whether the participant has to perform `action` this cycle.
    pub fn is_action_required(&self, action: Action) -> bool {
        self.core.actions.is_required(action)
    }

    /// Whether `action` has been fulfilled this cycle.
    pub fn is_action_fulfilled(&self, action: Action) -> bool {
        self.core.actions.is_fulfilled(action)
    }

    /// Acknowledge a required action.
    pub fn mark_action_fulfilled(&mut self, action: Action) -> Result<(), SchemeError> {
        if !self.core.actions.mark_fulfilled(action) {
            return Err(SchemeError::ActionNotRequired { action });
        }
        Ok(())
    }

    /// Raise an obligation on the participant.
    pub fn require_action(&mut self, action: Action) {
        self.core.actions.require(action);
    }

    // ── Data access ─────────────────────────────────────────────

    /// Borrow a registered datum for reading.
    pub fn data(&self, id: DataId) -> Option<&CouplingData> {
        self.core.registry.get(id)
    }

    /// Borrow a registered datum for writing. The borrow must end before
    /// the next scheme call.
    pub fn data_mut(&mut self, id: DataId) -> Option<&mut CouplingData> {
        self.core.registry.get_mut(id)
    }

    // ── State printing ──────────────────────────────────────────

    /// One-line human-readable description of the current coupling state.
    pub fn print_coupling_state(&self) -> String {
        let core = &self.core;
        let mut out = String::new();
        if core.is_implicit() {
            out.push_str(&format!("iteration: {}", core.iterations));
            if core.max_iterations != UNDEFINED_MAX_ITERATIONS
                && core.max_iterations != INFINITE_MAX_ITERATIONS
            {
                out.push_str(&format!(" of {}", core.max_iterations));
            }
            if core.min_iterations != UNDEFINED_MIN_ITERATIONS {
                out.push_str(&format!(" (min {})", core.min_iterations));
            }
            out.push_str(", ");
        }
        out.push_str(&format!("time-window: {}", core.time_windows));
        if core.max_time_windows != UNDEFINED_TIME_WINDOWS {
            out.push_str(&format!(" of {}", core.max_time_windows));
        }
        out.push_str(&format!(", time: {}", core.time.read()));
        if core.has_max_time() {
            out.push_str(&format!(" of {}", core.max_time));
        }
        if core.has_time_window_size() {
            out.push_str(&format!(", time-window-size: {}", core.time_window_size));
        }
        if core.has_time_window_size() || core.has_max_time() {
            out.push_str(&format!(
                ", max-time-step-size: {}",
                core.next_time_step_max_size()
            ));
        }
        out.push_str(if core.is_coupling_ongoing() {
            ", ongoing: yes"
        } else {
            ", ongoing: no"
        });
        out.push_str(if core.is_time_window_complete {
            ", time-window-complete: yes"
        } else {
            ", time-window-complete: no"
        });
        let required: Vec<String> = core.actions.required().map(|a| a.to_string()).collect();
        if !required.is_empty() {
            out.push_str(&format!(", required-actions: {}", required.join(", ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CouplingArrangement, SchemeConfig};
    use tether_core::data::{DataDirection, DataSpec};
    use tether_test_utils::channel_pair;

    fn explicit_serial_config(first: bool) -> SchemeConfig {
        SchemeConfig {
            local_participant: if first { "fluid" } else { "solid" }.into(),
            remote_participant: if first { "solid" } else { "fluid" }.into(),
            does_first_step: first,
            mode: CouplingMode::Explicit,
            arrangement: CouplingArrangement::Serial,
            dt_method: TimesteppingMethod::FixedTimeWindowSize,
            max_time: 1.0,
            max_time_windows: UNDEFINED_TIME_WINDOWS,
            time_window_size: 0.25,
            min_iterations: UNDEFINED_MIN_ITERATIONS,
            max_iterations: UNDEFINED_MAX_ITERATIONS,
        }
    }

    fn spec(id: u32, direction: DataDirection) -> DataSpec {
        DataSpec {
            id: DataId(id),
            name: format!("data-{id}"),
            size: 1,
            mesh_dimensions: 2,
            has_gradient: false,
            requires_initialization: false,
            exchange_substeps: false,
            direction,
        }
    }

    fn first_scheme() -> CouplingScheme {
        let (a, _b) = channel_pair();
        let mut scheme =
            CouplingScheme::new(explicit_serial_config(true), Box::new(a)).unwrap();
        scheme.add_coupling_data(spec(0, DataDirection::Send)).unwrap();
        scheme.add_coupling_data(spec(1, DataDirection::Receive)).unwrap();
        scheme
    }

    #[test]
    fn advance_before_initialize_is_a_usage_error() {
        let mut scheme = first_scheme();
        assert!(matches!(
            scheme.advance(),
            Err(SchemeError::NotInitialized { operation: "advance" })
        ));
    }

    #[test]
    fn finalize_before_initialize_is_a_usage_error() {
        let mut scheme = first_scheme();
        assert!(matches!(
            scheme.finalize(),
            Err(SchemeError::NotInitialized { operation: "finalize" })
        ));
    }

    #[test]
    fn initialize_sets_time_and_counters() {
        let mut scheme = first_scheme();
        scheme.initialize(0.0, 1).unwrap();
        assert!(scheme.is_initialized());
        assert_eq!(scheme.time(), 0.0);
        assert_eq!(scheme.window_start_time(), 0.0);
        assert_eq!(scheme.time_windows(), 1);
        assert!(!scheme.has_data_been_received());
        assert!(scheme.is_coupling_ongoing());
    }

    #[test]
    fn next_time_step_max_size_is_the_window_remainder() {
        let mut scheme = first_scheme();
        scheme.initialize(0.0, 1).unwrap();
        assert_eq!(scheme.next_time_step_max_size(), 0.25);
        assert!(!scheme.add_computed_time(0.1).unwrap());
        assert!((scheme.next_time_step_max_size() - 0.15).abs() < 1.0e-12);
        assert!(scheme.add_computed_time(scheme.next_time_step_max_size()).unwrap());
    }

    #[test]
    fn overshooting_the_window_is_a_usage_error() {
        let mut scheme = first_scheme();
        scheme.initialize(0.0, 1).unwrap();
        let err = scheme.add_computed_time(0.3).unwrap_err();
        match err {
            SchemeError::TimeStepTooLarge { dt, max } => {
                assert_eq!(dt, 0.3);
                assert_eq!(max, 0.25);
            }
            other => panic!("expected TimeStepTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn max_time_truncates_the_allowed_step() {
        // Window size 0.75 with max time 1.0: the first window is a full
        // one, and the remainder query stays consistent at its boundary.
        let mut config = explicit_serial_config(true);
        config.time_window_size = 0.75;
        let (a, _b) = channel_pair();
        let mut scheme = CouplingScheme::new(config, Box::new(a)).unwrap();
        scheme.initialize(0.0, 1).unwrap();
        assert_eq!(scheme.next_time_step_max_size(), 0.75);
        scheme.add_computed_time(0.75).unwrap();
        // Window complete; remainder to max time is 0.25 < window size.
        // (The exchange itself needs the peer; only the time query is
        // exercised here.)
        assert_eq!(scheme.this_time_window_remainder(), 0.0);
    }

    #[test]
    fn will_data_be_exchanged_at_the_boundary() {
        let mut scheme = first_scheme();
        scheme.initialize(0.0, 1).unwrap();
        assert!(!scheme.will_data_be_exchanged(0.1));
        assert!(scheme.will_data_be_exchanged(0.25));
    }

    #[test]
    fn conflicting_registration_is_rejected() {
        let mut scheme = first_scheme();
        let err = scheme
            .add_coupling_data(spec(0, DataDirection::Receive))
            .unwrap_err();
        assert!(matches!(err, SchemeError::ConflictingDirection { .. }));
    }

    #[test]
    fn initial_data_raises_the_initialize_action() {
        let (a, _b) = channel_pair();
        let mut scheme =
            CouplingScheme::new(explicit_serial_config(true), Box::new(a)).unwrap();
        let mut data_spec = spec(0, DataDirection::Send);
        data_spec.requires_initialization = true;
        scheme.add_coupling_data(data_spec).unwrap();
        assert!(scheme.sends_initialized_data());
        assert!(scheme.is_action_required(Action::InitializeData));
    }

    #[test]
    fn fulfilling_an_unrequired_action_is_a_usage_error() {
        let mut scheme = first_scheme();
        assert!(matches!(
            scheme.mark_action_fulfilled(Action::ReadCheckpoint),
            Err(SchemeError::ActionNotRequired {
                action: Action::ReadCheckpoint
            })
        ));
    }

    #[test]
    fn missing_action_fails_the_next_synchronization() {
        let mut scheme = first_scheme();
        scheme.initialize(0.0, 1).unwrap();
        scheme.require_action(Action::WriteCheckpoint);
        scheme.add_computed_time(0.1).unwrap();
        let err = scheme.advance().unwrap_err();
        match err {
            SchemeError::UnfulfilledActions { missing } => {
                assert_eq!(missing, vec![Action::WriteCheckpoint]);
            }
            other => panic!("expected UnfulfilledActions, got {other:?}"),
        }
    }

    #[test]
    fn mid_window_advance_exchanges_nothing() {
        let mut scheme = first_scheme();
        scheme.initialize(0.0, 1).unwrap();
        scheme.add_computed_time(0.1).unwrap();
        // Away from the boundary the advance is a pure bookkeeping no-op;
        // no channel traffic happens, so no peer is needed.
        scheme.advance().unwrap();
        assert!(!scheme.is_time_window_complete());
        assert_eq!(scheme.time_windows(), 1);
    }

    #[test]
    fn print_state_mentions_window_and_time() {
        let mut scheme = first_scheme();
        scheme.initialize(0.0, 1).unwrap();
        let state = scheme.print_coupling_state();
        assert!(state.contains("time-window: 1"));
        assert!(state.contains("time: 0 of 1"));
        assert!(state.contains("ongoing: yes"));
    }

    #[test]
    fn coupling_partners_names_the_remote() {
        let scheme = first_scheme();
        assert_eq!(scheme.coupling_partners(), vec!["solid".to_string()]);
    }
}
