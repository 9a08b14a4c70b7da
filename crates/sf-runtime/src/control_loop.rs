//! The scan-cycle scheduler.
//!
//! One scan, in order:
//! 1. clear the buffer
//! 2. `scan_start` to every listener
//! 3. wait out the start delay
//! 4. `processing_start`
//! 5. execute every crate in order; a module fault skips the rest
//! 6. `scan_end`
//! 7. wait out the cycle period, then check for an overrun
//!
//! A stop request is only looked at between scans.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use sf_core::{DurationStats, Signal};
use sf_modules::{ModuleFault, PrepareContext, ScanContext, ScanListener};
use tracing::{error, info, warn};

use crate::buffer::DataBuffer;
use crate::config::LoopConfig;
use crate::dump;
use crate::error::{RuntimeError, RuntimeResult};
use crate::events::{Dispatcher, Phase};
use crate::module_crate::ModuleCrate;

/// Scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    /// Stop requested; the scan in flight still completes.
    Stopping,
    Stopped,
}

impl LoopState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => LoopState::Idle,
            1 => LoopState::Running,
            2 => LoopState::Stopping,
            _ => LoopState::Stopped,
        }
    }
}

#[derive(Debug)]
struct Shared {
    stop: AtomicBool,
    state: AtomicU8,
    scans: AtomicU64,
    overruns: AtomicU64,
    last_scan_nanos: AtomicU64,
}

/// Cross-thread view of a running loop.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    shared: Arc<Shared>,
}

impl LoopHandle {
    fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                stop: AtomicBool::new(false),
                state: AtomicU8::new(LoopState::Idle as u8),
                scans: AtomicU64::new(0),
                overruns: AtomicU64::new(0),
                last_scan_nanos: AtomicU64::new(0),
            }),
        }
    }

    /// Ask the loop to stop after the scan in flight.
    pub fn request_stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        let _ = self.shared.state.compare_exchange(
            LoopState::Running as u8,
            LoopState::Stopping as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn stop_requested(&self) -> bool {
        self.shared.stop.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// Scans started so far.
    pub fn scan_count(&self) -> u64 {
        self.shared.scans.load(Ordering::SeqCst)
    }

    pub fn overrun_count(&self) -> u64 {
        self.shared.overruns.load(Ordering::SeqCst)
    }

    /// Wall-clock length of the last completed scan, wait included.
    pub fn last_scan_duration(&self) -> Duration {
        Duration::from_nanos(self.shared.last_scan_nanos.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: LoopState) {
        self.shared.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Summary returned by [`ControlLoop::run`].
#[derive(Debug)]
pub struct LoopReport {
    pub scans: u64,
    pub overruns: u64,
    /// Scans cut short by a module fault.
    pub faults: u64,
    pub durations: DurationStats,
    /// Buffer contents after the last scan.
    pub buffer: DataBuffer,
    /// The crates, handed back for inspection.
    pub crates: Vec<ModuleCrate>,
}

/// Repeats scans over a fixed, ordered list of module crates.
pub struct ControlLoop {
    config: LoopConfig,
    listeners: Vec<Box<dyn ScanListener + Send>>,
    handle: LoopHandle,
    has_run: bool,
}

impl Default for ControlLoop {
    fn default() -> Self {
        Self::new(LoopConfig::default())
    }
}

impl ControlLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            listeners: Vec::new(),
            handle: LoopHandle::new(),
            has_run: false,
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn set_cycle_period(&mut self, ms: u64) {
        self.config.cycle_period_ms = ms;
    }

    pub fn set_start_scan_delay(&mut self, ms: u64) {
        self.config.start_scan_delay_ms = ms;
    }

    /// Register a listener. External listeners are notified before
    /// listening modules, in registration order.
    pub fn add_listener(&mut self, listener: impl ScanListener + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn request_stop(&self) {
        self.handle.request_stop();
    }

    pub fn scan_count(&self) -> u64 {
        self.handle.scan_count()
    }

    pub fn last_scan_duration(&self) -> Duration {
        self.handle.last_scan_duration()
    }

    /// Prepare every module, then scan until stopped or `max_scans` is
    /// reached.
    ///
    /// Module faults are logged and counted, never returned. A panic inside
    /// a scan writes a diagnostic dump and is then resumed.
    pub fn run(
        &mut self,
        crates: Vec<ModuleCrate>,
        buffer_size: usize,
    ) -> RuntimeResult<LoopReport> {
        if self.has_run {
            return Err(RuntimeError::AlreadyRun);
        }
        self.has_run = true;

        let mut crates = crates;
        check_maps(&crates, buffer_size)?;

        let period = self.config.cycle_period();
        let ctx = PrepareContext {
            cycle_period: period,
        };
        for c in &mut crates {
            let type_name = c.type_name();
            c.module_mut()
                .base_mut()
                .prepare(&ctx)
                .map_err(|source| RuntimeError::Prepare {
                    module: c.name().to_string(),
                    type_name,
                    source,
                })?;
        }

        let dispatcher = Dispatcher::new(std::mem::take(&mut self.listeners), &mut crates);
        let mut cycle = Cycle {
            timing: Timing {
                period,
                start_delay: self.config.effective_start_delay(),
                tolerance: self.config.overrun_tolerance(),
            },
            dispatcher,
            buffer: DataBuffer::new(buffer_size),
            scratch: Vec::new(),
            crates,
        };

        info!(
            modules = cycle.crates.len(),
            buffer_size,
            listeners = cycle.dispatcher.len(),
            period_ms = self.config.cycle_period_ms,
            start_delay_ms = cycle.timing.start_delay.as_millis() as u64,
            "control loop started"
        );
        self.handle.set_state(LoopState::Running);
        if self.handle.stop_requested() {
            self.handle.set_state(LoopState::Stopping);
        }

        let shared = &self.handle.shared;
        let mut durations = DurationStats::new();
        let mut faults = 0;
        let mut dumped = false;
        let mut scan = 0;

        while !self.handle.stop_requested()
            && self.config.max_scans.is_none_or(|max| scan < max)
        {
            scan += 1;
            shared.scans.store(scan, Ordering::SeqCst);

            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| cycle.scan(scan))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    error!(scan, "panic during scan");
                    if !dumped {
                        self.write_dump(&cycle, &format!("panic during scan {scan}"));
                    }
                    self.handle.set_state(LoopState::Stopped);
                    panic::resume_unwind(payload);
                }
            };

            if let Some((index, fault)) = &outcome.fault {
                faults += 1;
                if self.config.dump_on_fault && !dumped {
                    let c = &cycle.crates[*index];
                    let reason =
                        format!("fault in module '{}' ({}): {fault}", c.name(), c.type_name());
                    self.write_dump(&cycle, &reason);
                    dumped = true;
                }
            }
            if outcome.overrun {
                shared.overruns.fetch_add(1, Ordering::SeqCst);
            }
            let nanos = u64::try_from(outcome.duration.as_nanos()).unwrap_or(u64::MAX);
            shared.last_scan_nanos.store(nanos, Ordering::SeqCst);
            durations.record(outcome.duration);
        }

        self.handle.set_state(LoopState::Stopped);
        let overruns = self.handle.overrun_count();
        info!(scans = scan, overruns, faults, "control loop stopped");

        Ok(LoopReport {
            scans: scan,
            overruns,
            faults,
            durations,
            buffer: cycle.buffer,
            crates: cycle.crates,
        })
    }

    fn write_dump(&self, cycle: &Cycle, reason: &str) {
        let dir = self.config.dump_dir();
        match dump::write(&dir, reason, &cycle.buffer, &cycle.crates) {
            Ok(path) => warn!(path = %path.display(), "diagnostic dump written"),
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "failed to write diagnostic dump")
            }
        }
    }
}

/// Every map entry must point inside the buffer.
fn check_maps(crates: &[ModuleCrate], buffer_size: usize) -> RuntimeResult<()> {
    let fits = |p: &i32| usize::try_from(*p).map_or(true, |p| p < buffer_size);
    for c in crates {
        let inputs = c.inputs().as_slice();
        let outputs = c.outputs().as_slice();
        if !(inputs.iter().all(fits) && outputs.iter().all(fits)) {
            return Err(RuntimeError::InvalidArg {
                what: "io-map pointer outside the data buffer",
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Timing {
    period: Duration,
    start_delay: Duration,
    tolerance: Duration,
}

struct ScanOutcome {
    duration: Duration,
    overrun: bool,
    /// Crate index and fault that cut the scan short.
    fault: Option<(usize, ModuleFault)>,
}

/// Everything a scan touches, owned by the scheduler thread.
struct Cycle {
    timing: Timing,
    dispatcher: Dispatcher,
    buffer: DataBuffer,
    scratch: Vec<Option<Signal>>,
    crates: Vec<ModuleCrate>,
}

impl Cycle {
    fn scan(&mut self, scan: u64) -> ScanOutcome {
        let started = Instant::now();
        let ctx = ScanContext { scan, started };

        self.buffer.clear();
        self.dispatcher.fire(Phase::ScanStart, &mut self.crates, &ctx);
        sleep_until(started + self.timing.start_delay);
        self.dispatcher
            .fire(Phase::ProcessingStart, &mut self.crates, &ctx);

        let mut fault = None;
        for (i, c) in self.crates.iter_mut().enumerate() {
            if let Err(e) = c.execute(&mut self.buffer, &mut self.scratch) {
                warn!(
                    scan,
                    module = %c.name(),
                    type_name = c.type_name(),
                    error = %e,
                    "module fault, skipping the rest of the scan"
                );
                fault = Some((i, e));
                break;
            }
        }

        self.dispatcher.fire(Phase::ScanEnd, &mut self.crates, &ctx);

        let period = self.timing.period;
        if !period.is_zero() {
            sleep_until(started + period);
        }
        let duration = started.elapsed();
        let overrun = !period.is_zero() && duration > period + self.timing.tolerance;
        if overrun {
            warn!(
                scan,
                elapsed_ms = duration.as_millis() as u64,
                period_ms = period.as_millis() as u64,
                "scan overrun"
            );
        }
        ScanOutcome {
            duration,
            overrun,
            fault,
        }
    }
}

fn sleep_until(deadline: Instant) {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if !remaining.is_zero() {
        thread::sleep(remaining);
    }
}
