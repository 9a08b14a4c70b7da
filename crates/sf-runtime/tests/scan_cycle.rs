//! End-to-end scans through Application and ControlLoop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use sf_core::Signal;
use sf_modules::{
    Console, Const, Module, ModuleBase, ModuleDescriptor, ModuleFault, Negate, PiControl,
    PortLayout, Recorder, ScanContext, ScanListener, Source, Transform,
};
use sf_runtime::{Application, Assembly, ControlLoop, LoopConfig, LoopState, RuntimeError};

static FLAKY: ModuleDescriptor = ModuleDescriptor {
    type_name: "flaky",
    summary: "fails every other scan",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out"]),
};

/// Passes its input through, failing on odd-numbered calls.
#[derive(Default)]
struct Flaky {
    calls: u32,
}

impl ModuleBase for Flaky {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &FLAKY
    }
}

impl Transform for Flaky {
    fn process(
        &mut self,
        input: &[Option<Signal>],
        output: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        self.calls += 1;
        if self.calls % 2 == 1 {
            return Err(ModuleFault::new("sensor timeout"));
        }
        output[0] = input[0].clone();
        Ok(())
    }
}

static SLOW: ModuleDescriptor = ModuleDescriptor {
    type_name: "slow",
    summary: "sleeps on its first scan",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out", "low", "high"]),
};

/// Writes no outputs; sleeps `first_delay` on its first scan.
struct Slow {
    first_delay: Duration,
    calls: u32,
}

impl ModuleBase for Slow {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &SLOW
    }
}

impl Transform for Slow {
    fn process(
        &mut self,
        _input: &[Option<Signal>],
        _output: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        self.calls += 1;
        if self.calls == 1 {
            thread::sleep(self.first_delay);
        }
        Ok(())
    }
}

static BOOM: ModuleDescriptor = ModuleDescriptor {
    type_name: "boom",
    summary: "panics",
    inputs: PortLayout::Empty,
    outputs: PortLayout::Fixed(&["out"]),
};

struct Boom;

impl ModuleBase for Boom {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &BOOM
    }
}

impl Source for Boom {
    fn produce(&mut self, _output: &mut [Option<Signal>]) -> Result<(), ModuleFault> {
        panic!("driver bug");
    }
}

struct PhaseLog(Arc<Mutex<Vec<String>>>);

impl ScanListener for PhaseLog {
    fn scan_start(&mut self, ctx: &ScanContext) {
        self.0.lock().unwrap().push(format!("start {}", ctx.scan));
    }

    fn processing_start(&mut self, ctx: &ScanContext) {
        self.0.lock().unwrap().push(format!("processing {}", ctx.scan));
    }

    fn scan_end(&mut self, ctx: &ScanContext) {
        self.0.lock().unwrap().push(format!("end {}", ctx.scan));
    }
}

fn quick(max_scans: u64) -> LoopConfig {
    LoopConfig {
        cycle_period_ms: 0,
        start_scan_delay_ms: 0,
        max_scans: Some(max_scans),
        ..LoopConfig::default()
    }
}

/// `five -> middle -> sink`, wired through signals `x` and `y`.
fn chain(middle: Module, sink: Module) -> Assembly {
    let mut app = Application::new();
    let five = app.add_module("five", Module::source(Const::new(5.0)));
    let mid = app.add_module("middle", middle);
    let end = app.add_module("end", sink);
    let root = app.root_scope();
    app.declare_signal(root, "x").unwrap();
    app.declare_signal(root, "y").unwrap();
    app.output(five, None, root, "x").unwrap();
    app.input(mid, Some("in"), root, "x").unwrap();
    app.output(mid, Some("out"), root, "y").unwrap();
    app.input(end, Some("y"), root, "y").unwrap();
    app.assemble().unwrap()
}

#[test]
fn const_negate_console() {
    let assembly = chain(Module::transform(Negate), Module::sink(Console::new()));
    let report = ControlLoop::new(quick(1))
        .run(assembly.crates, assembly.buffer_size)
        .unwrap();

    assert_eq!(report.scans, 1);
    assert_eq!(report.faults, 0);
    assert_eq!(report.buffer.slot(0), Some(&Signal::scalar(5.0)));
    assert_eq!(report.buffer.slot(1), Some(&Signal::scalar(-5.0)));

    let Module::Sink(_) = report.crates[2].module() else {
        panic!("console should be a sink");
    };
    assert_eq!(report.crates[2].name(), "end");
}

#[test]
fn fault_skips_rest_of_scan_only() {
    let recorder = Recorder::new();
    let history = recorder.handle();
    let assembly = chain(Module::transform(Flaky::default()), Module::sink(recorder));

    let report = ControlLoop::new(quick(4))
        .run(assembly.crates, assembly.buffer_size)
        .unwrap();

    assert_eq!(report.scans, 4);
    assert_eq!(report.faults, 2);
    // the recorder only ran on the even scans
    assert_eq!(history.len(), 2);
    assert_eq!(history.last(), Some(vec![Signal::scalar(5.0)]));
    assert_eq!(report.buffer.slot(0), Some(&Signal::scalar(5.0)));
}

#[test]
fn faulted_scan_keeps_upstream_outputs() {
    let recorder = Recorder::new();
    let history = recorder.handle();
    let assembly = chain(Module::transform(Flaky::default()), Module::sink(recorder));

    let report = ControlLoop::new(quick(1))
        .run(assembly.crates, assembly.buffer_size)
        .unwrap();

    assert_eq!(report.faults, 1);
    assert_eq!(report.buffer.slot(0), Some(&Signal::scalar(5.0)));
    assert_eq!(report.buffer.slot(1), None);
    assert!(history.is_empty());
}

#[test]
fn unwritten_outputs_are_invalid() {
    let mut app = Application::new();
    let five = app.add_module("five", Module::source(Const::new(5.0)));
    let slow = app.add_module(
        "silent",
        Module::transform(Slow {
            first_delay: Duration::ZERO,
            calls: 0,
        }),
    );
    let log = app.add_module("log", Module::sink(Console::new()));
    let root = app.root_scope();
    for name in ["x", "a", "b", "c"] {
        app.declare_signal(root, name).unwrap();
    }
    app.output(five, None, root, "x").unwrap();
    app.input(slow, None, root, "x").unwrap();
    for (key, name) in [("out", "a"), ("low", "b"), ("high", "c")] {
        app.output(slow, Some(key), root, name).unwrap();
        app.input(log, Some(name), root, name).unwrap();
    }
    let assembly = app.assemble().unwrap();

    let report = ControlLoop::new(quick(1))
        .run(assembly.crates, assembly.buffer_size)
        .unwrap();
    for p in 1..4 {
        assert_eq!(report.buffer.slot(p), Some(&Signal::invalid()));
    }
}

#[test]
fn overrun_is_reported_and_not_compensated() {
    let slow = Slow {
        first_delay: Duration::from_millis(60),
        calls: 0,
    };
    let assembly = chain(Module::transform(slow), Module::sink(Console::new()));
    let config = LoopConfig {
        cycle_period_ms: 20,
        start_scan_delay_ms: 0,
        overrun_tolerance_ms: 10,
        max_scans: Some(3),
        ..LoopConfig::default()
    };

    let mut lp = ControlLoop::new(config);
    let handle = lp.handle();
    let report = lp.run(assembly.crates, assembly.buffer_size).unwrap();

    assert_eq!(report.scans, 3);
    assert_eq!(report.overruns, 1);
    assert_eq!(handle.overrun_count(), 1);
    assert!(report.durations.max() >= Duration::from_millis(60));
    // every scan waits out the full period
    assert!(report.durations.min() >= Duration::from_millis(20));
    assert_eq!(report.durations.count(), 3);
}

#[test]
fn stop_from_another_thread() {
    let assembly = chain(Module::transform(Negate), Module::sink(Console::new()));
    let config = LoopConfig {
        cycle_period_ms: 5,
        start_scan_delay_ms: 0,
        ..LoopConfig::default()
    };
    let mut lp = ControlLoop::new(config);
    let handle = lp.handle();

    let worker = thread::spawn(move || lp.run(assembly.crates, assembly.buffer_size));
    while handle.scan_count() < 3 {
        thread::sleep(Duration::from_millis(2));
    }
    handle.request_stop();
    let report = worker.join().unwrap().unwrap();

    assert!(report.scans >= 3);
    assert_eq!(handle.state(), LoopState::Stopped);
    assert_eq!(handle.scan_count(), report.scans);
    assert!(handle.last_scan_duration() >= Duration::from_millis(5));
}

#[test]
fn listeners_see_phases_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let assembly = chain(Module::transform(Negate), Module::sink(Console::new()));
    let mut lp = ControlLoop::new(quick(2));
    lp.add_listener(PhaseLog(log.clone()));
    lp.run(assembly.crates, assembly.buffer_size).unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        [
            "start 1",
            "processing 1",
            "end 1",
            "start 2",
            "processing 2",
            "end 2"
        ]
    );
}

#[test]
fn listeners_still_hear_scan_end_after_a_fault() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let assembly = chain(
        Module::transform(Flaky::default()),
        Module::sink(Console::new()),
    );
    let mut lp = ControlLoop::new(quick(1));
    lp.add_listener(PhaseLog(log.clone()));
    let report = lp.run(assembly.crates, assembly.buffer_size).unwrap();

    assert_eq!(report.faults, 1);
    assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("end 1"));
}

#[test]
fn prepare_failure_is_fatal() {
    let mut pi = PiControl::default();
    pi.set_property("ti", "0").unwrap();
    let mut app = Application::new();
    app.add_module("controller", Module::transform(pi));
    let assembly = app.assemble().unwrap();

    let err = ControlLoop::new(quick(1))
        .run(assembly.crates, assembly.buffer_size)
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Prepare { ref module, type_name: "pi", .. } if module == "controller"
    ));
}

#[test]
fn first_fault_writes_one_dump() {
    let dir = tempfile::tempdir().unwrap();
    let assembly = chain(
        Module::transform(Flaky::default()),
        Module::sink(Console::new()),
    );
    let config = LoopConfig {
        dump_on_fault: true,
        dump_dir: Some(dir.path().to_path_buf()),
        ..quick(5)
    };
    let report = ControlLoop::new(config)
        .run(assembly.crates, assembly.buffer_size)
        .unwrap();
    assert_eq!(report.faults, 3);

    let dumps: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(dumps.len(), 1);
    let text = std::fs::read_to_string(dumps[0].as_ref().unwrap().path()).unwrap();
    assert!(text.contains("fault in module 'middle' (flaky): sensor timeout"));
    assert!(text.contains("1: middle (flaky)"));
}

#[test]
fn panic_writes_dump_then_propagates() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = Application::new();
    app.add_module("driver", Module::source(Boom));
    let assembly = app.assemble().unwrap();

    let mut lp = ControlLoop::new(LoopConfig {
        dump_dir: Some(dir.path().to_path_buf()),
        ..quick(1)
    });
    let handle = lp.handle();
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        lp.run(assembly.crates, assembly.buffer_size)
    }));

    assert!(result.is_err());
    assert_eq!(handle.state(), LoopState::Stopped);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
