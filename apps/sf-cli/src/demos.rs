//! Built-in demo applications.

use sf_core::{ModuleId, ScopeId};
use sf_modules::registry;
use sf_runtime::{Application, Assembly};

use crate::{CliError, CliResult};

pub struct Demo {
    pub name: &'static str,
    pub summary: &'static str,
    build: fn(&mut Wiring) -> CliResult<()>,
}

impl Demo {
    pub fn assemble(&self) -> CliResult<Assembly> {
        let mut wiring = Wiring::new();
        (self.build)(&mut wiring)?;
        Ok(wiring.app.assemble()?)
    }
}

pub static DEMOS: &[Demo] = &[
    Demo {
        name: "negate",
        summary: "const 5 through negate into a console",
        build: negate,
    },
    Demo {
        name: "limits",
        summary: "wall-clock seconds scaled and clamped to +/-30",
        build: limits,
    },
    Demo {
        name: "logic",
        summary: "comparator, window check and mux on the seconds counter",
        build: logic,
    },
    Demo {
        name: "control",
        summary: "PI controller driving a first-order lag",
        build: control,
    },
];

pub fn find(name: &str) -> CliResult<&'static Demo> {
    DEMOS
        .iter()
        .find(|d| d.name == name)
        .ok_or_else(|| CliError::UnknownDemo(name.to_string()))
}

/// Application plus the root scope every demo signal lives in.
struct Wiring {
    app: Application,
    root: ScopeId,
}

impl Wiring {
    fn new() -> Self {
        let app = Application::new();
        let root = app.root_scope();
        Self { app, root }
    }

    fn module(
        &mut self,
        name: &str,
        type_name: &str,
        properties: &[(&str, &str)],
    ) -> CliResult<ModuleId> {
        let id = self.app.add_module(name, registry::create(type_name)?);
        for (key, value) in properties {
            self.app.set_property(id, key, value)?;
        }
        Ok(id)
    }

    /// Declare `signal`, produced on `from` and read by every `to`.
    fn wire(
        &mut self,
        signal: &str,
        from: (ModuleId, Option<&str>),
        to: &[(ModuleId, Option<&str>)],
    ) -> CliResult<()> {
        self.app.declare_signal(self.root, signal)?;
        self.app.output(from.0, from.1, self.root, signal)?;
        for (module, key) in to {
            self.app.input(*module, *key, self.root, signal)?;
        }
        Ok(())
    }
}

fn negate(w: &mut Wiring) -> CliResult<()> {
    let five = w.module("five", "const", &[("value", "5")])?;
    let flip = w.module("flip", "negate", &[])?;
    let log = w.module("log", "console", &[])?;
    w.wire("x", (five, None), &[(flip, None), (log, Some("x"))])?;
    w.wire("minus_x", (flip, None), &[(log, Some("-x"))])
}

fn limits(w: &mut Wiring) -> CliResult<()> {
    let clock = w.module("clock", "clock", &[])?;
    let scale = w.module("scale", "linear", &[("mul", "2"), ("add", "-60")])?;
    let clamp = w.module(
        "clamp",
        "saturation",
        &[("min-limit", "-30"), ("max-limit", "30")],
    )?;
    let log = w.module("log", "console", &[])?;
    w.wire("sec", (clock, Some("sec")), &[(scale, None), (log, Some("sec"))])?;
    w.wire("scaled", (scale, None), &[(clamp, None), (log, Some("scaled"))])?;
    w.wire("clamped", (clamp, Some("out")), &[(log, Some("clamped"))])?;
    w.wire("at_min", (clamp, Some("min")), &[(log, Some("at min"))])?;
    w.wire("at_max", (clamp, Some("max")), &[(log, Some("at max"))])
}

fn logic(w: &mut Wiring) -> CliResult<()> {
    let clock = w.module("clock", "clock", &[])?;
    let thirty = w.module("thirty", "const", &[("value", "30")])?;
    let low = w.module("low", "const", &[("value", "10")])?;
    let high = w.module("high", "const", &[("value", "50")])?;
    let minutes = w.module("minutes", "const", &[("value", "1")])?;
    let below = w.module("below", "comparator", &[("hysteresis", "5")])?;
    let window = w.module("window", "between", &[])?;
    let both = w.module("both", "and", &[])?;
    let outside = w.module("outside", "not", &[])?;
    let pick = w.module("pick", "mux", &[])?;
    let log = w.module("log", "console", &[])?;

    w.wire(
        "sec",
        (clock, Some("sec")),
        &[
            (below, Some("in")),
            (window, Some("in")),
            (pick, Some("1")),
            (log, Some("sec")),
        ],
    )?;
    w.wire("min", (clock, Some("min")), &[(pick, Some("2"))])?;
    w.wire("thirty", (thirty, None), &[(below, Some("ref"))])?;
    w.wire("low", (low, None), &[(window, Some("min"))])?;
    w.wire("high", (high, None), &[(window, Some("max"))])?;
    w.wire("select", (minutes, None), &[(pick, Some("select"))])?;
    w.wire(
        "below",
        (below, None),
        &[(both, Some("a")), (log, Some("below 30"))],
    )?;
    w.wire(
        "inside",
        (window, None),
        &[(both, Some("b")), (outside, None), (log, Some("in 10..50"))],
    )?;
    w.wire("both", (both, None), &[(log, Some("both"))])?;
    w.wire("outside", (outside, None), &[(log, Some("outside"))])?;
    w.wire("picked", (pick, None), &[(log, Some("mux"))])
}

fn control(w: &mut Wiring) -> CliResult<()> {
    let sp = w.module("setpoint", "const", &[("value", "50")])?;
    let pv = w.module("measured", "const", &[("value", "42")])?;
    let pi = w.module(
        "pi",
        "pi",
        &[
            ("kp", "0.8"),
            ("ti", "4"),
            ("out-min", "0"),
            ("out-max", "100"),
            ("bias", "20"),
        ],
    )?;
    let valve = w.module("valve", "lag", &[("tau", "2"), ("rate-limit", "10")])?;
    let log = w.module("log", "console", &[])?;
    w.wire("sp", (sp, None), &[(pi, Some("sp"))])?;
    w.wire("pv", (pv, None), &[(pi, Some("pv")), (log, Some("pv"))])?;
    w.wire(
        "command",
        (pi, None),
        &[(valve, None), (log, Some("command"))],
    )?;
    w.wire("position", (valve, None), &[(log, Some("valve"))])
}
