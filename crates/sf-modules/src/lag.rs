//! First-order lag with a slew limit.

use std::time::Instant;

use sf_core::Signal;

use crate::descriptor::{ModuleDescriptor, PortLayout, PropertySpec, apply_property, parse_f64};
use crate::error::{ModuleError, ModuleFault, ModuleResult};
use crate::io::{emit, input};
use crate::module::{ModuleBase, PrepareContext, Transform};

pub static LAG: ModuleDescriptor = ModuleDescriptor {
    type_name: "lag",
    summary: "First-order lag with slew limit",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out"]),
};

/// Exact zero-order-hold step of `tau * dy/dt = u - y`; the move per step
/// is then capped at `slew * dt`.
///
/// The unlimited step moves `y` a fraction `1 - exp(-dt / tau)` of the way
/// to `u`, so it never overshoots whatever `dt` is.
///
/// ```
/// use sf_modules::lag::LagFilter;
///
/// let lag = LagFilter::new(0.2, 5.0).unwrap();
/// let mut y = 0.0;
/// for _ in 0..100 {
///     y = lag.advance(y, 1.0, 0.01);
/// }
/// assert!(y > 0.9 && y < 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LagFilter {
    /// Time constant (seconds).
    pub tau: f64,
    /// Largest change per second.
    pub slew: f64,
}

impl LagFilter {
    pub fn new(tau: f64, slew: f64) -> ModuleResult<Self> {
        let f = Self { tau, slew };
        f.check()?;
        Ok(f)
    }

    fn check(&self) -> ModuleResult<()> {
        if !(self.tau > 0.0) {
            return Err(ModuleError::InvalidArg {
                what: "tau must be positive",
            });
        }
        if !(self.slew > 0.0) {
            return Err(ModuleError::InvalidArg {
                what: "rate-limit must be positive",
            });
        }
        Ok(())
    }

    /// Output after holding input `u` for `dt` seconds from `y`.
    pub fn advance(&self, y: f64, u: f64, dt: f64) -> f64 {
        if !(dt > 0.0) {
            return y;
        }
        let reach = -(-dt / self.tau).exp_m1();
        let limit = self.slew * dt;
        y + ((u - y) * reach).clamp(-limit, limit)
    }
}

impl Default for LagFilter {
    fn default() -> Self {
        Self {
            tau: 1.0,
            slew: f64::INFINITY,
        }
    }
}

/// `lag` module. Holds its last output while the input is invalid.
#[derive(Debug, Clone, Default)]
pub struct Lag {
    pub filter: LagFilter,
    /// Output before the first scan.
    pub initial: f64,
    output: f64,
    fixed_dt: Option<f64>,
    last_run: Option<Instant>,
}

impl Lag {
    const PROPERTIES: &'static [PropertySpec<Self>] = &[
        PropertySpec {
            key: "tau",
            apply: |m, v| {
                m.filter.tau = parse_f64("tau", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "rate-limit",
            apply: |m, v| {
                m.filter.slew = parse_f64("rate-limit", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "initial",
            apply: |m, v| {
                m.initial = parse_f64("initial", v)?;
                Ok(())
            },
        },
    ];

    pub fn output(&self) -> f64 {
        self.output
    }
}

impl ModuleBase for Lag {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &LAG
    }

    fn set_property(&mut self, key: &str, value: &str) -> ModuleResult<()> {
        apply_property(self, Self::PROPERTIES, LAG.type_name, key, value)
    }

    fn prepare(&mut self, ctx: &PrepareContext) -> ModuleResult<()> {
        self.filter.check()?;
        self.fixed_dt = (!ctx.cycle_period.is_zero()).then(|| ctx.cycle_period.as_secs_f64());
        self.output = self.initial;
        self.last_run = None;
        Ok(())
    }
}

impl Transform for Lag {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let now = Instant::now();
        let since = self.last_run.replace(now);
        let dt = self
            .fixed_dt
            .or_else(|| since.map(|t| now.duration_since(t).as_secs_f64()))
            .unwrap_or(0.0);

        let u = input(inp, 0);
        if u.is_valid() {
            self.output = self.filter.advance(self.output, u.value()?, dt);
        }
        emit(out, 0, self.output);
        Ok(())
    }
}
