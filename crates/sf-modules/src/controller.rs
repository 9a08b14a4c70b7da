//! Sampled PI controller in velocity form.
//!
//! Each step computes an output increment from the change in error and the
//! error itself, then clamps the accumulated output. Since only the clamped
//! output is carried between steps, the controller cannot wind up while
//! saturated.

use std::time::Instant;

use sf_core::Signal;

use crate::descriptor::{
    ModuleDescriptor, PortLayout, PropertySpec, apply_property, parse_f64,
};
use crate::error::{ModuleError, ModuleFault, ModuleResult};
use crate::io::{emit, input};
use crate::module::{ModuleBase, PrepareContext, Transform};

pub static PI: ModuleDescriptor = ModuleDescriptor {
    type_name: "pi",
    summary: "Velocity-form PI controller",
    inputs: PortLayout::Fixed(&["pv", "sp"]),
    outputs: PortLayout::Fixed(&["out"]),
};

/// Controller tuning and output range.
///
/// `u[k] = clamp(u[k-1] + kp * ((e[k] - e[k-1]) + e[k] * dt / ti))`
/// with `e = sp - pv`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiController {
    pub kp: f64,
    /// Integral time (seconds).
    pub ti: f64,
    pub out_min: f64,
    pub out_max: f64,
    /// Output before the first step.
    pub bias: f64,
}

/// What the controller remembers between steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PiState {
    pub output: f64,
    pub error: f64,
}

impl PiController {
    pub fn new(kp: f64, ti: f64, out_min: f64, out_max: f64) -> ModuleResult<Self> {
        let pi = Self {
            kp,
            ti,
            out_min,
            out_max,
            bias: 0.0,
        };
        pi.check()?;
        Ok(pi)
    }

    fn check(&self) -> ModuleResult<()> {
        if !(self.ti > 0.0) {
            return Err(ModuleError::InvalidArg {
                what: "ti must be positive",
            });
        }
        if !(self.out_min < self.out_max) {
            return Err(ModuleError::InvalidArg {
                what: "out-min must be below out-max",
            });
        }
        if !self.bias.is_finite() {
            return Err(ModuleError::InvalidArg {
                what: "bias must be finite",
            });
        }
        Ok(())
    }

    /// State before the first step: the bias, clamped, and no error.
    pub fn initial(&self) -> PiState {
        PiState {
            output: self.bias.clamp(self.out_min, self.out_max),
            error: 0.0,
        }
    }

    pub fn step(&self, state: PiState, error: f64, dt: f64) -> PiState {
        let delta = self.kp * ((error - state.error) + error * dt / self.ti);
        PiState {
            output: (state.output + delta).clamp(self.out_min, self.out_max),
            error,
        }
    }
}

impl Default for PiController {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ti: 1.0,
            out_min: f64::NEG_INFINITY,
            out_max: f64::INFINITY,
            bias: 0.0,
        }
    }
}

/// `pi` module.
///
/// `dt` is the nominal cycle period, or the time since the previous scan
/// when scans run back to back (zero on the first scan).
#[derive(Debug, Clone, Default)]
pub struct PiControl {
    pub controller: PiController,
    state: PiState,
    fixed_dt: Option<f64>,
    last_run: Option<Instant>,
}

impl PiControl {
    const PROPERTIES: &'static [PropertySpec<Self>] = &[
        PropertySpec {
            key: "kp",
            apply: |m, v| {
                m.controller.kp = parse_f64("kp", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "ti",
            apply: |m, v| {
                m.controller.ti = parse_f64("ti", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "out-min",
            apply: |m, v| {
                m.controller.out_min = parse_f64("out-min", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "out-max",
            apply: |m, v| {
                m.controller.out_max = parse_f64("out-max", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "bias",
            apply: |m, v| {
                m.controller.bias = parse_f64("bias", v)?;
                Ok(())
            },
        },
    ];

    pub fn new(controller: PiController) -> Self {
        Self {
            controller,
            ..Self::default()
        }
    }

    pub fn state(&self) -> PiState {
        self.state
    }

    fn dt(&mut self) -> f64 {
        let now = Instant::now();
        let since = self.last_run.replace(now);
        match (self.fixed_dt, since) {
            (Some(dt), _) => dt,
            (None, Some(t)) => now.duration_since(t).as_secs_f64(),
            (None, None) => 0.0,
        }
    }
}

impl ModuleBase for PiControl {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &PI
    }

    fn set_property(&mut self, key: &str, value: &str) -> ModuleResult<()> {
        apply_property(self, Self::PROPERTIES, PI.type_name, key, value)
    }

    fn prepare(&mut self, ctx: &PrepareContext) -> ModuleResult<()> {
        self.controller.check()?;
        self.fixed_dt = (!ctx.cycle_period.is_zero()).then(|| ctx.cycle_period.as_secs_f64());
        self.state = self.controller.initial();
        self.last_run = None;
        Ok(())
    }
}

impl Transform for PiControl {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let dt = self.dt();
        let (pv, sp) = (input(inp, 0), input(inp, 1));
        if !(pv.is_valid() && sp.is_valid()) {
            return Ok(());
        }
        self.state = self.controller.step(self.state, sp.value()? - pv.value()?, dt);
        emit(out, 0, self.state.output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_step_has_proportional_kick() {
        let pi = PiController::new(2.0, 1.0, -10.0, 10.0).unwrap();
        let s = pi.step(pi.initial(), 1.0, 0.1);
        // 2 * (1 + 0.1)
        assert!(close(s.output, 2.2));
        assert_eq!(s.error, 1.0);
    }

    #[test]
    fn constant_error_ramps_output() {
        let pi = PiController::new(1.0, 1.0, -10.0, 10.0).unwrap();
        let mut s = pi.initial();
        for _ in 0..10 {
            s = pi.step(s, 1.0, 0.1);
        }
        // kick of 1 plus ten increments of 0.1
        assert!(close(s.output, 2.0));
    }

    #[test]
    fn saturated_output_recovers_at_once() {
        let pi = PiController::new(1.0, 1.0, -100.0, 1.0).unwrap();
        let mut s = pi.initial();
        for _ in 0..50 {
            s = pi.step(s, 10.0, 1.0);
        }
        assert_eq!(s.output, 1.0);
        // first step with a negative error already leaves the limit
        s = pi.step(s, -0.5, 1.0);
        assert!(s.output < 1.0);
    }

    #[test]
    fn bias_is_the_starting_output() {
        let mut pi = PiController::new(1.0, 1.0, 0.0, 100.0).unwrap();
        pi.bias = 40.0;
        assert_eq!(pi.initial().output, 40.0);
        assert!(close(pi.step(pi.initial(), 0.0, 0.1).output, 40.0));

        pi.bias = 500.0;
        assert_eq!(pi.initial().output, 100.0);
    }

    #[test]
    fn invalid_parameters() {
        assert!(PiController::new(1.0, -1.0, 0.0, 1.0).is_err());
        assert!(PiController::new(1.0, 1.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn module_uses_cycle_period_as_step() {
        let mut m = PiControl::default();
        m.set_property("kp", "1").unwrap();
        m.set_property("ti", "0.5").unwrap();
        m.prepare(&PrepareContext {
            cycle_period: Duration::from_millis(100),
        })
        .unwrap();

        let mut out = vec![None];
        let inputs = vec![Some(Signal::scalar(0.0)), Some(Signal::scalar(1.0))];
        m.process(&inputs, &mut out).unwrap();

        // 1 * (1 + 1 * 0.1 / 0.5)
        let v = out[0].as_ref().unwrap().value().unwrap();
        assert!(close(v, 1.2));
        assert_eq!(m.state().error, 1.0);
    }

    #[test]
    fn prepare_rejects_bad_configuration() {
        let mut m = PiControl::default();
        m.set_property("ti", "0").unwrap();
        assert!(matches!(
            m.prepare(&PrepareContext::default()),
            Err(ModuleError::InvalidArg { .. })
        ));
    }

    #[test]
    fn invalid_input_leaves_output_unset() {
        let mut m = PiControl::default();
        m.prepare(&PrepareContext::default()).unwrap();
        let mut out = vec![None];
        m.process(&[None, Some(Signal::scalar(1.0))], &mut out).unwrap();
        assert_eq!(out, vec![None]);
    }
}
