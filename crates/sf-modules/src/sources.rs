//! Signal sources: constants, the wall clock and uniform noise.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Datelike, Local, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sf_core::Signal;

use crate::descriptor::{ModuleDescriptor, PortLayout, PropertySpec, apply_property, parse_f64};
use crate::error::{ModuleError, ModuleFault, ModuleResult};
use crate::io::emit;
use crate::module::{ModuleBase, PrepareContext, Source};

pub static CONST: ModuleDescriptor = ModuleDescriptor {
    type_name: "const",
    summary: "Constant scalar source",
    inputs: PortLayout::Empty,
    outputs: PortLayout::Fixed(&["out"]),
};

pub static CLOCK: ModuleDescriptor = ModuleDescriptor {
    type_name: "clock",
    summary: "Local wall-clock fields",
    inputs: PortLayout::Empty,
    outputs: PortLayout::Fixed(&["sec", "min", "hour", "day", "month", "year"]),
};

pub static RANDOM: ModuleDescriptor = ModuleDescriptor {
    type_name: "random",
    summary: "Uniform random scalar in [min, max)",
    inputs: PortLayout::Empty,
    outputs: PortLayout::Fixed(&["out"]),
};

/// Emits the same scalar every scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Const {
    pub value: f64,
}

impl Const {
    const PROPERTIES: &'static [PropertySpec<Self>] = &[PropertySpec {
        key: "value",
        apply: |m, v| {
            m.value = parse_f64("value", v)?;
            Ok(())
        },
    }];

    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl ModuleBase for Const {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &CONST
    }

    fn set_property(&mut self, key: &str, value: &str) -> ModuleResult<()> {
        apply_property(self, Self::PROPERTIES, CONST.type_name, key, value)
    }
}

impl Source for Const {
    fn produce(&mut self, output: &mut [Option<Signal>]) -> Result<(), ModuleFault> {
        emit(output, 0, self.value);
        Ok(())
    }
}

/// Emits second, minute, hour, day of month, month (1-12) and year of the
/// local time at the moment the module runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock;

impl Clock {
    pub fn new() -> Self {
        Self
    }

    /// Output values for a given point in time, in port order.
    pub fn fields<T: Datelike + Timelike>(t: &T) -> [f64; 6] {
        [
            t.second() as f64,
            t.minute() as f64,
            t.hour() as f64,
            t.day() as f64,
            t.month() as f64,
            t.year() as f64,
        ]
    }
}

impl ModuleBase for Clock {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &CLOCK
    }
}

impl Source for Clock {
    fn produce(&mut self, output: &mut [Option<Signal>]) -> Result<(), ModuleFault> {
        for (i, v) in Self::fields(&Local::now()).into_iter().enumerate() {
            emit(output, i, v);
        }
        Ok(())
    }
}

/// Emits a fresh uniform sample in `[min, max)` every scan.
///
/// With a `seed` the sequence restarts identically on every `prepare`;
/// without one the generator is seeded from the system clock.
pub struct Random {
    pub min: f64,
    pub max: f64,
    pub seed: Option<u64>,
    rng: StdRng,
}

impl Random {
    const PROPERTIES: &'static [PropertySpec<Self>] = &[
        PropertySpec {
            key: "min",
            apply: |m, v| {
                m.min = parse_f64("min", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "max",
            apply: |m, v| {
                m.max = parse_f64("max", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "seed",
            apply: |m, v| {
                let seed = v.trim().parse::<u64>().map_err(|_| {
                    ModuleError::InvalidPropertyValue {
                        key: "seed".to_string(),
                        value: v.to_string(),
                        what: "expected an unsigned integer",
                    }
                })?;
                m.seed = Some(seed);
                Ok(())
            },
        },
    ];

    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            seed: None,
            rng: StdRng::seed_from_u64(clock_seed()),
        }
    }

    pub fn seeded(min: f64, max: f64, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            rng: StdRng::seed_from_u64(seed),
            ..Self::new(min, max)
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

impl ModuleBase for Random {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &RANDOM
    }

    fn set_property(&mut self, key: &str, value: &str) -> ModuleResult<()> {
        apply_property(self, Self::PROPERTIES, RANDOM.type_name, key, value)
    }

    fn prepare(&mut self, _ctx: &PrepareContext) -> ModuleResult<()> {
        if !(self.min.is_finite() && self.max.is_finite() && self.min < self.max) {
            return Err(ModuleError::InvalidArg {
                what: "random needs finite min < max",
            });
        }
        self.rng = StdRng::seed_from_u64(self.seed.unwrap_or_else(clock_seed));
        Ok(())
    }
}

impl Source for Random {
    fn produce(&mut self, output: &mut [Option<Signal>]) -> Result<(), ModuleFault> {
        let u: f64 = self.rng.r#gen();
        emit(output, 0, self.min + (self.max - self.min) * u);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn const_emits_configured_value() {
        let mut c = Const::default();
        c.set_property("value", "5").unwrap();
        let mut out = vec![None];
        c.produce(&mut out).unwrap();
        assert_eq!(out[0], Some(Signal::scalar(5.0)));
    }

    #[test]
    fn const_rejects_unknown_property() {
        assert!(Const::new(1.0).set_property("gain", "2").is_err());
    }

    #[test]
    fn clock_fields_are_calendar_values() {
        let t = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(17, 45, 12)
            .unwrap();
        assert_eq!(
            Clock::fields(&t),
            [12.0, 45.0, 17.0, 9.0, 3.0, 2024.0]
        );
    }

    #[test]
    fn clock_fills_only_connected_outputs() {
        let mut out = vec![None; 2];
        Clock::new().produce(&mut out).unwrap();
        assert!(out.iter().all(|s| s.as_ref().is_some_and(Signal::is_valid)));
    }

    fn samples(r: &mut Random, n: usize) -> Vec<f64> {
        let mut out = vec![None];
        (0..n)
            .map(|_| {
                r.produce(&mut out).unwrap();
                out[0].as_ref().unwrap().value().unwrap()
            })
            .collect()
    }

    #[test]
    fn random_stays_in_range() {
        let mut r = Random::default();
        r.set_property("min", "-2").unwrap();
        r.set_property("max", "3").unwrap();
        r.prepare(&PrepareContext::default()).unwrap();
        assert!(samples(&mut r, 200).iter().all(|v| (-2.0..3.0).contains(v)));
    }

    #[test]
    fn seed_makes_the_sequence_repeatable() {
        let mut a = Random::default();
        a.set_property("seed", "42").unwrap();
        a.prepare(&PrepareContext::default()).unwrap();
        let first = samples(&mut a, 5);

        a.prepare(&PrepareContext::default()).unwrap();
        assert_eq!(samples(&mut a, 5), first);
        assert_eq!(samples(&mut Random::seeded(0.0, 1.0, 42), 5), first);
        assert!(first.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn random_rejects_bad_configuration() {
        let mut r = Random::new(1.0, 1.0);
        assert!(matches!(
            r.prepare(&PrepareContext::default()),
            Err(ModuleError::InvalidArg { .. })
        ));
        assert!(matches!(
            r.set_property("seed", "-1"),
            Err(ModuleError::InvalidPropertyValue { .. })
        ));
    }
}
