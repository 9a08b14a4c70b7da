//! Arithmetic transforms.

use sf_core::Signal;

use crate::descriptor::{
    ModuleDescriptor, PortCounter, PortLayout, PropertySpec, apply_property, parse_f64,
};
use crate::error::{ModuleFault, ModuleResult};
use crate::io::{all_valid, emit, input, value_or_nan};
use crate::module::{ModuleBase, Transform};

pub static NEGATE: ModuleDescriptor = ModuleDescriptor {
    type_name: "negate",
    summary: "Sign inversion",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out"]),
};

pub static LINEAR: ModuleDescriptor = ModuleDescriptor {
    type_name: "linear",
    summary: "out = in * mul + add",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out"]),
};

pub static SUM: ModuleDescriptor = ModuleDescriptor {
    type_name: "sum",
    summary: "Sum of all inputs",
    inputs: PortLayout::Variadic,
    outputs: PortLayout::Fixed(&["out"]),
};

pub static DIV: ModuleDescriptor = ModuleDescriptor {
    type_name: "div",
    summary: "Quotient, NaN when an operand is missing",
    inputs: PortLayout::Fixed(&["divident", "divisor"]),
    outputs: PortLayout::Fixed(&["out"]),
};

pub static SQRT: ModuleDescriptor = ModuleDescriptor {
    type_name: "sqrt",
    summary: "Square root, NaN when the operand is missing",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out"]),
};

pub static SATURATION: ModuleDescriptor = ModuleDescriptor {
    type_name: "saturation",
    summary: "Clamp to limits and flag which limit was hit",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out", "min", "max"]),
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Negate;

impl ModuleBase for Negate {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &NEGATE
    }
}

impl Transform for Negate {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let x = input(inp, 0);
        if x.is_valid() {
            emit(out, 0, -x.value()?);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    pub mul: f64,
    pub add: f64,
}

impl Default for LinearTransform {
    fn default() -> Self {
        Self { mul: 1.0, add: 0.0 }
    }
}

impl LinearTransform {
    const PROPERTIES: &'static [PropertySpec<Self>] = &[
        PropertySpec {
            key: "mul",
            apply: |m, v| {
                m.mul = parse_f64("mul", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "add",
            apply: |m, v| {
                m.add = parse_f64("add", v)?;
                Ok(())
            },
        },
    ];
}

impl ModuleBase for LinearTransform {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &LINEAR
    }

    fn set_property(&mut self, key: &str, value: &str) -> ModuleResult<()> {
        apply_property(self, Self::PROPERTIES, LINEAR.type_name, key, value)
    }
}

impl Transform for LinearTransform {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let x = input(inp, 0);
        if x.is_valid() {
            emit(out, 0, x.value()? * self.mul + self.add);
        } else {
            emit(out, 0, Signal::invalid());
        }
        Ok(())
    }
}

/// Sum of any number of inputs; the output stays invalid unless every
/// input is valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sum {
    inputs: PortCounter,
}

impl ModuleBase for Sum {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &SUM
    }

    fn input_index(&mut self, _key: Option<&str>) -> ModuleResult<u32> {
        Ok(self.inputs.next())
    }
}

impl Transform for Sum {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        if all_valid(inp) {
            let mut sum = 0.0;
            for i in 0..inp.len() {
                sum += input(inp, i).value()?;
            }
            emit(out, 0, sum);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Div;

impl ModuleBase for Div {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &DIV
    }
}

impl Transform for Div {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        emit(out, 0, value_or_nan(inp, 0) / value_or_nan(inp, 1));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SquareRoot;

impl ModuleBase for SquareRoot {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &SQRT
    }
}

impl Transform for SquareRoot {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        emit(out, 0, value_or_nan(inp, 0).sqrt());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Saturation {
    pub min_limit: f64,
    pub max_limit: f64,
}

impl Default for Saturation {
    fn default() -> Self {
        Self {
            min_limit: f64::NEG_INFINITY,
            max_limit: f64::INFINITY,
        }
    }
}

impl Saturation {
    const PROPERTIES: &'static [PropertySpec<Self>] = &[
        PropertySpec {
            key: "min-limit",
            apply: |m, v| {
                m.min_limit = parse_f64("min-limit", v)?;
                Ok(())
            },
        },
        PropertySpec {
            key: "max-limit",
            apply: |m, v| {
                m.max_limit = parse_f64("max-limit", v)?;
                Ok(())
            },
        },
    ];
}

impl ModuleBase for Saturation {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &SATURATION
    }

    fn set_property(&mut self, key: &str, value: &str) -> ModuleResult<()> {
        apply_property(self, Self::PROPERTIES, SATURATION.type_name, key, value)
    }
}

impl Transform for Saturation {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let x = input(inp, 0);
        if !x.is_valid() {
            for i in 0..3 {
                emit(out, i, Signal::invalid());
            }
            return Ok(());
        }
        let v = x.value()?;
        let clamped = if v > self.max_limit {
            self.max_limit
        } else if v < self.min_limit {
            self.min_limit
        } else {
            v
        };
        emit(out, 0, clamped);
        emit(out, 1, v < self.min_limit);
        emit(out, 2, v > self.max_limit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(m: &mut dyn Transform, inputs: Vec<Option<Signal>>, outputs: usize) -> Vec<Option<Signal>> {
        let mut out = vec![None; outputs];
        m.process(&inputs, &mut out).unwrap();
        out
    }

    #[test]
    fn negate_flips_sign_and_skips_invalid() {
        assert_eq!(
            run(&mut Negate, vec![Some(Signal::scalar(5.0))], 1),
            vec![Some(Signal::scalar(-5.0))]
        );
        assert_eq!(run(&mut Negate, vec![None], 1), vec![None]);
    }

    #[test]
    fn linear_applies_gain_and_offset() {
        let mut m = LinearTransform::default();
        m.set_property("mul", "2").unwrap();
        m.set_property("add", "-1").unwrap();
        assert_eq!(
            run(&mut m, vec![Some(Signal::scalar(3.0))], 1),
            vec![Some(Signal::scalar(5.0))]
        );
        assert_eq!(
            run(&mut m, vec![Some(Signal::invalid())], 1),
            vec![Some(Signal::invalid())]
        );
    }

    #[test]
    fn sum_allocates_inputs_and_requires_all_valid() {
        let mut m = Sum::default();
        assert_eq!(m.input_index(Some("a")).unwrap(), 0);
        assert_eq!(m.input_index(Some("a")).unwrap(), 1);
        assert_eq!(m.input_index(None).unwrap(), 2);

        let all = vec![
            Some(Signal::scalar(1.0)),
            Some(Signal::boolean(true)),
            Some(Signal::scalar(2.5)),
        ];
        assert_eq!(run(&mut m, all, 1), vec![Some(Signal::scalar(4.5))]);

        let partial = vec![Some(Signal::scalar(1.0)), None];
        assert_eq!(run(&mut m, partial, 1), vec![None]);
    }

    #[test]
    fn div_and_sqrt_use_nan_for_missing_operands() {
        let out = run(
            &mut Div,
            vec![Some(Signal::scalar(6.0)), Some(Signal::scalar(3.0))],
            1,
        );
        assert_eq!(out, vec![Some(Signal::scalar(2.0))]);

        let out = run(&mut Div, vec![Some(Signal::scalar(6.0)), None], 1);
        assert!(out[0].as_ref().unwrap().value().unwrap().is_nan());

        let out = run(&mut SquareRoot, vec![Some(Signal::scalar(9.0))], 1);
        assert_eq!(out, vec![Some(Signal::scalar(3.0))]);
    }

    #[test]
    fn saturation_clamps_and_flags() {
        let mut m = Saturation::default();
        m.set_property("min-limit", "0").unwrap();
        m.set_property("max-limit", "10").unwrap();

        let out = run(&mut m, vec![Some(Signal::scalar(12.0))], 3);
        assert_eq!(
            out,
            vec![
                Some(Signal::scalar(10.0)),
                Some(Signal::boolean(false)),
                Some(Signal::boolean(true)),
            ]
        );

        let out = run(&mut m, vec![Some(Signal::scalar(-1.0))], 3);
        assert_eq!(out[0], Some(Signal::scalar(0.0)));
        assert_eq!(out[1], Some(Signal::boolean(true)));

        let out = run(&mut m, vec![None], 3);
        assert!(out.iter().all(|s| s == &Some(Signal::invalid())));
    }

    #[test]
    fn saturation_defaults_pass_through() {
        let out = run(&mut Saturation::default(), vec![Some(Signal::scalar(1e300))], 1);
        assert_eq!(out, vec![Some(Signal::scalar(1e300))]);
    }
}
