//! Boolean logic and comparison.
//!
//! Logic follows three-valued semantics: a decisive valid input settles
//! the result, otherwise any invalid input makes the output invalid.

use sf_core::Signal;

use crate::descriptor::{
    ModuleDescriptor, PortCounter, PortLayout, PropertySpec, apply_property, parse_f64,
};
use crate::error::{ModuleFault, ModuleResult};
use crate::io::{emit, input, validity_mask, value_or_nan};
use crate::module::{ModuleBase, Transform};

pub static AND: ModuleDescriptor = ModuleDescriptor {
    type_name: "and",
    summary: "Logical conjunction of all inputs",
    inputs: PortLayout::Variadic,
    outputs: PortLayout::Fixed(&["out"]),
};

pub static OR: ModuleDescriptor = ModuleDescriptor {
    type_name: "or",
    summary: "Logical disjunction of all inputs",
    inputs: PortLayout::Variadic,
    outputs: PortLayout::Fixed(&["out"]),
};

pub static NOT: ModuleDescriptor = ModuleDescriptor {
    type_name: "not",
    summary: "Logical negation",
    inputs: PortLayout::Fixed(&["in"]),
    outputs: PortLayout::Fixed(&["out"]),
};

pub static COMPARATOR: ModuleDescriptor = ModuleDescriptor {
    type_name: "comparator",
    summary: "ref - in against a hysteresis band",
    inputs: PortLayout::Fixed(&["in", "ref"]),
    outputs: PortLayout::Fixed(&["out"]),
};

pub static BETWEEN: ModuleDescriptor = ModuleDescriptor {
    type_name: "between",
    summary: "Whether in lies within [min, max]",
    inputs: PortLayout::Fixed(&["min", "max", "in"]),
    outputs: PortLayout::Fixed(&["out"]),
};

/// Shared body of `and` / `or`: `decisive` is the input value that settles
/// the result on its own.
fn three_valued(inp: &[Option<Signal>], decisive: bool) -> Result<Signal, ModuleFault> {
    let mut all_valid = true;
    for i in 0..inp.len() {
        let s = input(inp, i);
        if !s.is_valid() {
            all_valid = false;
        } else if s.as_bool()? == decisive {
            return Ok(Signal::boolean(decisive));
        }
    }
    Ok(if all_valid {
        Signal::boolean(!decisive)
    } else {
        Signal::invalid()
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct And {
    inputs: PortCounter,
}

impl ModuleBase for And {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &AND
    }

    fn input_index(&mut self, _key: Option<&str>) -> ModuleResult<u32> {
        Ok(self.inputs.next())
    }
}

impl Transform for And {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        emit(out, 0, three_valued(inp, false)?);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Or {
    inputs: PortCounter,
}

impl ModuleBase for Or {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &OR
    }

    fn input_index(&mut self, _key: Option<&str>) -> ModuleResult<u32> {
        Ok(self.inputs.next())
    }
}

impl Transform for Or {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        emit(out, 0, three_valued(inp, true)?);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Not;

impl ModuleBase for Not {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &NOT
    }
}

impl Transform for Not {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let x = input(inp, 0);
        let result = if x.is_valid() {
            Signal::boolean(!x.as_bool()?)
        } else {
            Signal::invalid()
        };
        emit(out, 0, result);
        Ok(())
    }
}

/// Two-position comparator with hysteresis.
///
/// With `d = ref - in`: true once `d >= hysteresis`, false once
/// `d <= -hysteresis`, unchanged in between.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Comparator {
    pub hysteresis: f64,
    state: bool,
}

impl Comparator {
    const PROPERTIES: &'static [PropertySpec<Self>] = &[PropertySpec {
        key: "hysteresis",
        apply: |m, v| {
            m.hysteresis = parse_f64("hysteresis", v)?;
            Ok(())
        },
    }];

    pub fn new(hysteresis: f64) -> Self {
        Self {
            hysteresis,
            state: false,
        }
    }
}

impl ModuleBase for Comparator {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &COMPARATOR
    }

    fn set_property(&mut self, key: &str, value: &str) -> ModuleResult<()> {
        apply_property(self, Self::PROPERTIES, COMPARATOR.type_name, key, value)
    }
}

impl Transform for Comparator {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let (x, r) = (input(inp, 0), input(inp, 1));
        if !(x.is_valid() && r.is_valid()) {
            emit(out, 0, Signal::invalid());
            return Ok(());
        }
        let diff = r.value()? - x.value()?;
        if diff >= self.hysteresis {
            self.state = true;
        } else if diff <= -self.hysteresis {
            self.state = false;
        }
        emit(out, 0, self.state);
        Ok(())
    }
}

/// Range check that still answers when only one limit is known: with just
/// `min` a value below it is definitely out of range, likewise above a lone
/// `max`; otherwise unknown. The mask has `min` in bit 0 and `in` in bit 2.
#[derive(Debug, Clone, Copy, Default)]
pub struct Between;

impl ModuleBase for Between {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &BETWEEN
    }
}

impl Transform for Between {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        let min = value_or_nan(inp, 0);
        let max = value_or_nan(inp, 1);
        let x = value_or_nan(inp, 2);
        let result = match validity_mask(inp) & 0b111 {
            0b101 if x < min => Signal::boolean(false),
            0b110 if x > max => Signal::boolean(false),
            0b111 => Signal::boolean(x >= min && x <= max),
            _ => Signal::invalid(),
        };
        emit(out, 0, result);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(v: bool) -> Option<Signal> {
        Some(Signal::boolean(v))
    }

    fn x(v: f64) -> Option<Signal> {
        Some(Signal::scalar(v))
    }

    fn eval(m: &mut dyn Transform, inputs: &[Option<Signal>]) -> Signal {
        let mut out = vec![None];
        m.process(inputs, &mut out).unwrap();
        out.remove(0).unwrap_or_default()
    }

    #[test]
    fn and_truth_table() {
        let mut m = And::default();
        assert_eq!(eval(&mut m, &[b(true), b(true)]), Signal::boolean(true));
        assert_eq!(eval(&mut m, &[b(true), b(false)]), Signal::boolean(false));
        assert_eq!(eval(&mut m, &[None, b(false)]), Signal::boolean(false));
        assert_eq!(eval(&mut m, &[None, b(true)]), Signal::invalid());
        assert_eq!(eval(&mut m, &[x(0.7), x(0.9)]), Signal::boolean(true));
    }

    #[test]
    fn or_truth_table() {
        let mut m = Or::default();
        assert_eq!(eval(&mut m, &[b(false), b(false)]), Signal::boolean(false));
        assert_eq!(eval(&mut m, &[None, b(true)]), Signal::boolean(true));
        assert_eq!(eval(&mut m, &[None, b(false)]), Signal::invalid());
    }

    #[test]
    fn not_negates_and_propagates_invalid() {
        assert_eq!(eval(&mut Not, &[b(true)]), Signal::boolean(false));
        assert_eq!(eval(&mut Not, &[x(0.2)]), Signal::boolean(true));
        assert_eq!(eval(&mut Not, &[None]), Signal::invalid());
    }

    #[test]
    fn comparator_holds_inside_band() {
        let mut m = Comparator::default();
        m.set_property("hysteresis", "1").unwrap();

        // in = 0, ref = 2: diff 2 >= 1
        assert_eq!(eval(&mut m, &[x(0.0), x(2.0)]), Signal::boolean(true));
        // diff 0.5 inside band keeps true
        assert_eq!(eval(&mut m, &[x(1.5), x(2.0)]), Signal::boolean(true));
        // diff -1 switches off
        assert_eq!(eval(&mut m, &[x(3.0), x(2.0)]), Signal::boolean(false));
        // diff 0.5 inside band keeps false
        assert_eq!(eval(&mut m, &[x(1.5), x(2.0)]), Signal::boolean(false));
        assert_eq!(eval(&mut m, &[None, x(2.0)]), Signal::invalid());
    }

    #[test]
    fn between_with_both_limits() {
        assert_eq!(eval(&mut Between, &[x(0.0), x(10.0), x(5.0)]), Signal::boolean(true));
        assert_eq!(eval(&mut Between, &[x(0.0), x(10.0), x(10.0)]), Signal::boolean(true));
        assert_eq!(eval(&mut Between, &[x(0.0), x(10.0), x(11.0)]), Signal::boolean(false));
    }

    #[test]
    fn between_with_one_limit() {
        assert_eq!(eval(&mut Between, &[x(0.0), None, x(-1.0)]), Signal::boolean(false));
        assert_eq!(eval(&mut Between, &[x(0.0), None, x(1.0)]), Signal::invalid());
        assert_eq!(eval(&mut Between, &[None, x(10.0), x(11.0)]), Signal::boolean(false));
        assert_eq!(eval(&mut Between, &[None, x(10.0), x(9.0)]), Signal::invalid());
        assert_eq!(eval(&mut Between, &[x(0.0), x(10.0), None]), Signal::invalid());
    }
}
