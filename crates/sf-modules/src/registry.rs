//! Create modules by type name.
//!
//! The recorder is not listed: its history is only reachable through the
//! handle of an instance the host constructs itself.

use crate::console::{CONSOLE, Console};
use crate::controller::{PI, PiControl};
use crate::descriptor::ModuleDescriptor;
use crate::error::{ModuleError, ModuleResult};
use crate::lag::{LAG, Lag};
use crate::logic::{AND, And, BETWEEN, Between, COMPARATOR, Comparator, NOT, Not, OR, Or};
use crate::math::{
    DIV, Div, LINEAR, LinearTransform, NEGATE, Negate, SATURATION, SQRT, SUM, Saturation,
    SquareRoot, Sum,
};
use crate::module::Module;
use crate::mux::{MUX, Multiplexer};
use crate::sources::{CLOCK, CONST, Clock, Const, RANDOM, Random};

static DESCRIPTORS: &[&ModuleDescriptor] = &[
    &CONST,
    &CLOCK,
    &RANDOM,
    &NEGATE,
    &LINEAR,
    &SUM,
    &DIV,
    &SQRT,
    &SATURATION,
    &COMPARATOR,
    &BETWEEN,
    &AND,
    &OR,
    &NOT,
    &MUX,
    &PI,
    &LAG,
    &CONSOLE,
];

/// Descriptors of every registered type, in listing order.
pub fn descriptors() -> &'static [&'static ModuleDescriptor] {
    DESCRIPTORS
}

/// A fresh, default-configured module of the given type.
pub fn create(type_name: &str) -> ModuleResult<Module> {
    let module = match type_name {
        "const" => Module::source(Const::default()),
        "clock" => Module::source(Clock::new()),
        "random" => Module::source(Random::default()),
        "negate" => Module::transform(Negate),
        "linear" => Module::transform(LinearTransform::default()),
        "sum" => Module::transform(Sum::default()),
        "div" => Module::transform(Div),
        "sqrt" => Module::transform(SquareRoot),
        "saturation" => Module::transform(Saturation::default()),
        "comparator" => Module::transform(Comparator::default()),
        "between" => Module::transform(Between),
        "and" => Module::transform(And::default()),
        "or" => Module::transform(Or::default()),
        "not" => Module::transform(Not),
        "mux" => Module::transform(Multiplexer),
        "pi" => Module::transform(PiControl::default()),
        "lag" => Module::transform(Lag::default()),
        "console" => Module::sink(Console::new()),
        other => return Err(ModuleError::UnknownType(other.to_string())),
    };
    Ok(module)
}
