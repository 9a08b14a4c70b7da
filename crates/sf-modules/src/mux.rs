//! Input selector.

use sf_core::Signal;

use crate::descriptor::{ModuleDescriptor, PortLayout};
use crate::error::ModuleFault;
use crate::io::{emit, input};
use crate::module::{ModuleBase, Transform};

pub static MUX: ModuleDescriptor = ModuleDescriptor {
    type_name: "mux",
    summary: "Forward the data input chosen by select",
    inputs: PortLayout::Indexed(&["select"]),
    outputs: PortLayout::Fixed(&["out"]),
};

/// Forwards data input `round(select)`; data inputs are numbered from 1
/// up to [`MAX_NUMBERED_PORTS`](crate::descriptor::MAX_NUMBERED_PORTS).
///
/// An invalid select, or one outside `1..=n`, gives an invalid output.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multiplexer;

impl Multiplexer {
    fn choose(inp: &[Option<Signal>]) -> Result<Signal, ModuleFault> {
        let select = input(inp, 0);
        if !select.is_valid() {
            return Ok(Signal::invalid());
        }
        let data = inp.len().saturating_sub(1);
        let k = select.value()?.round();
        if !(k >= 1.0 && k <= data as f64) {
            return Ok(Signal::invalid());
        }
        Ok(input(inp, k as usize).clone())
    }
}

impl ModuleBase for Multiplexer {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &MUX
    }
}

impl Transform for Multiplexer {
    fn process(
        &mut self,
        inp: &[Option<Signal>],
        out: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault> {
        emit(out, 0, Self::choose(inp)?);
        Ok(())
    }
}
