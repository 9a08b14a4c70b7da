//! Recorder sink: keeps every scan's inputs for the host to inspect.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sf_core::Signal;

use crate::descriptor::{ModuleDescriptor, PortCounter, PortLayout};
use crate::error::{ModuleFault, ModuleResult};
use crate::io::input;
use crate::module::{ModuleBase, Sink};

pub static RECORDER: ModuleDescriptor = ModuleDescriptor {
    type_name: "recorder",
    summary: "Append every scan's inputs to a shared history",
    inputs: PortLayout::Variadic,
    outputs: PortLayout::Empty,
};

type History = Arc<Mutex<Vec<Vec<Signal>>>>;

/// Read side of a [`Recorder`], usable from any thread.
#[derive(Debug, Clone, Default)]
pub struct RecorderHandle {
    history: History,
}

impl RecorderHandle {
    fn lock(&self) -> MutexGuard<'_, Vec<Vec<Signal>>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All recorded scans, oldest first. Absent inputs are recorded as
    /// invalid signals.
    pub fn scans(&self) -> Vec<Vec<Signal>> {
        self.lock().clone()
    }

    pub fn last(&self) -> Option<Vec<Signal>> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    inputs: PortCounter,
    handle: RecorderHandle,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> RecorderHandle {
        self.handle.clone()
    }
}

impl ModuleBase for Recorder {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &RECORDER
    }

    fn input_index(&mut self, _key: Option<&str>) -> ModuleResult<u32> {
        Ok(self.inputs.next())
    }
}

impl Sink for Recorder {
    fn consume(&mut self, inp: &[Option<Signal>]) -> Result<(), ModuleFault> {
        let row = (0..inp.len()).map(|i| input(inp, i).clone()).collect();
        self.handle.lock().push(row);
        Ok(())
    }
}
