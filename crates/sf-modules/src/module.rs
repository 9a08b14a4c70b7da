//! The module contract and the closed set of capability variants.

use std::fmt;
use std::time::Duration;

use sf_core::Signal;

use crate::descriptor::ModuleDescriptor;
use crate::error::{Direction, ModuleError, ModuleFault, ModuleResult};
use crate::listener::ScanListener;

/// Information handed to [`ModuleBase::prepare`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PrepareContext {
    /// Nominal scan period; zero means scans run back to back.
    pub cycle_period: Duration,
}

/// Behavior shared by every module, whatever its capability.
pub trait ModuleBase: Send {
    fn descriptor(&self) -> &'static ModuleDescriptor;

    fn type_name(&self) -> &'static str {
        self.descriptor().type_name
    }

    /// Set one configuration property. Fails with `UnknownProperty` for
    /// keys the module does not recognize.
    fn set_property(&mut self, key: &str, _value: &str) -> ModuleResult<()> {
        Err(ModuleError::UnknownProperty {
            type_name: self.type_name(),
            key: key.to_string(),
        })
    }

    /// Local index of the input port named by `key`.
    fn input_index(&mut self, key: Option<&str>) -> ModuleResult<u32> {
        let d = self.descriptor();
        d.inputs
            .lookup(key)
            .ok_or_else(|| ModuleError::no_such_port(d.type_name, Direction::Input, key))
    }

    /// Local index of the output port named by `key`.
    fn output_index(&mut self, key: Option<&str>) -> ModuleResult<u32> {
        let d = self.descriptor();
        d.outputs
            .lookup(key)
            .ok_or_else(|| ModuleError::no_such_port(d.type_name, Direction::Output, key))
    }

    /// One-time setup before the first scan.
    fn prepare(&mut self, _ctx: &PrepareContext) -> ModuleResult<()> {
        Ok(())
    }

    /// Modules that want scan lifecycle callbacks return themselves here.
    fn as_listener(&mut self) -> Option<&mut dyn ScanListener> {
        None
    }
}

/// Output-only module.
pub trait Source: ModuleBase {
    /// Fill `output` (one slot per local output index). Slots left `None`
    /// become invalid signals.
    fn produce(&mut self, output: &mut [Option<Signal>]) -> Result<(), ModuleFault>;
}

/// Input-only module.
pub trait Sink: ModuleBase {
    /// `input` holds one slot per local input index; `None` means the
    /// port is unconnected or nothing was written this scan.
    fn consume(&mut self, input: &[Option<Signal>]) -> Result<(), ModuleFault>;
}

/// Module with both inputs and outputs.
pub trait Transform: ModuleBase {
    fn process(
        &mut self,
        input: &[Option<Signal>],
        output: &mut [Option<Signal>],
    ) -> Result<(), ModuleFault>;
}

/// Which sides of the buffer a module touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Source,
    Sink,
    Transform,
}

impl Capability {
    pub fn accepts_input(self) -> bool {
        matches!(self, Capability::Sink | Capability::Transform)
    }

    pub fn produces_output(self) -> bool {
        matches!(self, Capability::Source | Capability::Transform)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Source => "source",
            Capability::Sink => "sink",
            Capability::Transform => "transform",
        })
    }
}

/// A configured module instance.
pub enum Module {
    Source(Box<dyn Source>),
    Sink(Box<dyn Sink>),
    Transform(Box<dyn Transform>),
}

impl Module {
    pub fn source(m: impl Source + 'static) -> Self {
        Module::Source(Box::new(m))
    }

    pub fn sink(m: impl Sink + 'static) -> Self {
        Module::Sink(Box::new(m))
    }

    pub fn transform(m: impl Transform + 'static) -> Self {
        Module::Transform(Box::new(m))
    }

    pub fn capability(&self) -> Capability {
        match self {
            Module::Source(_) => Capability::Source,
            Module::Sink(_) => Capability::Sink,
            Module::Transform(_) => Capability::Transform,
        }
    }

    pub fn base(&self) -> &dyn ModuleBase {
        match self {
            Module::Source(m) => &**m,
            Module::Sink(m) => &**m,
            Module::Transform(m) => &**m,
        }
    }

    pub fn base_mut(&mut self) -> &mut dyn ModuleBase {
        match self {
            Module::Source(m) => &mut **m,
            Module::Sink(m) => &mut **m,
            Module::Transform(m) => &mut **m,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.base().type_name()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Module({} {})", self.capability(), self.type_name())
    }
}
