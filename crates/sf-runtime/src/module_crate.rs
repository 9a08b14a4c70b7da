//! A module bound to its io-maps.

use sf_core::Signal;
use sf_graph::IoMap;
use sf_modules::{Module, ModuleFault};

use crate::buffer::DataBuffer;
use crate::error::{BuildError, BuildResult};

/// One module plus its input and output maps, ready to execute.
#[derive(Debug)]
pub struct ModuleCrate {
    name: String,
    module: Module,
    inputs: IoMap,
    outputs: IoMap,
}

impl ModuleCrate {
    /// Wrap `module`. A non-empty map on a side the module's capability
    /// does not have is rejected.
    pub fn new(
        name: impl Into<String>,
        module: Module,
        inputs: IoMap,
        outputs: IoMap,
    ) -> BuildResult<Self> {
        let name = name.into();
        let capability = module.capability();
        let side = if !inputs.is_empty() && !capability.accepts_input() {
            Some("inputs")
        } else if !outputs.is_empty() && !capability.produces_output() {
            Some("outputs")
        } else {
            None
        };
        if let Some(side) = side {
            return Err(BuildError::Capability {
                module: name,
                type_name: module.type_name(),
                capability,
                side,
            });
        }
        Ok(Self {
            name,
            module,
            inputs,
            outputs,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.module.type_name()
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut Module {
        &mut self.module
    }

    pub fn inputs(&self) -> &IoMap {
        &self.inputs
    }

    pub fn outputs(&self) -> &IoMap {
        &self.outputs
    }

    /// Run the module once against `buffer`.
    ///
    /// `scratch` receives the module's outputs; outputs the module leaves
    /// unset are written as invalid signals. Nothing is written to the
    /// buffer when the module faults.
    pub fn execute(
        &mut self,
        buffer: &mut DataBuffer,
        scratch: &mut Vec<Option<Signal>>,
    ) -> Result<(), ModuleFault> {
        match &mut self.module {
            Module::Source(m) => {
                reset(scratch, self.outputs.len());
                m.produce(scratch)?;
            }
            Module::Sink(m) => {
                let input = buffer.get(self.inputs.as_slice());
                return m.consume(input);
            }
            Module::Transform(m) => {
                reset(scratch, self.outputs.len());
                let input = buffer.get(self.inputs.as_slice());
                m.process(input, scratch)?;
            }
        }
        for slot in scratch.iter_mut().filter(|s| s.is_none()) {
            *slot = Some(Signal::invalid());
        }
        buffer.put(scratch, self.outputs.as_slice());
        Ok(())
    }
}

fn reset(scratch: &mut Vec<Option<Signal>>, len: usize) {
    scratch.clear();
    scratch.resize(len, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::ModuleId;
    use sf_modules::{Console, Const, Negate, Saturation};

    fn map(bindings: &[(u32, usize)]) -> IoMap {
        IoMap::build(ModuleId::from_index(0), bindings).unwrap()
    }

    #[test]
    fn source_then_transform() {
        let mut buffer = DataBuffer::new(2);
        let mut scratch = Vec::new();

        let five = Module::source(Const::new(5.0));
        let mut source = ModuleCrate::new("c", five, IoMap::empty(), map(&[(0, 0)])).unwrap();
        let mut negate = ModuleCrate::new(
            "n",
            Module::transform(Negate),
            map(&[(0, 0)]),
            map(&[(0, 1)]),
        )
        .unwrap();

        source.execute(&mut buffer, &mut scratch).unwrap();
        negate.execute(&mut buffer, &mut scratch).unwrap();
        assert_eq!(buffer.slot(1), Some(&Signal::scalar(-5.0)));
    }

    #[test]
    fn unset_outputs_become_invalid() {
        let mut buffer = DataBuffer::new(3);
        let mut scratch = Vec::new();
        // absent input: saturation writes invalid everywhere, negate writes nothing
        let mut negate = ModuleCrate::new(
            "n",
            Module::transform(Negate),
            map(&[(0, 0)]),
            map(&[(0, 1)]),
        )
        .unwrap();
        negate.execute(&mut buffer, &mut scratch).unwrap();
        assert_eq!(buffer.slot(1), Some(&Signal::invalid()));

        let mut sat = ModuleCrate::new(
            "s",
            Module::transform(Saturation::default()),
            map(&[(0, 0)]),
            map(&[(0, 0), (1, 1), (2, 2)]),
        )
        .unwrap();
        sat.execute(&mut buffer, &mut scratch).unwrap();
        assert!((0..3).all(|p| buffer.slot(p) == Some(&Signal::invalid())));
    }

    #[test]
    fn capability_mismatch_is_rejected() {
        let err = ModuleCrate::new(
            "console",
            Module::sink(Console::new()),
            map(&[(0, 0)]),
            map(&[(0, 1)]),
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::Capability { side: "outputs", .. }));

        let source = Module::source(Const::new(1.0));
        let err = ModuleCrate::new("c", source, map(&[(0, 0)]), IoMap::empty()).unwrap_err();
        assert!(matches!(err, BuildError::Capability { side: "inputs", .. }));
    }
}
