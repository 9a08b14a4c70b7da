//! Turn ordered modules and resolved connections into module crates.

use std::collections::HashMap;

use sf_core::ModuleId;
use sf_graph::{Connection, GraphError, IoMap};
use sf_modules::{Direction, Module};
use tracing::debug;

use crate::error::{BuildError, BuildResult};
use crate::module_crate::ModuleCrate;

/// A named module waiting to be wrapped.
#[derive(Debug)]
pub struct BuildEntry {
    pub id: ModuleId,
    pub name: String,
    pub module: Module,
}

impl BuildEntry {
    pub fn new(id: ModuleId, name: impl Into<String>, module: Module) -> Self {
        Self {
            id,
            name: name.into(),
            module,
        }
    }
}

#[derive(Default)]
struct Bindings {
    inputs: Vec<(u32, usize)>,
    outputs: Vec<(u32, usize)>,
}

/// Build one crate per entry, keeping the order of `entries` (which should
/// be topological).
///
/// Port keys are resolved by the modules themselves, connection by
/// connection in pointer order, producer before consumers; modules that
/// allocate indices per lookup see that order.
pub fn build(
    entries: Vec<BuildEntry>,
    connections: &[Connection],
) -> BuildResult<Vec<ModuleCrate>> {
    let mut entries = entries;
    let position: HashMap<ModuleId, usize> =
        entries.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
    let mut bindings: Vec<Bindings> = entries.iter().map(|_| Bindings::default()).collect();

    for c in connections {
        let i = *position
            .get(&c.producer.module)
            .ok_or(BuildError::UnknownModule(c.producer.module))?;
        let index = resolve(&mut entries[i], Direction::Output, c.producer.key())?;
        bindings[i].outputs.push((index, c.pointer));

        for consumer in &c.consumers {
            let i = *position
                .get(&consumer.module)
                .ok_or(BuildError::UnknownModule(consumer.module))?;
            let index = resolve(&mut entries[i], Direction::Input, consumer.key())?;
            bindings[i].inputs.push((index, c.pointer));
        }
    }

    let mut crates = Vec::with_capacity(entries.len());
    for (entry, b) in entries.into_iter().zip(bindings) {
        let inputs = io_map(&entry, Direction::Input, &b.inputs)?;
        let outputs = io_map(&entry, Direction::Output, &b.outputs)?;
        debug!(
            module = %entry.name,
            type_name = entry.module.type_name(),
            inputs = ?inputs.as_slice(),
            outputs = ?outputs.as_slice(),
            "crate built"
        );
        crates.push(ModuleCrate::new(entry.name, entry.module, inputs, outputs)?);
    }
    Ok(crates)
}

fn resolve(entry: &mut BuildEntry, direction: Direction, key: Option<&str>) -> BuildResult<u32> {
    let capability = entry.module.capability();
    let supported = match direction {
        Direction::Input => capability.accepts_input(),
        Direction::Output => capability.produces_output(),
    };
    if !supported {
        return Err(BuildError::Capability {
            module: entry.name.clone(),
            type_name: entry.module.type_name(),
            capability,
            side: match direction {
                Direction::Input => "inputs",
                Direction::Output => "outputs",
            },
        });
    }
    let base = entry.module.base_mut();
    let result = match direction {
        Direction::Input => base.input_index(key),
        Direction::Output => base.output_index(key),
    };
    result.map_err(|source| BuildError::Module {
        module: entry.name.clone(),
        type_name: entry.module.type_name(),
        source,
    })
}

fn io_map(
    entry: &BuildEntry,
    direction: Direction,
    bindings: &[(u32, usize)],
) -> BuildResult<IoMap> {
    IoMap::build(entry.id, bindings).map_err(|e| match e {
        GraphError::PortConflict {
            index,
            first,
            second,
            ..
        } => BuildError::PortConflict {
            module: entry.name.clone(),
            type_name: entry.module.type_name(),
            direction,
            index,
            first,
            second,
        },
        other => BuildError::Graph(other),
    })
}
