//! Typed application assembly.
//!
//! [`Application`] collects modules, scopes, signal declarations and port
//! references, then [`Application::assemble`] resolves connections, orders
//! the modules and builds the crates the control loop executes.

use sf_core::{ModuleId, ScopeId, SignalId};
use sf_graph::{Connection, ConnectionResolver, GraphError, PortRef, Sorter};
use sf_modules::Module;
use tracing::info;

use crate::builder::{self, BuildEntry};
use crate::error::{BuildError, BuildResult};
use crate::module_crate::ModuleCrate;

/// Result of [`Application::assemble`].
#[derive(Debug)]
pub struct Assembly {
    /// Crates in execution order.
    pub crates: Vec<ModuleCrate>,
    /// Number of buffer slots, one per connection.
    pub buffer_size: usize,
    pub connections: Vec<Connection>,
}

#[derive(Debug, Default)]
pub struct Application {
    names: Vec<String>,
    modules: Vec<Module>,
    resolver: ConnectionResolver,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&mut self, name: impl Into<String>, module: Module) -> ModuleId {
        let id = ModuleId::from_index(self.modules.len() as u32);
        self.names.push(name.into());
        self.modules.push(module);
        id
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn name(&self, id: ModuleId) -> Option<&str> {
        self.names.get(id.slot()).map(String::as_str)
    }

    pub fn set_property(&mut self, id: ModuleId, key: &str, value: &str) -> BuildResult<()> {
        let name = self.name(id).ok_or(BuildError::UnknownModule(id))?.to_string();
        let module = &mut self.modules[id.slot()];
        module
            .base_mut()
            .set_property(key, value)
            .map_err(|source| BuildError::Module {
                module: name,
                type_name: module.type_name(),
                source,
            })
    }

    pub fn root_scope(&self) -> ScopeId {
        self.resolver.root_scope()
    }

    pub fn add_scope(&mut self, parent: ScopeId) -> BuildResult<ScopeId> {
        Ok(self.resolver.add_scope(parent)?)
    }

    pub fn declare_signal(&mut self, scope: ScopeId, name: &str) -> BuildResult<SignalId> {
        Ok(self.resolver.declare_signal(scope, name)?)
    }

    /// Module `module` produces signal `name` (looked up from `scope`) on
    /// the output named `key`.
    pub fn output(
        &mut self,
        module: ModuleId,
        key: Option<&str>,
        scope: ScopeId,
        name: &str,
    ) -> BuildResult<()> {
        self.check(module)?;
        self.resolver.add_output(PortRef::new(module, key), scope, name);
        Ok(())
    }

    /// Module `module` consumes signal `name` (looked up from `scope`) on
    /// the input named `key`.
    pub fn input(
        &mut self,
        module: ModuleId,
        key: Option<&str>,
        scope: ScopeId,
        name: &str,
    ) -> BuildResult<()> {
        self.check(module)?;
        self.resolver.add_input(PortRef::new(module, key), scope, name);
        Ok(())
    }

    fn check(&self, module: ModuleId) -> BuildResult<()> {
        if module.slot() < self.modules.len() {
            Ok(())
        } else {
            Err(BuildError::UnknownModule(module))
        }
    }

    /// Resolve connections, sort the modules and build the crates.
    pub fn assemble(self) -> BuildResult<Assembly> {
        let connections = self.resolver.resolve().map_err(|e| self.named(e))?;

        let mut sorter = Sorter::new();
        for i in 0..self.modules.len() {
            sorter.add_vertex(ModuleId::from_index(i as u32));
        }
        for c in &connections {
            sorter.add_connection(c);
        }
        let order = sorter.topological_order().map_err(|e| self.named(e))?;

        let mut slots: Vec<Option<(String, Module)>> = self
            .names
            .into_iter()
            .zip(self.modules)
            .map(Some)
            .collect();
        let mut entries = Vec::with_capacity(order.len());
        for id in order {
            let (name, module) = slots
                .get_mut(id.slot())
                .and_then(Option::take)
                .ok_or(BuildError::UnknownModule(id))?;
            entries.push(BuildEntry::new(id, name, module));
        }

        let crates = builder::build(entries, &connections)?;
        let buffer_size = connections.len();
        info!(
            modules = crates.len(),
            connections = buffer_size,
            "application assembled"
        );
        Ok(Assembly {
            crates,
            buffer_size,
            connections,
        })
    }

    /// Replace module ids in a graph error with module names.
    fn named(&self, e: GraphError) -> BuildError {
        let name = |id: ModuleId| {
            self.name(id)
                .map_or_else(|| id.to_string(), str::to_string)
        };
        match e {
            GraphError::UnresolvedReference { signal, consumer } => {
                BuildError::UnresolvedReference {
                    signal,
                    consumer: name(consumer),
                }
            }
            GraphError::DuplicateProducer {
                signal,
                first,
                second,
            } => BuildError::DuplicateProducer {
                signal,
                first: name(first),
                second: name(second),
            },
            GraphError::CyclicDependency { cycle } => BuildError::CyclicDependency {
                modules: cycle.into_iter().map(name).collect(),
            },
            other => BuildError::Graph(other),
        }
    }
}
