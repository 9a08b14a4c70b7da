//! Connection resolution.
//!
//! Producer and consumer port references are recorded with the symbolic
//! signal name they refer to. `resolve` looks every name up through the
//! scope chain, groups references by the signal they land on and emits
//! one [`Connection`] per signal that has both a producer and consumers.

use std::collections::HashMap;

use sf_core::{ScopeId, SignalId};
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::port::{Connection, PortRef};
use crate::scope::SignalTable;
use crate::validate;

#[derive(Debug, Clone)]
struct Reference {
    port: PortRef,
    scope: ScopeId,
    name: String,
}

#[derive(Debug, Default)]
struct Group {
    producer: Option<PortRef>,
    consumers: Vec<PortRef>,
}

/// Collects port references and turns them into connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionResolver {
    signals: SignalTable,
    outputs: Vec<Reference>,
    inputs: Vec<Reference>,
}

impl ConnectionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_scope(&self) -> ScopeId {
        self.signals.root_scope()
    }

    pub fn add_scope(&mut self, parent: ScopeId) -> GraphResult<ScopeId> {
        self.signals.add_scope(parent)
    }

    pub fn declare_signal(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
    ) -> GraphResult<SignalId> {
        self.signals.declare(scope, name)
    }

    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// Record that `port` produces the signal `name` as seen from `scope`.
    pub fn add_output(&mut self, port: PortRef, scope: ScopeId, name: impl Into<String>) {
        self.outputs.push(Reference {
            port,
            scope,
            name: name.into(),
        });
    }

    /// Record that `port` consumes the signal `name` as seen from `scope`.
    pub fn add_input(&mut self, port: PortRef, scope: ScopeId, name: impl Into<String>) {
        self.inputs.push(Reference {
            port,
            scope,
            name: name.into(),
        });
    }

    /// Resolve all recorded references into connections.
    ///
    /// Groups are processed in order of first appearance, outputs before
    /// inputs, and connections get dense pointers in that order. Signals
    /// with a producer but no consumers are dropped.
    pub fn resolve(&self) -> GraphResult<Vec<Connection>> {
        let mut order: Vec<SignalId> = Vec::new();
        let mut groups: HashMap<SignalId, Group> = HashMap::new();

        for r in &self.outputs {
            let id = self.signals.lookup(r.scope, &r.name)?;
            let group = groups.entry(id).or_insert_with(|| {
                order.push(id);
                Group::default()
            });
            if let Some(first) = &group.producer {
                return Err(GraphError::DuplicateProducer {
                    signal: self.signals.name(id).to_string(),
                    first: first.module,
                    second: r.port.module,
                });
            }
            group.producer = Some(r.port.clone());
        }

        for r in &self.inputs {
            let id = self.signals.lookup(r.scope, &r.name)?;
            groups
                .entry(id)
                .or_insert_with(|| {
                    order.push(id);
                    Group::default()
                })
                .consumers
                .push(r.port.clone());
        }

        let mut connections = Vec::new();
        for id in order {
            let Some(group) = groups.remove(&id) else {
                continue;
            };
            let name = self.signals.name(id);
            match group.producer {
                None => {
                    if let Some(consumer) = group.consumers.first() {
                        return Err(GraphError::UnresolvedReference {
                            signal: name.to_string(),
                            consumer: consumer.module,
                        });
                    }
                }
                Some(producer) if group.consumers.is_empty() => {
                    debug!(signal = name, producer = %producer, "dropping unconsumed output");
                }
                Some(producer) => connections.push(Connection {
                    pointer: connections.len(),
                    signal: id,
                    name: name.to_string(),
                    producer,
                    consumers: group.consumers,
                }),
            }
        }

        validate::validate_connections(&connections)?;
        Ok(connections)
    }
}
