//! Nested naming scopes and signal declarations.

use std::collections::HashMap;

use sf_core::{ScopeId, SignalId};

use crate::error::{GraphError, GraphResult};

/// Tree of naming scopes. Index 0 is always the root.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    parents: Vec<Option<ScopeId>>,
}

impl ScopeTree {
    /// Create a tree holding only the root scope.
    pub fn new() -> Self {
        Self {
            parents: vec![None],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::from_index(0)
    }

    /// Open a child scope of `parent`.
    pub fn add_child(&mut self, parent: ScopeId) -> GraphResult<ScopeId> {
        self.check(parent)?;
        let id = ScopeId::from_index(self.parents.len() as u32);
        self.parents.push(Some(parent));
        Ok(id)
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.parents.get(scope.slot()).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    fn check(&self, scope: ScopeId) -> GraphResult<()> {
        if scope.slot() < self.parents.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownScope { scope })
        }
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Signal declarations keyed by (scope, name), with lookup that falls
/// back through enclosing scopes.
#[derive(Debug, Clone, Default)]
pub struct SignalTable {
    scopes: ScopeTree,
    by_key: HashMap<(ScopeId, String), SignalId>,
    names: Vec<String>,
}

impl SignalTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn root_scope(&self) -> ScopeId {
        self.scopes.root()
    }

    pub fn add_scope(&mut self, parent: ScopeId) -> GraphResult<ScopeId> {
        self.scopes.add_child(parent)
    }

    /// Declare `name` in `scope`. A name may shadow one from an enclosing
    /// scope but may not be declared twice in the same scope.
    pub fn declare(&mut self, scope: ScopeId, name: impl Into<String>) -> GraphResult<SignalId> {
        self.scopes.check(scope)?;
        let name = name.into();
        let key = (scope, name);
        if self.by_key.contains_key(&key) {
            return Err(GraphError::DuplicateSignal {
                scope,
                name: key.1,
            });
        }
        let id = SignalId::from_index(self.names.len() as u32);
        self.names.push(key.1.clone());
        self.by_key.insert(key, id);
        Ok(id)
    }

    /// Resolve `name` starting at `scope` and walking towards the root.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> GraphResult<SignalId> {
        self.scopes.check(scope)?;
        let mut current = Some(scope);
        while let Some(s) = current {
            if let Some(&id) = self.by_key.get(&(s, name.to_string())) {
                return Ok(id);
            }
            current = self.scopes.parent(s);
        }
        Err(GraphError::UnknownSignal {
            scope,
            name: name.to_string(),
        })
    }

    /// Declared name of a signal.
    pub fn name(&self, id: SignalId) -> &str {
        self.names.get(id.slot()).map_or("?", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
