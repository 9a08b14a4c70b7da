//! Port references and resolved connections.

use sf_core::{ModuleId, SignalId};

/// One port of one module, named by an optional key.
///
/// The key is interpreted by the module itself when the io-maps are
/// built; a blank key is stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub module: ModuleId,
    pub key: Option<String>,
}

impl PortRef {
    pub fn new(module: ModuleId, key: Option<&str>) -> Self {
        let key = key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);
        Self { module, key }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}.{}", self.module, key),
            None => write!(f, "{}", self.module),
        }
    }
}

/// One producer bound to the consumers of the same signal.
///
/// `pointer` is the slot this connection owns in the data buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub pointer: usize,
    pub signal: SignalId,
    pub name: String,
    pub producer: PortRef,
    pub consumers: Vec<PortRef>,
}

impl Connection {
    /// Dependency edges this connection contributes: producer module to
    /// each consumer module.
    pub fn edges(&self) -> impl Iterator<Item = (ModuleId, ModuleId)> + '_ {
        self.consumers
            .iter()
            .map(move |c| (self.producer.module, c.module))
    }
}
