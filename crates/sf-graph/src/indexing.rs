//! Dense io-maps from local port indices to buffer pointers.

use sf_core::ModuleId;

use crate::error::{GraphError, GraphResult};

/// Marker for a local port with no connection this run.
pub const UNCONNECTED: i32 = -1;

/// Local port index -> buffer pointer, `-1` where unconnected.
///
/// Sized to the highest bound local index + 1; ports above that are
/// simply not part of the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IoMap {
    entries: Vec<i32>,
}

impl IoMap {
    /// An empty map, for a module side with nothing connected.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the map for `module` from `(local index, pointer)` bindings.
    ///
    /// Binding one local index to two different pointers is a
    /// [`GraphError::PortConflict`]; repeating an identical binding is
    /// harmless.
    pub fn build(module: ModuleId, bindings: &[(u32, usize)]) -> GraphResult<Self> {
        let Some(max) = bindings.iter().map(|&(i, _)| i as usize).max() else {
            return Ok(Self::empty());
        };

        let mut entries = vec![UNCONNECTED; max + 1];
        for &(index, pointer) in bindings {
            let p = i32::try_from(pointer).map_err(|_| GraphError::PointerOverflow { pointer })?;
            let slot = &mut entries[index as usize];
            if *slot != UNCONNECTED && *slot != p {
                return Err(GraphError::PortConflict {
                    module,
                    index,
                    first: *slot as usize,
                    second: pointer,
                });
            }
            *slot = p;
        }
        Ok(Self { entries })
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pointer bound to a local index, if any.
    pub fn pointer(&self, index: usize) -> Option<usize> {
        self.entries
            .get(index)
            .and_then(|&p| usize::try_from(p).ok())
    }

    /// Number of local indices that are connected.
    pub fn connected(&self) -> usize {
        self.entries.iter().filter(|&&p| p >= 0).count()
    }
}
