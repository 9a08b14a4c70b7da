//! Graph-specific error types.

use sf_core::{ModuleId, ScopeId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Connection resolution, ordering and io-map construction errors.
///
/// All of these are fatal at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A scope id that was never created.
    UnknownScope { scope: ScopeId },

    /// A signal name declared twice in the same scope.
    DuplicateSignal { scope: ScopeId, name: String },

    /// A signal name not declared in the scope or any enclosing scope.
    UnknownSignal { scope: ScopeId, name: String },

    /// A signal is consumed but nothing produces it.
    UnresolvedReference { signal: String, consumer: ModuleId },

    /// A signal has more than one producer.
    DuplicateProducer {
        signal: String,
        first: ModuleId,
        second: ModuleId,
    },

    /// Modules that depend on each other, in edge order.
    CyclicDependency { cycle: Vec<ModuleId> },

    /// One local port bound to two different buffer pointers.
    PortConflict {
        module: ModuleId,
        index: u32,
        first: usize,
        second: usize,
    },

    /// A buffer pointer that does not fit an io-map entry.
    PointerOverflow { pointer: usize },

    /// Connection pointers are not the dense range `0..count`.
    BadPointer { pointer: usize, count: usize },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::UnknownScope { scope } => write!(f, "{} does not exist", scope),
            GraphError::DuplicateSignal { scope, name } => {
                write!(f, "Signal '{}' is already declared in {}", name, scope)
            }
            GraphError::UnknownSignal { scope, name } => {
                write!(f, "Signal '{}' is not visible from {}", name, scope)
            }
            GraphError::UnresolvedReference { signal, consumer } => {
                write!(
                    f,
                    "Signal '{}' is consumed by {} but has no producer",
                    signal, consumer
                )
            }
            GraphError::DuplicateProducer {
                signal,
                first,
                second,
            } => {
                write!(
                    f,
                    "Signal '{}' is produced by both {} and {}",
                    signal, first, second
                )
            }
            GraphError::CyclicDependency { cycle } => {
                let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
                write!(f, "Cyclic dependency: {}", names.join(" -> "))
            }
            GraphError::PortConflict {
                module,
                index,
                first,
                second,
            } => {
                write!(
                    f,
                    "Port {} of {} is bound to both pointer {} and pointer {}",
                    index, module, first, second
                )
            }
            GraphError::PointerOverflow { pointer } => {
                write!(f, "Buffer pointer {} does not fit an io-map", pointer)
            }
            GraphError::BadPointer { pointer, count } => {
                write!(
                    f,
                    "Buffer pointer {} is outside the dense range 0..{}",
                    pointer, count
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

