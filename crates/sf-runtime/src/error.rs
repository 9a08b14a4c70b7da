//! Error types for assembly and the control loop.

use sf_core::ModuleId;
use sf_graph::GraphError;
use sf_modules::{Capability, Direction, ModuleError};
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Build-time failures. All of them abort application startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Connection error: {0}")]
    Graph(#[from] GraphError),

    #[error("Signal '{signal}' is consumed by '{consumer}' but has no producer")]
    UnresolvedReference { signal: String, consumer: String },

    #[error("Signal '{signal}' is produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        signal: String,
        first: String,
        second: String,
    },

    #[error("Cyclic dependency: {}", modules.join(" -> "))]
    CyclicDependency { modules: Vec<String> },

    #[error(
        "Module '{module}' ({type_name}): {direction} {index} bound to both pointer {first} and {second}"
    )]
    PortConflict {
        module: String,
        type_name: &'static str,
        direction: Direction,
        index: u32,
        first: usize,
        second: usize,
    },

    #[error("Module '{module}' ({type_name}): {source}")]
    Module {
        module: String,
        type_name: &'static str,
        source: ModuleError,
    },

    #[error("Module '{module}' ({type_name}) is a {capability} and has no {side}")]
    Capability {
        module: String,
        type_name: &'static str,
        capability: Capability,
        side: &'static str,
    },

    #[error("{0} is not part of the application")]
    UnknownModule(ModuleId),
}

/// Control loop and configuration errors.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("Failed to prepare module '{module}' ({type_name}): {source}")]
    Prepare {
        module: String,
        type_name: &'static str,
        source: ModuleError,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("The control loop has already run")]
    AlreadyRun,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}
