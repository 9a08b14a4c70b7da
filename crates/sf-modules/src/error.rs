//! Error types for module configuration and execution.

use std::fmt;

use sf_core::SfError;
use thiserror::Error;

/// Result type for module configuration.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Port direction, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Input => "input",
            Direction::Output => "output",
        })
    }
}

/// Configuration-time failures. These abort application startup.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModuleError {
    /// A port key the module does not recognize.
    #[error("'{type_name}' has no {direction} port '{key}'")]
    NoSuchPort {
        type_name: &'static str,
        direction: Direction,
        key: String,
    },

    /// A property key the module does not recognize.
    #[error("'{type_name}' has no property '{key}'")]
    UnknownProperty { type_name: &'static str, key: String },

    /// A property value that could not be parsed.
    #[error("Invalid value '{value}' for property '{key}': {what}")]
    InvalidPropertyValue {
        key: String,
        value: String,
        what: &'static str,
    },

    /// A configuration that is inconsistent as a whole.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// No module type registered under this name.
    #[error("Unknown module type '{0}'")]
    UnknownType(String),
}

impl ModuleError {
    pub(crate) fn no_such_port(
        type_name: &'static str,
        direction: Direction,
        key: Option<&str>,
    ) -> Self {
        ModuleError::NoSuchPort {
            type_name,
            direction,
            key: key.unwrap_or("<default>").to_string(),
        }
    }
}

/// Scan-time failure of one module. Aborts the rest of the current scan
/// only; the scheduler logs it and carries on with the next scan.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModuleFault {
    #[error("signal access failed: {0}")]
    Signal(#[from] SfError),

    #[error("{what}")]
    Failed { what: String },
}

impl ModuleFault {
    pub fn new(what: impl Into<String>) -> Self {
        ModuleFault::Failed { what: what.into() }
    }
}
