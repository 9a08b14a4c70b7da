use thiserror::Error;

pub type SfResult<T> = Result<T, SfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SfError {
    #[error("Invalid signal has no value ({what})")]
    InvalidSignal { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Index out of bounds: {what} (index={index}, len={len})")]
    IndexOob {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
