//! sf-core: shared foundation for scanflow.
//!
//! Contains:
//! - signal (the tagged value exchanged between modules)
//! - ids (compact typed ids for modules, scopes and signals)
//! - timing (scan duration statistics)
//! - error (shared error type)

pub mod error;
pub mod ids;
pub mod signal;
pub mod timing;

pub use error::{SfError, SfResult};
pub use ids::{ModuleId, ScopeId, SignalId};
pub use signal::Signal;
pub use timing::DurationStats;
