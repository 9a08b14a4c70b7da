//! sf-runtime: assembly and scan-cycle execution for scanflow.
//!
//! Provides:
//! - DataBuffer (the per-scan signal exchange buffer)
//! - ModuleCrate (a module bound to its io-maps) and the crate builder
//! - Application (typed assembly from modules and signal references)
//! - ControlLoop (the scan scheduler) and its configuration
//! - diagnostic dumps
//!
//! # Example
//!
//! ```
//! use sf_core::Signal;
//! use sf_modules::{Console, Const, Module, Negate};
//! use sf_runtime::{Application, ControlLoop, LoopConfig};
//!
//! let mut app = Application::new();
//! let five = app.add_module("five", Module::source(Const::new(5.0)));
//! let flip = app.add_module("flip", Module::transform(Negate));
//! let log = app.add_module("log", Module::sink(Console::new()));
//!
//! let root = app.root_scope();
//! app.declare_signal(root, "x").unwrap();
//! app.declare_signal(root, "y").unwrap();
//! app.output(five, None, root, "x").unwrap();
//! app.input(flip, None, root, "x").unwrap();
//! app.output(flip, None, root, "y").unwrap();
//! app.input(log, Some("y"), root, "y").unwrap();
//! let assembly = app.assemble().unwrap();
//!
//! let config = LoopConfig {
//!     cycle_period_ms: 0,
//!     max_scans: Some(1),
//!     ..LoopConfig::default()
//! };
//! let report = ControlLoop::new(config)
//!     .run(assembly.crates, assembly.buffer_size)
//!     .unwrap();
//! assert_eq!(report.buffer.slot(1), Some(&Signal::scalar(-5.0)));
//! ```

pub mod application;
pub mod buffer;
pub mod builder;
pub mod config;
pub mod control_loop;
pub mod dump;
pub mod error;
pub(crate) mod events;
pub mod module_crate;

pub use application::{Application, Assembly};
pub use buffer::DataBuffer;
pub use builder::{BuildEntry, build};
pub use config::LoopConfig;
pub use control_loop::{ControlLoop, LoopHandle, LoopReport, LoopState};
pub use error::{BuildError, BuildResult, RuntimeError, RuntimeResult};
pub use module_crate::ModuleCrate;
