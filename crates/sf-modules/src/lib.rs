//! Module contract and standard module library for scanflow.
//!
//! A module is one of three capability variants (see [`Module`]):
//! - **Source**: writes outputs only
//! - **Sink**: reads inputs only
//! - **Transform**: reads inputs and writes outputs
//!
//! Every type publishes a static [`ModuleDescriptor`] naming its ports and
//! is configured through string properties before the first scan. Scan-time
//! failures are returned as [`ModuleFault`] values and abort only the scan
//! in flight.
//!
//! Modules that must act at fixed phases of a scan (typically those talking
//! to external equipment) expose a [`ScanListener`] through
//! [`ModuleBase::as_listener`].

pub mod console;
pub mod controller;
pub mod descriptor;
pub mod error;
pub mod io;
pub mod lag;
pub mod listener;
pub mod logic;
pub mod math;
pub mod module;
pub mod mux;
pub mod recorder;
pub mod registry;
pub mod sources;

pub use console::Console;
pub use controller::{PiControl, PiController, PiState};
pub use descriptor::{MAX_NUMBERED_PORTS, ModuleDescriptor, PortLayout, PropertySpec};
pub use error::{Direction, ModuleError, ModuleFault, ModuleResult};
pub use lag::{Lag, LagFilter};
pub use listener::{ScanContext, ScanListener};
pub use logic::{And, Between, Comparator, Not, Or};
pub use math::{Div, LinearTransform, Negate, Saturation, SquareRoot, Sum};
pub use module::{Capability, Module, ModuleBase, PrepareContext, Sink, Source, Transform};
pub use mux::Multiplexer;
pub use recorder::{Recorder, RecorderHandle};
pub use sources::{Clock, Const, Random};
