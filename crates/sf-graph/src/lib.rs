//! sf-graph: connection and ordering layer for scanflow.
//!
//! Provides:
//! - Nested scopes and signal declarations
//! - Connection resolution from symbolic port references
//! - Deterministic topological ordering with cycle reporting
//! - Dense io-maps from local port indices to buffer pointers
//!
//! # Example
//!
//! ```
//! use sf_core::ModuleId;
//! use sf_graph::{ConnectionResolver, PortRef, Sorter};
//!
//! let source = ModuleId::from_index(0);
//! let sink = ModuleId::from_index(1);
//!
//! let mut resolver = ConnectionResolver::new();
//! let root = resolver.root_scope();
//! resolver.declare_signal(root, "level").unwrap();
//! resolver.add_output(PortRef::new(source, Some("out")), root, "level");
//! resolver.add_input(PortRef::new(sink, Some("in")), root, "level");
//! let connections = resolver.resolve().unwrap();
//!
//! let mut sorter = Sorter::new();
//! sorter.add_vertex(sink);
//! sorter.add_vertex(source);
//! for c in &connections {
//!     sorter.add_connection(c);
//! }
//! assert_eq!(sorter.topological_order().unwrap(), vec![source, sink]);
//! ```

pub mod error;
pub mod indexing;
pub mod port;
pub mod resolver;
pub mod scope;
pub mod sorter;
pub(crate) mod validate;

pub use error::{GraphError, GraphResult};
pub use indexing::{IoMap, UNCONNECTED};
pub use port::{Connection, PortRef};
pub use resolver::ConnectionResolver;
pub use scope::{ScopeTree, SignalTable};
pub use sorter::Sorter;
