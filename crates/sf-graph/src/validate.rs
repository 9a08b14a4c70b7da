//! Connection list validation.

use crate::error::{GraphError, GraphResult};
use crate::port::Connection;

/// Check that pointers are exactly `0..connections.len()`.
/// Returns the buffer size.
pub(crate) fn validate_connections(connections: &[Connection]) -> GraphResult<usize> {
    let count = connections.len();
    let mut seen = vec![false; count];
    for conn in connections {
        if conn.pointer >= count || seen[conn.pointer] {
            return Err(GraphError::BadPointer {
                pointer: conn.pointer,
                count,
            });
        }
        seen[conn.pointer] = true;
    }
    Ok(count)
}
