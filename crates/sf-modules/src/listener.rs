//! Scan lifecycle callbacks.

use std::time::Instant;

/// What a listener is told about the scan in flight.
#[derive(Debug, Clone, Copy)]
pub struct ScanContext {
    /// 1-based number of the scan in flight.
    pub scan: u64,
    /// When the scan started.
    pub started: Instant,
}

/// Components that must act at fixed phases of every scan, typically
/// sources and sinks talking to external equipment.
///
/// Callbacks are synchronous; anything slow belongs on the listener's own
/// background machinery.
pub trait ScanListener {
    /// After the buffer is cleared, before the start delay.
    fn scan_start(&mut self, _ctx: &ScanContext) {}

    /// After the start delay, right before modules execute.
    fn processing_start(&mut self, _ctx: &ScanContext) {}

    /// After all modules executed (or the scan was aborted by a fault).
    fn scan_end(&mut self, _ctx: &ScanContext) {}
}
