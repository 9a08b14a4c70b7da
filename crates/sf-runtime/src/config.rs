//! Control loop configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

/// Timing and diagnostics settings for a [`ControlLoop`](crate::ControlLoop).
///
/// ```
/// use sf_runtime::LoopConfig;
///
/// let config = LoopConfig::from_yaml_str("cycle_period_ms: 200\nmax_scans: 5\n").unwrap();
/// assert_eq!(config.cycle_period_ms, 200);
/// assert_eq!(config.start_scan_delay_ms, 400);
/// // a start delay at or beyond the period is cut to a fifth of it
/// assert_eq!(config.effective_start_delay().as_millis(), 40);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    /// Nominal scan period; 0 runs scans back to back.
    pub cycle_period_ms: u64,
    /// Pause between `scan_start` and module execution.
    pub start_scan_delay_ms: u64,
    /// How far past the period a scan may run before it counts as an overrun.
    pub overrun_tolerance_ms: u64,
    /// Stop after this many scans; run until stopped when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scans: Option<u64>,
    /// Write a diagnostic dump on the first module fault.
    pub dump_on_fault: bool,
    /// Where dumps go; the system temp dir when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_dir: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: 1000,
            start_scan_delay_ms: 400,
            overrun_tolerance_ms: 100,
            max_scans: None,
            dump_on_fault: false,
            dump_dir: None,
        }
    }
}

impl LoopConfig {
    pub fn from_yaml_str(content: &str) -> RuntimeResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> RuntimeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> RuntimeResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Set one value by its command-line style key.
    ///
    /// Keys: `cycle-period`, `scan-start-delay`, `overrun-tolerance` (all in
    /// ms) and `max-scans` (`none` clears it).
    pub fn set(&mut self, key: &str, value: &str) -> RuntimeResult<()> {
        let field = match key {
            "cycle-period" => &mut self.cycle_period_ms,
            "scan-start-delay" => &mut self.start_scan_delay_ms,
            "overrun-tolerance" => &mut self.overrun_tolerance_ms,
            "max-scans" => {
                self.max_scans = match value.trim() {
                    "none" => None,
                    v => Some(parse_ms(key, v)?),
                };
                return Ok(());
            }
            _ => return Err(RuntimeError::UnknownKey(key.to_string())),
        };
        *field = parse_ms(key, value)?;
        Ok(())
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }

    pub fn overrun_tolerance(&self) -> Duration {
        Duration::from_millis(self.overrun_tolerance_ms)
    }

    /// The start delay actually used: a delay at or beyond the cycle period
    /// is replaced by a fifth of the period.
    pub fn effective_start_delay(&self) -> Duration {
        if self.start_scan_delay_ms >= self.cycle_period_ms {
            Duration::from_millis(self.cycle_period_ms / 5)
        } else {
            Duration::from_millis(self.start_scan_delay_ms)
        }
    }

    pub fn dump_dir(&self) -> PathBuf {
        self.dump_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn parse_ms(key: &str, value: &str) -> RuntimeResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| RuntimeError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
