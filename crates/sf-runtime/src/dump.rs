//! Post-mortem dump of buffer contents and the module list.
//!
//! The text is meant for people; nothing should parse it.

use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::buffer::DataBuffer;
use crate::module_crate::ModuleCrate;

struct Dump<'a> {
    reason: &'a str,
    buffer: &'a DataBuffer,
    crates: &'a [ModuleCrate],
}

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scanflow diagnostic dump")?;
        writeln!(f, "time: {}", chrono::Local::now().to_rfc3339())?;
        writeln!(
            f,
            "system: {} {}",
            std::env::consts::OS,
            std::env::consts::ARCH
        )?;
        writeln!(f, "reason: {}", self.reason)?;
        writeln!(f)?;
        writeln!(f, "buffer ({} slots):", self.buffer.size())?;
        for line in self.buffer.dump_lines() {
            writeln!(f, "  {line}")?;
        }
        writeln!(f)?;
        writeln!(f, "modules ({}):", self.crates.len())?;
        for (i, c) in self.crates.iter().enumerate() {
            writeln!(f, "  {i}: {} ({})", c.name(), c.type_name())?;
        }
        Ok(())
    }
}

/// Render the dump text.
pub fn render(reason: &str, buffer: &DataBuffer, crates: &[ModuleCrate]) -> String {
    Dump {
        reason,
        buffer,
        crates,
    }
    .to_string()
}

/// Write a dump to a fresh `scanflow_<uuid>.dump` file in `dir`.
pub fn write(
    dir: &Path,
    reason: &str,
    buffer: &DataBuffer,
    crates: &[ModuleCrate],
) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("scanflow_{}.dump", Uuid::new_v4()));
    std::fs::write(&path, render(reason, buffer, crates))?;
    Ok(path)
}
