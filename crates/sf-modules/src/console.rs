//! Console sink: logs labelled input values once per scan.

use sf_core::Signal;
use tracing::info;

use crate::descriptor::{ModuleDescriptor, PortLayout};
use crate::error::{ModuleFault, ModuleResult};
use crate::io::input;
use crate::listener::{ScanContext, ScanListener};
use crate::module::{ModuleBase, Sink};

pub static CONSOLE: ModuleDescriptor = ModuleDescriptor {
    type_name: "console",
    summary: "Log labelled inputs at the end of every scan",
    inputs: PortLayout::Keyed,
    outputs: PortLayout::Empty,
};

/// Each input key becomes a label; inputs connected without a key are
/// labelled by position (`#0`, `#1`, ...).
#[derive(Debug, Clone, Default)]
pub struct Console {
    labels: Vec<String>,
    lines: Vec<String>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Lines collected in the current (or last finished) scan.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl ModuleBase for Console {
    fn descriptor(&self) -> &'static ModuleDescriptor {
        &CONSOLE
    }

    fn input_index(&mut self, key: Option<&str>) -> ModuleResult<u32> {
        if let Some(k) = key
            && let Some(i) = self.labels.iter().position(|l| l == k)
        {
            return Ok(i as u32);
        }
        let index = self.labels.len();
        self.labels
            .push(key.map_or_else(|| format!("#{index}"), str::to_string));
        Ok(index as u32)
    }

    fn as_listener(&mut self) -> Option<&mut dyn ScanListener> {
        Some(self)
    }
}

impl Sink for Console {
    fn consume(&mut self, inp: &[Option<Signal>]) -> Result<(), ModuleFault> {
        self.lines.clear();
        for (i, label) in self.labels.iter().enumerate() {
            self.lines.push(format!("{label} = {}", input(inp, i)));
        }
        Ok(())
    }
}

impl ScanListener for Console {
    fn scan_start(&mut self, _ctx: &ScanContext) {
        self.lines.clear();
    }

    fn scan_end(&mut self, ctx: &ScanContext) {
        info!("---- Scan #{}", ctx.scan);
        for line in &self.lines {
            info!("{line}");
        }
    }
}
