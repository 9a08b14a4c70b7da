//! Static per-type descriptions of ports and properties.
//!
//! Every module type publishes one [`ModuleDescriptor`]; port keys are
//! resolved against its [`PortLayout`] and properties against a
//! [`PropertySpec`] table, with no runtime introspection.

use crate::error::{ModuleError, ModuleResult};

/// Cap on the numbered ports of an [`PortLayout::Indexed`] layout. With
/// `n` named ports, numbered keys run from `n` to `n + MAX_NUMBERED_PORTS - 1`.
pub const MAX_NUMBERED_PORTS: u32 = 64;

/// How a module names the ports on one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortLayout {
    /// No ports on this side.
    Empty,
    /// Named ports; the local index is the position in the list.
    /// A missing key resolves only when there is exactly one port.
    Fixed(&'static [&'static str]),
    /// Named ports followed by numbered ones: a key is either one of the
    /// names or a decimal local index past the names, at most
    /// [`MAX_NUMBERED_PORTS`] of them.
    Indexed(&'static [&'static str]),
    /// Each lookup allocates the next index, whatever the key.
    Variadic,
    /// Each distinct key allocates an index and keeps it as a label.
    Keyed,
}

impl PortLayout {
    /// Resolve a key without per-instance state.
    ///
    /// `Variadic` and `Keyed` layouts always return `None` here; modules
    /// using them allocate indices themselves.
    pub fn lookup(&self, key: Option<&str>) -> Option<u32> {
        match *self {
            PortLayout::Fixed(names) => match key {
                Some(k) => names.iter().position(|n| *n == k).map(|i| i as u32),
                None if names.len() == 1 => Some(0),
                None => None,
            },
            PortLayout::Indexed(names) => {
                let k = key?;
                if let Some(i) = names.iter().position(|n| *n == k) {
                    return Some(i as u32);
                }
                let first = names.len() as u32;
                k.parse::<u32>()
                    .ok()
                    .filter(|i| (first..first + MAX_NUMBERED_PORTS).contains(i))
            }
            PortLayout::Empty | PortLayout::Variadic | PortLayout::Keyed => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PortLayout::Empty)
    }

    /// Short human-readable form, e.g. `in, ref` or `variadic`.
    pub fn describe(&self) -> String {
        match self {
            PortLayout::Empty => "-".to_string(),
            PortLayout::Fixed(names) => names.join(", "),
            PortLayout::Indexed(names) => {
                let first = names.len() as u32;
                format!(
                    "{}, {first}..{}",
                    names.join(", "),
                    first + MAX_NUMBERED_PORTS - 1
                )
            }
            PortLayout::Variadic => "variadic".to_string(),
            PortLayout::Keyed => "keyed".to_string(),
        }
    }
}

/// Static description of one module type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub type_name: &'static str,
    pub summary: &'static str,
    pub inputs: PortLayout,
    pub outputs: PortLayout,
}

/// One configurable property of module type `M`.
pub struct PropertySpec<M> {
    pub key: &'static str,
    pub apply: fn(&mut M, &str) -> ModuleResult<()>,
}

/// Look `key` up in `table` and apply `value` to `module`.
pub fn apply_property<M>(
    module: &mut M,
    table: &[PropertySpec<M>],
    type_name: &'static str,
    key: &str,
    value: &str,
) -> ModuleResult<()> {
    match table.iter().find(|p| p.key == key) {
        Some(spec) => (spec.apply)(module, value),
        None => Err(ModuleError::UnknownProperty {
            type_name,
            key: key.to_string(),
        }),
    }
}

/// Parse a real-valued property. Accepts `inf` and `-inf`.
pub fn parse_f64(key: &str, value: &str) -> ModuleResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ModuleError::InvalidPropertyValue {
            key: key.to_string(),
            value: value.to_string(),
            what: "expected a number",
        })
}

/// Sequential index allocator for variadic ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortCounter(u32);

impl PortCounter {
    pub fn next(&mut self) -> u32 {
        let i = self.0;
        self.0 += 1;
        i
    }

    /// Number of indices handed out so far.
    pub fn count(&self) -> u32 {
        self.0
    }
}
