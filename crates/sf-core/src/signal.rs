//! The value type exchanged between modules.

use std::fmt;
use std::sync::Arc;

use crate::error::{SfError, SfResult};

/// Immutable tagged value carried through the data buffer.
///
/// A signal is created by a module during a scan and discarded when the
/// buffer is cleared at the start of the next one. Vector payloads are
/// shared, so cloning a signal never copies its elements.
#[derive(Debug, Clone, Default)]
pub enum Signal {
    /// No valid value this scan.
    #[default]
    Invalid,
    /// Boolean value; numeric view is 1.0 / 0.0.
    Boolean(bool),
    /// Real scalar value.
    Scalar(f64),
    /// Real vector value; scalar view is element 0.
    Vector(Arc<[f64]>),
}

impl Signal {
    pub fn invalid() -> Self {
        Self::Invalid
    }

    pub fn boolean(value: bool) -> Self {
        Self::Boolean(value)
    }

    pub fn scalar(value: f64) -> Self {
        Self::Scalar(value)
    }

    pub fn vector(values: impl Into<Arc<[f64]>>) -> Self {
        Self::Vector(values.into())
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Numeric view of the signal.
    ///
    /// Fails for an invalid signal and for an empty vector.
    pub fn value(&self) -> SfResult<f64> {
        self.value_at(0)
    }

    /// Element `index` of the numeric view.
    ///
    /// Scalars and booleans only have element 0.
    pub fn value_at(&self, index: usize) -> SfResult<f64> {
        match self {
            Self::Invalid => Err(SfError::InvalidSignal { what: "value" }),
            Self::Boolean(b) if index == 0 => Ok(if *b { 1.0 } else { 0.0 }),
            Self::Scalar(v) if index == 0 => Ok(*v),
            Self::Boolean(_) | Self::Scalar(_) => Err(SfError::IndexOob {
                what: "signal element",
                index,
                len: 1,
            }),
            Self::Vector(values) => values.get(index).copied().ok_or(SfError::IndexOob {
                what: "signal element",
                index,
                len: values.len(),
            }),
        }
    }

    /// Boolean view: numeric values at or above 0.5 are true.
    pub fn as_bool(&self) -> SfResult<bool> {
        match self {
            Self::Boolean(b) => Ok(*b),
            Self::Invalid => Err(SfError::InvalidSignal { what: "boolean" }),
            _ => Ok(self.value()? >= 0.5),
        }
    }

    /// Number of elements; 0 for an invalid signal.
    pub fn size(&self) -> usize {
        match self {
            Self::Invalid => 0,
            Self::Boolean(_) | Self::Scalar(_) => 1,
            Self::Vector(values) => values.len(),
        }
    }
}

/// Value equality: same variant and same value, or both invalid.
///
/// `Boolean(false)` and `Scalar(0.0)` are not equal.
impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Invalid, Self::Invalid) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Vector(a), Self::Vector(b)) => a[..] == b[..],
            _ => false,
        }
    }
}

impl From<bool> for Signal {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for Signal {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Signal {
    fn from(values: Vec<f64>) -> Self {
        Self::Vector(values.into())
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => f.write_str("?"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Scalar(v) => write!(f, "{v}"),
            Self::Vector(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn finite_signal() -> impl Strategy<Value = Signal> {
        prop_oneof![
            Just(Signal::invalid()),
            any::<bool>().prop_map(Signal::boolean),
            (-1e9f64..1e9).prop_map(Signal::scalar),
            prop::collection::vec(-1e9f64..1e9, 0..8).prop_map(Signal::vector),
        ]
    }

    proptest! {
        #[test]
        fn equality_is_reflexive_and_survives_clone(s in finite_signal()) {
            prop_assert_eq!(&s, &s);
            prop_assert_eq!(s.clone(), s);
        }

        #[test]
        fn value_at_is_defined_exactly_below_size(s in finite_signal(), index in 0usize..10) {
            prop_assert_eq!(s.value_at(index).is_ok(), index < s.size());
        }

        #[test]
        fn scalar_views_agree(v in -1e9f64..1e9) {
            let s = Signal::scalar(v);
            prop_assert_eq!(s.value().unwrap(), v);
            prop_assert_eq!(s.as_bool().unwrap(), v >= 0.5);
            prop_assert_eq!(Signal::vector(vec![v, 0.0]).value().unwrap(), v);
        }

        #[test]
        fn boolean_never_equals_its_numeric_view(b in any::<bool>()) {
            let numeric = Signal::boolean(b).value().unwrap();
            prop_assert_ne!(Signal::boolean(b), Signal::scalar(numeric));
        }
    }
}
