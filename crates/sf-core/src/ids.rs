use core::fmt;
use core::num::NonZeroU32;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident, $tag:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Create an id from a 0-based index by storing index+1.
            ///
            /// Panics if `index == u32::MAX`.
            pub fn from_index(index: u32) -> Self {
                match index.checked_add(1).and_then(NonZeroU32::new) {
                    Some(raw) => Self(raw),
                    None => panic!("{} index overflow", $tag),
                }
            }

            /// Recover the 0-based index.
            pub fn index(self) -> u32 {
                self.0.get() - 1
            }

            /// The 0-based index as a `usize`, for arena lookups.
            pub fn slot(self) -> usize {
                self.index() as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $tag, self.index())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $tag, self.index())
            }
        }
    };
}

typed_id!(
    /// Identity of one module instance in an application.
    ///
    /// Two modules with identical configuration still get distinct ids.
    ModuleId,
    "Module"
);

typed_id!(
    /// A naming scope; the root scope is created first and has index 0.
    ScopeId,
    "Scope"
);

typed_id!(
    /// A declared signal, i.e. the identity that producer and consumer ports meet on.
    SignalId,
    "Signal"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            assert_eq!(ModuleId::from_index(i).index(), i);
            assert_eq!(SignalId::from_index(i).slot(), i as usize);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<ModuleId>(),
            core::mem::size_of::<Option<ModuleId>>()
        );
    }

    #[test]
    fn display_names_the_kind() {
        assert_eq!(ModuleId::from_index(3).to_string(), "Module#3");
        assert_eq!(format!("{:?}", ScopeId::from_index(0)), "Scope(0)");
    }

    #[test]
    #[should_panic]
    fn max_index_overflows() {
        let _ = SignalId::from_index(u32::MAX);
    }
}
