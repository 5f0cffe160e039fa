#[doc(hidden)]
#[macro_export]
/// A macro which defines a closed, string-backed symbol enum.
///
/// Unlike lenient enums there is no catch-all variant: only the declared
/// literals parse (exact, case-sensitive match). Serialization writes the
/// literal. Deserialization is left to the defining crate so that it goes
/// through the same entry point as every other external string.
macro_rules! __enum_builder {
    (
        $(#[$m:meta])*
        @String
        $enum_vis:vis enum $enum_name:ident
        { $( $(#[$enum_meta:meta])* $enum_var:ident => $enum_val:literal ),* $(,)? }
    ) => {
        $(#[$m])*
        #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
        $enum_vis enum $enum_name {
            $(
                $(#[$enum_meta])*
                $enum_var
            ),*
        }

        impl $enum_name {
            /// All variants, in declaration order.
            $enum_vis const ALL: &'static [Self] = &[$($enum_name::$enum_var),*];

            /// The literal symbols of all variants, in declaration order.
            $enum_vis const SYMBOLS: &'static [&'static str] = &[$($enum_val),*];

            /// The literal symbol of this variant.
            #[must_use]
            $enum_vis const fn as_str(self) -> &'static str {
                match self {
                    $( $enum_name::$enum_var => $enum_val ),*
                }
            }

            /// Parse the exact literal symbol, returning `None` for anything else.
            #[must_use]
            $enum_vis fn strict_parse(s: &str) -> Option<Self> {
                match s {
                    $( $enum_val => Some($enum_name::$enum_var), )*
                    _ => None,
                }
            }
        }

        impl AsRef<str> for $enum_name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $crate::macros::enums::__SerdeSerialize for $enum_name {
            #[inline]
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: $crate::macros::enums::__SerdeSerializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

#[doc(inline)]
pub use crate::__enum_builder as enum_builder;

#[doc(hidden)]
pub use serde::{Serialize as __SerdeSerialize, Serializer as __SerdeSerializer};
