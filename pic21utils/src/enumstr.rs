//!
//! # Enum-String Mapping
//!
//! Many layout parameters arrive as one of a fixed set of strings:
//! cardinal directions (`"NORTH"`), resist tones (`"+"`), fabrication types (`"ETCH"`),
//! boolean operations (`"xor"`). The [enumstr] macro pairs each such set with an enum,
//! implementing [EnumStr], [std::fmt::Display], and serde support through the same strings.
//!
//! ```rust
//! use pic21utils::{enumstr, EnumStr};
//!
//! enumstr!(
//!     /// Resist Tone
//!     Tone {
//!         Positive: "+",
//!         Negative: "-",
//!     }
//! );
//! assert_eq!(Tone::from_str("+"), Some(Tone::Positive));
//! assert_eq!(Tone::Negative.to_str(), "-");
//! ```
//!

///
/// # String-Enumeration Trait
///
/// * `to_str` converts a variant to its string value.
/// * `from_str` does the opposite, returning `None` for unknown strings.
///
pub trait EnumStr: std::marker::Sized {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
}

///
/// # Enum-String Pairing Macro
///
/// Creates a fieldless `enum` whose variants are each paired with a string,
/// and which (de)serializes as those strings.
/// Invoking crates must depend on `serde` (with its `derive` feature).
///
#[macro_export]
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, ::serde::Deserialize, ::serde::Serialize, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $( #[doc=$strval]
               #[serde(rename = $strval)]
               $variant ),*
        }
        impl $crate::EnumStr for $enum_name {
            /// Convert to the paired string value
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            /// Create from a string value. Case sensitive.
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", $crate::EnumStr::to_str(self))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enumstr!(
        /// # Fabrication Types
        Fab {
            Etch: "ETCH",
            Liftoff: "LIFTOFF",
        }
    );

    #[test]
    fn enumstr_conversions() {
        assert_eq!(Fab::Etch.to_str(), "ETCH");
        assert_eq!(Fab::from_str("LIFTOFF"), Some(Fab::Liftoff));
        assert_eq!(Fab::from_str("etch"), None);
        assert_eq!(format!("{}", Fab::Liftoff), "LIFTOFF");
    }
    #[test]
    fn enumstr_serde() {
        let s = serde_json::to_string(&Fab::Etch).unwrap();
        assert_eq!(s, "\"ETCH\"");
        let f: Fab = serde_json::from_str("\"LIFTOFF\"").unwrap();
        assert_eq!(f, Fab::Liftoff);
    }
}
