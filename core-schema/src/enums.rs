//! Case-insensitive string enums.
//!
//! Native layers spell the same value differently (`STOPS_AND_EXITS`,
//! `stopsAndExits`, `stops-and-exits`), so matching happens on a normalized
//! token. Each enum declares its own fallback: enums that describe
//! server-delivered data fail closed to a safe variant, enums without a
//! fallback reject unknown input.

/// Matching key for enum tokens: lowercase, with `_`, `-`, `.` and
/// whitespace removed.
pub fn normalize_token(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-' | '.') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! string_enum {
    (@fallback $name:ident) => {
        ::std::option::Option::None
    };
    (@fallback $name:ident $fallback:ident) => {
        ::std::option::Option::Some($name::$fallback)
    };
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal $(| $alias:literal)*
            ),+ $(,)?
        }
        $(fallback = $fallback:ident;)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Variant substituted for unrecognized input, if this enum has one.
            pub const FALLBACK: Option<$name> = string_enum!(@fallback $name $($fallback)?);

            /// Canonical wire spelling.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Exact match against the table; `None` when unrecognized.
            pub fn lookup(raw: &str) -> Option<Self> {
                let token = $crate::enums::normalize_token(raw);
                $(
                    if token == $crate::enums::normalize_token($wire)
                        $(|| token == $crate::enums::normalize_token($alias))*
                    {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            /// Match against the table, substituting [`Self::FALLBACK`] for
            /// unrecognized input.
            pub fn from_wire(raw: &str) -> Option<Self> {
                if let Some(variant) = Self::lookup(raw) {
                    return Some(variant);
                }
                if let Some(fallback) = Self::FALLBACK {
                    tracing::warn!(
                        kind = stringify!($name),
                        value = raw,
                        fallback = fallback.as_str(),
                        "Unrecognized enum value, using fallback"
                    );
                }
                Self::FALLBACK
            }

            $(
                pub fn parse(raw: &str) -> Self {
                    Self::from_wire(raw).unwrap_or($name::$fallback)
                }
            )?
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let raw = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::from_wire(&raw).ok_or_else(|| {
                    <D::Error as ::serde::de::Error>::custom(format!(
                        "unknown {} value `{}`",
                        stringify!($name),
                        raw
                    ))
                })
            }
        }
    };
}

pub(crate) use string_enum;
