/// Declares a BACnet enumeration from a single name-to-number list.
///
/// With a trailing `else Variant` the enum is total: numbers missing from
/// the list are kept in that variant. Without it, the `from` conversion
/// returns `None` for them.
macro_rules! numbered_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($repr:ty, $to:ident, $from:ident) {
            $($variant:ident = $value:literal,)+
        } else $other:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis enum $name {
            $($variant,)+
            $other($repr),
        }

        impl $name {
            pub const fn $to(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)+
                    Self::$other(v) => v,
                }
            }

            pub const fn $from(value: $repr) -> Self {
                match value {
                    $($value => Self::$variant,)+
                    v => Self::$other(v),
                }
            }
        }
    };
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident($repr:ty, $to:ident, $from:ident) {
            $($variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis enum $name {
            $($variant,)+
        }

        impl $name {
            pub const fn $to(self) -> $repr {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            pub const fn $from(value: $repr) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}
