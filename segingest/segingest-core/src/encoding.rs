//! Schema and message encoding identifiers as they appear on event-log channels.

use std::fmt;

macro_rules! encoding_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
            /// Encoding without a registered identifier.
            Unknown(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)*
                    Self::Unknown(s) => s,
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                match s {
                    $($text => Self::$variant,)*
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

encoding_enum! {
    /// Encoding of a channel's schema blob.
    SchemaEncoding {
        None => "",
        Protobuf => "protobuf",
        JsonSchema => "jsonschema",
        FlatBuffer => "flatbuffer",
    }
}

encoding_enum! {
    /// Encoding of each event payload on a channel.
    MessageEncoding {
        Protobuf => "protobuf",
        Json => "json",
        FlatBuffer => "flatbuffer",
        Cbor => "cbor",
    }
}
