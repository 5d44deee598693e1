use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Raw id as it may appear in upstream JSON: either a small integer or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(value) => value.to_string(),
            RawId::Text(value) => value.trim().to_string(),
        }
    }
}

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(String::from(raw)))
            }
        }
    };
}

opaque_id!(
    /// Task identifier. Upstream data may use integers or strings; both are
    /// kept as text and compared as opaque tokens, never numerically.
    TaskId
);

opaque_id!(
    /// Resource identifier, same representation rules as [`TaskId`].
    ResourceId
);

opaque_id!(
    /// Identifier handed back by the remote project-hosting service.
    RemoteProjectId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_and_string_ids_compare_equal() {
        let from_int: TaskId = serde_json::from_str("7").unwrap();
        let from_text: TaskId = serde_json::from_str("\" 7 \"").unwrap();
        assert_eq!(from_int, from_text);
        assert_eq!(from_int, TaskId::from(7));
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ResourceId::from(3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"3\"");
    }

    #[test]
    fn ordering_is_textual_not_numeric() {
        assert!(TaskId::from("10") < TaskId::from("9"));
    }
}
