//! Identifiers used across the resolution workflow.
//!
//! All identifiers are thin wrappers around `String` so they serialize as
//! plain JSON strings and can be supplied by callers verbatim.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an existing string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a new random identifier (UUID v4).
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier of a resolution task.
    TaskId
);

string_id!(
    /// Unique identifier of a coordination session.
    SessionId
);

string_id!(
    /// Unique identifier of a coordination barrier.
    BarrierId
);

string_id!(
    /// Unique identifier of a generated strategy.
    StrategyId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = TaskId::generate();
        let b = TaskId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = SessionId::new("session-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"session-1\"");
        let back: SessionId = serde_json::from_str("\"session-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut ids = vec![TaskId::from("b"), TaskId::from("a"), TaskId::from("c")];
        ids.sort();
        assert_eq!(ids, vec!["a".into(), "b".into(), "c".into()]);
    }
}
