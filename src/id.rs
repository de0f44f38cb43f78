use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use uuid::Uuid;

/// Key kinds an activity can be addressed by.
///
/// The host runtime supports three key shapes: 64-bit integers, UUIDs and
/// strings. Everything else in the crate is generic over the key, so a single
/// `ActivityId<K>` covers all three instead of one type family per kind.
pub trait ActivityKey:
    Clone + fmt::Debug + fmt::Display + Eq + Hash + Send + Sync + 'static
{
}

impl ActivityKey for i64 {}
impl ActivityKey for Uuid {}
impl ActivityKey for String {}

/// The logical identity of an activity.
///
/// Immutable once resolved; the host guarantees the same key names the same
/// logical activity across re-activations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId<K: ActivityKey>(K);

impl<K: ActivityKey> ActivityId<K> {
    pub fn new(key: K) -> Self {
        Self(key)
    }

    /// Get the underlying key
    pub fn key(&self) -> &K {
        &self.0
    }

    pub fn into_key(self) -> K {
        self.0
    }
}

impl ActivityId<Uuid> {
    /// Generate a new random UUID-keyed identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a UUID-keyed identity from a string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl<K: ActivityKey> From<K> for ActivityId<K> {
    fn from(key: K) -> Self {
        Self(key)
    }
}

impl<K: ActivityKey> fmt::Display for ActivityId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let id1 = ActivityId::generate();
        let id2 = ActivityId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_parse_and_display() {
        let id = ActivityId::generate();
        let id_str = id.to_string();
        let parsed = ActivityId::parse(&id_str).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_key_kinds() {
        let long: ActivityId<i64> = ActivityId::new(42);
        assert_eq!(long.to_string(), "42");
        assert_eq!(*long.key(), 42);

        let text: ActivityId<String> = "orders-7".to_string().into();
        assert_eq!(text.to_string(), "orders-7");
        assert_eq!(text.into_key(), "orders-7");
    }

    #[test]
    fn test_serialization() {
        let id: ActivityId<i64> = ActivityId::new(7);
        let serialized = serde_json::to_string(&id).unwrap();
        let deserialized: ActivityId<i64> = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);
    }
}
