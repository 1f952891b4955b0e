//! Structural cache keys.
//!
//! A [`QueryKey`] is an ordered tuple `(domain, ...params)` identifying one
//! cached read. Keys compare structurally, so two independently built keys
//! with the same parts address the same cache entry. Invalidation works on
//! prefixes: `(notifications)` matches `(notifications, true)` and
//! `(notifications, "unread-count")`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Key Part
// ============================================================================

/// One component of a query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    /// Boolean flag (e.g. `unread_only`).
    Bool(bool),
    /// Integer parameter (e.g. a page number).
    Int(i64),
    /// String parameter (domain names, resource ids).
    Str(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

// ============================================================================
// Query Key
// ============================================================================

/// Ordered, hashable identifier for a cached read.
///
/// Never empty: every key has at least its domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeyPart>", into = "Vec<KeyPart>")]
pub struct QueryKey(Vec<KeyPart>);

/// A key used as a pattern matching every key that starts with it.
pub type QueryKeyPrefix = QueryKey;

impl QueryKey {
    /// Creates a key containing only a domain.
    pub fn new(domain: impl Into<String>) -> Self {
        Self(vec![KeyPart::Str(domain.into())])
    }

    /// Appends a parameter, builder style.
    #[must_use]
    pub fn with(mut self, part: impl Into<KeyPart>) -> Self {
        self.0.push(part.into());
        self
    }

    /// Builds a key from raw parts. Returns `None` for an empty part list.
    pub fn from_parts(parts: Vec<KeyPart>) -> Option<Self> {
        if parts.is_empty() { None } else { Some(Self(parts)) }
    }

    /// Returns the domain (first component) of the key.
    pub fn domain(&self) -> &KeyPart {
        &self.0[0]
    }

    /// Returns the parameters following the domain.
    pub fn params(&self) -> &[KeyPart] {
        &self.0[1..]
    }

    /// Returns all components, domain included.
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Number of components, domain included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; a key has at least its domain.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `prefix` is a component-wise prefix of this key.
    ///
    /// Every key is a prefix of itself.
    pub fn starts_with(&self, prefix: &QueryKeyPrefix) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Returns true if this key matches any of the given prefixes.
    pub fn matches_any<'a>(&self, prefixes: impl IntoIterator<Item = &'a QueryKeyPrefix>) -> bool {
        prefixes.into_iter().any(|p| self.starts_with(p))
    }
}

impl TryFrom<Vec<KeyPart>> for QueryKey {
    type Error = CoreError;

    fn try_from(parts: Vec<KeyPart>) -> Result<Self, Self::Error> {
        Self::from_parts(parts).ok_or_else(|| CoreError::InvalidKey("key has no domain".into()))
    }
}

impl From<QueryKey> for Vec<KeyPart> {
    fn from(key: QueryKey) -> Self {
        key.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Domains
// ============================================================================

/// Resource collections fetched by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Startups owned by the current user.
    Startups,
    /// Analyses run against a startup.
    Analyses,
    /// Follow-up questions generated for a startup.
    Questions,
    /// User notifications.
    Notifications,
}

impl Domain {
    /// Returns the key-part name for this domain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Startups => "startups",
            Self::Analyses => "analyses",
            Self::Questions => "questions",
            Self::Notifications => "notifications",
        }
    }

    /// Returns all domains.
    pub fn all() -> &'static [Domain] {
        &[
            Self::Startups,
            Self::Analyses,
            Self::Questions,
            Self::Notifications,
        ]
    }

    /// Returns the prefix key covering every read in this domain.
    pub fn key(&self) -> QueryKey {
        QueryKey::new(self.as_str())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Domain> for QueryKey {
    fn from(domain: Domain) -> Self {
        domain.key()
    }
}

/// Key constructors for the application's reads.
///
/// Keeping these in one place means mutations and reads agree on key shapes.
pub mod keys {
    use super::{Domain, QueryKey};

    /// All startups for the current user.
    pub fn startups() -> QueryKey {
        Domain::Startups.key().with("list")
    }

    /// A single startup.
    pub fn startup(id: &str) -> QueryKey {
        Domain::Startups.key().with("detail").with(id)
    }

    /// Every cached read about one startup's analyses.
    pub fn analyses(startup_id: &str) -> QueryKey {
        Domain::Analyses.key().with(startup_id)
    }

    /// Every cached read about one startup's questions.
    pub fn questions(startup_id: &str) -> QueryKey {
        Domain::Questions.key().with(startup_id)
    }

    /// Notification list, optionally filtered to unread ones.
    pub fn notifications(unread_only: bool) -> QueryKey {
        Domain::Notifications.key().with("list").with(unread_only)
    }

    /// Unread notification counter.
    pub fn unread_count() -> QueryKey {
        Domain::Notifications.key().with("unread-count")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_structural_equality() {
        let a = QueryKey::new("notifications").with(true);
        let b = QueryKey::new("notifications").with(true);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_part_types_are_distinct() {
        let s = QueryKey::new("x").with("1");
        let i = QueryKey::new("x").with(1i64);
        assert_ne!(s, i);
    }

    #[test]
    fn test_prefix_matching() {
        let prefix = Domain::Notifications.key();
        assert!(keys::unread_count().starts_with(&prefix));
        assert!(keys::notifications(true).starts_with(&prefix));
        assert!(!keys::startups().starts_with(&prefix));

        // A key is a prefix of itself
        assert!(keys::unread_count().starts_with(&keys::unread_count()));

        // Longer keys are never prefixes of shorter ones
        assert!(!prefix.starts_with(&keys::unread_count()));
    }

    #[test]
    fn test_prefix_is_component_wise() {
        let a = keys::analyses("abc");
        let ab = keys::analyses("abcd");
        assert!(!ab.starts_with(&a));
    }

    #[test]
    fn test_matches_any() {
        let prefixes = [keys::analyses("s1"), Domain::Notifications.key()];
        assert!(keys::analyses("s1").with("latest").matches_any(&prefixes));
        assert!(keys::unread_count().matches_any(&prefixes));
        assert!(!keys::analyses("s2").matches_any(&prefixes));
    }

    #[test]
    fn test_display() {
        assert_eq!(keys::notifications(false).to_string(), "notifications/list/false");
        assert_eq!(keys::startup("s1").to_string(), "startups/detail/s1");
    }

    #[test]
    fn test_from_parts_rejects_empty() {
        assert!(QueryKey::from_parts(Vec::new()).is_none());
        let key = QueryKey::from_parts(vec!["a".into(), 2i64.into()]).unwrap();
        assert_eq!(key.domain(), &KeyPart::from("a"));
        assert_eq!(key.params(), &[KeyPart::Int(2)]);
    }

    #[test]
    fn test_serializes_as_array() {
        let json = serde_json::to_string(&keys::notifications(true)).unwrap();
        assert_eq!(json, r#"["notifications","list",true]"#);

        let back: QueryKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, keys::notifications(true));
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        let err = serde_json::from_str::<QueryKey>("[]").unwrap_err();
        assert!(err.to_string().contains("Invalid query key"));
        assert!(serde_json::from_str::<QueryKeyPrefix>(r#"["startups"]"#).is_ok());
    }
}
