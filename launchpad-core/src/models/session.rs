//! Chat session identifiers.
//!
//! A session id binds a client-visible conversation to the server-side
//! transcript. It is derived from `(user id, startup id)` so the same user
//! chatting about the same startup always resumes the same transcript, across
//! reloads and without a server round-trip.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the two escaped components.
const SEPARATOR: char = ':';

/// Escapes `%` and the separator so the join stays injective.
fn escape_component(raw: &str, out: &mut String) {
    for c in raw.chars() {
        match c {
            '%' => out.push_str("%25"),
            SEPARATOR => out.push_str("%3A"),
            other => out.push(other),
        }
    }
}

/// Derives the session id for a user talking about a resource.
///
/// Pure and total. Distinct `(user_id, resource_id)` pairs never collide:
/// both components are escaped so the separator can only appear once, and
/// the escaping is reversible. Ids without `%` or `:` read back verbatim,
/// e.g. `user-1:startup-9`.
pub fn derive_session_id(user_id: &str, resource_id: &str) -> String {
    let mut id = String::with_capacity(user_id.len() + resource_id.len() + 1);
    escape_component(user_id, &mut id);
    id.push(SEPARATOR);
    escape_component(resource_id, &mut id);
    id
}

/// A chat conversation about one startup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    /// Deterministic session id.
    pub session_id: String,
    /// The startup the conversation is about.
    pub startup_id: String,
}

impl ChatSession {
    /// Creates the session for `user_id` chatting about `startup_id`.
    pub fn new(user_id: &str, startup_id: impl Into<String>) -> Self {
        let startup_id = startup_id.into();
        Self {
            session_id: derive_session_id(user_id, &startup_id),
            startup_id,
        }
    }
}

impl fmt::Display for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(
            derive_session_id("user-1", "startup-9"),
            derive_session_id("user-1", "startup-9")
        );
        assert_eq!(derive_session_id("user-1", "startup-9"), "user-1:startup-9");
    }

    #[test]
    fn test_distinct_users_differ() {
        assert_ne!(
            derive_session_id("alice", "s1"),
            derive_session_id("bob", "s1")
        );
    }

    #[test]
    fn test_separator_in_ids_does_not_collide() {
        // Naive "{u}:{r}" would map both of these to "a:b:c"
        let left = derive_session_id("a:b", "c");
        let right = derive_session_id("a", "b:c");
        assert_ne!(left, right);
    }

    #[test]
    fn test_escape_sequences_do_not_collide() {
        let literal = derive_session_id("a%3A", "b");
        let escaped = derive_session_id("a:", "b");
        assert_ne!(literal, escaped);
    }

    #[test]
    fn test_empty_components() {
        assert_eq!(derive_session_id("", ""), ":");
        assert_ne!(derive_session_id("", "x"), derive_session_id("x", ""));
    }

    #[test]
    fn test_chat_session() {
        let session = ChatSession::new("u1", "s1");
        assert_eq!(session.startup_id, "s1");
        assert_eq!(session.session_id, derive_session_id("u1", "s1"));
        assert_eq!(session.to_string(), "u1:s1");
    }
}
