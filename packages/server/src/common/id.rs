//! Typed string keys for compile-time type safety.
//!
//! Identifiers in this system arrive from the outside as opaque strings
//! (`"p1"`, a content uid, a moderation record id), so `Key<T>` wraps a
//! `String` instead of a `Uuid`. The marker type `T` keeps a publication key
//! from being passed where a content key was expected.
//!
//! # Example
//!
//! ```rust
//! use blog_core::common::{ContentId, PublicationId};
//!
//! let pub_id = PublicationId::from("p1");
//! let content_id = ContentId::generate();
//!
//! // This would be a compile error:
//! // let wrong: ContentId = pub_id;
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::convert::Infallible;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed wrapper around an opaque string identifier.
#[repr(transparent)]
pub struct Key<T>(String, PhantomData<fn() -> T>);

// ============================================================================
// Core implementations
// ============================================================================

impl<T> Key<T> {
    #[inline]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into(), PhantomData)
    }

    /// Mints a fresh key from a time-ordered UUID (v7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string(), PhantomData)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

// ============================================================================
// Standard trait implementations
// ============================================================================

impl<T> Clone for Key<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone(), PhantomData)
    }
}

impl<T> Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_name = std::any::type_name::<T>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        f.debug_tuple(&format!("Key<{}>", short))
            .field(&self.0)
            .finish()
    }
}

impl<T> Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<T> PartialEq for Key<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Key<T> {}

impl<T> PartialOrd for Key<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Key<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Key<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> AsRef<str> for Key<T> {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<T> Borrow<str> for Key<T> {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<T> From<&str> for Key<T> {
    #[inline]
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T> From<String> for Key<T> {
    #[inline]
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<T> FromStr for Key<T> {
    type Err = Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ============================================================================
// Serde support
// ============================================================================

impl<T> Serialize for Key<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Key<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Post;
    struct Author;

    type PostKey = Key<Post>;

    #[test]
    fn test_generate_creates_unique_keys() {
        assert_ne!(PostKey::generate(), PostKey::generate());
    }

    #[test]
    fn test_display_is_raw_value() {
        let key = PostKey::from("p1");
        assert_eq!(key.to_string(), "p1");
        assert_eq!(key.as_str(), "p1");
    }

    #[test]
    fn test_serde_is_transparent() {
        let key = PostKey::from("p1");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"p1\"");
        let parsed: PostKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_hash_map_lookup_by_str() {
        use std::collections::HashMap;
        let mut map: HashMap<PostKey, &str> = HashMap::new();
        map.insert(PostKey::from("p1"), "draft");
        assert_eq!(map.get("p1"), Some(&"draft"));
    }

    #[test]
    fn test_debug_includes_type_name() {
        let key: Key<Author> = Key::from("a1");
        let debug = format!("{:?}", key);
        assert!(debug.contains("Author"));
        assert!(debug.contains("a1"));
    }
}
