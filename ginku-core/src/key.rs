//! Cache key types and construction.
//!
//! This module provides types for building and representing cache keys:
//!
//! - [`CacheKey`] - The complete cache key with an operation prefix and parts
//! - [`KeyPart`] - A single key-value component of a cache key
//! - [`KeyParts`] - Builder for accumulating key parts in a fixed order
//!
//! ## Format
//!
//! When rendered as a string, keys follow this format:
//! `{prefix}:key1=value1&key2=value2`
//!
//! - The `:` separator is omitted when there are no parts
//! - Parts are rendered in insertion order, which makes keys deterministic
//!
//! ```
//! use ginku_core::{CacheKey, KeyPart};
//!
//! let key = CacheKey::new("getTempsLieu", vec![
//!     KeyPart::new("nom", Some("Gare")),
//!     KeyPart::new("nb", Some("3")),
//! ]);
//! assert_eq!(key.to_string(), "getTempsLieu:nom=Gare&nb=3");
//!
//! let key = CacheKey::new("getLignes", Vec::new());
//! assert_eq!(key.to_string(), "getLignes");
//! ```
//!
//! Equality and hashing are structural: two keys are equal when prefix and
//! parts are equal, independently of how values would render.
//!
//! [`CacheKey`] uses `Arc` internally, so cloning a key only increments a
//! reference count. [`KeyPart`] uses [`SmolStr`], which stores short strings
//! inline.

use smol_str::SmolStr;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, Eq, PartialEq, Hash)]
struct CacheKeyInner {
    prefix: SmolStr,
    parts: Vec<KeyPart>,
}

/// A cache key identifying one upstream operation with its parameters.
///
/// # Example
///
/// ```
/// use ginku_core::{CacheKey, KeyPart};
///
/// let key = CacheKey::new(
///     "getDetailsVariante",
///     vec![
///         KeyPart::new("idLigne", Some("3")),
///         KeyPart::new("idVariante", Some("1")),
///     ],
/// );
///
/// assert_eq!(key.prefix(), "getDetailsVariante");
/// assert_eq!(key.parts().count(), 2);
/// assert_eq!(key.to_string(), "getDetailsVariante:idLigne=3&idVariante=1");
/// ```
#[derive(Clone, Debug)]
pub struct CacheKey {
    inner: Arc<CacheKeyInner>,
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner == other.inner
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.prefix)?;
        for (i, part) in self.inner.parts.iter().enumerate() {
            let separator = if i == 0 { ":" } else { "&" };
            write!(f, "{separator}{part}")?;
        }
        Ok(())
    }
}

impl CacheKey {
    /// Creates a new cache key from an operation prefix and its parts.
    pub fn new(prefix: impl Into<SmolStr>, parts: Vec<KeyPart>) -> Self {
        CacheKey {
            inner: Arc::new(CacheKeyInner {
                prefix: prefix.into(),
                parts,
            }),
        }
    }

    /// Starts a [`KeyParts`] builder for the given operation prefix.
    pub fn builder(prefix: impl Into<SmolStr>) -> KeyParts {
        KeyParts::new(prefix)
    }

    /// Returns the operation prefix.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Returns an iterator over the key parts, in insertion order.
    pub fn parts(&self) -> impl Iterator<Item = &KeyPart> {
        self.inner.parts.iter()
    }
}

impl From<&str> for CacheKey {
    fn from(prefix: &str) -> Self {
        CacheKey::new(prefix, Vec::new())
    }
}

/// A single component of a cache key.
///
/// The value is optional; a part without a value acts as a flag.
///
/// ```
/// use ginku_core::KeyPart;
///
/// let num = KeyPart::new("num", Some("412"));
/// assert_eq!(num.key(), "num");
/// assert_eq!(num.value(), Some("412"));
/// assert_eq!(num.to_string(), "num=412");
///
/// let flag = KeyPart::new("realtime", None::<&str>);
/// assert_eq!(flag.to_string(), "realtime");
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct KeyPart {
    key: SmolStr,
    value: Option<SmolStr>,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)?;
        if let Some(ref value) = self.value {
            write!(f, "={}", value)?;
        }
        Ok(())
    }
}

impl KeyPart {
    /// Creates a new key part.
    pub fn new<K: AsRef<str>, V: AsRef<str>>(key: K, value: Option<V>) -> Self {
        KeyPart {
            key: SmolStr::new(key),
            value: value.map(SmolStr::new),
        }
    }

    /// Returns the key name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the optional value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Builder for accumulating cache key parts.
///
/// Parts keep the order in which they are pushed, so an operation that always
/// pushes its parameters in the same order always produces the same key.
///
/// ```
/// use ginku_core::CacheKey;
///
/// let key = CacheKey::builder("getDetailsVehicule")
///     .part("num", "412")
///     .into_cache_key();
/// assert_eq!(key.to_string(), "getDetailsVehicule:num=412");
/// ```
#[derive(Debug, Clone)]
pub struct KeyParts {
    prefix: SmolStr,
    parts: Vec<KeyPart>,
}

impl KeyParts {
    /// Creates an empty builder for the given prefix.
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        KeyParts {
            prefix: prefix.into(),
            parts: Vec::new(),
        }
    }

    /// Adds a key-value part.
    pub fn part(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.parts.push(KeyPart::new(key, Some(value)));
        self
    }

    /// Consumes the builder and returns the cache key.
    pub fn into_cache_key(self) -> CacheKey {
        CacheKey::new(self.prefix, self.parts)
    }
}
