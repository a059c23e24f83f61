use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

/// Opaque byte key. Ordering is defined by the tree's [`KeyComparator`], never by
/// the derived traits.
#[derive(Clone, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Key(#[serde(with = "hex")] Vec<u8>);

impl Key {
    /// Wraps raw bytes as a key.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Key {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Key {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<&[u8]> for Key {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&KeyDisplay(&self.0), f)
    }
}

/// Renders raw key bytes as a quoted string when printable, hex otherwise.
#[derive(Clone, Copy)]
pub struct KeyDisplay<'a>(pub &'a [u8]);

impl fmt::Display for KeyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.0) {
            Ok(text) if text.chars().all(|c| !c.is_control()) => write!(f, "{text:?}"),
            _ => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

/// Three-way comparison over opaque keys.
///
/// Must be a strict total order and must be the same comparator the tree was
/// built with; every ordering and bound check in the verifier goes through it.
pub trait KeyComparator: Send + Sync {
    /// Compares `a` against `b`.
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// Lexicographic byte order, the default comparator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bytewise;

impl KeyComparator for Bytewise {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }
}

/// Adapts a closure into a [`KeyComparator`].
#[derive(Clone, Copy)]
pub struct CompareFn<F>(pub F);

impl<F> KeyComparator for CompareFn<F>
where
    F: Fn(&[u8], &[u8]) -> Ordering + Send + Sync,
{
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        (self.0)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytewise_orders_prefix_first() {
        let cmp = Bytewise;
        assert_eq!(cmp.compare(b"a", b"ab"), Ordering::Less);
        assert_eq!(cmp.compare(b"b", b"ab"), Ordering::Greater);
        assert_eq!(cmp.compare(b"m", b"m"), Ordering::Equal);
    }

    #[test]
    fn closure_comparator_is_used_verbatim() {
        let reverse = CompareFn(|a: &[u8], b: &[u8]| b.cmp(a));
        assert_eq!(reverse.compare(b"a", b"z"), Ordering::Greater);
    }

    #[test]
    fn key_serializes_as_hex() {
        let json = serde_json::to_string(&Key::from("mz")).expect("serialize");
        assert_eq!(json, "\"6d7a\"");
        let back: Key = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.as_bytes(), b"mz");
    }

    #[test]
    fn display_falls_back_to_hex() {
        assert_eq!(Key::from("k").to_string(), "\"k\"");
        assert_eq!(Key::new(vec![0u8, 1]).to_string(), "0x0001");
    }
}
