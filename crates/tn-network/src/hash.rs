//! Content hashing primitives
//!
//! Provides [`ContentHash`], the 32-byte digest used for network checksums,
//! and [`RecordHasher`], an incremental hasher for individual layer records.

use std::fmt;

/// Blake3 digest of network content
///
/// Two networks with equal layer content have equal checksums whatever
/// their derived indexes look like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Wrap raw digest bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Digest of a byte string
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Leading 16 hex digits, for log lines
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl serde::Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Incremental hasher for one layer record
///
/// Every field is written with a fixed width or a length prefix so that
/// adjacent fields can never be confused with each other.
#[derive(Debug, Clone)]
pub struct RecordHasher {
    inner: blake3::Hasher,
}

impl RecordHasher {
    /// Start a record of the given kind (domain separation tag)
    #[must_use]
    pub fn new(kind: &str) -> Self {
        let mut inner = blake3::Hasher::new();
        inner.update(&(kind.len() as u64).to_le_bytes());
        inner.update(kind.as_bytes());
        Self { inner }
    }

    /// Write an unsigned 32-bit field
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.inner.update(&value.to_le_bytes());
        self
    }

    /// Write a signed 32-bit field
    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.inner.update(&value.to_le_bytes());
        self
    }

    /// Write an unsigned 64-bit field
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(&value.to_le_bytes());
        self
    }

    /// Write a boolean field
    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.inner.update(&[u8::from(value)]);
        self
    }

    /// Write a length-prefixed string field
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.inner.update(&(value.len() as u64).to_le_bytes());
        self.inner.update(value.as_bytes());
        self
    }

    /// Write a length-prefixed sequence of unsigned 32-bit values
    pub fn u32_seq(&mut self, values: &[u32]) -> &mut Self {
        self.inner.update(&(values.len() as u64).to_le_bytes());
        for value in values {
            self.inner.update(&value.to_le_bytes());
        }
        self
    }

    /// Finish the record
    #[must_use]
    pub fn finish(&self) -> ContentHash {
        ContentHash::new(*self.inner.finalize().as_bytes())
    }
}
