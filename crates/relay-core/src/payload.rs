//! Opaque payload value type.
//!
//! A [`Payload`] is an immutable byte sequence. Every constructor either
//! copies the caller's bytes or takes ownership of them, so nothing the caller
//! still holds can alias a stored payload. Clones share the same immutable
//! buffer, which gives value semantics without copying on every dispatch.

use std::{fmt, ops::Deref};

use bytes::Bytes;

/// Immutable, opaque byte sequence exchanged over a connection.
///
/// No text encoding is assumed. Empty payloads and payloads containing null
/// or high bytes are valid and are delivered unchanged.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Payload(Bytes);

impl Payload {
    /// Create a payload by copying `data`.
    ///
    /// Later mutation of `data` by the caller has no effect on the payload.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }

    /// Borrow the payload contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of bytes in the payload.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the payload and return the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for Payload {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&[u8]> for Payload {
    fn from(data: &[u8]) -> Self {
        Self::copy_from_slice(data)
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(data: &[u8; N]) -> Self {
        Self::copy_from_slice(data)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl PartialEq<[u8]> for Payload {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for Payload {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_bytes() == other.as_slice()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({:?})", self.0)
    }
}

/// Lowercase hex, used when payloads show up in logs.
impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_is_independent_of_source() {
        let mut source = b"alpha".to_vec();
        let payload = Payload::copy_from_slice(&source);

        source[0] = b'X';
        source.push(b'!');

        assert_eq!(payload.as_bytes(), b"alpha");
    }

    #[test]
    fn binary_content_is_preserved() {
        let payload = Payload::from(b"\x00\xff\x10z");
        assert_eq!(payload.len(), 4);
        assert_eq!(payload, b"\x00\xff\x10z");
    }

    #[test]
    fn empty_payload_is_valid() {
        let payload = Payload::from(Vec::new());
        assert!(payload.is_empty());
        assert_eq!(payload, Payload::default());
    }

    #[test]
    fn display_renders_hex() {
        let payload = Payload::from(b"\x00\xffz");
        assert_eq!(payload.to_string(), "00ff7a");
    }

    #[test]
    fn debug_shows_escaped_bytes() {
        let payload = Payload::from(b"a\x00");
        assert_eq!(format!("{payload:?}"), r#"Payload(b"a\x00")"#);
    }

    #[test]
    fn clones_compare_equal() {
        let payload = Payload::from(b"beta\x00gamma");
        let clone = payload.clone();
        assert_eq!(payload, clone);
        assert_eq!(clone.into_bytes(), Bytes::from_static(b"beta\x00gamma"));
    }
}
