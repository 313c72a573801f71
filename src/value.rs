use std::fmt;

/// Whether a field value may be modified by downstream code.
///
/// The flag travels with every value through every sanitization step: a
/// frozen input always produces a frozen output, so a handler that relied on
/// a value being shared and immutable keeps that guarantee after
/// sanitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mutability {
    /// Downstream code owns the value and may change it.
    #[default]
    Mutable,
    /// The value is shared and must not be changed.
    Frozen,
}

/// A textual request field: raw bytes plus a mutability flag.
///
/// Request fields arrive as untrusted bytes. Nothing about their encoding is
/// assumed until a [`Sanitizer`](crate::Sanitizer) has processed them, after
/// which the bytes are guaranteed to be valid UTF-8.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::{FieldValue, Mutability};
///
/// let value = FieldValue::frozen(b"/search".to_vec());
/// assert_eq!(value.mutability(), Mutability::Frozen);
/// assert_eq!(value.as_str(), Some("/search"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct FieldValue {
    bytes: Vec<u8>,
    mutability: Mutability,
}

impl FieldValue {
    /// Wraps raw bytes as a mutable value.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            mutability: Mutability::Mutable,
        }
    }

    /// Wraps raw bytes as a frozen value.
    pub fn frozen(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            mutability: Mutability::Frozen,
        }
    }

    /// Builds a value with the given mutability.
    pub fn with_mutability(bytes: impl Into<Vec<u8>>, mutability: Mutability) -> Self {
        Self {
            bytes: bytes.into(),
            mutability,
        }
    }

    /// Returns a new value holding `bytes` and this value's mutability.
    ///
    /// Every transform builds its output through this method so the flag is
    /// never lost.
    pub fn transfer(&self, bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_mutability(bytes, self.mutability)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the value as text if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Returns the mutability flag.
    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Returns `true` if the value must not be modified.
    pub fn is_frozen(&self) -> bool {
        self.mutability == Mutability::Frozen
    }

    /// Marks the value as frozen.
    pub fn freeze(&mut self) {
        self.mutability = Mutability::Frozen;
    }

    /// Returns mutable access to the bytes, or `None` if the value is frozen.
    pub fn bytes_mut(&mut self) -> Option<&mut Vec<u8>> {
        match self.mutability {
            Mutability::Mutable => Some(&mut self.bytes),
            Mutability::Frozen => None,
        }
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the value holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consumes the value and returns the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::new(value.into_bytes())
    }
}

impl From<&[u8]> for FieldValue {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldValue")
            .field("bytes", &String::from_utf8_lossy(&self.bytes))
            .field("mutability", &self.mutability)
            .finish()
    }
}
