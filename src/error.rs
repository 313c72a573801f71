use std::fmt;

/// Errors that can occur while sanitizing a request field.
///
/// Only the `RaiseOnInvalid` strategy (or a custom strategy) produces these;
/// the default `Replace` strategy repairs input instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input is not valid UTF-8
    Encoding(EncodingError),
    /// The input contains a null byte and null-byte sanitization is enabled
    NullByte(NullByteError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Encoding(e) => write!(f, "Invalid encoding: {}", e),
            Error::NullByte(e) => write!(f, "Null byte: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encoding(e) => Some(e),
            Error::NullByte(e) => Some(e),
        }
    }
}

impl From<EncodingError> for Error {
    fn from(e: EncodingError) -> Self {
        Error::Encoding(e)
    }
}

impl From<NullByteError> for Error {
    fn from(e: NullByteError) -> Self {
        Error::NullByte(e)
    }
}

/// Error returned when a byte sequence cannot be interpreted as UTF-8.
///
/// The error carries byte offsets only. The rejected input itself is never
/// stored, so the error is safe to log.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::EncodingError;
///
/// let error = EncodingError::new(3, Some(1));
/// assert_eq!(error.valid_up_to(), 3);
/// assert_eq!(error.to_string(), "invalid UTF-8 sequence of 1 byte(s) at offset 3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingError {
    valid_up_to: usize,
    error_len: Option<usize>,
}

impl EncodingError {
    /// Creates a new encoding error.
    ///
    /// `error_len` is `None` when the input ends in the middle of a multibyte
    /// sequence.
    pub fn new(valid_up_to: usize, error_len: Option<usize>) -> Self {
        Self {
            valid_up_to,
            error_len,
        }
    }

    /// Returns the length of the valid UTF-8 prefix.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }

    /// Returns the length of the invalid sequence, if it was not truncated.
    pub fn error_len(&self) -> Option<usize> {
        self.error_len
    }
}

impl From<std::str::Utf8Error> for EncodingError {
    fn from(e: std::str::Utf8Error) -> Self {
        Self::new(e.valid_up_to(), e.error_len())
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_len {
            Some(len) => write!(
                f,
                "invalid UTF-8 sequence of {} byte(s) at offset {}",
                len, self.valid_up_to
            ),
            None => write!(
                f,
                "incomplete UTF-8 sequence at offset {}",
                self.valid_up_to
            ),
        }
    }
}

impl std::error::Error for EncodingError {}

/// Error returned when a null byte is found and null bytes are forbidden.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::NullByteError;
///
/// let error = NullByteError::new(4);
/// assert_eq!(error.offset(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullByteError {
    offset: usize,
}

impl NullByteError {
    /// Creates a new null-byte error for the byte at `offset`.
    pub fn new(offset: usize) -> Self {
        Self { offset }
    }

    /// Returns the offset of the first null byte.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for NullByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "null byte at offset {}", self.offset)
    }
}

impl std::error::Error for NullByteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_error_from_utf8_error() {
        let bytes = b"foo\xe0".to_vec();
        let err = std::str::from_utf8(&bytes).unwrap_err();
        let error = EncodingError::from(err);

        assert_eq!(error.valid_up_to(), 3);
        assert_eq!(error.error_len(), None);
        assert!(error.to_string().contains("incomplete"));
    }

    #[test]
    fn encoding_error_display_includes_offset() {
        let error = EncodingError::new(7, Some(2));
        let output = format!("{}", error);

        assert!(output.contains("offset 7"));
        assert!(output.contains("2 byte(s)"));
    }

    #[test]
    fn error_wraps_both_kinds() {
        let enc: Error = EncodingError::new(0, Some(1)).into();
        let nul: Error = NullByteError::new(2).into();

        assert!(matches!(enc, Error::Encoding(_)));
        assert!(matches!(nul, Error::NullByte(_)));
        assert!(format!("{}", enc).starts_with("Invalid encoding"));
        assert!(format!("{}", nul).starts_with("Null byte"));
    }

    #[test]
    fn error_source_points_at_inner_error() {
        use std::error::Error as _;

        let error = Error::from(NullByteError::new(1));
        let source = error.source().expect("source present");
        assert_eq!(source.to_string(), "null byte at offset 1");
    }
}
