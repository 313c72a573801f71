//! Request body sanitization.
//!
//! Bodies are read in full (bounded by the declared length), repaired and
//! handed downstream as a [`SanitizedBody`] backed by an in-memory buffer.

use std::fmt;
use std::io::{self, BufRead, Read};

use crate::config::Config;
use crate::error::Error;
use crate::percent::UriSanitizer;
use crate::sanitizer::StringSanitizer;

/// UTF-8 byte-order mark.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

const INITIAL_CAPACITY: usize = 8 * 1024;

/// A request body stream.
///
/// Any [`Read`] source can serve as a body; `close` releases the underlying
/// resource (a socket, a temp file) and defaults to a no-op.
pub trait Input: Read + Send {
    /// Closes the stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the resource fails to close.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: AsRef<[u8]> + Send> Input for io::Cursor<T> {}

impl Input for io::Empty {}

/// Error returned when the request body cannot be read.
///
/// A body that ends before its declared length is reported with
/// [`io::ErrorKind::UnexpectedEof`].
#[derive(Debug)]
pub struct BodyError {
    source: io::Error,
}

impl BodyError {
    /// Creates a body error from the underlying I/O error.
    pub fn new(source: io::Error) -> Self {
        Self { source }
    }

    /// Creates an error for a body shorter than its declared length.
    pub fn premature_eof(received: usize, expected: usize) -> Self {
        Self::new(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("received {received} of {expected} bytes"),
        ))
    }

    /// Returns the kind of the underlying I/O error.
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }

    /// Returns `true` if the stream ended early.
    pub fn is_premature_eof(&self) -> bool {
        self.kind() == io::ErrorKind::UnexpectedEof
    }
}

impl fmt::Display for BodyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to read request body: {}", self.source)
    }
}

impl std::error::Error for BodyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

impl From<io::Error> for BodyError {
    fn from(e: io::Error) -> Self {
        Self::new(e)
    }
}

/// A request body replaced by its sanitized bytes.
///
/// Reads are served from memory. The original stream is kept only so that
/// [`close`](Input::close) releases it as well.
///
/// # Examples
///
/// ```
/// use std::io::{Cursor, Read};
/// use utf8_sanitizer::body::SanitizedBody;
///
/// let original = Box::new(Cursor::new(b"raw".to_vec()));
/// let mut body = SanitizedBody::new(original, b"line 1\nline 2".to_vec());
///
/// assert_eq!(body.size(), 13);
/// assert_eq!(body.gets().unwrap(), Some(b"line 1\n".to_vec()));
///
/// body.rewind();
/// let mut all = String::new();
/// body.read_to_string(&mut all).unwrap();
/// assert_eq!(all, "line 1\nline 2");
/// ```
pub struct SanitizedBody {
    buffer: io::Cursor<Vec<u8>>,
    original: Option<Box<dyn Input>>,
}

impl SanitizedBody {
    /// Wraps `sanitized` bytes, taking ownership of the original stream.
    pub fn new(original: Box<dyn Input>, sanitized: Vec<u8>) -> Self {
        Self {
            buffer: io::Cursor::new(sanitized),
            original: Some(original),
        }
    }

    /// Returns the size of the sanitized body in bytes.
    pub fn size(&self) -> usize {
        self.buffer.get_ref().len()
    }

    /// Returns the full sanitized body regardless of the read position.
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.get_ref()
    }

    /// Reads the next line, including its trailing `\n`.
    ///
    /// Returns `None` once the body is exhausted.
    ///
    /// # Errors
    ///
    /// Reads from memory; this only fails if the buffer is poisoned by a
    /// previous panic, which cannot happen for a cursor.
    pub fn gets(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        if self.buffer.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Iterates over the remaining lines, each including its trailing `\n`.
    pub fn each_line(&mut self) -> impl Iterator<Item = io::Result<Vec<u8>>> + '_ {
        std::iter::from_fn(move || self.gets().transpose())
    }

    /// Moves the read position back to the start.
    pub fn rewind(&mut self) {
        self.buffer.set_position(0);
    }

    /// Returns `true` once [`close`](Input::close) has run.
    pub fn is_closed(&self) -> bool {
        self.original.is_none()
    }
}

impl Read for SanitizedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.buffer.read(buf)
    }
}

impl BufRead for SanitizedBody {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.buffer.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.buffer.consume(amt);
    }
}

impl Input for SanitizedBody {
    fn close(&mut self) -> io::Result<()> {
        match self.original.take() {
            Some(mut original) => original.close(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SanitizedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SanitizedBody")
            .field("size", &self.size())
            .field("position", &self.buffer.position())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Reads and repairs request bodies.
///
/// # Examples
///
/// ```
/// use std::io::Cursor;
/// use utf8_sanitizer::{body::BodySanitizer, Config};
///
/// let config = Config::default();
/// let sanitizer = BodySanitizer::new(&config);
///
/// assert!(sanitizer.applies_to(Some("application/json"), Some("UTF-8")));
/// assert!(!sanitizer.applies_to(Some("application/json"), Some("latin1")));
///
/// let mut input = Cursor::new(b"\xEF\xBB\xBFname=caf%E9".to_vec());
/// let raw = sanitizer.read(&mut input, Some(14)).unwrap();
/// let body = sanitizer.sanitize(&raw, "application/x-www-form-urlencoded").unwrap();
/// assert_eq!(body, b"name=caf%EF%BF%BD");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BodySanitizer<'a> {
    config: &'a Config,
}

impl<'a> BodySanitizer<'a> {
    /// Creates a body sanitizer for the configuration.
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Returns `true` if a body with this media type and charset is sanitized.
    ///
    /// The media type must be in the sanitizable set; the charset, if
    /// declared, must be UTF-8. Other charsets are left alone entirely.
    pub fn applies_to(&self, media_type: Option<&str>, charset: Option<&str>) -> bool {
        let Some(media_type) = media_type else {
            return false;
        };
        self.config.is_sanitizable(media_type)
            && charset.map_or(true, |c| c.eq_ignore_ascii_case("utf-8"))
    }

    /// Reads the body.
    ///
    /// With a declared length exactly that many bytes are read and nothing
    /// more; otherwise the stream is read to its end.
    ///
    /// # Errors
    ///
    /// Returns a [`BodyError`] if the stream fails or ends before the
    /// declared length.
    pub fn read(
        &self,
        input: &mut dyn Input,
        declared_length: Option<u64>,
    ) -> Result<Vec<u8>, BodyError> {
        match declared_length {
            Some(expected) => {
                let capacity = usize::try_from(expected)
                    .unwrap_or(usize::MAX)
                    .min(INITIAL_CAPACITY);
                let mut raw = Vec::with_capacity(capacity);
                input.take(expected).read_to_end(&mut raw)?;

                if (raw.len() as u64) < expected {
                    let expected = usize::try_from(expected).unwrap_or(usize::MAX);
                    return Err(BodyError::premature_eof(raw.len(), expected));
                }
                Ok(raw)
            }
            None => {
                let mut raw = Vec::with_capacity(INITIAL_CAPACITY);
                input.read_to_end(&mut raw)?;
                Ok(raw)
            }
        }
    }

    /// Repairs raw body bytes.
    ///
    /// A leading BOM is stripped, the rest is repaired with the strategy and,
    /// for URI-encoded media types, percent-normalized.
    ///
    /// # Errors
    ///
    /// Returns the strategy's [`Error`] if it refuses the body.
    pub fn sanitize(&self, raw: &[u8], media_type: &str) -> Result<Vec<u8>, Error> {
        let body = raw.strip_prefix(BOM).unwrap_or(raw);
        let text = StringSanitizer::from_config(self.config).sanitize_bytes(body)?;

        if self.config.is_uri_encoded(media_type) {
            let normalized = UriSanitizer::from_config(self.config).normalize(&text)?;
            return Ok(normalized.into_bytes());
        }
        Ok(text.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Strategy;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Tracked {
        inner: Cursor<Vec<u8>>,
        closed: Arc<AtomicBool>,
    }

    impl Read for Tracked {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Input for Tracked {
        fn close(&mut self) -> io::Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away"))
        }
    }

    impl Input for Broken {}

    #[test]
    fn applies_only_to_sanitizable_utf8_bodies() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);

        assert!(sanitizer.applies_to(Some("text/plain"), None));
        assert!(sanitizer.applies_to(Some("TEXT/PLAIN"), Some("utf-8")));
        assert!(!sanitizer.applies_to(Some("text/plain"), Some("iso-8859-1")));
        assert!(!sanitizer.applies_to(Some("image/png"), None));
        assert!(!sanitizer.applies_to(None, None));
    }

    #[test]
    fn read_stops_at_declared_length() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);
        let mut input = Cursor::new(b"abcdef".to_vec());

        let raw = sanitizer.read(&mut input, Some(3)).unwrap();

        assert_eq!(raw, b"abc");
        assert_eq!(input.position(), 3);
    }

    #[test]
    fn read_without_length_reads_to_end() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);
        let mut input = Cursor::new(b"abcdef".to_vec());

        assert_eq!(sanitizer.read(&mut input, None).unwrap(), b"abcdef");
    }

    #[test]
    fn short_body_is_premature_eof() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);
        let mut input = Cursor::new(b"abc".to_vec());

        let error = sanitizer.read(&mut input, Some(10)).unwrap_err();

        assert!(error.is_premature_eof());
        assert!(error.to_string().contains("3 of 10"));
    }

    #[test]
    fn stream_failure_is_reported() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);

        let error = sanitizer.read(&mut Broken, Some(4)).unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::ConnectionReset);
        assert!(!error.is_premature_eof());
    }

    #[test]
    fn sanitize_strips_bom() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);

        let body = sanitizer.sanitize(b"\xEF\xBB\xBF{\"a\":1}", "application/json").unwrap();

        assert_eq!(body, b"{\"a\":1}");
    }

    #[test]
    fn sanitize_repairs_json_without_percent_pass() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);

        let body = sanitizer
            .sanitize(b"{\"q\":\"a b%E0\xff\"}", "application/json")
            .unwrap();

        assert_eq!(body, "{\"q\":\"a b%E0\u{FFFD}\"}".as_bytes());
    }

    #[test]
    fn sanitize_normalizes_form_bodies() {
        let config = Config::default();
        let sanitizer = BodySanitizer::new(&config);

        let body = sanitizer
            .sanitize(b"a=%D0%BB&b=%E0&c=%2F", "application/x-www-form-urlencoded")
            .unwrap();

        assert_eq!(body, b"a=%D0%BB&b=%EF%BF%BD&c=%2F");
    }

    #[test]
    fn sanitize_propagates_strict_errors() {
        let config = Config::builder().strategy(Strategy::RaiseOnInvalid).build();
        let sanitizer = BodySanitizer::new(&config);

        let result = sanitizer.sanitize(b"\xff", "text/plain");

        assert!(matches!(result, Err(Error::Encoding(_))));
    }

    #[test]
    fn sanitized_body_reads_from_buffer() {
        let mut body = SanitizedBody::new(Box::new(io::empty()), b"one\ntwo\n".to_vec());

        let lines: Vec<_> = body.each_line().collect::<io::Result<_>>().unwrap();
        assert_eq!(lines, vec![b"one\n".to_vec(), b"two\n".to_vec()]);
        assert_eq!(body.gets().unwrap(), None);

        body.rewind();
        let mut buf = [0u8; 3];
        body.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"one");
    }

    #[test]
    fn closing_sanitized_body_closes_original() {
        let closed = Arc::new(AtomicBool::new(false));
        let original = Tracked {
            inner: Cursor::new(Vec::new()),
            closed: Arc::clone(&closed),
        };
        let mut body = SanitizedBody::new(Box::new(original), b"x".to_vec());

        body.close().unwrap();

        assert!(closed.load(Ordering::SeqCst));
        assert!(body.is_closed());
        // Closing twice is harmless
        body.close().unwrap();
    }

    #[test]
    fn debug_does_not_print_contents() {
        let body = SanitizedBody::new(Box::new(io::empty()), b"secret".to_vec());
        let output = format!("{:?}", body);

        assert!(output.contains("size: 6"));
        assert!(!output.contains("secret"));
    }
}
