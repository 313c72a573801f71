//! Names of the environment fields the middleware knows about.

/// Fields holding URI components.
pub const URI_FIELDS: &[&str] = &[
    "SCRIPT_NAME",
    "REQUEST_PATH",
    "REQUEST_URI",
    "PATH_INFO",
    "QUERY_STRING",
    "HTTP_REFERER",
    "ORIGINAL_FULLPATH",
    "ORIGINAL_SCRIPT_NAME",
    "SERVER_NAME",
];

/// The cookie header.
pub const HTTP_COOKIE: &str = "HTTP_COOKIE";

/// Prefix shared by every request header field.
pub const HEADER_PREFIX: &str = "HTTP_";

/// The request body stream.
pub const BODY: &str = "request.input";

/// The request method.
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";

/// The `Content-Type` header of the body.
pub const CONTENT_TYPE: &str = "CONTENT_TYPE";

/// The declared body length.
pub const CONTENT_LENGTH: &str = "CONTENT_LENGTH";

/// How a text field is sanitized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Percent-normalized.
    Uri,
    /// Split into pairs, each percent-normalized.
    Cookie,
    /// Repaired as plain text.
    Header,
    /// Left alone.
    Other,
}

/// Classifies a field by name.
///
/// ```
/// use utf8_sanitizer::web::fields::{classify, FieldKind};
///
/// assert_eq!(classify("PATH_INFO"), FieldKind::Uri);
/// assert_eq!(classify("HTTP_REFERER"), FieldKind::Uri);
/// assert_eq!(classify("HTTP_COOKIE"), FieldKind::Cookie);
/// assert_eq!(classify("HTTP_USER_AGENT"), FieldKind::Header);
/// assert_eq!(classify("rack.version"), FieldKind::Other);
/// ```
pub fn classify(name: &str) -> FieldKind {
    if URI_FIELDS.contains(&name) {
        FieldKind::Uri
    } else if name == HTTP_COOKIE {
        FieldKind::Cookie
    } else if name.starts_with(HEADER_PREFIX) {
        FieldKind::Header
    } else {
        FieldKind::Other
    }
}
