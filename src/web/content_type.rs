/// A parsed `Content-Type` value.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::web::ContentType;
///
/// let ct = ContentType::parse("Application/JSON; charset=\"UTF-8\"");
/// assert_eq!(ct.media_type(), Some("application/json"));
/// assert_eq!(ct.charset(), Some("UTF-8"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentType {
    media_type: Option<String>,
    charset: Option<String>,
}

impl ContentType {
    /// Parses a header value.
    ///
    /// The media type is lowercased with parameters stripped. The charset
    /// parameter keeps its original case with surrounding quotes removed.
    /// Parsing never fails; missing parts are `None`.
    pub fn parse(header: &str) -> Self {
        let mut parts = header.split(';');
        let media_type = parts
            .next()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_lowercase);

        let mut charset = None;
        for part in parts {
            if let Some((key, value)) = part.trim().split_once('=') {
                if key.trim().eq_ignore_ascii_case("charset") {
                    let value = value.trim().trim_matches('"').trim_matches('\'');
                    if !value.is_empty() {
                        charset = Some(value.to_string());
                    }
                }
            }
        }

        Self { media_type, charset }
    }

    /// Returns the lowercased media type.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Returns the declared charset.
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_media_type() {
        let ct = ContentType::parse("text/plain");
        assert_eq!(ct.media_type(), Some("text/plain"));
        assert_eq!(ct.charset(), None);
    }

    #[test]
    fn strips_parameters_and_whitespace() {
        let ct = ContentType::parse("  multipart/form-data ; boundary=xyz ; charset=utf-8 ");
        assert_eq!(ct.media_type(), Some("multipart/form-data"));
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn charset_key_is_case_insensitive() {
        let ct = ContentType::parse("text/plain;CHARSET='Shift_JIS'");
        assert_eq!(ct.charset(), Some("Shift_JIS"));
    }

    #[test]
    fn empty_header_has_no_parts() {
        assert_eq!(ContentType::parse(""), ContentType::default());
        assert_eq!(ContentType::parse(";charset=").media_type(), None);
    }
}
