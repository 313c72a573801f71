//! The sanitizing middleware.
//!
//! # Flow
//!
//! ```text
//! Env
//!   ↓
//! body: content type, charset and method gates, bounded read, repair
//!   ↓              ↘ read failure → 400 Bad Request (next handler not called)
//! fields: URI-like → percent-normalized
//!         HTTP_COOKIE → per-pair percent-normalized
//!         other HTTP_* → repaired as text
//!   ↓
//! next handler
//! ```

use std::io;
use std::sync::Arc;

use crate::body::{BodySanitizer, Input, SanitizedBody};
use crate::config::Config;
use crate::cookie::CookieSanitizer;
use crate::error::Error;
use crate::logging::FieldLog;
use crate::method::HttpMethod;
use crate::percent::UriSanitizer;
use crate::sanitizer::{Sanitizer, StringSanitizer};
use crate::value::FieldValue;

use super::content_type::ContentType;
use super::env::{Env, Value};
use super::fields::{self, FieldKind};
use super::response::Response;

/// The next handler in the chain.
pub trait App: Send + Sync {
    /// Handles a request whose text fields are valid UTF-8.
    fn call(&self, env: Env) -> Response;
}

impl<F> App for F
where
    F: Fn(Env) -> Response + Send + Sync,
{
    fn call(&self, env: Env) -> Response {
        self(env)
    }
}

/// Result of sanitizing an environment.
#[derive(Debug)]
pub enum Outcome {
    /// The rebuilt environment, ready for the next handler.
    Continue(Env),
    /// The request must be answered with this response.
    Reject(Response),
}

impl Outcome {
    /// Returns the environment, or `None` if the request was rejected.
    pub fn into_env(self) -> Option<Env> {
        match self {
            Outcome::Continue(env) => Some(env),
            Outcome::Reject(_) => None,
        }
    }

    /// Returns `true` if the request was rejected.
    pub fn is_reject(&self) -> bool {
        matches!(self, Outcome::Reject(_))
    }
}

/// Middleware that makes every text field of a request valid UTF-8.
///
/// # Examples
///
/// ```
/// use utf8_sanitizer::web::{Env, Response, Utf8Sanitizer};
/// use utf8_sanitizer::Config;
///
/// let app = |env: Env| {
///     let path = env.text("PATH_INFO").and_then(|v| v.as_str()).unwrap_or("");
///     Response::new(200).with_body(path)
/// };
/// let middleware = Utf8Sanitizer::new(app, Config::default());
///
/// let env = Env::new().with("PATH_INFO", b"/caf\xE9".to_vec());
/// let response = middleware.call(env).unwrap();
/// assert_eq!(response.body, vec!["/caf%EF%BF%BD".to_string()]);
/// ```
#[derive(Debug)]
pub struct Utf8Sanitizer<A> {
    app: A,
    config: Arc<Config>,
}

impl<A> Utf8Sanitizer<A> {
    /// Wraps `app` with the given configuration.
    pub fn new(app: A, config: impl Into<Arc<Config>>) -> Self {
        Self {
            app,
            config: config.into(),
        }
    }

    /// Returns the shared configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sanitizes `env` without calling the next handler.
    ///
    /// # Errors
    ///
    /// Returns the strategy's [`Error`] if it refuses a field or the body.
    /// A body that cannot be read is not an error; it yields
    /// [`Outcome::Reject`] with a 400 response.
    pub fn sanitize(&self, mut env: Env) -> Result<Outcome, Error> {
        if let Some(response) = self.sanitize_body(&mut env)? {
            return Ok(Outcome::Reject(response));
        }
        self.sanitize_fields(&mut env)?;
        Ok(Outcome::Continue(env))
    }

    fn sanitize_body(&self, env: &mut Env) -> Result<Option<Response>, Error> {
        let log = FieldLog::new(fields::BODY);
        if self.config.filter().skip(fields::BODY) {
            log.skipped();
            return Ok(None);
        }

        let content_type = env
            .text(fields::CONTENT_TYPE)
            .and_then(FieldValue::as_str)
            .map(ContentType::parse)
            .unwrap_or_default();
        let Some(media_type) = content_type.media_type() else {
            return Ok(None);
        };
        let body = BodySanitizer::new(&self.config);
        if !body.applies_to(Some(media_type), content_type.charset()) {
            return Ok(None);
        }

        let method = env
            .text(fields::REQUEST_METHOD)
            .and_then(FieldValue::as_str)
            .and_then(|m| m.parse::<HttpMethod>().ok());
        if !self.config.allows_body_method(method) {
            log.debug(format_args!("method not allowed for body sanitization"));
            return Ok(None);
        }

        let declared = declared_length(env);
        let Some(slot) = env.get_mut(fields::BODY).and_then(Value::as_input_mut) else {
            return Ok(None);
        };
        let mut original = std::mem::replace(slot, Box::new(io::empty()));

        let raw = match body.read(original.as_mut(), declared) {
            Ok(raw) => raw,
            Err(e) => {
                log.warn(format_args!("{e}, rejecting request"));
                close(&log, original);
                return Ok(Some(Response::bad_request()));
            }
        };
        let sanitized = match body.sanitize(&raw, media_type) {
            Ok(sanitized) => sanitized,
            Err(e) => {
                close(&log, original);
                return Err(e);
            }
        };

        if sanitized != raw {
            log.repaired(raw.len(), sanitized.len());
        }
        let length = sanitized.len();
        *slot = Box::new(SanitizedBody::new(original, sanitized));

        rewrite_content_length(env, length);
        Ok(None)
    }

    fn sanitize_fields(&self, env: &mut Env) -> Result<(), Error> {
        let text = StringSanitizer::from_config(&self.config);
        let uri = UriSanitizer::new(text);
        let cookie = CookieSanitizer::new(uri);

        for (key, value) in env.iter_mut() {
            let Some(name) = key.name() else {
                continue;
            };
            let Value::Text(field) = value else {
                continue;
            };
            let sanitizer: &dyn Sanitizer = match fields::classify(name) {
                FieldKind::Uri => &uri,
                FieldKind::Cookie => &cookie,
                FieldKind::Header => &text,
                FieldKind::Other => continue,
            };

            let log = FieldLog::new(name);
            if self.config.filter().skip(name) {
                log.skipped();
                continue;
            }

            let sanitized = sanitizer.sanitize(field.clone())?;
            if sanitized.as_bytes() != field.as_bytes() {
                log.repaired(field.len(), sanitized.len());
                *field = sanitized;
            }
        }
        Ok(())
    }
}

impl<A: App> Utf8Sanitizer<A> {
    /// Sanitizes `env` and passes it to the next handler.
    ///
    /// A request whose body cannot be read is answered with a 400 response
    /// and never reaches the next handler.
    ///
    /// # Errors
    ///
    /// Returns the strategy's [`Error`] if it refuses a field or the body.
    pub fn call(&self, env: Env) -> Result<Response, Error> {
        match self.sanitize(env)? {
            Outcome::Continue(env) => Ok(self.app.call(env)),
            Outcome::Reject(response) => Ok(response),
        }
    }
}

fn close(log: &FieldLog<'_>, mut input: Box<dyn Input>) {
    if let Err(e) = input.close() {
        log.warn(format_args!("failed to close body stream: {e}"));
    }
}

/// Negative or unparseable lengths mean the body is read to its end.
fn declared_length(env: &Env) -> Option<u64> {
    let length = match env.get(fields::CONTENT_LENGTH)? {
        Value::Int(n) => *n,
        Value::Text(text) => text.as_str()?.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u64::try_from(length).ok()
}

fn rewrite_content_length(env: &mut Env, length: usize) {
    let Some(value) = env.get_mut(fields::CONTENT_LENGTH) else {
        return;
    };
    match value {
        Value::Int(n) => {
            let length = i64::try_from(length).unwrap_or(i64::MAX);
            if *n != length {
                *n = length;
            }
        }
        Value::Text(text) => {
            let length = length.to_string();
            if text.as_bytes() != length.as_bytes() {
                *text = text.transfer(length);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Matcher, Strategy};
    use std::io::{Cursor, Read};

    fn passthrough(env: Env) -> Response {
        let body = env
            .text("PATH_INFO")
            .and_then(FieldValue::as_str)
            .unwrap_or_default()
            .to_string();
        Response::new(200).with_body(body)
    }

    fn continued(outcome: Outcome) -> Env {
        match outcome {
            Outcome::Continue(env) => env,
            Outcome::Reject(response) => panic!("unexpected reject: {:?}", response),
        }
    }

    fn body_input(bytes: &[u8]) -> Box<dyn Input> {
        Box::new(Cursor::new(bytes.to_vec()))
    }

    fn read_body(env: &mut Env) -> Vec<u8> {
        let input = env.get_mut(fields::BODY).and_then(Value::as_input_mut).unwrap();
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn sanitizes_uri_header_and_cookie_fields() {
        let middleware = Utf8Sanitizer::new(passthrough, Config::default());
        let env = Env::new()
            .with("PATH_INFO", b"/foo%E0".to_vec())
            .with("HTTP_USER_AGENT", b"Mozilla\xE0".to_vec())
            .with("HTTP_COOKIE", b"a=1; b=\xED".to_vec())
            .with("rack.custom", b"\xE0".to_vec());

        let env = continued(middleware.sanitize(env).unwrap());

        assert_eq!(env.text("PATH_INFO").unwrap().as_bytes(), b"/foo%EF%BF%BD");
        assert_eq!(
            env.text("HTTP_USER_AGENT").unwrap().as_str(),
            Some("Mozilla\u{FFFD}")
        );
        assert_eq!(env.text("HTTP_COOKIE").unwrap().as_bytes(), b"a=1; b=%EF%BF%BD");
        assert_eq!(env.text("rack.custom").unwrap().as_bytes(), b"\xE0");
    }

    #[test]
    fn valid_fields_keep_their_mutability() {
        let middleware = Utf8Sanitizer::new(passthrough, Config::default());
        let env = Env::new().with("PATH_INFO", FieldValue::frozen("/ok"));

        let env = continued(middleware.sanitize(env).unwrap());

        assert!(env.text("PATH_INFO").unwrap().is_frozen());
    }

    #[test]
    fn except_leaves_field_untouched() {
        let config = Config::builder().except(Matcher::exact("HTTP_USER_AGENT")).build();
        let middleware = Utf8Sanitizer::new(passthrough, config);
        let env = Env::new().with("HTTP_USER_AGENT", b"\xE0".to_vec());

        let env = continued(middleware.sanitize(env).unwrap());

        assert_eq!(env.text("HTTP_USER_AGENT").unwrap().as_bytes(), b"\xE0");
    }

    #[test]
    fn body_is_replaced_and_length_rewritten() {
        let middleware = Utf8Sanitizer::new(passthrough, Config::default());
        let env = Env::new()
            .with("REQUEST_METHOD", "POST")
            .with("CONTENT_TYPE", "text/plain; charset=UTF-8")
            .with("CONTENT_LENGTH", "4")
            .with(fields::BODY, body_input(b"caf\xE9"));

        let mut env = continued(middleware.sanitize(env).unwrap());

        assert_eq!(read_body(&mut env), "caf\u{FFFD}".as_bytes());
        assert_eq!(env.text("CONTENT_LENGTH").unwrap().as_bytes(), b"6");
    }

    #[test]
    fn integer_content_length_stays_an_integer() {
        let middleware = Utf8Sanitizer::new(passthrough, Config::default());
        let env = Env::new()
            .with("CONTENT_TYPE", "application/json")
            .with("CONTENT_LENGTH", 1i64)
            .with(fields::BODY, body_input(b"\xFF"));

        let env = continued(middleware.sanitize(env).unwrap());

        assert_eq!(env.get("CONTENT_LENGTH").and_then(Value::as_int), Some(3));
    }

    #[test]
    fn missing_content_length_is_not_added() {
        let middleware = Utf8Sanitizer::new(passthrough, Config::default());
        let env = Env::new()
            .with("CONTENT_TYPE", "text/plain")
            .with(fields::BODY, body_input(b"\xFF"));

        let mut env = continued(middleware.sanitize(env).unwrap());

        assert!(env.get("CONTENT_LENGTH").is_none());
        assert_eq!(read_body(&mut env), "\u{FFFD}".as_bytes());
    }

    #[test]
    fn other_charsets_are_left_alone() {
        let middleware = Utf8Sanitizer::new(passthrough, Config::default());
        let env = Env::new()
            .with("CONTENT_TYPE", "text/plain; charset=iso-8859-1")
            .with("CONTENT_LENGTH", "4")
            .with(fields::BODY, body_input(b"caf\xE9"));

        let mut env = continued(middleware.sanitize(env).unwrap());

        assert_eq!(read_body(&mut env), b"caf\xE9");
        assert_eq!(env.text("CONTENT_LENGTH").unwrap().as_bytes(), b"4");
    }

    #[test]
    fn short_body_is_rejected() {
        let middleware = Utf8Sanitizer::new(
            |_env: Env| -> Response { panic!("next handler must not run") },
            Config::default(),
        );
        let env = Env::new()
            .with("CONTENT_TYPE", "text/plain")
            .with("CONTENT_LENGTH", "100")
            .with(fields::BODY, body_input(b"short"));

        let response = middleware.call(env).unwrap();

        assert_eq!(response, Response::bad_request());
    }

    #[test]
    fn method_gate_skips_disallowed_methods() {
        let config = Config::builder().body_methods([HttpMethod::Post]).build();
        let middleware = Utf8Sanitizer::new(passthrough, config);
        let env = Env::new()
            .with("REQUEST_METHOD", "GET")
            .with("CONTENT_TYPE", "text/plain")
            .with(fields::BODY, body_input(b"\xFF"));

        let mut env = continued(middleware.sanitize(env).unwrap());

        assert_eq!(read_body(&mut env), b"\xFF");
    }

    #[test]
    fn strict_strategy_errors_propagate() {
        let config = Config::builder().strategy(Strategy::RaiseOnInvalid).build();
        let middleware = Utf8Sanitizer::new(passthrough, config);
        let env = Env::new().with("QUERY_STRING", b"q=%E0".to_vec());

        assert!(matches!(middleware.call(env), Err(Error::Encoding(_))));
    }

    #[test]
    fn declared_length_parsing() {
        assert_eq!(declared_length(&Env::new().with("CONTENT_LENGTH", " 12 ")), Some(12));
        assert_eq!(declared_length(&Env::new().with("CONTENT_LENGTH", "-1")), None);
        assert_eq!(declared_length(&Env::new().with("CONTENT_LENGTH", "abc")), None);
        assert_eq!(declared_length(&Env::new().with("CONTENT_LENGTH", -5i64)), None);
        assert_eq!(declared_length(&Env::new()), None);
    }
}
