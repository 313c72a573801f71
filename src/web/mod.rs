//! Request-level integration.
//!
//! A request is modelled as an [`Env`]: an ordered map from field names to
//! text, body streams or scalars, in the style of CGI environments. The
//! [`Utf8Sanitizer`] middleware consumes an `Env`, repairs the fields it
//! knows about and hands the rebuilt environment to the next [`App`].
//!
//! # Which fields are touched
//!
//! - URI components ([`fields::URI_FIELDS`]) are percent-normalized
//! - `HTTP_COOKIE` is normalized pair by pair
//! - every other `HTTP_*` header is repaired as plain text
//! - the body ([`fields::BODY`]) is repaired when its content type is
//!   sanitizable and its charset is UTF-8
//!
//! Everything else, including symbol keys, passes through untouched.
//!
//! # Example
//!
//! ```
//! use std::io::{Cursor, Read};
//! use utf8_sanitizer::body::Input;
//! use utf8_sanitizer::web::{fields, Env, Outcome, Utf8Sanitizer, Value};
//! use utf8_sanitizer::Config;
//!
//! let middleware = Utf8Sanitizer::new((), Config::default());
//!
//! let body: Box<dyn Input> = Box::new(Cursor::new(b"name=caf%E9".to_vec()));
//! let env = Env::new()
//!     .with("REQUEST_METHOD", "POST")
//!     .with("CONTENT_TYPE", "application/x-www-form-urlencoded")
//!     .with("CONTENT_LENGTH", "11")
//!     .with(fields::BODY, body);
//!
//! let Outcome::Continue(mut env) = middleware.sanitize(env).unwrap() else {
//!     panic!("body was readable");
//! };
//!
//! let mut form = String::new();
//! let input = env.get_mut(fields::BODY).and_then(Value::as_input_mut).unwrap();
//! input.read_to_string(&mut form).unwrap();
//! assert_eq!(form, "name=caf%EF%BF%BD");
//! assert_eq!(env.text("CONTENT_LENGTH").unwrap().as_bytes(), b"17");
//! ```

mod content_type;
mod env;
pub mod fields;
mod middleware;
mod response;

pub use content_type::ContentType;
pub use env::{Env, EnvKey, Value};
pub use middleware::{App, Outcome, Utf8Sanitizer};
pub use response::Response;
