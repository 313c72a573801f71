//! UTF-8 sanitization for HTTP request environments.
//!
//! Clients send whatever bytes they like in paths, query strings, headers,
//! cookies and bodies. This crate repairs those fields before application
//! code sees them, so that every text value handed downstream decodes as
//! UTF-8.
//!
//! # Core Types
//!
//! - [`Strategy`]: what to do with invalid input (replace, raise, or custom)
//! - [`Sanitizer`]: field-level sanitizers ([`StringSanitizer`],
//!   [`UriSanitizer`], [`CookieSanitizer`])
//! - [`FieldValue`]: raw field bytes plus a [`Mutability`] flag
//! - [`Config`]: immutable settings built with [`ConfigBuilder`]
//! - [`web::Utf8Sanitizer`]: middleware applying all of the above to a
//!   request [`web::Env`]
//!
//! # Examples
//!
//! ```
//! use utf8_sanitizer::{Config, FieldValue, Matcher, Sanitizer, Strategy, UriSanitizer};
//!
//! let config = Config::builder()
//!     .strategy(Strategy::replace())
//!     .except(Matcher::exact("HTTP_AUTHORIZATION"))
//!     .build();
//!
//! let uri = UriSanitizer::from_config(&config);
//! let path = uri.sanitize(FieldValue::new(b"/wiki/%E0%A4%A".to_vec())).unwrap();
//! assert_eq!(path.as_str(), Some("/wiki/%EF%BF%BD%A"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
mod config;
mod cookie;
mod error;
mod logging;
mod matcher;
mod method;
pub mod percent;
mod sanitizer;
mod strategy;
mod value;
pub mod web;

#[cfg(test)]
mod test_utils;

pub use body::{BodyError, BodySanitizer, Input, SanitizedBody};
pub use config::{
    Config, ConfigBuilder, DEFAULT_SANITIZABLE_CONTENT_TYPES, URI_ENCODED_CONTENT_TYPES,
};
pub use cookie::{split_cookie_pairs, CookieSanitizer, COOKIE_SEPARATOR};
pub use error::{EncodingError, Error, NullByteError};
pub use logging::FieldLog;
pub use matcher::{FieldFilter, Matcher};
pub use method::{HttpMethod, UnknownMethod};
pub use percent::UriSanitizer;
pub use sanitizer::{Sanitizer, StringSanitizer};
pub use strategy::{EncodingStrategy, Strategy, StrategyOptions, REPLACEMENT_CHARACTER};
pub use value::{FieldValue, Mutability};
