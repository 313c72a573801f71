use std::fmt;

/// A field-scoped logging interface.
///
/// `FieldLog` tags every event with the name of the request field being
/// sanitized. It is lifetime-bound to the field name so it cannot outlive
/// the sanitization of that field.
///
/// Field values are never logged, only their byte lengths: they are
/// untrusted and may hold credentials.
#[derive(Debug, Clone, Copy)]
pub struct FieldLog<'a> {
    field: &'a str,
}

impl<'a> FieldLog<'a> {
    /// Creates a logger for `field`.
    pub fn new(field: &'a str) -> Self {
        Self { field }
    }

    /// Returns the field name attached to every event.
    pub fn field(&self) -> &str {
        self.field
    }

    /// Records that a field value was rewritten.
    pub fn repaired(&self, before: usize, after: usize) {
        tracing::debug!(
            field = %self.field,
            before_len = before,
            after_len = after,
            "sanitized field"
        );
    }

    /// Records that the filter left a field untouched.
    pub fn skipped(&self) {
        tracing::trace!(field = %self.field, "field excluded from sanitization");
    }

    /// Logs a debug-level message with the field name.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(field = %self.field, "{}", args);
    }

    /// Logs a warning-level message with the field name.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(field = %self.field, "{}", args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_log_keeps_field_name() {
        let log = FieldLog::new("PATH_INFO");
        assert_eq!(log.field(), "PATH_INFO");

        // Without a subscriber these are no-ops; they must not panic.
        log.repaired(4, 12);
        log.skipped();
        log.debug(format_args!("body length {}", 3));
        log.warn(format_args!("read failed"));
    }
}
