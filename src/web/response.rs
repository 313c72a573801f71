use std::collections::HashMap;

/// A response produced without calling the next handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Body chunks
    pub body: Vec<String>,
}

impl Response {
    /// Creates a response with no headers and an empty body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Appends a body chunk.
    pub fn with_body(mut self, chunk: impl Into<String>) -> Self {
        self.body.push(chunk.into());
        self
    }

    /// The response returned when the request body cannot be read.
    ///
    /// A new value is built on every call; callers may modify it freely.
    pub fn bad_request() -> Self {
        Self::new(400)
            .with_header("Content-Type", "text/plain")
            .with_body("Bad Request")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_shape() {
        let response = Response::bad_request();

        assert_eq!(response.status, 400);
        assert_eq!(
            response.headers.get("Content-Type").map(String::as_str),
            Some("text/plain")
        );
        assert_eq!(response.body, vec!["Bad Request".to_string()]);
    }

    #[test]
    fn bad_request_values_are_independent() {
        let mut first = Response::bad_request();
        first.body.push("extra".to_string());
        first.headers.insert("X-Trace".to_string(), "1".to_string());

        let second = Response::bad_request();
        assert_eq!(second.body.len(), 1);
        assert!(!second.headers.contains_key("X-Trace"));
    }
}
