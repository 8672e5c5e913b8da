use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use std::fmt;

/// Username/password pair presented through `Authorization: Basic ...`.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Extract credentials from the request headers. Anything missing or
    /// malformed yields `None`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        Self::parse(value)
    }

    /// Parse an `Authorization` header value. The scheme is matched
    /// case-insensitively; the password may itself contain `:`.
    pub fn parse(value: &str) -> Option<Self> {
        let (scheme, encoded) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;

        Some(Self::new(username, password))
    }

    /// Header value a client would send for these credentials.
    pub fn to_header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_standard_header() {
        // alice:secret
        let creds = BasicCredentials::parse("Basic YWxpY2U6c2VjcmV0").unwrap();
        assert_eq!(creds, BasicCredentials::new("alice", "secret"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let creds = BasicCredentials::parse("basic YWxpY2U6c2VjcmV0").unwrap();
        assert_eq!(creds.username, "alice");
    }

    #[test]
    fn password_may_contain_colons() {
        let header = BasicCredentials::new("bob", "a:b:c").to_header_value();
        let creds = BasicCredentials::parse(&header).unwrap();
        assert_eq!(creds.password, "a:b:c");
    }

    #[test]
    fn empty_pair_parses_as_empty_strings() {
        // ":"
        let creds = BasicCredentials::parse("Basic Og==").unwrap();
        assert_eq!(creds, BasicCredentials::new("", ""));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(BasicCredentials::parse("").is_none());
        assert!(BasicCredentials::parse("Basic").is_none());
        assert!(BasicCredentials::parse("Bearer YWxpY2U6c2VjcmV0").is_none());
        assert!(BasicCredentials::parse("Basic !!!not-base64!!!").is_none());
        // "alice" without a separator
        assert!(BasicCredentials::parse("Basic YWxpY2U=").is_none());
        // invalid UTF-8 (0xff 0x3a)
        assert!(BasicCredentials::parse("Basic /zo=").is_none());
    }

    #[test]
    fn reads_from_header_map() {
        let mut headers = HeaderMap::new();
        assert!(BasicCredentials::from_headers(&headers).is_none());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic YWxpY2U6c2VjcmV0"),
        );
        let creds = BasicCredentials::from_headers(&headers).unwrap();
        assert_eq!(creds, BasicCredentials::new("alice", "secret"));
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", BasicCredentials::new("alice", "secret"));
        assert!(!rendered.contains("secret"));
    }
}
