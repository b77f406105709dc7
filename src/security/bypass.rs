//! Secret-in-path bypass.
//!
//! A request whose path contains the configured secret is answered with a
//! fixed message and never reaches the destination. The match is a plain
//! substring search over the percent-decoded path, not a segment or query match.

use crate::config::schema::SecurityConfig;

#[derive(Debug, Clone)]
pub struct SecretBypass {
    secret: Option<String>,
    message: String,
}

impl SecretBypass {
    /// An empty secret disables the bypass.
    pub fn new(secret: Option<String>, message: impl Into<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            message: message.into(),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.secret_key.clone(), config.bypass_message.clone())
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// `path` is the raw request path; it is percent-decoded before matching.
    pub fn matches(&self, path: &str) -> bool {
        let Some(secret) = self.secret.as_deref() else {
            return false;
        };
        let decoded = urlencoding::decode_binary(path.as_bytes());
        String::from_utf8_lossy(&decoded).contains(secret)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_substring_anywhere_in_path() {
        let bypass = SecretBypass::new(Some("WebHook".into()), "ok");
        assert!(bypass.matches("/WebHook"));
        assert!(bypass.matches("/api/WebHook/events"));
        assert!(bypass.matches("/not-WebHook-but-contains-it"));
        assert!(!bypass.matches("/webhook"));
        assert!(!bypass.matches("/api/payment/checkout"));
    }

    #[test]
    fn matches_percent_encoded_secret() {
        let bypass = SecretBypass::new(Some("goruboe".into()), "ok");
        assert!(bypass.matches("/goru%62oe"));
        assert!(bypass.matches("/hooks/%67%6F%72%75%62%6F%65/x"));
        assert!(!bypass.matches("/goru%63oe"));

        let spaced = SecretBypass::new(Some("my secret".into()), "ok");
        assert!(spaced.matches("/my%20secret"));
    }

    #[test]
    fn empty_or_missing_secret_never_matches() {
        assert!(!SecretBypass::new(None, "ok").matches("/anything"));

        let empty = SecretBypass::new(Some(String::new()), "ok");
        assert!(!empty.is_enabled());
        assert!(!empty.matches("/anything"));
    }
}
