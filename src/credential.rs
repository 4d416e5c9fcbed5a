//! Provider secret handling
//!
//! The key is read once from the environment at startup and shared
//! read-only afterwards. Formatting never reveals more than a short prefix.

use std::fmt;

/// Provider API key
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key; empty or whitespace-only values are treated as absent
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Read the key from the named environment variable
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(Self::new)
    }

    /// `Authorization` header value for this key
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Short form safe for logs; keys of 8 chars or fewer are fully masked
    pub fn redacted(&self) -> String {
        if self.0.chars().count() <= 8 {
            return "****".to_string();
        }
        let prefix: String = self.0.chars().take(3).collect();
        format!("{}****", prefix)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiKey").field(&self.redacted()).finish()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_absent() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
    }

    #[test]
    fn test_bearer_header_value() {
        let key = ApiKey::new("sk-test-123").unwrap();
        assert_eq!(key.bearer(), "Bearer sk-test-123");
    }

    #[test]
    fn test_formatting_never_reveals_key() {
        let key = ApiKey::new("sk-very-secret-value").unwrap();
        let debug = format!("{:?}", key);
        let display = key.to_string();
        assert!(!debug.contains("very-secret"));
        assert!(!display.contains("very-secret"));
        assert_eq!(display, "sk-****");
    }

    #[test]
    fn test_short_keys_are_fully_masked() {
        let key = ApiKey::new("abc").unwrap();
        assert_eq!(key.to_string(), "****");
    }

    #[test]
    fn test_from_env_missing_variable() {
        assert!(ApiKey::from_env("DEEPSEEK_RELAY_TEST_UNSET_VARIABLE_9F2A").is_none());
    }
}
