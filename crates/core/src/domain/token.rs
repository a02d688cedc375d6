// Credential value types

use serde::{Deserialize, Serialize};

const BEARER_PREFIX: &str = "Bearer ";

/// Caller credential for the platform APIs
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Value for the `Authorization` header.
    ///
    /// Tokens handed out by the host auth flow usually already carry the
    /// scheme; bare tokens get it prepended.
    pub fn authorization_header(&self) -> String {
        if self.0.starts_with(BEARER_PREFIX) {
            self.0.clone()
        } else {
            format!("{}{}", BEARER_PREFIX, self.0)
        }
    }
}

// Never print token material
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// EC3 bearer token with its expiry (epoch ms)
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ec3Token {
    pub token: String,
    pub expires_at: i64,
}

impl Ec3Token {
    pub fn new(token: impl Into<String>, expires_at: i64) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Signed in iff a token is present and has not expired
    pub fn is_valid(&self, now_millis: i64) -> bool {
        !self.token.is_empty() && self.expires_at > now_millis
    }
}

impl std::fmt::Debug for Ec3Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ec3Token")
            .field("token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header_adds_scheme_once() {
        assert_eq!(AccessToken::new("abc").authorization_header(), "Bearer abc");
        assert_eq!(
            AccessToken::new("Bearer abc").authorization_header(),
            "Bearer abc"
        );
    }

    #[test]
    fn test_debug_hides_secret() {
        let token = AccessToken::new("super-secret");
        assert!(!format!("{:?}", token).contains("super-secret"));

        let ec3 = Ec3Token::new("ec3-secret", 10);
        assert!(!format!("{:?}", ec3).contains("ec3-secret"));
    }

    #[test]
    fn test_ec3_token_expiry() {
        let token = Ec3Token::new("ec3", 5_000);
        assert!(token.is_valid(4_999));
        assert!(!token.is_valid(5_000));
        assert!(!Ec3Token::new("", 5_000).is_valid(0));
    }
}
