//! Access token providers
//!
//! Token acquisition and refresh happen outside this crate; a provider only
//! hands out a bearer token for the next request.

use crate::error::{Error, Result};
use crate::util::mask_token;
use std::fmt;

/// Supplies bearer tokens for remote calls
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Return a token valid for the next request
    async fn access_token(&self) -> Result<String>;
}

/// A fixed, externally obtained access token
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

// SECURITY: Custom Debug implementation to mask the token
impl fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticToken")
            .field("token", &mask_token(&self.token))
            .finish()
    }
}

impl StaticToken {
    /// Wrap an access token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let token = std::env::var(var)
            .map_err(|_| Error::Credential(format!("{var} not set")))?;
        Ok(Self::new(token))
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(Error::Credential("access token is empty".to_string()));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token() {
        let provider = StaticToken::new("ya29.abcdefghijklmnop");
        assert_eq!(
            provider.access_token().await.unwrap(),
            "ya29.abcdefghijklmnop"
        );
        let debug = format!("{provider:?}");
        assert!(!debug.contains("efghijkl"));
    }

    #[tokio::test]
    async fn test_empty_token_is_credential_error() {
        let provider = StaticToken::new("  ");
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, Error::Credential(_)));
    }
}
