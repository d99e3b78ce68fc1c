//! Bearer tokens for the Sheets API.
//!
//! `ServiceAccountTokenProvider` owns the service-account key and the cached
//! access token. Callers only ever ask for a valid token; refresh happens
//! inside `valid_token` when the cached one is missing or about to expire.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Result, SheetsError};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before the token's stated expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// An access token that is valid right now.
    async fn valid_token(&self) -> Result<String>;
}

/// Fixed token. For local runs against a proxy and for tests.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn valid_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// The fields of a Google service-account JSON key that the JWT flow needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    pub token_uri: String,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    client: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenProvider {
    pub fn new(key: ServiceAccountKey) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| SheetsError::Auth(format!("invalid service account key: {e}")))?;

        Ok(Self {
            key,
            encoding_key,
            scope: SPREADSHEETS_SCOPE.to_string(),
            client: reqwest::Client::new(),
            cached: Mutex::new(None),
        })
    }

    /// Load a key file as downloaded from the cloud console.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SheetsError::Auth(format!("reading service account key {}: {e}", path.display()))
        })?;
        let key: ServiceAccountKey = serde_json::from_str(&json)
            .map_err(|e| SheetsError::Auth(format!("parsing service account key: {e}")))?;
        Self::new(key)
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        encode(&header, &claims, &self.encoding_key)
            .map_err(|e| SheetsError::Auth(format!("signing assertion: {e}")))
    }

    async fn exchange(&self, now: DateTime<Utc>) -> Result<CachedToken> {
        let assertion = self.signed_assertion(now)?;
        let resp = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| SheetsError::Auth(format!("token request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!(
                "token endpoint returned {}: {body}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| SheetsError::Auth(format!("token response: {e}")))?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenProvider {
    async fn valid_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.access_token.clone());
        }

        tracing::debug!(client_email = %self.key.client_email, "Refreshing Sheets access token");
        let token = self.exchange(now).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_stale_inside_skew_window() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".into(),
            expires_at: now + Duration::seconds(EXPIRY_SKEW_SECS - 1),
        };
        assert!(!token.is_fresh(now));
    }

    #[test]
    fn token_is_fresh_well_before_expiry() {
        let now = Utc::now();
        let token = CachedToken {
            access_token: "t".into(),
            expires_at: now + Duration::seconds(3600),
        };
        assert!(token.is_fresh(now));
    }

    #[test]
    fn garbage_key_is_auth_error() {
        let key = ServiceAccountKey {
            client_email: "svc@example.iam.gserviceaccount.com".into(),
            private_key: "not a pem".into(),
            private_key_id: None,
            token_uri: "https://oauth2.googleapis.com/token".into(),
        };
        assert!(matches!(
            ServiceAccountTokenProvider::new(key),
            Err(SheetsError::Auth(_))
        ));
    }

    #[test]
    fn missing_key_file_is_auth_error() {
        let result = ServiceAccountTokenProvider::from_file("/nonexistent/key.json");
        assert!(matches!(result, Err(SheetsError::Auth(_))));
    }

    #[tokio::test]
    async fn static_provider_returns_its_token() {
        let provider = StaticTokenProvider::new("abc");
        assert_eq!(provider.valid_token().await.unwrap(), "abc");
    }
}
