//! Google OAuth2 service-account authentication for the Sheets API.
//!
//! Signs a short-lived RS256 assertion with the service account's key,
//! exchanges it at the account's `token_uri`, and caches the access token
//! until shortly before it expires.

use crate::error::{StoreError, truncate_error};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each signed assertion (Google's maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Refresh this long before the access token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Supplies bearer tokens for ledger API calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, StoreError>;
}

/// The fields of a service-account credentials blob this bot needs.
#[derive(Clone)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub token_uri: String,
    signing_key: EncodingKey,
}

#[derive(Deserialize)]
struct RawServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Parse the JSON credentials blob and load its private key.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let raw: RawServiceAccountKey = serde_json::from_str(raw)
            .map_err(|e| format!("not a service account JSON document: {}", e))?;
        let signing_key = EncodingKey::from_rsa_pem(raw.private_key.as_bytes())
            .map_err(|e| format!("private_key is not an RSA PEM key: {}", e))?;

        Ok(Self {
            client_email: raw.client_email,
            token_uri: raw
                .token_uri
                .filter(|uri| !uri.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
            signing_key,
        })
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String, StoreError> {
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SHEETS_SCOPE,
            aud: &self.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| StoreError::Auth(format!("failed to sign assertion: {}", e)))
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
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
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) < self.expires_at
    }
}

pub struct ServiceAccountAuth {
    key: ServiceAccountKey,
    http: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(key: ServiceAccountKey, http: Client) -> Self {
        Self {
            key,
            http,
            cached: Mutex::new(None),
        }
    }

    async fn exchange(&self) -> Result<CachedToken, StoreError> {
        let assertion = self.key.assertion(Utc::now())?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!(
                "token exchange failed ({}): {}",
                status,
                truncate_error(&body)
            )));
        }

        let token: TokenResponse = response.json().await?;
        log::debug!(
            "Obtained Sheets access token for {} (expires in {}s)",
            self.key.client_email,
            token.expires_in
        );

        Ok(CachedToken {
            value: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, StoreError> {
        // Held across the exchange so concurrent callers share one refresh.
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Utc::now())) {
            return Ok(token.value.clone());
        }

        let token = self.exchange().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

/// Fixed bearer token, for tests against a local fake API.
#[cfg(test)]
pub struct StaticToken(pub String);

#[cfg(test)]
#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, StoreError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::error::MAX_ERROR_BODY;
    use crate::ledger::test_support::spawn_server;
    use axum::extract::State;
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub const TEST_PRIVATE_KEY: &str = include_str!("../../testdata/service_account_key.pem");
    const TEST_PUBLIC_KEY: &str = include_str!("../../testdata/service_account_pub.pem");

    /// A credentials blob signed with the throwaway test key.
    pub fn service_account_json(token_uri: &str) -> String {
        json!({
            "type": "service_account",
            "project_id": "eggegram-test",
            "client_email": "eggegram@eggegram-test.iam.gserviceaccount.com",
            "private_key": TEST_PRIVATE_KEY,
            "token_uri": token_uri,
        })
        .to_string()
    }

    #[test]
    fn test_from_json_defaults_token_uri() {
        let blob = json!({
            "client_email": "a@b.iam.gserviceaccount.com",
            "private_key": TEST_PRIVATE_KEY,
        })
        .to_string();
        let key = ServiceAccountKey::from_json(&blob).unwrap();
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_from_json_rejects_bad_key() {
        let blob = json!({
            "client_email": "a@b.iam.gserviceaccount.com",
            "private_key": "not a key",
        })
        .to_string();
        let err = ServiceAccountKey::from_json(&blob).unwrap_err();
        assert!(err.contains("private_key"));
    }

    #[test]
    fn test_assertion_claims() {
        let key = ServiceAccountKey::from_json(&service_account_json("https://t.example/token"))
            .unwrap();
        let now = Utc::now();
        let jwt = key.assertion(now).unwrap();

        let parts: Vec<&str> = jwt.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header = jsonwebtoken::decode_header(&jwt).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);

        let mut validation = jsonwebtoken::Validation::new(Algorithm::RS256);
        validation.set_audience(&["https://t.example/token"]);
        let public_key = jsonwebtoken::DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
        let decoded =
            jsonwebtoken::decode::<serde_json::Value>(&jwt, &public_key, &validation).unwrap();
        assert_eq!(decoded.claims["iss"], key.client_email.as_str());
        assert_eq!(decoded.claims["scope"], SHEETS_SCOPE);
        assert_eq!(decoded.claims["exp"], now.timestamp() + ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn test_cached_token_freshness() {
        let now = Utc::now();
        let token = CachedToken {
            value: "t".into(),
            expires_at: now + Duration::seconds(120),
        };
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::seconds(61)));
    }

    #[derive(Clone, Default)]
    struct TokenEndpoint {
        calls: Arc<AtomicUsize>,
    }

    async fn issue_token(
        State(endpoint): State<TokenEndpoint>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        assert_eq!(form.get("grant_type").map(String::as_str), Some(JWT_GRANT_TYPE));
        assert!(form.get("assertion").is_some_and(|a| a.split('.').count() == 3));
        let n = endpoint.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Json(json!({
            "access_token": format!("token-{}", n),
            "expires_in": 3599,
            "token_type": "Bearer",
        }))
    }

    #[tokio::test]
    async fn test_exchanges_once_and_caches() {
        let endpoint = TokenEndpoint::default();
        let app = Router::new()
            .route("/token", post(issue_token))
            .with_state(endpoint.clone());
        let base = spawn_server(app).await;

        let key = ServiceAccountKey::from_json(&service_account_json(&format!("{}/token", base)))
            .unwrap();
        let auth = ServiceAccountAuth::new(key, Client::new());

        assert_eq!(auth.access_token().await.unwrap(), "token-1");
        assert_eq!(auth.access_token().await.unwrap(), "token-1");
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_exchange_is_auth_error() {
        let app = Router::new().route(
            "/token",
            post(|| async { (axum::http::StatusCode::BAD_REQUEST, "invalid_grant") }),
        );
        let base = spawn_server(app).await;

        let key = ServiceAccountKey::from_json(&service_account_json(&format!("{}/token", base)))
            .unwrap();
        let auth = ServiceAccountAuth::new(key, Client::new());

        match auth.access_token().await {
            Err(StoreError::Auth(msg)) => assert!(msg.contains("invalid_grant")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_exchange_body_is_truncated() {
        let app = Router::new().route(
            "/token",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, "x".repeat(4096)) }),
        );
        let base = spawn_server(app).await;

        let key = ServiceAccountKey::from_json(&service_account_json(&format!("{}/token", base)))
            .unwrap();
        let auth = ServiceAccountAuth::new(key, Client::new());

        match auth.access_token().await {
            Err(StoreError::Auth(msg)) => {
                assert!(msg.ends_with("..."));
                assert!(msg.len() < MAX_ERROR_BODY + 64);
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }
}
