use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::Identity;
use crate::config::AuthConfig;

/// Claims carried by a hosted-auth access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub user_metadata: Value,
}

impl SessionClaims {
    pub fn new(user_id: Uuid, email: Option<String>, config: &AuthConfig) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(config.token_expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            role: Some("authenticated".to_string()),
            aud: config.jwt_audience.clone(),
            exp,
            iat: now.timestamp(),
            user_metadata: Value::Object(Default::default()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session signing secret is not configured")]
    MissingSecret,

    #[error("malformed credentials: {0}")]
    MalformedCredentials(String),

    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Signs `claims` with the shared HS256 secret.
pub fn issue_session_token(secret: &str, claims: &SessionClaims) -> Result<String, SessionError> {
    if secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    Ok(encode(&Header::default(), claims, &encoding_key)?)
}

/// Resolves the current identity from inbound request credentials.
///
/// `Ok(None)` means the request carried no credentials at all; `Err` means
/// credentials were present but could not be trusted. The gate treats both
/// as unauthenticated.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, SessionError>;
}

/// Verifies HS256 access tokens from the bearer header or the session cookie.
#[derive(Clone)]
pub struct JwtSessionResolver {
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl JwtSessionResolver {
    pub fn new(config: &AuthConfig) -> Result<Self, SessionError> {
        if config.jwt_secret.is_empty() {
            return Err(SessionError::MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        match &config.jwt_audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            cookie_name: config.session_cookie.clone(),
        })
    }

    fn extract_token(&self, headers: &HeaderMap) -> Result<Option<String>, SessionError> {
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            let auth_str = value
                .to_str()
                .map_err(|_| SessionError::MalformedCredentials("Invalid Authorization header format".into()))?;
            let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
                SessionError::MalformedCredentials("Authorization header must use Bearer token format".into())
            })?;
            if token.trim().is_empty() {
                return Err(SessionError::MalformedCredentials("Empty bearer token".into()));
            }
            return Ok(Some(token.trim().to_string()));
        }

        Ok(session_cookie(headers, &self.cookie_name))
    }
}

/// Finds `name` among all `Cookie` headers. A double-quoted value
/// (RFC 6265 `cookie-value`) is unwrapped.
fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .filter(|(key, _)| *key == name)
        .map(|(_, value)| unquote(value.trim()))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Identity>, SessionError> {
        let Some(token) = self.extract_token(headers)? else {
            return Ok(None);
        };
        let token_data = decode::<SessionClaims>(&token, &self.decoding_key, &self.validation)?;
        Ok(Some(Identity::from(token_data.claims)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::HeaderValue;

    fn auth_config() -> AuthConfig {
        AppConfig::development().auth
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn resolves_identity_from_bearer_token() {
        let config = auth_config();
        let user_id = Uuid::new_v4();
        let claims = SessionClaims::new(user_id, Some("ops@pukk.ai".into()), &config);
        let token = issue_session_token(&config.jwt_secret, &claims).unwrap();

        let resolver = JwtSessionResolver::new(&config).unwrap();
        let identity = resolver.resolve(&bearer(&token)).await.unwrap().unwrap();
        assert_eq!(identity.id, user_id);
        assert_eq!(identity.email.as_deref(), Some("ops@pukk.ai"));
    }

    #[tokio::test]
    async fn falls_back_to_session_cookie() {
        let config = auth_config();
        let user_id = Uuid::new_v4();
        let token = issue_session_token(&config.jwt_secret, &SessionClaims::new(user_id, None, &config)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={token}", config.session_cookie)).unwrap(),
        );

        let resolver = JwtSessionResolver::new(&config).unwrap();
        let identity = resolver.resolve(&headers).await.unwrap().unwrap();
        assert_eq!(identity.id, user_id);
    }

    #[tokio::test]
    async fn quoted_cookie_value_is_unwrapped() {
        let config = auth_config();
        let user_id = Uuid::new_v4();
        let token = issue_session_token(&config.jwt_secret, &SessionClaims::new(user_id, None, &config)).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}=\"{token}\"", config.session_cookie)).unwrap(),
        );

        let resolver = JwtSessionResolver::new(&config).unwrap();
        let identity = resolver.resolve(&headers).await.unwrap().unwrap();
        assert_eq!(identity.id, user_id);
    }

    #[test]
    fn empty_quoted_cookie_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sb-access-token=\"\""));
        assert_eq!(session_cookie(&headers, "sb-access-token"), None);
    }

    #[tokio::test]
    async fn no_credentials_resolves_to_none() {
        let resolver = JwtSessionResolver::new(&auth_config()).unwrap();
        assert!(resolver.resolve(&HeaderMap::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_foreign_signature_and_wrong_scheme() {
        let config = auth_config();
        let claims = SessionClaims::new(Uuid::new_v4(), None, &config);
        let forged = issue_session_token("some-other-secret", &claims).unwrap();
        let resolver = JwtSessionResolver::new(&config).unwrap();

        assert!(matches!(
            resolver.resolve(&bearer(&forged)).await,
            Err(SessionError::InvalidToken(_))
        ));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(
            resolver.resolve(&basic).await,
            Err(SessionError::MalformedCredentials(_))
        ));
    }

    #[tokio::test]
    async fn rejects_expired_tokens() {
        let config = auth_config();
        let mut claims = SessionClaims::new(Uuid::new_v4(), None, &config);
        claims.exp = Utc::now().timestamp() - 3600;
        let token = issue_session_token(&config.jwt_secret, &claims).unwrap();

        let resolver = JwtSessionResolver::new(&config).unwrap();
        assert!(resolver.resolve(&bearer(&token)).await.is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        let mut config = auth_config();
        config.jwt_secret.clear();
        assert!(matches!(JwtSessionResolver::new(&config), Err(SessionError::MissingSecret)));
    }
}
