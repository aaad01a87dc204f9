use axum::http::{header::AUTHORIZATION, HeaderMap};
use huddle_core::domain::team::AuthToken;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authorization header must use the Bearer scheme")]
    MalformedHeader,
    #[error("invalid bearer token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Verifies HS256 user tokens issued by the identity service.
#[derive(Clone)]
pub struct TokenDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl TokenDecoder {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn decode(&self, token: &str) -> Result<AuthToken, AuthError> {
        let data = jsonwebtoken::decode::<AuthToken>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }

    /// `Ok(None)` when no credentials were presented.
    pub fn from_headers(&self, headers: &HeaderMap) -> Result<Option<AuthToken>, AuthError> {
        let Some(value) = headers.get(AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value.to_str().map_err(|_| AuthError::MalformedHeader)?;
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MalformedHeader)?;
        self.decode(token).map(Some)
    }
}

#[cfg(test)]
pub(crate) fn issue_token(secret: &str, claims: &AuthToken) -> String {
    use jsonwebtoken::{EncodingKey, Header};

    jsonwebtoken::encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("token should encode")
}
