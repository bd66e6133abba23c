//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs whose subject is the user id.

use crate::error::UploadError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_ISSUER: &str = "tubely-access";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, UploadError> {
    let header = authorization.ok_or(UploadError::MissingToken)?;
    let (scheme, token) = header.trim().split_once(' ').ok_or(UploadError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(UploadError::MissingToken);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(UploadError::MissingToken);
    }
    Ok(token)
}

pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verifies a token and returns the user it was issued to.
    pub fn validate(&self, token: &str) -> Result<Uuid, UploadError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(UploadError::InvalidToken)?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| {
            UploadError::InvalidToken(jsonwebtoken::errors::ErrorKind::InvalidSubject.into())
        })
    }

    /// Header value to user id in one step.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Uuid, UploadError> {
        self.validate(bearer_token(authorization)?)
    }

    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }
}
