use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    auth::{claims::Claims, repo::User},
    config::JwtConfig,
    error::ApiError,
    state::AppState,
};

/// Signing and verification keys plus session parameters from config.
///
/// The secret is read once at startup and shared read-only; no other module
/// inspects token internals.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity_days: i64,
    cookie_name: String,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_days,
            cookie_name,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity_days: ttl_days,
            cookie_name,
        }
    }
}

impl JwtKeys {
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn sign(&self, user: &User, validity_days: i64) -> Result<String, ApiError> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::days(validity_days);
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(e.into()))?;
        debug!(user_id = user.id, "session token issued");
        Ok(token)
    }

    /// Issue a session token for `user` with the configured validity.
    pub fn issue(&self, user: &User) -> Result<String, ApiError> {
        self.sign(user, self.validity_days)
    }

    /// Verify signature and expiry. Malformed input, a bad signature and an
    /// elapsed expiry are indistinguishable to the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| ApiError::InvalidToken)?;
        debug!(user_id = data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}
