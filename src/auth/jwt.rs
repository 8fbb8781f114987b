use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{
    config::JwtConfig,
    error::AuthError,
    state::AppState,
    store::Role,
};

use super::claims::Claims;

/// Signing and verification material derived from config. Symmetric HS256
/// under a single server-held secret; rotating the secret invalidates every
/// outstanding token, which short TTLs make acceptable.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    /// Mint a token binding the username, the immutable numeric id and the
    /// role, expiring `access_ttl` from now. The TTL is fixed at mint time;
    /// a token cannot be renewed, only replaced by a fresh login.
    pub fn sign(&self, username: &str, user_id: i64, role: Role) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.access_ttl.as_secs() as i64);
        let claims = Claims {
            sub: username.to_string(),
            uid: user_id,
            role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id, username, "jwt signed");
        Ok(token)
    }

    /// Signature integrity is checked first, then expiry, then the claim set.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        // A token is valid strictly within [iat, iat + ttl); no grace window.
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::Json(_)
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::InvalidAudience
                | ErrorKind::InvalidIssuer => AuthError::MalformedClaims,
                _ => AuthError::InvalidSignature,
            }
        })?;
        debug!(user_id = data.claims.uid, "jwt verified");
        Ok(data.claims)
    }
}
