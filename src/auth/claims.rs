use serde::{Deserialize, Serialize};

use crate::store::Role;

/// JWT payload. `sub` carries the username, `uid` the immutable numeric id;
/// both must be present for a token to resolve to an identity. `role` is
/// tolerated missing so foreign tokens degrade to plain users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: i64,
    #[serde(default)]
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

/// Who is making this request, as resolved from a verified token. Everything
/// past token verification consumes this value and never the raw token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.uid,
            username: claims.sub,
            role: claims.role,
        }
    }
}
