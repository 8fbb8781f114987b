use serde::Deserialize;

/// Request body for changing the caller's password. The current password is
/// re-verified even though the request already carries a valid token.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
    pub new_password: String,
}
