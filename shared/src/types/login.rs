use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Login wire types
// ---------------------------------------------------------------------------

/// `id` may be the user's id, name or email.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginData {
    #[serde(alias = "username", alias = "email")]
    pub id: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Signed bearer token.
    pub token: String,
    /// Unix timestamp (seconds) after which the token is rejected.
    pub expires_at: i64,
    pub is_admin: bool,
}
