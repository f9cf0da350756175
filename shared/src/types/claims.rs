use serde::{Deserialize, Serialize};

/// Audience carried by tokens minted for other backend services.
pub const SERVICE_AUDIENCE: &str = "svc";

/// Default audience of tokens issued to players at login.
pub const USER_AUDIENCE: &str = "medieval";

/// Default issuer written into login tokens.
pub const TOKEN_ISSUER: &str = "users-service";

/// Identity claims carried by every bearer token.
///
/// Every field is optional on the wire: a missing string decodes as `""`,
/// a missing number as `0` and a missing `is_admin` as `false`. A token with
/// no `exp` therefore reads as already expired.
///
/// Claims are never persisted. They live for the duration of one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClaims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_email: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_admin: bool,

    /// `"svc"` marks a service-to-service caller.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub aud: String,

    /// Expiry (Unix timestamp, seconds).
    #[serde(default)]
    pub exp: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub jti: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub iat: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub iss: String,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub nbf: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sub: String,
}

impl GameClaims {
    /// True when the token was minted for a backend service.
    pub fn is_service(&self) -> bool {
        self.aud == SERVICE_AUDIENCE
    }

    /// Admins and service callers may invoke high-privilege operations.
    pub fn is_privileged(&self) -> bool {
        self.is_admin || self.is_service()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.exp < now
    }

    /// Whether `identifier` names the caller by id, username or email.
    pub fn refers_to(&self, identifier: &str) -> bool {
        if identifier.is_empty() {
            return false;
        }
        identifier == self.user_id || identifier == self.username || identifier == self.user_email
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_decode_as_empty() {
        let claims: GameClaims = serde_json::from_str(r#"{"user_id":"u1"}"#).unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.username, "");
        assert!(!claims.is_admin);
        assert_eq!(claims.exp, 0);
    }

    #[test]
    fn missing_expiry_reads_as_expired() {
        let claims = GameClaims::default();
        assert!(claims.is_expired(1));
    }

    #[test]
    fn empty_identifier_never_refers_to_caller() {
        let claims = GameClaims::default();
        assert!(!claims.refers_to(""));
    }

    #[test]
    fn refers_to_matches_any_identity_field() {
        let claims = GameClaims {
            user_id: "id-1".into(),
            username: "Prothean".into(),
            user_email: "prothean@example.com".into(),
            ..Default::default()
        };
        assert!(claims.refers_to("id-1"));
        assert!(claims.refers_to("Prothean"));
        assert!(claims.refers_to("prothean@example.com"));
        assert!(!claims.refers_to("someone-else"));
    }
}
