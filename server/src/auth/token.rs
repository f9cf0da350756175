use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use tracing::debug;

use shared::types::{GameClaims, SERVICE_AUDIENCE};
use shared::types::server_config::AuthConfig;

use crate::database::{generate_uuid, get_timestamp};
use crate::database::users::User;

/// Sign `claims` with HS512 under `secret`.
pub fn sign_claims(claims: &GameClaims, secret: &str) -> anyhow::Result<String> {
    let token = encode(
        &Header::new(Algorithm::HS512),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// Mints the tokens handed out at login and to backend services.
///
/// The secret is fixed for the life of the process; audience, issuer and
/// lifetime are read from the live config on every call.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }

    /// Claims for a player session starting at `now`.
    pub fn user_claims(user: &User, auth: &AuthConfig, now: i64) -> GameClaims {
        GameClaims {
            user_id: user.id.clone(),
            username: user.name.clone(),
            user_email: user.email.clone(),
            is_admin: user.is_admin,
            aud: auth.audience.clone(),
            exp: now + auth.token_expiry_secs(),
            jti: generate_uuid(),
            iat: now,
            iss: auth.issuer.clone(),
            nbf: now,
            sub: String::new(),
        }
    }

    /// Issue a login token. Returns the token and its expiry.
    pub fn issue_for_user(&self, user: &User, auth: &AuthConfig) -> anyhow::Result<(String, i64)> {
        let claims = Self::user_claims(user, auth, get_timestamp());
        debug!("Issuing token {} for user {}", claims.jti, user.id);
        let token = sign_claims(&claims, &self.secret)?;
        Ok((token, claims.exp))
    }

    /// Issue a token with the service audience for a named backend caller.
    pub fn issue_for_service(
        &self,
        name: &str,
        auth: &AuthConfig,
        ttl_secs: i64,
    ) -> anyhow::Result<(String, i64)> {
        let now = get_timestamp();
        let claims = GameClaims {
            aud: SERVICE_AUDIENCE.to_string(),
            exp: now.saturating_add(ttl_secs),
            jti: generate_uuid(),
            iat: now,
            iss: auth.issuer.clone(),
            nbf: now,
            sub: name.to_string(),
            ..Default::default()
        };
        let token = sign_claims(&claims, &self.secret)?;
        Ok((token, claims.exp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::ClaimsDecoder;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn auth_config() -> AuthConfig {
        AuthConfig {
            token_expiry_minutes: 480,
            jwt_secret: Some(SECRET.into()),
            audience: "medieval".into(),
            issuer: "users-service".into(),
            verify_signature: false,
        }
    }

    fn user() -> User {
        User {
            id: "u-1".into(),
            name: "Prothean".into(),
            email: "prothean@example.com".into(),
            password: String::new(),
            coins: 0,
            gems: 0,
            is_admin: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn user_claims_follow_auth_config() {
        let claims = TokenIssuer::user_claims(&user(), &auth_config(), 1_000);
        assert_eq!(claims.aud, "medieval");
        assert_eq!(claims.iss, "users-service");
        assert_eq!(claims.exp, 1_000 + 8 * 3600);
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.nbf, 1_000);
        assert!(claims.is_admin);
        assert_eq!(claims.jti.len(), 36);
    }

    #[test]
    fn issued_login_token_decodes_to_the_user() {
        let issuer = TokenIssuer::new(SECRET.into());
        let (token, expires_at) = issuer.issue_for_user(&user(), &auth_config()).unwrap();
        let claims = ClaimsDecoder::new(true, SECRET).decode(&token).unwrap();
        assert_eq!(claims.user_id, "u-1");
        assert_eq!(claims.username, "Prothean");
        assert_eq!(claims.exp, expires_at);
    }

    #[test]
    fn service_token_carries_service_audience() {
        let issuer = TokenIssuer::new(SECRET.into());
        let (token, _) = issuer.issue_for_service("matchmaker", &auth_config(), 60).unwrap();
        let claims = ClaimsDecoder::Unverified.decode(&token).unwrap();
        assert!(claims.is_service());
        assert_eq!(claims.sub, "matchmaker");
        assert!(!claims.is_admin);
    }

    #[test]
    fn huge_service_ttl_clamps_expiry() {
        let issuer = TokenIssuer::new(SECRET.into());
        let (token, expires_at) = issuer
            .issue_for_service("matchmaker", &auth_config(), i64::MAX)
            .unwrap();
        assert_eq!(expires_at, i64::MAX);
        let claims = ClaimsDecoder::Unverified.decode(&token).unwrap();
        assert!(!claims.is_expired(get_timestamp()));
    }
}
