use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use thiserror::Error;
use tracing::debug;

use shared::types::GameClaims;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("empty token")]
    Empty,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Turns a bearer credential into `GameClaims`.
///
/// `Unverified` only checks that the token is a well-formed JWT whose
/// payload has the claim shape: the signature, expiry, audience and issuer
/// are not looked at here. Expiry is the guard's job; the signature is
/// expected to have been checked upstream. `Verified` additionally checks an
/// HMAC signature against the configured secret.
#[derive(Clone)]
pub enum ClaimsDecoder {
    Unverified,
    Verified(DecodingKey),
}

impl std::fmt::Debug for ClaimsDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unverified => f.write_str("ClaimsDecoder::Unverified"),
            Self::Verified(_) => f.write_str("ClaimsDecoder::Verified(..)"),
        }
    }
}

impl ClaimsDecoder {
    pub fn new(verify_signature: bool, secret: &str) -> Self {
        if verify_signature {
            Self::Verified(DecodingKey::from_secret(secret.as_bytes()))
        } else {
            Self::Unverified
        }
    }

    pub fn decode(&self, token: &str) -> Result<GameClaims, DecodeError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DecodeError::Empty);
        }

        let unverified_key = DecodingKey::from_secret(&[]);
        let (key, validation) = match self {
            Self::Unverified => {
                let mut validation = Validation::new(Algorithm::HS256);
                validation.insecure_disable_signature_validation();
                (&unverified_key, relax(validation))
            }
            Self::Verified(key) => {
                let mut validation = Validation::new(Algorithm::HS512);
                validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
                (key, relax(validation))
            }
        };

        let data = decode::<GameClaims>(token, key, &validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            DecodeError::Malformed(e.to_string())
        })?;

        Ok(data.claims)
    }
}

/// Leave every time and audience decision to the authorization guard.
fn relax(mut validation: Validation) -> Validation {
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}
