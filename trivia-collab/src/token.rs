use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use ring::hmac;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PrimaryKey, Role};

/// The payload of an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The id of the user the token was issued to
    pub sub: PrimaryKey,
    pub role: Role,
    /// Issued at, in unix seconds
    pub iat: i64,
    /// Expires at, in unix seconds
    pub exp: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed")]
    Malformed,
    #[error("Token signature is invalid")]
    BadSignature,
    #[error("Token has expired")]
    Expired,
}

/// Signs and verifies stateless access tokens.
///
/// A token is `base64url(claims) "." base64url(hmac_sha256(claims))`.
pub struct TokenSigner {
    key: hmac::Key,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user_id: PrimaryKey, role: Role) -> String {
        let now = Utc::now().timestamp();

        self.sign(&Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + self.ttl.num_seconds(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        hmac::verify(&self.key, payload.as_bytes(), &signature)
            .map_err(|_| TokenError::BadSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;

        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, claims: &Claims) -> String {
        // Serializing a struct of plain fields can't fail
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap_or_default());
        let tag = hmac::sign(&self.key, payload.as_bytes());

        format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new("secret", Duration::hours(1))
    }

    #[test]
    fn test_issued_token_verifies() {
        let signer = signer();
        let token = signer.issue(7, Role::Admin);
        let claims = signer.verify(&token).expect("token is valid");

        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600, "token lives for an hour");
    }

    #[test]
    fn test_other_secret_is_rejected() {
        let token = signer().issue(7, Role::User);
        let other = TokenSigner::new("other", Duration::hours(1));

        assert_eq!(other.verify(&token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let signer = signer();
        let token = signer.issue(7, Role::User);
        let (_, signature) = token.split_once('.').unwrap();

        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                sub: 7,
                role: Role::Admin,
                iat: 0,
                exp: i64::MAX,
            })
            .unwrap(),
        );

        assert_eq!(
            signer.verify(&format!("{forged}.{signature}")),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_expired_and_malformed() {
        let signer = signer();
        let expired = signer.sign(&Claims {
            sub: 1,
            role: Role::User,
            iat: 0,
            exp: 1,
        });

        assert_eq!(signer.verify(&expired), Err(TokenError::Expired));
        assert_eq!(signer.verify("garbage"), Err(TokenError::Malformed));
        assert_eq!(signer.verify(""), Err(TokenError::Malformed));
    }
}
