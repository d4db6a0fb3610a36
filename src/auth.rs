//! Bearer-token verification — the identity boundary of the service.
//!
//! The external auth provider (OAuth flow, user store) mints Ed25519-signed
//! tokens of the form `base64url(claims).base64url(signature)`; this module
//! only verifies them. Verification is pure: one call per connection at
//! upgrade time, no storage access.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::error::CollabError;
use crate::types::{Identity, Role};

/// Signed claims carried by a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub role: Role,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// Verifies bearer tokens against the auth provider's public key.
#[derive(Debug, Clone)]
pub struct IdentityVerifier {
    key: VerifyingKey,
}

impl IdentityVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Parse a standard-base64 32-byte public key (the `AUTH_PUBLIC_KEY`
    /// config format).
    pub fn from_base64(encoded: &str) -> Result<Self, CollabError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| CollabError::Auth(format!("invalid public key encoding: {e}")))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CollabError::Auth("public key must be 32 bytes".into()))?;
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| CollabError::Auth(format!("invalid public key: {e}")))?;
        Ok(Self { key })
    }

    /// Verify a token and extract the caller identity.
    ///
    /// Rejects on malformed structure, bad signature, or expiry.
    pub fn verify(&self, token: &str) -> Result<Identity, CollabError> {
        let (claims_b64, sig_b64) = token
            .split_once('.')
            .ok_or_else(|| CollabError::Auth("malformed token".into()))?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| CollabError::Auth("malformed token claims".into()))?;
        let sig_bytes = URL_SAFE_NO_PAD
            .decode(sig_b64)
            .map_err(|_| CollabError::Auth("malformed token signature".into()))?;
        let signature = Signature::from_slice(&sig_bytes)
            .map_err(|_| CollabError::Auth("malformed token signature".into()))?;

        // Signature first, then claims: unverified bytes are never parsed.
        self.key
            .verify_strict(&claims_bytes, &signature)
            .map_err(|_| CollabError::Auth("invalid token signature".into()))?;

        let claims: Claims = serde_json::from_slice(&claims_bytes)
            .map_err(|e| CollabError::Auth(format!("invalid token claims: {e}")))?;

        if claims.exp <= Utc::now().timestamp() {
            return Err(CollabError::Auth("token expired".into()));
        }

        Ok(Identity {
            id: claims.id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Mint a token for the given claims. Used by the auth provider and by
/// tests; the server itself never signs.
pub fn issue_token(key: &SigningKey, claims: &Claims) -> Result<String, CollabError> {
    let body = serde_json::to_vec(claims)
        .map_err(|e| CollabError::Protocol(format!("claims serialize error: {e}")))?;
    let signature = key.sign(&body);
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(&body),
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(exp_offset: i64) -> Claims {
        Claims {
            id: 7,
            email: "ada@example.com".into(),
            role: Role::Admin,
            exp: Utc::now().timestamp() + exp_offset,
        }
    }

    #[test]
    fn valid_token_round_trips() {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let token = issue_token(&key, &claims(3600)).unwrap();

        let verifier = IdentityVerifier::new(key.verifying_key());
        let identity = verifier.verify(&token).unwrap();
        assert_eq!(identity.id, 7);
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let other = SigningKey::generate(&mut rand::thread_rng());
        let token = issue_token(&key, &claims(3600)).unwrap();

        let verifier = IdentityVerifier::new(other.verifying_key());
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let token = issue_token(&key, &claims(-60)).unwrap();

        let verifier = IdentityVerifier::new(key.verifying_key());
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let token = issue_token(&key, &claims(3600)).unwrap();

        // Swap in claims with role=admin signed for a different body.
        let forged_claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims(7200)).unwrap(),
        );
        let sig = token.split_once('.').unwrap().1;
        let forged = format!("{forged_claims}.{sig}");

        let verifier = IdentityVerifier::new(key.verifying_key());
        assert!(verifier.verify(&forged).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let verifier = IdentityVerifier::new(key.verifying_key());
        assert!(verifier.verify("not-a-token").is_err());
        assert!(verifier.verify("a.b").is_err());
        assert!(verifier.verify("").is_err());
    }
}
