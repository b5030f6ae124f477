use crate::core::{AuthError, SessionClaims, TokenVerifier};
use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Verifies `base64url(claims).base64url(hmac_sha256(secret, claims_segment))` tokens.
pub struct HmacTokenVerifier {
    keyed: HmacSha256,
}

impl HmacTokenVerifier {
    pub fn new(secret: &str) -> Result<Self> {
        let keyed = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow!("Failed to initialize session token key: {e}"))?;
        Ok(Self { keyed })
    }

    fn mac(&self) -> HmacSha256 {
        self.keyed.clone()
    }

    /// Produces a token for local development and tests.
    pub fn sign(&self, claims: &SessionClaims) -> Result<String> {
        let payload = serde_json::to_vec(claims).context("Failed to serialize session claims")?;
        let encoded = URL_SAFE_NO_PAD.encode(payload);
        let mut mac = self.mac();
        mac.update(encoded.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        Ok(format!("{encoded}.{signature}"))
    }
}

impl TokenVerifier for HmacTokenVerifier {
    fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let decoded = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&decoded).map_err(|_| AuthError::Malformed)?;

        if claims.exp <= Utc::now().timestamp() {
            debug!(uid = %claims.uid, "Rejecting expired session token");
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AuthenticatedUser, Role};

    fn claims(ttl_secs: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            uid: "u1".to_string(),
            email: "a@b.com".to_string(),
            name: None,
            role: Role::User,
            iat: now,
            exp: now + ttl_secs,
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let verifier = HmacTokenVerifier::new("s3cret").unwrap();
        let token = verifier.sign(&claims(60)).unwrap();
        let user = verifier.authenticate(&token).unwrap();
        assert_eq!(
            user,
            AuthenticatedUser {
                uid: "u1".to_string(),
                email: "a@b.com".to_string(),
                display_name: "a@b.com".to_string(),
                role: Role::User,
            }
        );
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = HmacTokenVerifier::new("s3cret").unwrap().sign(&claims(60)).unwrap();
        let err = HmacTokenVerifier::new("other").unwrap().verify(&token).unwrap_err();
        assert_eq!(err, AuthError::BadSignature);
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let verifier = HmacTokenVerifier::new("s3cret").unwrap();
        let token = verifier.sign(&claims(60)).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let mut forged = claims(60);
        forged.role = Role::Admin;
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let err = verifier
            .verify(&format!("{forged_payload}.{signature}"))
            .unwrap_err();
        assert_eq!(err, AuthError::BadSignature);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = HmacTokenVerifier::new("s3cret").unwrap();
        let token = verifier.sign(&claims(-1)).unwrap();
        assert_eq!(verifier.verify(&token).unwrap_err(), AuthError::Expired);
    }

    #[test]
    fn test_malformed_tokens() {
        let verifier = HmacTokenVerifier::new("s3cret").unwrap();
        assert_eq!(verifier.verify("").unwrap_err(), AuthError::MissingToken);
        assert_eq!(verifier.verify("abc").unwrap_err(), AuthError::Malformed);
        assert_eq!(verifier.verify("abc.!!!").unwrap_err(), AuthError::Malformed);
    }
}
