//! Capability token validation.
//!
//! Two forms are accepted:
//! - Signed: `v1.<base64url claims>.<base64url ed25519 signature>`, where the
//!   signature covers the ASCII text `v1.<base64url claims>`. Verified against
//!   any trusted public key; claims must be unexpired and scoped to the
//!   resource (or `*`).
//! - Opaque: the SHA-256 digest of the token is compared in constant time
//!   against every configured digest.
//!
//! Keys and digests come from configuration and rotate with it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::{Choice, ConstantTimeEq};

use crate::config::SensitivityConfig;

const SIGNED_PREFIX: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature not valid for any trusted key")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("token scope does not cover '{0}'")]
    OutOfScope(String),
    #[error("token not recognised")]
    Unknown,
    #[error("invalid token digest '{0}': expected 64 hex characters")]
    InvalidDigest(String),
    #[error("invalid trusted key '{0}': expected 64 hex characters of an ed25519 public key")]
    InvalidKey(String),
}

/// Claims carried by a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub scope: Vec<String>,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// How a token was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    Signed { subject: String },
    Digest,
}

/// Parse a hex SHA-256 digest.
pub fn parse_digest(hex_digest: &str) -> Result<[u8; 32], TokenError> {
    hex::decode(hex_digest.trim())
        .ok()
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .ok_or_else(|| TokenError::InvalidDigest(hex_digest.to_string()))
}

/// Parse a hex Ed25519 public key.
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, TokenError> {
    hex::decode(hex_key.trim())
        .ok()
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .and_then(|bytes| VerifyingKey::from_bytes(&bytes).ok())
        .ok_or_else(|| TokenError::InvalidKey(hex_key.to_string()))
}

/// Hex SHA-256 digest of an opaque token, as stored in configuration.
pub fn token_digest_hex(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Produce a signed token for `claims`.
pub fn sign_token(key: &SigningKey, claims: &TokenClaims) -> Result<String, serde_json::Error> {
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{}.{}", SIGNED_PREFIX, payload);
    let signature = key.sign(signing_input.as_bytes());
    Ok(format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

/// Validates capability tokens against configured keys and digests.
#[derive(Debug, Clone, Default)]
pub struct CapabilityVerifier {
    digests: Vec<[u8; 32]>,
    keys: Vec<VerifyingKey>,
}

impl CapabilityVerifier {
    pub fn from_config(config: &SensitivityConfig) -> Result<Self, TokenError> {
        let digests = config
            .capability_token_digests
            .iter()
            .map(|d| parse_digest(d))
            .collect::<Result<Vec<_>, _>>()?;
        let keys = config
            .trusted_token_keys
            .iter()
            .map(|k| parse_public_key(k))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { digests, keys })
    }

    /// Validate `token` for access to `resource` at time `now` (Unix seconds).
    pub fn verify(&self, token: &str, resource: &str, now: u64) -> Result<TokenGrant, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::Malformed);
        }

        if token.starts_with("v1.") {
            return self.verify_signed(token, resource, now);
        }

        let actual: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        // Every digest is compared so timing does not reveal which one matched.
        let mut matched = Choice::from(0);
        for expected in &self.digests {
            matched |= actual.as_slice().ct_eq(expected.as_slice());
        }

        if bool::from(matched) {
            Ok(TokenGrant::Digest)
        } else {
            Err(TokenError::Unknown)
        }
    }

    fn verify_signed(&self, token: &str, resource: &str, now: u64) -> Result<TokenGrant, TokenError> {
        let (signing_input, sig_b64) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
        let payload_b64 = signing_input
            .strip_prefix("v1.")
            .filter(|p| !p.contains('.'))
            .ok_or(TokenError::Malformed)?;

        let sig_bytes = URL_SAFE_NO_PAD.decode(sig_b64).map_err(|_| TokenError::Malformed)?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|_| TokenError::Malformed)?;

        let trusted = self
            .keys
            .iter()
            .any(|key| key.verify_strict(signing_input.as_bytes(), &signature).is_ok());
        if !trusted {
            return Err(TokenError::BadSignature);
        }

        let payload = URL_SAFE_NO_PAD.decode(payload_b64).map_err(|_| TokenError::Malformed)?;
        let claims: TokenClaims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if !claims.scope.iter().any(|s| s == "*" || s == resource) {
            return Err(TokenError::OutOfScope(resource.to_string()));
        }

        Ok(TokenGrant::Signed { subject: claims.sub })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn verifier(keys: &[&SigningKey], opaque: &[&str]) -> CapabilityVerifier {
        let config = SensitivityConfig {
            capability_token_digests: opaque.iter().map(|t| token_digest_hex(t)).collect(),
            trusted_token_keys: keys
                .iter()
                .map(|k| hex::encode(k.verifying_key().to_bytes()))
                .collect(),
            ..SensitivityConfig::default()
        };
        CapabilityVerifier::from_config(&config).unwrap()
    }

    fn claims(scope: &[&str], exp: u64) -> TokenClaims {
        TokenClaims {
            sub: "ops@condo".into(),
            scope: scope.iter().map(|s| s.to_string()).collect(),
            exp,
        }
    }

    #[test]
    fn test_opaque_digest_match() {
        let v = verifier(&[], &["first-secret", "second-secret"]);
        assert_eq!(v.verify("second-secret", "Admin", NOW), Ok(TokenGrant::Digest));
        assert_eq!(v.verify("third-secret", "Admin", NOW), Err(TokenError::Unknown));
    }

    #[test]
    fn test_signed_token_accepted() {
        let signer = key(7);
        let v = verifier(&[&key(1), &signer], &[]);
        let token = sign_token(&signer, &claims(&["NominaModel"], NOW + 60)).unwrap();
        assert_eq!(
            v.verify(&token, "NominaModel", NOW),
            Ok(TokenGrant::Signed { subject: "ops@condo".into() })
        );
    }

    #[test]
    fn test_signed_token_rejections() {
        let signer = key(7);
        let v = verifier(&[&signer], &[]);

        let expired = sign_token(&signer, &claims(&["*"], NOW)).unwrap();
        assert_eq!(v.verify(&expired, "Admin", NOW), Err(TokenError::Expired));

        let scoped = sign_token(&signer, &claims(&["Persona"], NOW + 60)).unwrap();
        assert_eq!(
            v.verify(&scoped, "Admin", NOW),
            Err(TokenError::OutOfScope("Admin".into()))
        );

        let foreign = sign_token(&key(9), &claims(&["*"], NOW + 60)).unwrap();
        assert_eq!(v.verify(&foreign, "Admin", NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_claims_fail_signature() {
        let signer = key(7);
        let v = verifier(&[&signer], &[]);
        let token = sign_token(&signer, &claims(&["Persona"], NOW + 60)).unwrap();
        let sig = token.rsplit_once('.').unwrap().1;
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(&["*"], NOW + 60)).unwrap());
        let forged = format!("v1.{}.{}", forged_payload, sig);
        assert_eq!(v.verify(&forged, "Admin", NOW), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_inputs() {
        let v = verifier(&[&key(7)], &[]);
        assert_eq!(v.verify("", "Admin", NOW), Err(TokenError::Malformed));
        assert_eq!(v.verify("v1.only", "Admin", NOW), Err(TokenError::Malformed));
        assert_eq!(v.verify("v1.a.b.c", "Admin", NOW), Err(TokenError::Malformed));
    }

    #[test]
    fn test_config_parsing_errors() {
        assert!(matches!(parse_digest("abcd"), Err(TokenError::InvalidDigest(_))));
        assert!(matches!(parse_public_key("zz"), Err(TokenError::InvalidKey(_))));
        assert!(parse_digest(&token_digest_hex("x")).is_ok());
    }
}
