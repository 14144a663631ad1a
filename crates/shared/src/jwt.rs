//! Bearer token verification for identity-provider issued JWTs.
//!
//! Production tokens are RS256 signed by the identity provider and only the
//! public key is configured. A private key can be supplied as well so that
//! tests and local tooling can mint tokens the server will accept.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Token signing is not configured")]
    SigningDisabled,
}

/// Claims carried by an identity-provider access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Verification (and optional signing) settings for bearer tokens.
#[derive(Clone)]
pub struct JwtConfig {
    decoding_key: DecodingKey,
    encoding_key: Option<EncodingKey>,
    algorithm: Algorithm,
    pub leeway_secs: u64,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("decoding_key", &"[REDACTED]")
            .field(
                "encoding_key",
                &self.encoding_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl JwtConfig {
    /// Creates an RS256 verifier from a PEM public key.
    ///
    /// # Arguments
    /// * `public_key_pem` - RSA public key of the identity provider
    /// * `private_key_pem` - optional RSA private key, enables `issue_token`
    /// * `leeway_secs` - Leeway in seconds for clock skew tolerance
    pub fn from_rsa_pem(
        public_key_pem: &str,
        private_key_pem: Option<&str>,
        leeway_secs: u64,
    ) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        let encoding_key = match private_key_pem.filter(|pem| !pem.trim().is_empty()) {
            Some(pem) => Some(
                EncodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(|e| JwtError::InvalidKey(format!("Invalid private key: {}", e)))?,
            ),
            None => None,
        };

        Ok(Self {
            decoding_key,
            encoding_key,
            algorithm: Algorithm::RS256,
            leeway_secs,
            issuer: None,
            audience: None,
        })
    }

    /// Creates an HS256 config with a shared secret. Test use only.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: Some(EncodingKey::from_secret(secret.as_bytes())),
            algorithm: Algorithm::HS256,
            leeway_secs: 0,
            issuer: None,
            audience: None,
        }
    }

    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.issuer = issuer;
        self
    }

    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Signs a token for `user_id` valid for `ttl_secs`.
    pub fn issue_token(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        ttl_secs: i64,
    ) -> Result<String, JwtError> {
        let encoding_key = self.encoding_key.as_ref().ok_or(JwtError::SigningDisabled)?;
        let now = Utc::now();

        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            iat: now.timestamp(),
            email: email.map(str::to_string),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::new(self.algorithm), &claims, encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates a token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidIssuer
                | jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }
}

/// Extracts user ID from validated claims.
pub fn extract_user_id(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> JwtConfig {
        JwtConfig::from_secret("test_secret_key_for_jwt_testing_12345")
    }

    #[test]
    fn test_issue_and_verify() {
        let config = create_test_config();
        let user_id = Uuid::new_v4();

        let token = config
            .issue_token(user_id, Some("teacher@skola.cz"), 900)
            .unwrap();
        let claims = config.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email.as_deref(), Some("teacher@skola.cz"));
        assert_eq!(extract_user_id(&claims).unwrap(), user_id);
    }

    #[test]
    fn test_expired_token() {
        let config = create_test_config();
        let token = config.issue_token(Uuid::new_v4(), None, -60).unwrap();

        let result = config.verify(&token);
        assert!(
            matches!(result, Err(JwtError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = JwtConfig::from_secret("one_secret");
        let verifier = JwtConfig::from_secret("another_secret");
        let token = signer.issue_token(Uuid::new_v4(), None, 900).unwrap();

        assert!(matches!(verifier.verify(&token), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token() {
        let config = create_test_config();
        assert!(config.verify("not_a_jwt").is_err());
    }

    #[test]
    fn test_audience_and_issuer_enforced() {
        let signer = create_test_config()
            .with_issuer(Some("https://idp.example".into()))
            .with_audience(Some("authenticated".into()));
        let token = signer.issue_token(Uuid::new_v4(), None, 900).unwrap();

        assert!(signer.verify(&token).is_ok());

        let strict = create_test_config().with_audience(Some("other".into()));
        assert!(matches!(strict.verify(&token), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_non_uuid_subject() {
        let claims = Claims {
            sub: "not-a-uuid".into(),
            exp: 0,
            iat: 0,
            email: None,
            iss: None,
            aud: None,
        };
        assert!(matches!(
            extract_user_id(&claims),
            Err(JwtError::InvalidToken)
        ));
    }

    #[test]
    fn test_signing_disabled_without_private_key() {
        let config = JwtConfig {
            encoding_key: None,
            ..create_test_config()
        };
        assert!(matches!(
            config.issue_token(Uuid::new_v4(), None, 60),
            Err(JwtError::SigningDisabled)
        ));
    }
}
