//! JWT token service implementation.
//!
//! Access tokens and password reset tokens share the signing key and are
//! told apart by the `purpose` claim.

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use blogicum_core::ports::{AuthError, ResetClaims, TokenClaims, TokenService};

const DEFAULT_SECRET: &str = "change-me-in-production";
const ACCESS_PURPOSE: &str = "access";
const RESET_PURPOSE: &str = "password_reset";

/// JWT token service configuration.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
    pub reset_expiration_hours: i64,
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SECRET.to_string(),
            expiration_hours: 24,
            reset_expiration_hours: 72,
            issuer: "blogicum".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    roles: Vec<String>,
    purpose: String,
    exp: i64,
    iat: i64,
    iss: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetTokenClaims {
    sub: String,
    stamp: String,
    purpose: String,
    exp: i64,
    iat: i64,
    iss: String,
}

/// JWT-based token service.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    config: JwtConfig,
}

impl JwtTokenService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            encoding_key,
            decoding_key,
            config,
        }
    }

    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());

        if secret == DEFAULT_SECRET {
            let is_production = std::env::var("RUST_ENV")
                .map(|v| v == "production" || v == "prod")
                .unwrap_or(false);

            if is_production {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        let defaults = JwtConfig::default();
        let config = JwtConfig {
            secret,
            expiration_hours: std::env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.expiration_hours),
            reset_expiration_hours: std::env::var("PASSWORD_RESET_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.reset_expiration_hours),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        };
        Self::new(config)
    }

    fn decode_claims<C: DeserializeOwned>(&self, token: &str) -> Result<C, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);

        decode::<C>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })
    }
}

fn parse_subject(sub: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(sub).map_err(|e| AuthError::InvalidToken(e.to_string()))
}

fn check_purpose(actual: &str, expected: &str) -> Result<(), AuthError> {
    if actual == expected {
        Ok(())
    } else {
        Err(AuthError::InvalidToken(format!(
            "expected a {expected} token, got {actual}"
        )))
    }
}

impl TokenService for JwtTokenService {
    fn generate_token(&self, user_id: Uuid, roles: Vec<String>) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.expiration_hours);

        let claims = AccessClaims {
            sub: user_id.to_string(),
            roles,
            purpose: ACCESS_PURPOSE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let claims: AccessClaims = self.decode_claims(token)?;
        check_purpose(&claims.purpose, ACCESS_PURPOSE)?;

        Ok(TokenClaims {
            user_id: parse_subject(&claims.sub)?,
            roles: claims.roles,
            exp: claims.exp,
        })
    }

    fn expiration_seconds(&self) -> i64 {
        self.config.expiration_hours * 3600
    }

    fn generate_reset_token(&self, user_id: Uuid, stamp: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + TimeDelta::hours(self.config.reset_expiration_hours);

        let claims = ResetTokenClaims {
            sub: user_id.to_string(),
            stamp: stamp.to_string(),
            purpose: RESET_PURPOSE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    fn validate_reset_token(&self, token: &str) -> Result<ResetClaims, AuthError> {
        let claims: ResetTokenClaims = self.decode_claims(token)?;
        check_purpose(&claims.purpose, RESET_PURPOSE)?;

        Ok(ResetClaims {
            user_id: parse_subject(&claims.sub)?,
            stamp: claims.stamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key".to_string(),
            expiration_hours: 1,
            reset_expiration_hours: 1,
            issuer: "test-issuer".to_string(),
        }
    }

    #[test]
    fn test_validate_token_success() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service
            .generate_token(user_id, vec!["user".to_string(), "admin".to_string()])
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.roles, vec!["user".to_string(), "admin".to_string()]);
    }

    #[test]
    fn test_validate_invalid_token() {
        let service = JwtTokenService::new(test_config());

        let result = service.validate_token("invalid-token");

        assert!(matches!(result.unwrap_err(), AuthError::InvalidToken(_)));
    }

    #[test]
    fn test_validate_wrong_issuer_token() {
        let issuer1 = JwtTokenService::new(JwtConfig {
            issuer: "issuer1".to_string(),
            ..test_config()
        });
        let issuer2 = JwtTokenService::new(JwtConfig {
            issuer: "issuer2".to_string(),
            ..test_config()
        });

        let token = issuer1.generate_token(Uuid::new_v4(), vec![]).unwrap();

        assert!(issuer2.validate_token(&token).is_err());
    }

    #[test]
    fn test_reset_token_round_trip() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let token = service.generate_reset_token(user_id, "stamp-1234").unwrap();
        let claims = service.validate_reset_token(&token).unwrap();

        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.stamp, "stamp-1234");
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let service = JwtTokenService::new(test_config());
        let user_id = Uuid::new_v4();

        let access = service.generate_token(user_id, vec![]).unwrap();
        let reset = service.generate_reset_token(user_id, "stamp").unwrap();

        assert!(service.validate_reset_token(&access).is_err());
        assert!(service.validate_token(&reset).is_err());
    }

    #[test]
    fn test_expired_reset_token_is_rejected() {
        let service = JwtTokenService::new(JwtConfig {
            reset_expiration_hours: -1,
            ..test_config()
        });

        let token = service.generate_reset_token(Uuid::new_v4(), "stamp").unwrap();

        assert!(matches!(
            service.validate_reset_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_expiration_seconds() {
        let service = JwtTokenService::new(JwtConfig {
            expiration_hours: 24,
            ..test_config()
        });

        assert_eq!(service.expiration_seconds(), 86400);
    }
}
