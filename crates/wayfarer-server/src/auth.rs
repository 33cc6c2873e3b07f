use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jwt_compact::alg::{Hs256, Hs256Key};
use jwt_compact::{AlgorithmExt, TimeOptions, Token, UntrustedToken, ValidationError};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use wayfarer_core::{AppError, TokenFailure};

use crate::error::HandlerError;

/// Application claims carried next to the registered JWT claims
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
}

/// Authenticated caller, available to handlers as a request extension
#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: Option<String>,
}

/// Verifies HS256 bearer tokens
///
/// Every `jwt-compact` failure is mapped onto a [`TokenFailure`] here, so
/// nothing past this boundary sees library error types.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Arc<Hs256Key>,
}

impl TokenVerifier {
    pub fn new(secret: &SecretString) -> Self {
        Self {
            key: Arc::new(Hs256Key::new(secret.expose_secret().as_bytes())),
        }
    }

    /// Verify signature and time claims
    ///
    /// # Errors
    ///
    /// Returns [`TokenFailure::Expired`] for an expired token and
    /// [`TokenFailure::Invalid`] for anything else wrong with it
    pub fn verify(&self, token: &str) -> Result<Principal, TokenFailure> {
        let untrusted = UntrustedToken::new(token).map_err(|e| TokenFailure::Invalid(e.to_string()))?;

        let token: Token<UserClaims> = Hs256
            .validator(&self.key)
            .validate(&untrusted)
            .map_err(token_failure)?;

        let claims = token.claims();
        let time = TimeOptions::default();

        // exp and nbf are optional; only present claims are enforced
        if claims.expiration.is_some() {
            claims.validate_expiration(&time).map_err(token_failure)?;
        }
        if claims.not_before.is_some() {
            claims.validate_maturity(&time).map_err(token_failure)?;
        }

        Ok(Principal {
            subject: claims.custom.sub.clone(),
        })
    }
}

fn token_failure(error: ValidationError) -> TokenFailure {
    match error {
        ValidationError::Expired => TokenFailure::Expired,
        other => TokenFailure::Invalid(other.to_string()),
    }
}

/// Require a valid bearer token outside the public paths
pub async fn auth_middleware(
    verifier: TokenVerifier,
    public_paths: Arc<[String]>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if public_paths.iter().any(|p| path.starts_with(p.as_str())) {
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return HandlerError::from(AppError::unauthorized()).into_response();
    };

    match verifier.verify(token) {
        Ok(principal) => {
            tracing::trace!(subject = ?principal.subject, "bearer token accepted");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(failure) => {
            tracing::warn!(error = %failure, "bearer token rejected");
            HandlerError::from(failure).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use jwt_compact::{Claims, Header};

    use super::*;

    const SECRET: &str = "test-secret";

    fn sign(secret: &str, claims: serde_json::Value) -> String {
        let claims: Claims<UserClaims> = serde_json::from_value(claims).unwrap();
        Hs256
            .token(&Header::empty(), &claims, &Hs256Key::new(secret.as_bytes()))
            .unwrap()
    }

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&SecretString::from(SECRET.to_owned()))
    }

    fn now() -> i64 {
        jiff::Timestamp::now().as_second()
    }

    #[test]
    fn accepts_valid_token() {
        let token = sign(SECRET, serde_json::json!({ "sub": "user-1", "exp": now() + 3600 }));

        let principal = verifier().verify(&token).unwrap();
        assert_eq!(principal.subject.as_deref(), Some("user-1"));
    }

    #[test]
    fn accepts_token_without_expiry() {
        let token = sign(SECRET, serde_json::json!({ "sub": "user-1" }));

        assert!(verifier().verify(&token).is_ok());
    }

    #[test]
    fn expired_token_is_expired() {
        let token = sign(SECRET, serde_json::json!({ "sub": "user-1", "exp": now() - 3600 }));

        assert!(matches!(verifier().verify(&token), Err(TokenFailure::Expired)));
    }

    #[test]
    fn wrong_signature_is_invalid() {
        let token = sign("another-secret", serde_json::json!({ "sub": "user-1" }));

        assert!(matches!(verifier().verify(&token), Err(TokenFailure::Invalid(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(verifier().verify("not-a-jwt"), Err(TokenFailure::Invalid(_))));
    }
}
