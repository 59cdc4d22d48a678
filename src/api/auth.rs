//! Authentication middleware for JWT bearer tokens
//!
//! Every memory route sits behind [`auth_middleware`]: the bearer token is
//! verified (HS256 signature + expiry) and the decoded claims are attached to
//! the request before any handler runs. Handlers receive the identity as an
//! explicit [`CurrentUser`] parameter rather than looking it up ambiently.

use super::AppState;
use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Claims carried by the bearer token.
///
/// `sub` is the owning user's identifier and the sole authorization key;
/// `name` and `avatar_url` are display-only extras set by the token issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        rename = "avatarUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar_url: Option<String>,
    pub exp: usize,
}

/// Verification material derived from the configured secret
#[derive(Clone)]
pub struct AuthKeys {
    decoding: DecodingKey,
    validation: Validation,
}

impl AuthKeys {
    pub fn new(secret: &str) -> Self {
        AuthKeys {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify signature and expiry, returning the decoded claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

/// Authentication middleware
///
/// Expected format: `Authorization: Bearer <jwt>`. Rejects missing,
/// malformed, or invalid credentials with an empty-bodied 401 before the
/// handler executes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return StatusCode::UNAUTHORIZED.into_response();
    };

    match state.auth.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!("Rejected bearer token: {}", e);
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

/// The verified caller, extracted from claims the middleware attached
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Claims);

impl CurrentUser {
    /// The caller's subject identifier
    pub fn sub(&self) -> &str {
        &self.0.sub
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(CurrentUser)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Decode claims WITHOUT verifying the signature or expiry.
///
/// This mirrors what the companion web client does with the token cookie: it
/// only needs `name`/`avatarUrl` for display. Never use the result for an
/// authorization decision; that stays server-side behind [`AuthKeys::verify`].
pub fn decode_display_claims(token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.set_required_spec_claims::<&str>(&[]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token_for(secret: &str, sub: &str, exp: usize) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            name: Some("Ada".to_string()),
            avatar_url: Some("http://x/ada.png".to_string()),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_verify_valid_token() {
        let keys = AuthKeys::new("secret");
        let token = token_for("secret", "user-a", future_exp());

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-a");
        assert_eq!(claims.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let keys = AuthKeys::new("secret");
        let token = token_for("other-secret", "user-a", future_exp());
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let keys = AuthKeys::new("secret");
        let expired = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = token_for("secret", "user-a", expired);
        assert!(keys.verify(&token).is_err());
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let keys = AuthKeys::new("secret");
        assert!(keys.verify("not-a-jwt").is_err());
    }

    #[test]
    fn test_display_decode_ignores_signature_and_expiry() {
        // Signed with a key this process has never seen, and already expired
        let expired = (chrono::Utc::now().timestamp() - 3600) as usize;
        let token = token_for("somebody-elses-key", "user-a", expired);

        let claims = decode_display_claims(&token).unwrap();
        assert_eq!(claims.sub, "user-a");
        assert_eq!(claims.name.as_deref(), Some("Ada"));
        assert_eq!(claims.avatar_url.as_deref(), Some("http://x/ada.png"));
    }

    #[test]
    fn test_display_decode_rejects_non_jwt() {
        assert!(decode_display_claims("definitely not a token").is_err());
    }
}
