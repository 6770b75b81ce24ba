use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    repository::RepositoryState,
};

/// Claims
///
/// The payload of a session token. Signed with `AppConfig::jwt_secret` at login and
/// validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the username the session belongs to.
    pub sub: String,
    /// Session id: must equal `users.token` for the token to be accepted. Logout clears
    /// the column, revoking every token issued for that session.
    pub sid: String,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat): seconds since the epoch.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Services scope every contact and
/// address query by `username`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub name: String,
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized".to_string())
}

/// issue_token
///
/// Signs a session token for `username` bound to `session_id`, valid for
/// `config.token_ttl_secs`.
pub fn issue_token(
    config: &AppConfig,
    username: &str,
    session_id: &str,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: username.to_string(),
        sid: session_id.to_string(),
        iat: usize::try_from(now).unwrap_or_default(),
        exp: usize::try_from(now + config.token_ttl_secs).unwrap_or_default(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function argument
/// in any authenticated handler. The process:
/// 0. Reuse: a user already resolved by `auth_middleware` for this request.
/// 1. Dependency Resolution: Repository and AppConfig from the application state.
/// 2. Local Bypass: in `Env::Local`, an `x-username` header naming an existing user.
/// 3. Token Validation: Bearer token extraction and JWT decoding (expiry enforced).
/// 4. Session Check: the user must exist and still hold the token's session id.
///
/// Rejection: `AppError::Unauthorized` (401, `{"errors": "Unauthorized"}`) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Development bypass, never honoured in production. Falls through to the
        // token flow if the header is absent or names no user.
        if config.env == Env::Local {
            if let Some(username) = parts
                .headers
                .get("x-username")
                .and_then(|value| value.to_str().ok())
            {
                if let Some(user) = repo.find_user(username).await? {
                    return Ok(AuthUser {
                        username: user.username,
                        name: user.name,
                    });
                }
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            unauthorized()
        })?;
        let claims = token_data.claims;

        // Prevents access if the user was removed or logged out after the token was issued.
        let user = repo.find_user(&claims.sub).await?.ok_or_else(unauthorized)?;
        if user.token.as_deref() != Some(claims.sid.as_str()) {
            return Err(unauthorized());
        }

        Ok(AuthUser {
            username: user.username,
            name: user.name,
        })
    }
}
