use std::ops::Deref;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, Extensions, HeaderMap},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;

use crate::auth::{AuthError, Identity};
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Outcome of token resolution, stored on every request.
#[derive(Clone, Debug)]
pub struct Authentication(pub Result<Identity, AuthError>);

/// Authenticated caller. Rejects with 401 when the request carried no valid token.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Identity);

impl Deref for AuthUser {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthUser(identity_of(&parts.extensions)?))
    }
}

/// Identity resolved for this request, or why there is none.
pub fn identity_of(extensions: &Extensions) -> Result<Identity, AuthError> {
    match extensions.get::<Authentication>() {
        Some(Authentication(outcome)) => outcome.clone(),
        None => Err(AuthError::Missing),
    }
}

/// Resolve the caller on every request. Public routes ignore the outcome.
pub async fn resolve_identity(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let outcome = match extract_token(request.headers(), &state.config.security.cookie_name) {
        Some(token) => authenticate(&state, &token).await,
        None => Err(AuthError::Missing),
    };

    match &outcome {
        Ok(identity) => tracing::debug!(user_id = %identity.user_id, role = %identity.role, "request authenticated"),
        Err(AuthError::Missing) => {}
        Err(e) => tracing::debug!("token rejected: {}", e),
    }

    request.extensions_mut().insert(Authentication(outcome));
    next.run(request).await
}

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|raw| {
            let cookie = Cookie::parse(raw.trim()).ok()?;
            (cookie.name() == cookie_name && !cookie.value().is_empty()).then(|| cookie.value().to_owned())
        })
}

/// Verify the token and reload the user so the role reflects the current record.
async fn authenticate(state: &AppState, token: &str) -> Result<Identity, AuthError> {
    let claims = state.tokens.verify(token)?;
    let user = state
        .collection::<User>()
        .get(claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("user lookup during authentication failed: {}", e);
            AuthError::Invalid
        })?
        .ok_or(AuthError::Invalid)?;

    Ok(Identity {
        user_id: user.id,
        role: user.role,
        email: user.email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=from-cookie"));
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=xyz; lang=en"));
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("xyz"));
        assert_eq!(extract_token(&headers, "session"), None);
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers, "token"), None);
    }
}
