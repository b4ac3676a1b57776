use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::identity_of;
use crate::auth::{AuthError, Identity};
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Role;

pub const TENANT: &[Role] = &[Role::Tenant];
pub const LANDLORD: &[Role] = &[Role::Landlord];
pub const AGENT: &[Role] = &[Role::Agent];
pub const BUILDER: &[Role] = &[Role::Builder];
pub const ADMIN: &[Role] = &[Role::Admin];
pub const COMMERCIAL_OWNERS: &[Role] = &[Role::Landlord, Role::Builder, Role::Agent];

/// Gate decision: 401 without an identity, 403 for a role outside `allowed`.
pub fn authorize(outcome: Result<Identity, AuthError>, allowed: &[Role]) -> Result<Identity, ApiError> {
    let identity = outcome?;
    if allowed.contains(&identity.role) {
        return Ok(identity);
    }

    tracing::warn!(
        user_id = %identity.user_id,
        role = %identity.role,
        "role gate denied request"
    );
    let required: Vec<&str> = allowed.iter().map(Role::as_str).collect();
    Err(ApiError::forbidden(format!("Access denied. Required role: {}", required.join(" or "))))
}

/// Route layer requiring one of the given roles.
pub async fn require_role(
    State(allowed): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(identity_of(request.extensions()), allowed)?;
    Ok(next.run(request).await)
}

/// Route layer requiring a completed KYC when listings demand it. Admins are exempt.
pub async fn require_kyc(State(state): State<AppState>, request: Request, next: Next) -> Result<Response, ApiError> {
    let identity = identity_of(request.extensions())?;
    if state.config.kyc.require_kyc_for_listings && identity.role != Role::Admin {
        let user = state.collection::<User>().get_404(identity.user_id).await?;
        if !user.kyc_verified {
            tracing::debug!(user_id = %identity.user_id, "listing blocked until KYC is verified");
            return Err(ApiError::forbidden("KYC verification required"));
        }
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn identity(role: Role) -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            role,
            email: "someone@example.com".into(),
        }
    }

    #[test]
    fn missing_identity_is_unauthorized() {
        let err = authorize(Err(AuthError::Missing), LANDLORD).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.message(), "Authentication required");

        let err = authorize(Err(AuthError::Expired), LANDLORD).unwrap_err();
        assert_eq!(err.message(), "Token expired");
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let err = authorize(Ok(identity(Role::Tenant)), LANDLORD).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "Access denied. Required role: landlord");
    }

    #[test]
    fn allowed_role_passes_identity_through() {
        let id = identity(Role::Builder);
        assert_eq!(authorize(Ok(id.clone()), COMMERCIAL_OWNERS).unwrap(), id);
    }
}
