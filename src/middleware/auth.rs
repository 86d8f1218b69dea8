use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{self, Caller};
use crate::error::ApiError;
use crate::state::AppState;

const MISSING_IDENTITY: &str = "Missing X-User header";
const ADMIN_ONLY: &str = "Only admin can perform this action";

/// Who may invoke a route
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Any caller presenting an identity header
    Login,
    /// Callers whose user record carries the admin role
    Admin,
}

/// Rejects requests without an identity header, otherwise passes them through
/// with the [`Caller`] attached
pub async fn require_login(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let caller = Caller::from_headers(request.headers())
        .ok_or_else(|| ApiError::unauthorized(MISSING_IDENTITY))?;

    tracing::debug!("login check passed for '{}'", caller.username);
    request.extensions_mut().insert(caller);

    Ok(next.run(request).await)
}

/// Rejects requests unless the identity header resolves to an admin user.
///
/// Unknown usernames and non-admin users both get 403.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = Caller::from_headers(request.headers())
        .ok_or_else(|| ApiError::unauthorized(MISSING_IDENTITY))?;

    match auth::role_of(state.store.as_ref(), &caller.username).await? {
        Some(role) if role.is_admin() => {}
        Some(role) => {
            tracing::warn!("admin check failed: '{}' has role {:?}", caller.username, role);
            return Err(ApiError::forbidden(ADMIN_ONLY));
        }
        None => {
            tracing::warn!("admin check failed: user '{}' not found", caller.username);
            return Err(ApiError::forbidden(ADMIN_ONLY));
        }
    }

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}
