/**
 * Request Authentication
 *
 * The hosting platform injects the member's id into every request it
 * proxies. Handlers take one of these extractors to require a caller:
 *
 * - `Authenticated`: any active member (admin or customer)
 * - `AdminOnly`: active member with the admin role
 */

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::services::AccessError;
use crate::types::{AccessLevel, AuthenticatedUser};
use crate::AppState;

/// Header carrying the platform user id.
pub const USER_ID_HEADER: &str = "x-whop-user-id";
/// Older proxies send the id without the `x-` prefix.
const LEGACY_USER_ID_HEADER: &str = "whop-user-id";

/// Authenticated member extractor.
///
/// ```ignore
/// async fn handler(auth: Authenticated) -> impl IntoResponse {
///     let user = auth.user.user;
/// }
/// ```
pub struct Authenticated {
    pub user: AuthenticatedUser,
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let whop_user_id = caller_id(parts).ok_or(AccessError::MissingIdentity)?;
        let user = state.access.verify(whop_user_id)?;
        Ok(Authenticated { user })
    }
}

/// Admin-only extractor. Members without the admin role get 403.
pub struct AdminOnly {
    pub user: AuthenticatedUser,
}

#[async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Authenticated { user } = Authenticated::from_request_parts(parts, state).await?;

        if user.access_level != AccessLevel::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminOnly { user })
    }
}

fn caller_id(parts: &Parts) -> Option<&str> {
    [USER_ID_HEADER, LEGACY_USER_ID_HEADER]
        .iter()
        .find_map(|name| parts.headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
