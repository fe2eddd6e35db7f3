/**
 * User API
 *
 * Endpoints:
 * - GET /api/user/profile - Caller's member record and access level
 * - GET /api/user/stats   - Caller's feed statistics
 */

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::api::auth::Authenticated;
use crate::error::AppError;
use crate::types::{AccessLevel, User, UserStats};
use crate::AppState;

/// Create user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile))
        .route("/stats", get(get_stats))
}

/// Profile with the resolved access level.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub access_level: AccessLevel,
}

/// GET /api/user/profile
async fn get_profile(auth: Authenticated) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        access_level: auth.user.access_level,
        user: auth.user.user,
    })
}

/// GET /api/user/stats
async fn get_stats(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<UserStats>, AppError> {
    let stats = state.signal_service.user_stats(&auth.user.user)?;
    Ok(Json(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UpsertUser, UserRole};

    #[test]
    fn test_profile_response_flattens_user() {
        let user = User::new(UpsertUser {
            whop_user_id: "user_1".to_string(),
            name: "Dana".to_string(),
            email: Some("dana@example.com".to_string()),
            role: UserRole::Subscriber,
            product_id: None,
            membership_id: None,
        });

        let json = serde_json::to_value(ProfileResponse {
            user,
            access_level: AccessLevel::Customer,
        })
        .unwrap();

        assert_eq!(json["whopUserId"], "user_1");
        assert_eq!(json["accessLevel"], "customer");
        assert_eq!(json["email"], "dana@example.com");
    }
}
