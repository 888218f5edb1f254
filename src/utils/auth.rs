// src/utils/auth.rs
//
// Identity comes from a trusted fronting gateway: it authenticates the user
// and forwards `X-User-Id` (and `X-User-Role` for authors). Session and
// credential handling live in that collaborator, not here.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated student making the request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: i64,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| AppError::AuthError("Missing or invalid X-User-Id".to_string()))?;
        Ok(CurrentUser { id })
    }
}

/// An authenticated user the gateway has marked as an author/admin.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
    pub id: i64,
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        let is_admin = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.eq_ignore_ascii_case("admin"))
            .unwrap_or(false);
        if !is_admin {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }
        Ok(AdminUser { id: user.id })
    }
}
