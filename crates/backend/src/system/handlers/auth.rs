use axum::{extract::Json, http::StatusCode};
use contracts::system::auth::{LoginRequest, LoginResponse, UserInfo};
use contracts::system::users::User;

use crate::shared::data::db::get_connection;
use crate::system::auth::extractor::CurrentUser;
use crate::system::auth::jwt;
use crate::system::users::service::{self as user_service, CredentialCheck};

fn user_info(user: User) -> UserInfo {
    UserInfo {
        id: user.id,
        username: user.username,
        level: user.level,
        prefix: user.prefix,
        firstname: user.firstname,
        lastname: user.lastname,
    }
}

/// POST /api/auth/login
pub async fn login(Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, StatusCode> {
    let check =
        user_service::verify_credentials(get_connection(), &request.username, &request.password)
            .await
            .map_err(|e| {
                tracing::error!("Login failed for {}: {}", request.username, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

    let user = match check {
        CredentialCheck::Valid(user) => user,
        CredentialCheck::Invalid => return Err(StatusCode::UNAUTHORIZED),
        CredentialCheck::Disabled => return Err(StatusCode::FORBIDDEN),
    };

    let token = jwt::generate_access_token(&user.id, &user.username, user.level).map_err(|e| {
        tracing::error!("Failed to issue token: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("User {} logged in", user.username);

    Ok(Json(LoginResponse {
        token,
        user: user_info(user),
    }))
}

/// GET /api/auth/me
pub async fn current_user(
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserInfo>, StatusCode> {
    let user = user_service::get_by_id(get_connection(), &claims.sub)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user {}: {}", claims.sub, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(user_info(user)))
}
