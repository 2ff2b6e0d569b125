use axum::{
    extract::{Json, Query},
    http::StatusCode,
};
use contracts::system::users::{ListUsersQuery, User};

use crate::shared::data::db::get_connection;
use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service as user_service;

/// GET /api/users
///
/// Feeds the owner picker of the log screen: a `user` sees only itself,
/// an admin sees everyone, soft-deleted identities on `includeDeleted=true`.
pub async fn list(
    CurrentUser(claims): CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, StatusCode> {
    let include_deleted = query.include_deleted.as_deref().map(str::trim) == Some("true");

    user_service::list_visible(get_connection(), &claims.sub, claims.level, include_deleted)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to list users: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
