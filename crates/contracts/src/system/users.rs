use serde::{Deserialize, Serialize};

use super::auth::Role;

/// Identity that owns log entries. Deleted identities are kept (soft delete).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub code: String,
    pub prefix: String,
    pub firstname: String,
    pub lastname: String,
    pub level: Role,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserDto {
    pub username: String,
    pub password: String,
    pub code: String,
    pub prefix: String,
    pub firstname: String,
    pub lastname: String,
    pub level: Role,
}

/// Query for GET /api/users
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub include_deleted: Option<String>,
}
