//! Fixtures for tests that run against an in-memory store.

use contracts::system::auth::Role;
use contracts::system::users::User;
use sea_orm::{ActiveModelTrait, DatabaseConnection, NotSet, Set};

use super::repository::ActiveModel;
use crate::system::users::repository as users_repository;

pub async fn seed_identity(
    conn: &DatabaseConnection,
    id: &str,
    prefix: &str,
    firstname: &str,
    lastname: &str,
    deleted: bool,
) {
    let user = User {
        id: id.to_string(),
        username: id.to_string(),
        code: String::new(),
        prefix: prefix.to_string(),
        firstname: firstname.to_string(),
        lastname: lastname.to_string(),
        level: Role::User,
        is_active: true,
        is_deleted: deleted,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };
    users_repository::create_with_password(conn, &user, "unused")
        .await
        .unwrap();
}

pub async fn seed_entry(
    conn: &DatabaseConnection,
    timestamp: &str,
    action: &str,
    owner: &str,
    labnumbers: &[&str],
    status_code: &str,
    time_ms: i64,
) {
    ActiveModel {
        id: NotSet,
        timestamp: Set(timestamp.to_string()),
        action: Set(action.to_string()),
        labnumbers: Set(serde_json::to_string(labnumbers).unwrap()),
        request_method: Set("POST".to_string()),
        request_endpoint: Set(format!("/api/lab/{}", action)),
        response_status_code: Set(status_code.to_string()),
        response_message: Set("OK".to_string()),
        response_time_ms: Set(time_ms),
        user_id: Set(owner.to_string()),
    }
    .insert(conn)
    .await
    .unwrap();
}
