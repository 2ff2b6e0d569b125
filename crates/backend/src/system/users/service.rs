use anyhow::Result;
use chrono::Utc;
use contracts::system::auth::Role;
use contracts::system::users::{CreateUserDto, User};
use sea_orm::ConnectionTrait;

use super::repository;
use crate::system::auth::password;

/// Result of a login attempt
#[derive(Debug)]
pub enum CredentialCheck {
    Valid(User),
    /// Unknown username, wrong password or a deleted identity
    Invalid,
    /// Identity exists but is switched off
    Disabled,
}

/// Create a new user
pub async fn create<C: ConnectionTrait>(conn: &C, dto: CreateUserDto) -> Result<String> {
    if dto.username.trim().is_empty() {
        return Err(anyhow::anyhow!("Username cannot be empty"));
    }

    if repository::get_by_username(conn, &dto.username).await?.is_some() {
        return Err(anyhow::anyhow!("Username already exists"));
    }

    if dto.password.is_empty() {
        return Err(anyhow::anyhow!("Password cannot be empty"));
    }

    let password_hash = password::hash_password(&dto.password)?;

    let user_id = uuid::Uuid::new_v4().to_string();
    let user = User {
        id: user_id.clone(),
        username: dto.username,
        code: dto.code,
        prefix: dto.prefix,
        firstname: dto.firstname,
        lastname: dto.lastname,
        level: dto.level,
        is_active: true,
        is_deleted: false,
        created_at: Utc::now().to_rfc3339(),
    };

    repository::create_with_password(conn, &user, &password_hash).await?;

    Ok(user_id)
}

/// Get user by ID
pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<User>> {
    repository::get_by_id(conn, id).await
}

/// Identities visible to the caller: only itself for the `user` role,
/// everyone (optionally including soft-deleted) for admins.
pub async fn list_visible<C: ConnectionTrait>(
    conn: &C,
    caller_id: &str,
    role: Role,
    include_deleted: bool,
) -> Result<Vec<User>> {
    match role {
        Role::User => {
            let user = repository::get_by_id(conn, caller_id).await?;
            Ok(user.into_iter().filter(|u| !u.is_deleted).collect())
        }
        Role::Admin => repository::list(conn, include_deleted).await,
    }
}

/// Verify user credentials (for login)
pub async fn verify_credentials<C: ConnectionTrait>(
    conn: &C,
    username: &str,
    password: &str,
) -> Result<CredentialCheck> {
    let user = match repository::get_by_username(conn, username).await? {
        Some(u) if !u.is_deleted => u,
        _ => return Ok(CredentialCheck::Invalid),
    };

    if !user.is_active {
        return Ok(CredentialCheck::Disabled);
    }

    let password_hash = repository::get_password_hash(conn, &user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

    if !password::verify_password(password, &password_hash)? {
        return Ok(CredentialCheck::Invalid);
    }

    Ok(CredentialCheck::Valid(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

    fn dto(username: &str, level: Role) -> CreateUserDto {
        CreateUserDto {
            username: username.to_string(),
            password: "pass".to_string(),
            code: String::new(),
            prefix: "Dr.".to_string(),
            firstname: "Anong".to_string(),
            lastname: "Chai".to_string(),
            level,
        }
    }

    async fn set_flag(conn: &sea_orm::DatabaseConnection, id: &str, column: &str, value: i32) {
        conn.execute(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("UPDATE sys_users SET {} = ? WHERE id = ?", column),
            [value.into(), id.into()],
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let conn = connect_in_memory().await;
        create(&conn, dto("anong", Role::User)).await.unwrap();
        assert!(create(&conn, dto("anong", Role::User)).await.is_err());
    }

    #[tokio::test]
    async fn test_verify_credentials_outcomes() {
        let conn = connect_in_memory().await;
        let id = create(&conn, dto("anong", Role::User)).await.unwrap();

        assert!(matches!(
            verify_credentials(&conn, "anong", "pass").await.unwrap(),
            CredentialCheck::Valid(_)
        ));
        assert!(matches!(
            verify_credentials(&conn, "anong", "nope").await.unwrap(),
            CredentialCheck::Invalid
        ));
        assert!(matches!(
            verify_credentials(&conn, "ghost", "pass").await.unwrap(),
            CredentialCheck::Invalid
        ));

        set_flag(&conn, &id, "is_active", 0).await;
        assert!(matches!(
            verify_credentials(&conn, "anong", "pass").await.unwrap(),
            CredentialCheck::Disabled
        ));

        set_flag(&conn, &id, "is_deleted", 1).await;
        assert!(matches!(
            verify_credentials(&conn, "anong", "pass").await.unwrap(),
            CredentialCheck::Invalid
        ));
    }

    #[tokio::test]
    async fn test_list_visible_by_role() {
        let conn = connect_in_memory().await;
        let admin = create(&conn, dto("root", Role::Admin)).await.unwrap();
        let user = create(&conn, dto("anong", Role::User)).await.unwrap();
        let gone = create(&conn, dto("former", Role::User)).await.unwrap();
        set_flag(&conn, &gone, "is_deleted", 1).await;

        let own = list_visible(&conn, &user, Role::User, true).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].id, user);

        let active = list_visible(&conn, &admin, Role::Admin, false).await.unwrap();
        assert_eq!(active.len(), 2);

        let all = list_visible(&conn, &admin, Role::Admin, true).await.unwrap();
        assert_eq!(all.len(), 3);

        let deleted_self = list_visible(&conn, &gone, Role::User, false).await.unwrap();
        assert!(deleted_self.is_empty());
    }
}
