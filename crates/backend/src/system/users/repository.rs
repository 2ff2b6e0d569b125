use anyhow::{Context, Result};
use contracts::system::auth::Role;
use contracts::system::users::User;
use sea_orm::{ConnectionTrait, DatabaseBackend, QueryResult, Statement};

const USER_COLUMNS: &str =
    "id, username, code, prefix, firstname, lastname, level, is_active, is_deleted, created_at";

fn row_to_user(row: &QueryResult) -> Result<User> {
    let level: String = row.try_get("", "level")?;
    Ok(User {
        id: row.try_get("", "id")?,
        username: row.try_get("", "username")?,
        code: row.try_get("", "code")?,
        prefix: row.try_get("", "prefix")?,
        firstname: row.try_get("", "firstname")?,
        lastname: row.try_get("", "lastname")?,
        level: Role::from_level(&level),
        is_active: row.try_get::<i32>("", "is_active")? != 0,
        is_deleted: row.try_get::<i32>("", "is_deleted")? != 0,
        created_at: row.try_get("", "created_at")?,
    })
}

/// Create user with password hash
pub async fn create_with_password<C: ConnectionTrait>(
    conn: &C,
    user: &User,
    password_hash: &str,
) -> Result<()> {
    conn.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO sys_users (id, username, password_hash, code, prefix, firstname, lastname, level, is_active, is_deleted, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        [
            user.id.clone().into(),
            user.username.clone().into(),
            password_hash.to_string().into(),
            user.code.clone().into(),
            user.prefix.clone().into(),
            user.firstname.clone().into(),
            user.lastname.clone().into(),
            user.level.as_str().into(),
            (if user.is_active { 1 } else { 0 }).into(),
            (if user.is_deleted { 1 } else { 0 }).into(),
            user.created_at.clone().into(),
        ],
    ))
    .await
    .context("Failed to insert user")?;

    Ok(())
}

/// Get user by ID
pub async fn get_by_id<C: ConnectionTrait>(conn: &C, id: &str) -> Result<Option<User>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("SELECT {} FROM sys_users WHERE id = ?", USER_COLUMNS),
            [id.into()],
        ))
        .await?;

    result.as_ref().map(row_to_user).transpose()
}

/// Get user by username
pub async fn get_by_username<C: ConnectionTrait>(conn: &C, username: &str) -> Result<Option<User>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            &format!("SELECT {} FROM sys_users WHERE username = ?", USER_COLUMNS),
            [username.into()],
        ))
        .await?;

    result.as_ref().map(row_to_user).transpose()
}

/// Get password hash for user
pub async fn get_password_hash<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<Option<String>> {
    let result = conn
        .query_one(Statement::from_sql_and_values(
            DatabaseBackend::Sqlite,
            "SELECT password_hash FROM sys_users WHERE id = ?",
            [user_id.into()],
        ))
        .await?;

    match result {
        Some(row) => {
            let hash: String = row.try_get("", "password_hash")?;
            Ok(Some(hash))
        }
        None => Ok(None),
    }
}

/// List users, soft-deleted ones only when asked for
pub async fn list<C: ConnectionTrait>(conn: &C, include_deleted: bool) -> Result<Vec<User>> {
    let sql = if include_deleted {
        format!("SELECT {} FROM sys_users ORDER BY created_at", USER_COLUMNS)
    } else {
        format!(
            "SELECT {} FROM sys_users WHERE is_deleted = 0 ORDER BY created_at",
            USER_COLUMNS
        )
    };

    let rows = conn
        .query_all(Statement::from_string(DatabaseBackend::Sqlite, sql))
        .await?;

    rows.iter().map(row_to_user).collect()
}

/// Count total users
pub async fn count_users<C: ConnectionTrait>(conn: &C) -> Result<usize> {
    let result = conn
        .query_one(Statement::from_string(
            DatabaseBackend::Sqlite,
            "SELECT COUNT(*) as count FROM sys_users".to_string(),
        ))
        .await?;

    match result {
        Some(row) => {
            let count: i64 = row.try_get("", "count")?;
            Ok(count as usize)
        }
        None => Ok(0),
    }
}
