use anyhow::Result;
use contracts::system::auth::Role;
use contracts::system::users::CreateUserDto;
use sea_orm::ConnectionTrait;

use crate::system::users::{repository, service};

/// Ensure admin user exists (create if table is empty)
pub async fn ensure_admin_user_exists<C: ConnectionTrait>(conn: &C) -> Result<()> {
    let count = repository::count_users(conn).await?;

    if count == 0 {
        tracing::info!("No users found. Creating default admin user...");

        let admin_dto = CreateUserDto {
            username: "admin".to_string(),
            password: "admin".to_string(),
            code: "ADMIN".to_string(),
            prefix: String::new(),
            firstname: "Administrator".to_string(),
            lastname: String::new(),
            level: Role::Admin,
        };

        let admin_id = service::create(conn, admin_dto).await?;

        tracing::warn!("═══════════════════════════════════════════════");
        tracing::warn!("  Default admin user created!");
        tracing::warn!("  Username: admin");
        tracing::warn!("  Password: admin");
        tracing::warn!("  User ID: {}", admin_id);
        tracing::warn!("  ⚠️  PLEASE CHANGE THE PASSWORD IMMEDIATELY!");
        tracing::warn!("═══════════════════════════════════════════════");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_admin_created_once() {
        let conn = connect_in_memory().await;
        ensure_admin_user_exists(&conn).await.unwrap();
        ensure_admin_user_exists(&conn).await.unwrap();
        assert_eq!(repository::count_users(&conn).await.unwrap(), 1);

        let admin = repository::get_by_username(&conn, "admin").await.unwrap().unwrap();
        assert_eq!(admin.level, Role::Admin);
    }
}
