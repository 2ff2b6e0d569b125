use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Schema bootstrap. `audit_log.timestamp` holds RFC 3339 UTC strings with
/// millisecond precision so that text comparison follows time order.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sys_users (
        id TEXT PRIMARY KEY NOT NULL,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        code TEXT NOT NULL DEFAULT '',
        prefix TEXT NOT NULL DEFAULT '',
        firstname TEXT NOT NULL DEFAULT '',
        lastname TEXT NOT NULL DEFAULT '',
        level TEXT NOT NULL DEFAULT 'user',
        is_active INTEGER NOT NULL DEFAULT 1,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        action TEXT NOT NULL DEFAULT '',
        labnumbers TEXT NOT NULL DEFAULT '[]',
        request_method TEXT NOT NULL DEFAULT '',
        request_endpoint TEXT NOT NULL DEFAULT '',
        response_status_code TEXT NOT NULL DEFAULT '',
        response_message TEXT NOT NULL DEFAULT '',
        response_time_ms INTEGER NOT NULL DEFAULT 0,
        user_id TEXT NOT NULL
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_audit_log_timestamp ON audit_log (timestamp DESC);",
    "CREATE INDEX IF NOT EXISTS idx_audit_log_action ON audit_log (action);",
    "CREATE INDEX IF NOT EXISTS idx_audit_log_status ON audit_log (response_status_code);",
    "CREATE INDEX IF NOT EXISTS idx_audit_log_user ON audit_log (user_id);",
];

pub async fn initialize_database(db_path: Option<&str>) -> anyhow::Result<()> {
    let db_file = db_path.unwrap_or("target/db/audit.db");
    if let Some(parent) = std::path::Path::new(db_file).parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if std::path::Path::new(db_file).is_absolute() {
        std::path::PathBuf::from(db_file)
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);
    tracing::info!("Opening database: {}", db_url);
    let conn = Database::connect(&db_url).await?;

    apply_schema(&conn).await?;

    if DB_CONN.set(conn).is_err() {
        tracing::warn!("Database connection was already initialized");
    }
    Ok(())
}

pub async fn apply_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for statement in SCHEMA {
        conn.execute(Statement::from_string(
            DatabaseBackend::Sqlite,
            statement.to_string(),
        ))
        .await?;
    }
    Ok(())
}

pub fn get_connection() -> &'static DatabaseConnection {
    DB_CONN
        .get()
        .expect("Database connection has not been initialized")
}

/// Fresh in-memory database with the schema applied.
/// A single pooled connection keeps every query on the same memory database.
#[cfg(test)]
pub async fn connect_in_memory() -> DatabaseConnection {
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let conn = Database::connect(options).await.unwrap();
    apply_schema(&conn).await.unwrap();
    conn
}
