use once_cell::sync::OnceCell;
use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};

static DB_CONN: OnceCell<DatabaseConnection> = OnceCell::new();

/// Tables created at startup when missing
const SCHEMA: &[(&str, &str)] = &[
    (
        "sys_users",
        r#"
        CREATE TABLE IF NOT EXISTS sys_users (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            email TEXT,
            password_hash TEXT NOT NULL,
            full_name TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            warehouse_id TEXT,
            client_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_login_at TEXT,
            created_by TEXT
        );
    "#,
    ),
    (
        "sys_user_roles",
        r#"
        CREATE TABLE IF NOT EXISTS sys_user_roles (
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (user_id, role)
        );
    "#,
    ),
    (
        "sys_refresh_tokens",
        r#"
        CREATE TABLE IF NOT EXISTS sys_refresh_tokens (
            id TEXT PRIMARY KEY NOT NULL,
            user_id TEXT NOT NULL,
            token_hash TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL,
            revoked_at TEXT
        );
    "#,
    ),
    (
        "sys_settings",
        r#"
        CREATE TABLE IF NOT EXISTS sys_settings (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#,
    ),
    (
        "role_permissions",
        r#"
        CREATE TABLE IF NOT EXISTS role_permissions (
            role TEXT NOT NULL,
            resource TEXT NOT NULL,
            can_create INTEGER NOT NULL DEFAULT 0,
            can_read INTEGER NOT NULL DEFAULT 0,
            can_update INTEGER NOT NULL DEFAULT 0,
            can_delete INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (role, resource)
        );
    "#,
    ),
    (
        "a001_warehouse",
        r#"
        CREATE TABLE IF NOT EXISTS a001_warehouse (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT,
            capacity_total REAL,
            active INTEGER NOT NULL DEFAULT 1,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
    "#,
    ),
    (
        "a002_client",
        r#"
        CREATE TABLE IF NOT EXISTS a002_client (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            document TEXT NOT NULL,
            email TEXT,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
    "#,
    ),
    (
        "a003_product",
        r#"
        CREATE TABLE IF NOT EXISTS a003_product (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            unit TEXT NOT NULL DEFAULT 't',
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
    "#,
    ),
    (
        "a004_stock",
        r#"
        CREATE TABLE IF NOT EXISTS a004_stock (
            id TEXT PRIMARY KEY NOT NULL,
            product_id TEXT NOT NULL,
            warehouse_id TEXT NOT NULL,
            quantity REAL NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            updated_by TEXT,
            UNIQUE (product_id, warehouse_id)
        );
    "#,
    ),
    (
        "a005_employee",
        r#"
        CREATE TABLE IF NOT EXISTS a005_employee (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            cpf TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL,
            phone TEXT,
            position TEXT,
            department TEXT,
            role TEXT NOT NULL,
            active INTEGER NOT NULL DEFAULT 1,
            user_id TEXT,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT,
            updated_at TEXT,
            version INTEGER NOT NULL DEFAULT 0
        );
    "#,
    ),
    (
        "a006_load",
        r#"
        CREATE TABLE IF NOT EXISTS a006_load (
            id TEXT PRIMARY KEY NOT NULL,
            status TEXT NOT NULL,
            current_stage INTEGER NOT NULL DEFAULT 0,
            client_id TEXT NOT NULL,
            warehouse_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            stage1_timestamp TEXT,
            stage1_observation TEXT,
            stage1_attachment_url TEXT,
            stage2_timestamp TEXT,
            stage2_observation TEXT,
            stage2_attachment_url TEXT,
            stage3_timestamp TEXT,
            stage3_observation TEXT,
            stage3_attachment_url TEXT,
            stage4_timestamp TEXT,
            stage4_observation TEXT,
            stage4_attachment_url TEXT,
            stage5_timestamp TEXT,
            stage5_observation TEXT,
            stage5_attachment_url TEXT,
            stage5_secondary_attachment_url TEXT
        );
    "#,
    ),
];

/// Open the SQLite file (created when missing) and make it the global
/// connection
pub async fn initialize_database(db_path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_path.is_absolute() {
        db_path.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_path)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    let conn = Database::connect(&db_url).await?;
    bootstrap_schema(&conn).await?;

    DB_CONN
        .set(conn)
        .map_err(|_| anyhow::anyhow!("Failed to set DB_CONN"))?;
    Ok(())
}

/// Create every missing table
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for (table, sql) in SCHEMA {
        tracing::debug!("Ensuring table {}", table);
        conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create table {}: {}", table, e))?;
    }
    tracing::info!("Database schema ready ({} tables)", SCHEMA.len());
    Ok(())
}

pub fn get_connection() -> anyhow::Result<&'static DatabaseConnection> {
    DB_CONN
        .get()
        .ok_or_else(|| anyhow::anyhow!("Database connection has not been initialized"))
}

/// Fresh in-memory database with the full schema
#[cfg(test)]
pub async fn open_in_memory() -> DatabaseConnection {
    let mut options = sea_orm::ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let conn = Database::connect(options).await.unwrap();
    bootstrap_schema(&conn).await.unwrap();
    conn
}
