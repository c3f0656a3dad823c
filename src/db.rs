//! SQLite storage layer for LegalManager.
//!
//! Uses rusqlite with WAL mode. Provides schema migrations, the shared
//! connection handle injected into every request handler, and the small
//! category/key/value settings store (`ajustes`).
//!
//! The handle is opened once at process start; there is no "is the store
//! connected" flag anywhere — a request either holds the connection or
//! surfaces a store error.

use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Shared state holding the database connection.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 3;

/// Initialize the database at `{data_dir}/legalmanager.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. On corruption or open failure,
/// deletes the file and retries once.
pub fn init(data_dir: &Path) -> Result<DbState, String> {
    fs::create_dir_all(data_dir).map_err(|e| format!("Failed to create data dir: {e}"))?;

    let db_path = data_dir.join("legalmanager.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!(
                "Database open failed ({}), deleting and retrying once",
                first_err
            );
            if db_path.exists() {
                let _ = fs::remove_file(&db_path);
                let wal = db_path.with_extension("db-wal");
                let shm = db_path.with_extension("db-shm");
                let _ = fs::remove_file(&wal);
                let _ = fs::remove_file(&shm);
            }
            open_and_configure(&db_path)
                .map_err(|e| format!("Database open failed after retry: {e}"))?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection, String> {
    let conn = Connection::open(path).map_err(|e| format!("sqlite open: {e}"))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| format!("pragma setup: {e}"))?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("create schema_version: {e}"))?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }
    if current < 3 {
        migrate_v3(conn)?;
    }

    Ok(())
}

/// Migration v1: the four entity collections.
///
/// Records are documents: relationships are free strings, not foreign
/// keys, so there are no FK constraints between these tables. Date
/// columns hold normalized `YYYY-MM-DD` text, but pre-normalization rows
/// may still carry `DD/MM/YYYY`.
fn migrate_v1(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        -- clientes
        CREATE TABLE IF NOT EXISTS clientes (
            id TEXT PRIMARY KEY,
            nombre TEXT NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            telefono TEXT NOT NULL DEFAULT '',
            caso TEXT NOT NULL DEFAULT '',
            estado TEXT NOT NULL DEFAULT 'Activo',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- casos
        CREATE TABLE IF NOT EXISTS casos (
            id TEXT PRIMARY KEY,
            titulo TEXT NOT NULL,
            cliente TEXT NOT NULL DEFAULT '',
            tipo TEXT NOT NULL DEFAULT '',
            fecha_inicio TEXT NOT NULL DEFAULT '',
            fecha_fin TEXT NOT NULL DEFAULT '',
            estado TEXT NOT NULL DEFAULT 'En proceso',
            notas TEXT NOT NULL DEFAULT '',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- tareas
        CREATE TABLE IF NOT EXISTS tareas (
            id TEXT PRIMARY KEY,
            titulo TEXT NOT NULL,
            cliente TEXT NOT NULL DEFAULT '',
            caso TEXT NOT NULL DEFAULT '',
            fecha_limite TEXT NOT NULL DEFAULT '',
            prioridad TEXT NOT NULL DEFAULT 'Media',
            estado TEXT NOT NULL DEFAULT 'Pendiente',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- pagos
        CREATE TABLE IF NOT EXISTS pagos (
            id TEXT PRIMARY KEY,
            cliente TEXT NOT NULL,
            caso TEXT NOT NULL DEFAULT '',
            monto REAL NOT NULL CHECK (monto > 0),
            fecha TEXT NOT NULL DEFAULT '',
            metodo TEXT NOT NULL DEFAULT '',
            estado TEXT NOT NULL DEFAULT 'Pendiente',
            comprobante TEXT NOT NULL DEFAULT '',
            notas TEXT NOT NULL DEFAULT '',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- Indexes for the dashboard's fixed status predicates
        CREATE INDEX IF NOT EXISTS idx_clientes_estado ON clientes(estado);
        CREATE INDEX IF NOT EXISTS idx_casos_estado ON casos(estado);
        CREATE INDEX IF NOT EXISTS idx_tareas_estado ON tareas(estado);
        CREATE INDEX IF NOT EXISTS idx_pagos_estado ON pagos(estado);

        -- Record migration
        INSERT INTO schema_version (version) VALUES (1);
        ",
    )
    .map_err(|e| {
        error!("Migration v1 failed: {e}");
        format!("migration v1: {e}")
    })?;

    info!("Applied migration v1 (entity collections)");
    Ok(())
}

/// Migration v2: configuration document and login accounts.
fn migrate_v2(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        -- configuracion (one document per account, keyed by owner email;
        -- perfil/despacho kept as JSON sub-documents)
        CREATE TABLE IF NOT EXISTS configuracion (
            email TEXT PRIMARY KEY,
            perfil TEXT NOT NULL DEFAULT '{}',
            despacho TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- usuarios (login accounts; password is a bcrypt hash)
        CREATE TABLE IF NOT EXISTS usuarios (
            id TEXT PRIMARY KEY,
            email TEXT UNIQUE NOT NULL,
            password TEXT NOT NULL,
            nombre TEXT NOT NULL DEFAULT '',
            rol TEXT NOT NULL DEFAULT 'admin',
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        );

        -- Record migration
        INSERT INTO schema_version (version) VALUES (2);
        ",
    )
    .map_err(|e| {
        error!("Migration v2 failed: {e}");
        format!("migration v2: {e}")
    })?;

    info!("Applied migration v2 (configuracion + usuarios)");
    Ok(())
}

/// Migration v3: ajustes store, seeded with the dashboard delta figures.
///
/// The month-over-month "incremento" numbers shown on the dashboard are
/// placeholders, not statistics derived from data. They live here so they
/// can be edited without a deploy.
fn migrate_v3(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        -- ajustes (category/key/value store)
        CREATE TABLE IF NOT EXISTS ajustes (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            categoria TEXT NOT NULL,
            clave TEXT NOT NULL,
            valor TEXT NOT NULL,
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE(categoria, clave)
        );

        INSERT OR IGNORE INTO ajustes (categoria, clave, valor) VALUES
            ('dashboard', 'clientes_incremento', '2'),
            ('dashboard', 'casos_incremento', '3'),
            ('dashboard', 'pagos_pendientes_incremento', '-1200'),
            ('dashboard', 'tareas_incremento', '4');

        -- Record migration
        INSERT INTO schema_version (version) VALUES (3);
        ",
    )
    .map_err(|e| {
        error!("Migration v3 failed: {e}");
        format!("migration v3: {e}")
    })?;

    info!("Applied migration v3 (ajustes + dashboard deltas)");
    Ok(())
}

// ---------------------------------------------------------------------------
// Ajustes helpers
// ---------------------------------------------------------------------------

/// Get a single setting value.
pub fn get_ajuste(conn: &Connection, categoria: &str, clave: &str) -> Option<String> {
    conn.query_row(
        "SELECT valor FROM ajustes WHERE categoria = ?1 AND clave = ?2",
        params![categoria, clave],
        |row| row.get(0),
    )
    .ok()
}

/// Insert or update a setting.
pub fn set_ajuste(
    conn: &Connection,
    categoria: &str,
    clave: &str,
    valor: &str,
) -> Result<(), String> {
    conn.execute(
        "INSERT INTO ajustes (categoria, clave, valor, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(categoria, clave) DO UPDATE SET
            valor = excluded.valor,
            updated_at = excluded.updated_at",
        params![categoria, clave, valor],
    )
    .map_err(|e| format!("set_ajuste: {e}"))?;
    Ok(())
}

/// Open an in-memory database with all migrations applied (test helper).
#[cfg(test)]
pub fn db_en_memoria() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .expect("pragma setup");
    run_migrations(&conn).expect("run_migrations should succeed in test");
    conn
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: list table names in the database.
    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .expect("prepare table list");
        stmt.query_map([], |row| row.get(0))
            .expect("query tables")
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_migrations_v1_to_latest() {
        let conn = db_en_memoria();
        let tables = table_names(&conn);

        for tabla in ["clientes", "casos", "tareas", "pagos"] {
            assert!(tables.contains(&tabla.to_string()), "missing {tabla}");
        }
        assert!(tables.contains(&"configuracion".to_string()));
        assert!(tables.contains(&"usuarios".to_string()));
        assert!(tables.contains(&"ajustes".to_string()));

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .expect("read schema version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = db_en_memoria();
        run_migrations(&conn).expect("second run should succeed");

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .expect("read schema version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_wal_mode_on_file_db() {
        // WAL only works on file-backed databases; in-memory always returns
        // "memory". Use a tempfile to verify the full open_and_configure path.
        let dir = std::env::temp_dir().join("legalmanager_test_wal");
        let _ = std::fs::create_dir_all(&dir);
        let db_path = dir.join("test_wal.db");
        let _ = std::fs::remove_file(&db_path);

        let conn = open_and_configure(&db_path).expect("open temp db");
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("read journal_mode");
        assert_eq!(mode.to_lowercase(), "wal", "journal_mode should be WAL");

        drop(conn);
        let _ = std::fs::remove_file(&db_path);
        let _ = std::fs::remove_file(db_path.with_extension("db-wal"));
        let _ = std::fs::remove_file(db_path.with_extension("db-shm"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_pagos_rechaza_monto_no_positivo() {
        let conn = db_en_memoria();
        let result = conn.execute(
            "INSERT INTO pagos (id, cliente, monto) VALUES ('p-1', 'Juan Pérez', 0)",
            [],
        );
        assert!(result.is_err(), "monto = 0 should be rejected");

        conn.execute(
            "INSERT INTO pagos (id, cliente, monto) VALUES ('p-2', 'Juan Pérez', 2500)",
            [],
        )
        .expect("positive monto should be accepted");
    }

    #[test]
    fn test_usuarios_email_unico() {
        let conn = db_en_memoria();
        conn.execute(
            "INSERT INTO usuarios (id, email, password) VALUES ('u-1', 'a@b.mx', 'hash')",
            [],
        )
        .expect("first insert");
        let dup = conn.execute(
            "INSERT INTO usuarios (id, email, password) VALUES ('u-2', 'a@b.mx', 'hash')",
            [],
        );
        assert!(dup.is_err(), "duplicate email should be rejected");
    }

    #[test]
    fn test_ajustes_seed_y_upsert() {
        let conn = db_en_memoria();

        assert_eq!(
            get_ajuste(&conn, "dashboard", "clientes_incremento").as_deref(),
            Some("2")
        );
        assert_eq!(
            get_ajuste(&conn, "dashboard", "pagos_pendientes_incremento").as_deref(),
            Some("-1200")
        );

        set_ajuste(&conn, "dashboard", "clientes_incremento", "7").expect("upsert");
        assert_eq!(
            get_ajuste(&conn, "dashboard", "clientes_incremento").as_deref(),
            Some("7")
        );

        assert_eq!(get_ajuste(&conn, "dashboard", "inexistente"), None);
    }
}
