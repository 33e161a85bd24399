//! Embedded schema migrations.
//!
//! Applied versions are recorded in a `_migrations` table; pending ones run
//! in order, each inside its own transaction.

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_master_table",
        sql: include_str!("sql/001_create_master.sql"),
    },
    Migration {
        version: 2,
        description: "create_uploaded_files_table",
        sql: include_str!("sql/002_create_uploaded_files.sql"),
    },
    Migration {
        version: 3,
        description: "create_dispositions_tables",
        sql: include_str!("sql/003_create_dispositions.sql"),
    },
    Migration {
        version: 4,
        description: "create_downloads_history_table",
        sql: include_str!("sql/004_create_downloads_history.sql"),
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let batch = format!(
            "BEGIN;\n{}\nINSERT INTO _migrations (version, description) VALUES ({}, '{}');\nCOMMIT;",
            migration.sql, migration.version, migration.description
        );
        if let Err(e) = conn.execute_batch(&batch) {
            // Leave the connection usable for the caller's error path.
            let _ = conn.execute_batch("ROLLBACK;");
            return Err(DatabaseError::Migration {
                version: migration.version,
                reason: e.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) fn column_exists(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let exists = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .any(|r| r.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}
