use ::duckdb::{Connection, ToSql};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_model_registry",
        sql: r#"
CREATE TABLE IF NOT EXISTS model_records (
    symbol TEXT PRIMARY KEY,
    model_path TEXT NOT NULL,
    trained_on TEXT NOT NULL,
    epochs BIGINT NOT NULL,
    time_steps BIGINT NOT NULL,
    scaler_min DOUBLE NOT NULL,
    scaler_max DOUBLE NOT NULL,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS training_log (
    run_id TEXT PRIMARY KEY,
    symbol TEXT NOT NULL,
    status TEXT NOT NULL,
    reason TEXT,
    epochs BIGINT NOT NULL,
    samples BIGINT NOT NULL,
    duration_ms BIGINT NOT NULL,
    final_loss DOUBLE,
    recorded_at TEXT NOT NULL,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_training_log_symbol_recorded_at ON training_log(symbol, recorded_at);
"#,
    },
];

pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let params: [&dyn ToSql; 1] = [&migration.version];
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params.as_slice(),
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params.as_slice(),
            )?;
        }
    }

    Ok(())
}
