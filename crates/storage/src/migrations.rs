use sqlx::PgPool;
use tracing::info;

use crate::Result;

/// A schema change applied once, in version order
struct Migration {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

// `IF NOT EXISTS` everywhere: databases created by the previous deployment
// already have `auth` and `admin` and must migrate in place.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 20241018_000001,
        name: "create_auth_table",
        statements: &[
            "CREATE TABLE IF NOT EXISTS auth (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )",
            "ALTER TABLE auth ADD COLUMN IF NOT EXISTS rating NUMERIC(6, 2) NOT NULL DEFAULT 0 \
             CHECK (rating >= 0)",
        ],
    },
    Migration {
        version: 20241018_000002,
        name: "create_admin_table",
        statements: &["CREATE TABLE IF NOT EXISTS admin (
                id SERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
            )"],
    },
    Migration {
        version: 20241018_000003,
        name: "create_profile_table",
        statements: &["CREATE TABLE IF NOT EXISTS profile (
                user_id INTEGER PRIMARY KEY REFERENCES auth(id) ON DELETE CASCADE,
                latitude DOUBLE PRECISION,
                longitude DOUBLE PRECISION,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"],
    },
];

/// Apply every pending migration.
///
/// Each migration runs in its own transaction together with its bookkeeping
/// row. Returns how many were applied.
pub async fn run_migrations(pool: &PgPool) -> Result<usize> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version BIGINT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await?;

    let applied: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_migrations")
        .fetch_all(pool)
        .await?;

    let mut count = 0;
    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
        let mut tx = pool.begin().await?;

        for statement in migration.statements {
            sqlx::query(*statement).execute(&mut *tx).await?;
        }

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(version = migration.version, name = migration.name, "applied migration");
        count += 1;
    }

    Ok(count)
}
