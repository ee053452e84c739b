use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error, SqliteConnection, SqlitePool};
use thiserror::Error;

pub mod models;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Invalid database URL `{url}`: {source}")]
    UrlParse { url: String, source: Error },
    #[error("Database error: {0}")]
    Sqlx(#[from] Error),
    #[error("Database schema version {db_version} is newer than supported version {latest_supported}")]
    UnsupportedSchemaVersion { db_version: i64, latest_supported: i64 },
}

struct Migration {
    version: i64,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("migrations/0001_medicines.sql"),
    },
    Migration {
        version: 2,
        sql: include_str!("migrations/0002_low_stock_threshold.sql"),
    },
    Migration {
        version: 3,
        sql: include_str!("migrations/0003_folded_search_columns.sql"),
    },
];

/// Schema version that introduced the `*_folded` search columns.
const FOLDED_COLUMNS_VERSION: i64 = 3;

/// Opens (creating if missing) the SQLite database at `database_url` and
/// brings its schema up to date.
pub async fn init_db(database_url: &str) -> Result<SqlitePool, DatabaseError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|source| DatabaseError::UrlParse {
            url: database_url.to_string(),
            source,
        })?
        .create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    apply_migrations(&pool).await?;

    log::info!("Database ready at {}", database_url);
    Ok(pool)
}

/// Opens a migrated in-memory database.
///
/// The pool is pinned to a single connection that never expires, since every
/// SQLite `:memory:` connection is its own database.
pub async fn open_in_memory() -> Result<SqlitePool, DatabaseError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    apply_migrations(&pool).await?;
    Ok(pool)
}

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies every pending migration in one transaction and records the new
/// version in `PRAGMA user_version`.
pub async fn apply_migrations(pool: &SqlitePool) -> Result<(), DatabaseError> {
    let current = current_version(pool).await?;
    let latest = latest_version();

    if current > latest {
        return Err(DatabaseError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    if current == latest {
        return Ok(());
    }

    let mut transaction = pool.begin().await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        log::info!("Applying schema migration {}", migration.version);
        sqlx::raw_sql(migration.sql)
            .execute(&mut *transaction)
            .await?;

        let set_version = format!("PRAGMA user_version = {}", migration.version);
        sqlx::raw_sql(&set_version)
            .execute(&mut *transaction)
            .await?;
    }

    // SQLite's lower() only folds ASCII, so existing rows are folded here.
    if current < FOLDED_COLUMNS_VERSION {
        refold_search_columns(&mut transaction).await?;
    }
    transaction.commit().await?;

    Ok(())
}

/// Lowercases text the way search needles are lowercased.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

async fn refold_search_columns(conn: &mut SqliteConnection) -> Result<(), DatabaseError> {
    let rows: Vec<(i64, String, String, String)> =
        sqlx::query_as("SELECT id, name, composition, category FROM medicines")
            .fetch_all(&mut *conn)
            .await?;

    for (id, name, composition, category) in rows {
        sqlx::query(
            "UPDATE medicines SET name_folded = ?1, composition_folded = ?2, \
             category_folded = ?3 WHERE id = ?4",
        )
        .bind(fold(&name))
        .bind(fold(&composition))
        .bind(fold(&category))
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn current_version(pool: &SqlitePool) -> Result<i64, DatabaseError> {
    let version = sqlx::query_scalar::<_, i64>("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_database_is_migrated() {
        let pool = open_in_memory().await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), latest_version());
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = open_in_memory().await.unwrap();
        apply_migrations(&pool).await.unwrap();
        apply_migrations(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn newer_schema_is_rejected() {
        let pool = open_in_memory().await.unwrap();
        sqlx::raw_sql("PRAGMA user_version = 99")
            .execute(&pool)
            .await
            .unwrap();

        let err = apply_migrations(&pool).await.unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::UnsupportedSchemaVersion {
                db_version: 99,
                latest_supported: 3
            }
        ));
    }

    #[tokio::test]
    async fn upgrade_folds_existing_rows() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        for migration in &MIGRATIONS[..2] {
            sqlx::raw_sql(migration.sql).execute(&mut *conn).await.unwrap();
        }
        sqlx::raw_sql(
            "PRAGMA user_version = 2; \
             INSERT INTO medicines (name, composition, category, expiration_date, created_at, updated_at) \
             VALUES ('Ácido Fólico', 'ÁCIDO FÓLICO 5mg', 'Vitamina', '2027-01-01', \
                     '2026-01-01 00:00:00', '2026-01-01 00:00:00');",
        )
        .execute(&mut *conn)
        .await
        .unwrap();
        drop(conn);

        apply_migrations(&pool).await.unwrap();

        let folded: (String, String, String) = sqlx::query_as(
            "SELECT name_folded, composition_folded, category_folded FROM medicines",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(
            folded,
            (
                "ácido fólico".to_string(),
                "ácido fólico 5mg".to_string(),
                "vitamina".to_string()
            )
        );
    }
}
