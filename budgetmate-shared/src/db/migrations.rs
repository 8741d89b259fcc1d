/// Embedded schema migrations
///
/// The SQL files under `budgetmate-shared/migrations/` are compiled into the
/// binary with `sqlx::migrate!` and applied at startup. Each file is named
/// `{timestamp}_{description}.sql` and applied once, in timestamp order.
///
/// # Example
///
/// ```no_run
/// use budgetmate_shared::db::migrations::{get_migration_status, run_migrations};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// run_migrations(&pool).await?;
///
/// let status = get_migration_status(&pool).await?;
/// assert!(status.is_up_to_date);
/// # Ok(())
/// # }
/// ```

use sqlx::{migrate::MigrateDatabase, migrate::Migrator, postgres::PgPool, Postgres};
use tracing::{debug, info, warn};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Where the database stands relative to the embedded migrations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Successfully applied migrations
    pub applied_migrations: usize,

    /// Embedded migrations known to this build
    pub known_migrations: usize,

    /// Highest applied version
    pub latest_version: Option<i64>,

    /// True when every embedded migration has been applied
    pub is_up_to_date: bool,
}

/// Applies every pending migration.
///
/// # Errors
///
/// Returns the migrator's error when a script fails or a previously applied
/// script was edited after the fact.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!(known = MIGRATOR.iter().count(), "Running database migrations");

    MIGRATOR.run(pool).await.map_err(|e| {
        warn!(error = %e, "Migration failed");
        e
    })?;

    info!("Database schema is up to date");
    Ok(())
}

/// Reads `_sqlx_migrations` and compares it with the embedded set.
pub async fn get_migration_status(pool: &PgPool) -> Result<MigrationStatus, sqlx::Error> {
    let known_migrations = MIGRATOR.iter().count();

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!("Migrations table does not exist yet");
        return Ok(MigrationStatus {
            applied_migrations: 0,
            known_migrations,
            latest_version: None,
            is_up_to_date: known_migrations == 0,
        });
    }

    let (applied, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = TRUE",
    )
    .fetch_one(pool)
    .await?;

    let applied_migrations = applied as usize;
    debug!(applied_migrations, known_migrations, ?latest_version, "Migration status");

    Ok(MigrationStatus {
        applied_migrations,
        known_migrations,
        latest_version,
        is_up_to_date: applied_migrations >= known_migrations,
    })
}

/// Creates the database named in `database_url` when it is missing. Used by
/// local setup and the integration tests.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), sqlx::Error> {
    if Postgres::database_exists(database_url).await? {
        debug!("Database already exists");
    } else {
        info!("Creating database");
        Postgres::create_database(database_url).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert!(!versions.is_empty());
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_embedded_migrations_create_core_tables() {
        let sql: String = MIGRATOR.iter().map(|m| m.sql.as_ref()).collect();
        for table in [
            "families",
            "users",
            "sessions",
            "transactions",
            "budgets",
            "purchase_requests",
            "votes",
            "goals",
            "subscriptions",
            "notifications",
            "invites",
        ] {
            assert!(
                sql.contains(&format!("CREATE TABLE {} (", table)),
                "missing table {}",
                table
            );
        }
    }
}
