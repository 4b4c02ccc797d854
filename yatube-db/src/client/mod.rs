mod comments;
mod follows;
mod groups;
mod posts;
mod sessions;
mod users;

pub use posts::PostFilter;

use sqlx::{
    SqlitePool,
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{
    str::FromStr,
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tracing::debug;
use yatube_common::{
    model::{ModelValidationError, YatubeSnowflake, YatubeSnowflakeGenerator},
    snowflake::{ProcessId, SnowflakeTimestampFromDateTimeError, WorkerId},
};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

const FILE_POOL_MAX_CONNECTIONS: u32 = 8;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error("Could not generate an id: {0}")]
    Snowflake(#[from] SnowflakeTimestampFromDateTimeError),
    #[error("The handle {0} is already taken")]
    HandleTaken(String),
    #[error("The group slug {0} is already taken")]
    SlugTaken(String),
    #[error("Migrating the database failed: {0}")]
    Migrate(#[from] MigrateError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub struct DbClient {
    pool: SqlitePool,
    snowflake_generator: Mutex<YatubeSnowflakeGenerator>,
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl DbClient {
    #[must_use]
    pub fn new(pool: SqlitePool, worker_id: WorkerId, process_id: ProcessId) -> Self {
        let snowflake_generator =
            Mutex::new(YatubeSnowflakeGenerator::new(worker_id, process_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    /// Opens (creating if needed) the database at `database_url`.
    ///
    /// An in-memory database lives only as long as its connection, so it gets
    /// a single connection that is never recycled.
    pub async fn connect(
        database_url: &str,
        worker_id: WorkerId,
        process_id: ProcessId,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(FILE_POOL_MAX_CONNECTIONS)
        };

        let pool = pool_options.connect_with(options).await?;
        debug!(database_url, in_memory, "Connected to database");

        Ok(Self::new(pool, worker_id, process_id))
    }

    /// Connects to a fresh, migrated in-memory database.
    pub async fn connect_in_memory() -> Result<Self> {
        let client = Self::connect(
            "sqlite::memory:",
            WorkerId::default(),
            ProcessId::default(),
        )
        .await?;
        client.migrate().await?;
        Ok(client)
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Database migrations applied");
        Ok(())
    }

    fn next_snowflake(&self) -> Result<YatubeSnowflake> {
        let snowflake = self
            .snowflake_generator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generate()?;

        Ok(snowflake)
    }

    fn next_snowflake_i64(&self) -> Result<i64> {
        Ok(self.next_snowflake()?.get().cast_signed())
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|error| error.is_unique_violation())
}

fn u64_from_count(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

fn i64_from_u64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
