//! SQLite backend built on an `sqlx` connection pool.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{Database, StorageError, TutorRepository, UnitOfWork};
use crate::settings::DatabaseConfig;
use crate::tutor::Tutor;

const CREATE_TUTORS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tutors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        email TEXT,
        subject TEXT
    )
"#;

/// Pooled SQLite database; creates the file and schema if missing.
#[derive(Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StorageError> {
        info!("Initializing SQLite pool: {}", config.url);

        let mut options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds));

        // A private in-memory database lives and dies with its only connection.
        if config.is_sqlite_in_memory() {
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            // readers never block the single writer
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let pool = pool_options.connect_with(options).await?;
        let database = Self { pool };
        database.init().await?;
        Ok(database)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating tutors table if not exists");
        sqlx::query(CREATE_TUTORS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    /// Returns the underlying pool for running queries.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// One SQLite transaction; `sqlx` rolls it back when dropped uncommitted.
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl TutorRepository for SqliteUnitOfWork {
    async fn save(&mut self, tutor: Tutor) -> Result<Tutor, StorageError> {
        match tutor.id {
            None => {
                let result =
                    sqlx::query("INSERT INTO tutors (name, email, subject) VALUES (?, ?, ?)")
                        .bind(&tutor.name)
                        .bind(&tutor.email)
                        .bind(&tutor.subject)
                        .execute(&mut *self.tx)
                        .await?;

                let id = result.last_insert_rowid();
                debug!("Inserted tutor: id={}", id);
                Ok(Tutor {
                    id: Some(id),
                    ..tutor
                })
            }
            Some(id) => {
                sqlx::query(
                    r#"
                    INSERT INTO tutors (id, name, email, subject)
                    VALUES (?, ?, ?, ?)
                    ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        email = excluded.email,
                        subject = excluded.subject
                    "#,
                )
                .bind(id)
                .bind(&tutor.name)
                .bind(&tutor.email)
                .bind(&tutor.subject)
                .execute(&mut *self.tx)
                .await?;

                debug!("Saved tutor: id={}", id);
                Ok(tutor)
            }
        }
    }

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Tutor>, StorageError> {
        let tutor = sqlx::query_as::<_, Tutor>(
            "SELECT id, name, email, subject FROM tutors WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(tutor)
    }

    async fn find_all(&mut self) -> Result<Vec<Tutor>, StorageError> {
        let tutors = sqlx::query_as::<_, Tutor>(
            "SELECT id, name, email, subject FROM tutors ORDER BY id",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        debug!("Retrieved {} tutors", tutors.len());
        Ok(tutors)
    }

    async fn update(&mut self, tutor: Tutor) -> Result<Option<Tutor>, StorageError> {
        let Some(id) = tutor.id else {
            return Ok(None);
        };

        // The write itself decides existence, so the transaction takes the
        // write lock first and waits on `busy_timeout` instead of failing.
        let result =
            sqlx::query("UPDATE tutors SET name = ?, email = ?, subject = ? WHERE id = ?")
                .bind(&tutor.name)
                .bind(&tutor.email)
                .bind(&tutor.subject)
                .bind(id)
                .execute(&mut *self.tx)
                .await?;

        if result.rows_affected() == 0 {
            debug!("No tutor to update: id={}", id);
            return Ok(None);
        }
        debug!("Updated tutor: id={}", id);
        Ok(Some(tutor))
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM tutors WHERE id = ?")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        debug!("Deleted {} tutor rows for id={}", result.rows_affected(), id);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }
}
