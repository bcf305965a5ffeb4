//! Persistence gateway for [`Tutor`] records.
//!
//! A [`Database`] hands out one [`UnitOfWork`] per request. Every gateway
//! operation runs inside that unit of work, and nothing becomes visible to
//! other units until [`UnitOfWork::commit`] succeeds. Dropping an
//! uncommitted unit of work rolls it back.
//!
//! ## Backends
//!
//! - [`sqlite`] – `SqliteDatabase`, one `sqlx` transaction per unit of work
//! - [`memory`] – `InMemoryDatabase`, staged copy published on commit

mod error;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use crate::settings::{DatabaseBackend, DatabaseConfig};
use crate::tutor::Tutor;

pub use error::StorageError;
pub use memory::InMemoryDatabase;
pub use sqlite::SqliteDatabase;

/// CRUD operations for one entity type.
#[async_trait]
pub trait TutorRepository: Send {
    /// Inserts when `tutor.id` is `None` (the returned tutor carries the new
    /// id), otherwise inserts or fully replaces the row with that id.
    async fn save(&mut self, tutor: Tutor) -> Result<Tutor, StorageError>;

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Tutor>, StorageError>;

    /// Every stored tutor, ascending by id.
    async fn find_all(&mut self) -> Result<Vec<Tutor>, StorageError>;

    /// Fully replaces the row with `tutor.id`. `None` when no such row exists
    /// (or the tutor has no id); nothing is inserted in that case.
    ///
    /// The existence check is part of the write itself, so a unit of work
    /// never has to upgrade a read lock to a write lock.
    async fn update(&mut self, tutor: Tutor) -> Result<Option<Tutor>, StorageError>;

    /// Deleting an unknown id is not an error.
    async fn delete_by_id(&mut self, id: i64) -> Result<(), StorageError>;
}

/// An all-or-nothing scope over the gateway.
#[async_trait]
pub trait UnitOfWork: TutorRepository {
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// Storage backend handle shared by every request.
#[async_trait]
pub trait Database: Send + Sync + 'static {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError>;

    /// Cheap liveness check for the health endpoint.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Open the backend selected in the configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Database>, StorageError> {
    match config.backend {
        DatabaseBackend::Sqlite => Ok(Arc::new(SqliteDatabase::connect(config).await?)),
        DatabaseBackend::Memory => Ok(Arc::new(InMemoryDatabase::new())),
    }
}
