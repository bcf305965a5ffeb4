//! In-memory backend.
//!
//! A unit of work holds the table lock for its whole lifetime and edits a
//! staged copy, so units are serialized and an uncommitted one leaves no trace.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Database, StorageError, TutorRepository, UnitOfWork};
use crate::tutor::Tutor;

#[derive(Debug, Clone)]
struct Table {
    rows: BTreeMap<i64, Tutor>,
    next_id: i64,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    table: Arc<Mutex<Table>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StorageError> {
        let guard = self.table.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork { guard, staged }))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
}

#[async_trait]
impl TutorRepository for InMemoryUnitOfWork {
    async fn save(&mut self, mut tutor: Tutor) -> Result<Tutor, StorageError> {
        let table = &mut self.staged;
        let id = match tutor.id {
            Some(id) => id,
            None => table.next_id,
        };
        // ids are never reused, even after an explicit-id insert
        table.next_id = table.next_id.max(id + 1);

        tutor.id = Some(id);
        table.rows.insert(id, tutor.clone());
        Ok(tutor)
    }

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Tutor>, StorageError> {
        Ok(self.staged.rows.get(&id).cloned())
    }

    async fn find_all(&mut self) -> Result<Vec<Tutor>, StorageError> {
        Ok(self.staged.rows.values().cloned().collect())
    }

    async fn update(&mut self, tutor: Tutor) -> Result<Option<Tutor>, StorageError> {
        let Some(row) = tutor.id.and_then(|id| self.staged.rows.get_mut(&id)) else {
            return Ok(None);
        };
        *row = tutor.clone();
        Ok(Some(tutor))
    }

    async fn delete_by_id(&mut self, id: i64) -> Result<(), StorageError> {
        self.staged.rows.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let InMemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let db = InMemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        let saved = uow.save(Tutor::new("Alice")).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(saved.id, Some(1));

        let mut uow = db.begin().await.unwrap();
        assert_eq!(uow.find_by_id(1).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_rollback_on_drop() {
        let db = InMemoryDatabase::new();

        let mut uow = db.begin().await.unwrap();
        uow.save(Tutor::new("Ghost")).await.unwrap();
        drop(uow);

        let mut uow = db.begin().await.unwrap();
        assert!(uow.find_all().await.unwrap().is_empty());
        // the rolled back insert does not consume an id either
        assert_eq!(uow.save(Tutor::new("Alice")).await.unwrap().id, Some(1));
    }

    #[tokio::test]
    async fn test_ids_are_not_reused() {
        let db = InMemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();

        let first = uow.save(Tutor::new("Alice")).await.unwrap().id.unwrap();
        uow.delete_by_id(first).await.unwrap();
        let second = uow.save(Tutor::new("Bob")).await.unwrap().id.unwrap();
        assert!(second > first);

        uow.save(Tutor::new("Carol").with_id(10)).await.unwrap();
        let next = uow.save(Tutor::new("Dave")).await.unwrap().id.unwrap();
        assert_eq!(next, 11);
    }

    #[tokio::test]
    async fn test_update_of_missing_row_inserts_nothing() {
        let db = InMemoryDatabase::new();
        let mut uow = db.begin().await.unwrap();

        assert!(uow.update(Tutor::new("Nobody").with_id(4)).await.unwrap().is_none());
        assert!(uow.find_all().await.unwrap().is_empty());

        let id = uow.save(Tutor::new("Alice")).await.unwrap().id.unwrap();
        let updated = uow.update(Tutor::new("Alicia").with_id(id)).await.unwrap();
        assert_eq!(updated, Some(Tutor::new("Alicia").with_id(id)));
        assert_eq!(uow.find_by_id(id).await.unwrap(), updated);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(String),
        Delete(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(Op::Create),
            (0usize..16).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn prop_list_matches_created_minus_deleted(ops in prop::collection::vec(op_strategy(), 0..40)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let db = InMemoryDatabase::new();
                let mut created: Vec<i64> = Vec::new();
                let mut live: BTreeSet<i64> = BTreeSet::new();

                for op in ops {
                    let mut uow = db.begin().await.unwrap();
                    match op {
                        Op::Create(name) => {
                            let id = uow.save(Tutor::new(name)).await.unwrap().id.unwrap();
                            created.push(id);
                            live.insert(id);
                        }
                        Op::Delete(index) => {
                            let id = created.get(index).copied().unwrap_or(9_999);
                            uow.delete_by_id(id).await.unwrap();
                            live.remove(&id);
                        }
                    }
                    uow.commit().await.unwrap();
                }

                let mut uow = db.begin().await.unwrap();
                let listed: BTreeSet<i64> = uow
                    .find_all()
                    .await
                    .unwrap()
                    .into_iter()
                    .filter_map(|t| t.id)
                    .collect();
                assert_eq!(listed, live);
            });
        }
    }
}
