//! Transactional key-value store backing the credential records.
//!
//! - `txn`: read-only and read-write transactions over one snapshot.
//! - `backend`: durability (in-memory or single file).
//! - `codec`: MessagePack encoding of stored records.
//! - `gate`: lets a caller abandon an update that has not started yet.
//!
//! Writers are serialized: an update transaction holds the write lock from
//! its first read to its commit, so read-check-write sequences inside one
//! transaction are atomic. Readers see the last committed state.

pub mod backend;
pub mod codec;
pub mod gate;
pub mod txn;

use std::{fmt, path::PathBuf};

pub use backend::*;
pub use codec::*;
pub use gate::*;
use ftpgate_error::{StoreError, StoreResult};
use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{error, trace};
pub use txn::*;

pub struct Store {
    data: RwLock<KeySpace>,
    backend: Box<dyn Backend>,
}

impl Store {
    /// Volatile store, used in tests and when no path is configured.
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(KeySpace::new()),
            backend: Box::new(MemoryBackend),
        }
    }

    pub fn open(backend: impl Backend + 'static) -> StoreResult<Self> {
        let data = backend.load()?;
        Ok(Self {
            data: RwLock::new(data),
            backend: Box::new(backend),
        })
    }

    pub fn open_file(path: impl Into<PathBuf>) -> StoreResult<Self> {
        Self::open(FileBackend::new(path))
    }

    /// Number of committed keys.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` against a consistent snapshot.
    pub fn view<T, E>(
        &self,
        f: impl FnOnce(&ViewTxn<'_>) -> Result<T, E>,
    ) -> Result<T, E> {
        let guard = self.data.read();
        f(&ViewTxn::new(&guard))
    }

    /// Runs `f` in a read-write transaction.
    ///
    /// If `f` returns `Err` nothing is written. If `f` succeeds, its staged
    /// writes are applied and handed to the backend; a backend failure
    /// undoes them in memory before the error is returned.
    pub fn update<T, E>(
        &self,
        f: impl FnOnce(&mut UpdateTxn<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let guard = self.data.write();
        self.commit(guard, f)
    }

    /// Like [`update`](Self::update), but runs `f` only if `gate` has not
    /// been abandoned by the time the write lock is held.
    ///
    /// An abandoned gate yields `StoreError::Cancelled` and leaves the key
    /// space untouched. Once entered, the transaction commits or rolls back
    /// as usual regardless of what the caller does.
    pub fn update_gated<T, E>(
        &self,
        gate: &CommitGate,
        f: impl FnOnce(&mut UpdateTxn<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let guard = self.data.write();
        if !gate.enter() {
            trace!(operation = gate.operation(), "Abandoned transaction skipped");
            return Err(StoreError::Cancelled {
                operation: gate.operation().to_string(),
            }
            .into());
        }
        self.commit(guard, f)
    }

    fn commit<T, E>(
        &self,
        mut guard: RwLockWriteGuard<'_, KeySpace>,
        f: impl FnOnce(&mut UpdateTxn<'_>) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let (out, pending) = {
            let mut txn = UpdateTxn::new(&guard);
            let out = f(&mut txn)?;
            (out, txn.into_pending())
        };

        if pending.is_empty() {
            return Ok(out);
        }

        let mut undo = Vec::with_capacity(pending.len());
        for (key, value) in pending {
            let previous = match value {
                Some(value) => guard.insert(key.clone(), value),
                None => guard.remove(&key),
            };
            undo.push((key, previous));
        }

        if let Err(err) = self.backend.persist(&guard) {
            error!(backend = self.backend.name(), error = %err, "Commit failed, rolling back");
            for (key, previous) in undo.into_iter().rev() {
                match previous {
                    Some(value) => guard.insert(key, value),
                    None => guard.remove(&key),
                };
            }
            return Err(err.into());
        }

        trace!(backend = self.backend.name(), keys = undo.len(), "Transaction committed");
        Ok(out)
    }
}

impl fmt::Debug for Store {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend)
            .field("keys", &self.len())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;

    /// Backend whose persist can be made to fail on demand.
    #[derive(Debug, Default)]
    struct FlakyBackend {
        fail: Arc<AtomicBool>,
    }

    impl Backend for FlakyBackend {
        fn load(&self) -> StoreResult<KeySpace> {
            Ok(KeySpace::new())
        }

        fn persist(
            &self,
            _data: &KeySpace,
        ) -> StoreResult<()> {
            if self.fail.load(Ordering::SeqCst) {
                Err(StoreError::Io {
                    reason: "disk full".into(),
                })
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn test_commit_and_view() {
        let store = Store::in_memory();
        store
            .update(|txn| {
                txn.set("user:a", b"1".to_vec());
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let value = store
            .view(|txn| Ok::<_, StoreError>(txn.get("user:a").map(<[u8]>::to_vec)))
            .unwrap();
        assert_eq!(value, Some(b"1".to_vec()));
        assert_eq!(store.len(), 1);
    }

    /// An error returned from the closure discards staged writes.
    #[test]
    fn test_closure_error_rolls_back() {
        let store = Store::in_memory();
        let result: Result<(), StoreError> = store.update(|txn| {
            txn.set("user:a", b"1".to_vec());
            Err(StoreError::KeyNotFound {
                key: "group:x".into(),
            })
        });

        assert!(result.is_err());
        assert!(store.is_empty());
    }

    /// A failed persist leaves memory exactly as it was before the commit.
    #[test]
    fn test_persist_failure_restores_previous_state() {
        let fail = Arc::new(AtomicBool::new(false));
        let store = Store::open(FlakyBackend { fail: fail.clone() }).unwrap();

        store
            .update(|txn| {
                txn.set("user:a", b"old".to_vec());
                txn.set("user:b", b"keep".to_vec());
                Ok::<_, StoreError>(())
            })
            .unwrap();

        fail.store(true, Ordering::SeqCst);
        let err = store
            .update(|txn| {
                txn.set("user:a", b"new".to_vec());
                txn.delete("user:b");
                txn.set("user:c", b"added".to_vec());
                Ok::<_, StoreError>(())
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));

        store
            .view(|txn| {
                assert_eq!(txn.get("user:a"), Some(&b"old"[..]));
                assert_eq!(txn.get("user:b"), Some(&b"keep"[..]));
                assert_eq!(txn.get("user:c"), None);
                Ok::<_, StoreError>(())
            })
            .unwrap();
    }

    #[test]
    fn test_abandoned_gate_writes_nothing() {
        let store = Store::in_memory();
        let gate = CommitGate::new("add_group");
        assert!(gate.abandon());

        let err = store
            .update_gated(&gate, |txn| {
                txn.set("group:staff", Vec::new());
                Ok::<_, StoreError>(())
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Cancelled { ref operation } if operation == "add_group"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_entered_gate_cannot_be_abandoned() {
        let store = Store::in_memory();
        let gate = CommitGate::new("add_group");

        store
            .update_gated(&gate, |txn| {
                txn.set("group:staff", Vec::new());
                Ok::<_, StoreError>(())
            })
            .unwrap();
        assert!(!gate.abandon());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.db");

        {
            let store = Store::open_file(&path).unwrap();
            store
                .update(|txn| {
                    txn.set("group:staff", Vec::new());
                    Ok::<_, StoreError>(())
                })
                .unwrap();
        }

        let reopened = Store::open_file(&path).unwrap();
        assert_eq!(reopened.len(), 1);
        assert!(reopened
            .view(|txn| Ok::<_, StoreError>(txn.contains("group:staff")))
            .unwrap());
    }
}
