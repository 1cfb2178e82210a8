//! In-process [`AggregateStore`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::model::Aggregate;
use crate::storage::{AggregateStore, LoadedAggregate};

const MEMORY_LOCATION: &str = "memory";

/// Keeps the serialized document in memory so that loads and saves go
/// through the same JSON encoding as a remote store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<Option<String>>,
    saves: AtomicUsize,
}

impl MemoryStore {
    /// An empty store; the first load creates the document.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `aggregate`.
    pub fn with_aggregate(aggregate: &Aggregate) -> Result<Self> {
        let store = Self::new();
        *store.lock()? = Some(serde_json::to_string(aggregate)?);
        Ok(store)
    }

    /// The currently persisted aggregate, if any.
    pub fn snapshot(&self) -> Result<Option<Aggregate>> {
        match self.lock()?.as_deref() {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>> {
        self.document
            .lock()
            .map_err(|_| Error::StoreLoad("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl AggregateStore for MemoryStore {
    async fn load(&mut self) -> Result<LoadedAggregate> {
        let mut document = self.lock()?;
        let created = document.is_none();
        let text = document.get_or_insert_with(|| "{}".to_string());
        let aggregate = serde_json::from_str(text).map_err(|e| Error::StoreLoad(e.to_string()))?;
        Ok(LoadedAggregate {
            location: MEMORY_LOCATION.to_string(),
            created,
            aggregate,
        })
    }

    async fn save(&self, aggregate: &Aggregate) -> Result<()> {
        let text = serde_json::to_string(aggregate).map_err(|e| Error::StoreSave(e.to_string()))?;
        *self
            .document
            .lock()
            .map_err(|_| Error::StoreSave("memory store lock poisoned".into()))? = Some(text);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
