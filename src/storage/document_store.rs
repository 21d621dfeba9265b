use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::fs::operations::{read_locked, replace_locked};

/// Interface for abstracting a key-value store of JSON documents. Implementations don't
/// provide isolation between a `load` and a following `save`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    async fn save(&self, key: &str, document: Value) -> Result<()>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        (**self).load(key).await
    }

    async fn save(&self, key: &str, document: Value) -> Result<()> {
        (**self).save(key, document).await
    }
}

/// The main realization of [DocumentStore]: one flat JSON object on disk, mapping keys to
/// documents. Every operation reads or rewrites the whole file.
pub struct JsonFileStore {
    path: PathBuf,
    io_guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            io_guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        let contents = read_locked(&self.path)
            .await
            .with_context(|| format!("Failed to read {:?}", self.path))?;

        match contents {
            Some(contents) if !contents.trim().is_empty() => serde_json::from_str(&contents)
                .with_context(|| format!("Store {:?} doesn't hold a json object", self.path)),
            _ => Ok(Map::new()),
        }
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.io_guard.lock().await;
        let mut documents = self.read_all().await?;
        Ok(documents.remove(key))
    }

    async fn save(&self, key: &str, document: Value) -> Result<()> {
        let _guard = self.io_guard.lock().await;
        let mut documents = self.read_all().await?;
        documents.insert(key.to_string(), document);

        let serialized = serde_json::to_vec_pretty(&documents)?;
        replace_locked(&self.path, &serialized)
            .await
            .with_context(|| format!("Failed to write {:?}", self.path))?;
        debug!("Saved document {key} into {:?}", self.path);
        Ok(())
    }
}

/// Keeps documents in memory. Handy for embedding and tests.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: Mutex<Map<String, Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.documents.lock().await.get(key).cloned())
    }

    async fn save(&self, key: &str, document: Value) -> Result<()> {
        self.documents.lock().await.insert(key.to_string(), document);
        Ok(())
    }
}
