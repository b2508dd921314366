use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::StoreError;
use crate::models::TaskRecord;
use crate::paths::split_parent;
use crate::push_id::PushIdGenerator;

pub type Fields = Map<String, Value>;

/// Hierarchical key-value store holding the durable copy of every task.
///
/// Paths look like `tasks/{userId}` (a collection) or `tasks/{userId}/{taskId}`
/// (a single record).
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns a fresh child key, unique and ordered after every key this store
    /// handed out before.
    fn generate_key(&self) -> String;

    async fn set(&self, path: &str, record: &TaskRecord) -> Result<(), StoreError>;

    /// Writes only the given fields, leaving the rest of the record untouched.
    async fn update(&self, path: &str, fields: Fields) -> Result<(), StoreError>;

    async fn remove(&self, path: &str) -> Result<(), StoreError>;

    /// Every child under `path` in key order, or `None` when nothing exists there.
    async fn children(&self, path: &str) -> Result<Option<Vec<(String, TaskRecord)>>, StoreError>;
}

/// In-process store used by tests and the offline mode of the binary.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ids: PushIdGenerator,
    data: Mutex<BTreeMap<String, BTreeMap<String, TaskRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_data<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, BTreeMap<String, TaskRecord>>) -> T,
    ) -> T {
        let mut guard = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Number of records under a collection path.
    pub fn count(&self, path: &str) -> usize {
        self.with_data(|data| data.get(path.trim_matches('/')).map_or(0, BTreeMap::len))
    }

    pub fn get(&self, path: &str) -> Option<TaskRecord> {
        let (parent, key) = split_parent(path)?;
        self.with_data(|data| data.get(parent).and_then(|children| children.get(key)).cloned())
    }
}

fn split(path: &str) -> Result<(String, String), StoreError> {
    split_parent(path)
        .map(|(parent, key)| (parent.to_string(), key.to_string()))
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))
}

#[async_trait]
impl TaskStore for MemoryStore {
    fn generate_key(&self) -> String {
        self.ids.generate()
    }

    async fn set(&self, path: &str, record: &TaskRecord) -> Result<(), StoreError> {
        let (parent, key) = split(path)?;
        self.with_data(|data| {
            data.entry(parent).or_default().insert(key, record.clone());
        });
        Ok(())
    }

    async fn update(&self, path: &str, fields: Fields) -> Result<(), StoreError> {
        let (parent, key) = split(path)?;
        self.with_data(|data| -> Result<(), StoreError> {
            let children = data.entry(parent).or_default();
            let mut merged = match children.get(&key) {
                Some(existing) => match serde_json::to_value(existing)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                },
                None => Map::new(),
            };
            merged.extend(fields);
            let record: TaskRecord = serde_json::from_value(Value::Object(merged))?;
            children.insert(key, record);
            Ok(())
        })
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        let (parent, key) = split(path)?;
        self.with_data(|data| {
            if let Some(children) = data.get_mut(&parent) {
                children.remove(&key);
                if children.is_empty() {
                    data.remove(&parent);
                }
            }
        });
        Ok(())
    }

    async fn children(&self, path: &str) -> Result<Option<Vec<(String, TaskRecord)>>, StoreError> {
        let trimmed = path.trim_matches('/');
        Ok(self.with_data(|data| {
            data.get(trimmed).filter(|children| !children.is_empty()).map(|children| {
                children
                    .iter()
                    .map(|(key, record)| (key.clone(), record.clone()))
                    .collect()
            })
        }))
    }
}
