//! In-process entity store.
//!
//! Used for local development (seeded from YAML) and tests. Records keep
//! insertion order, ids are random hex strings and timestamps are filled in
//! the same way the hosted API does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EntityStore, Filter, GatewayError};

/// Entity store backed by a map of entity name to records.
#[derive(Default)]
pub struct MemoryEntityStore {
    records: RwLock<HashMap<String, Vec<Value>>>,
    unavailable: AtomicBool,
    write_calls: AtomicU64,
}

impl MemoryEntityStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`GatewayError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of create/update/delete calls that reached the store.
    #[must_use]
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(Ordering::Relaxed)
    }

    /// Number of stored records of `entity`.
    pub async fn count(&self, entity: &str) -> usize {
        self.records.read().await.get(entity).map_or(0, Vec::len)
    }

    fn check_available(&self) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "memory store switched off".to_string(),
            ));
        }
        Ok(())
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn as_object(value: Value) -> Result<Map<String, Value>, GatewayError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(GatewayError::Api {
            status: 400,
            message: "entity fields must be a JSON object".to_string(),
        }),
    }
}

#[async_trait]
impl EntityStore for MemoryEntityStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, entity: &str) -> Result<Vec<Value>, GatewayError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .get(entity)
            .cloned()
            .unwrap_or_default())
    }

    async fn filter(&self, entity: &str, filter: &Filter) -> Result<Vec<Value>, GatewayError> {
        self.check_available()?;
        Ok(self
            .records
            .read()
            .await
            .get(entity)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.matches(record))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, entity: &str, fields: Value) -> Result<Value, GatewayError> {
        self.check_available()?;
        self.write_calls.fetch_add(1, Ordering::Relaxed);

        let mut record = as_object(fields)?;
        let now = Value::String(Utc::now().to_rfc3339());
        record.insert(
            "id".to_string(),
            Value::String(Uuid::new_v4().simple().to_string()),
        );
        record.insert("created_date".to_string(), now.clone());
        record.insert("updated_date".to_string(), now);

        let record = Value::Object(record);
        self.records
            .write()
            .await
            .entry(entity.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, entity: &str, id: &str, patch: Value) -> Result<Value, GatewayError> {
        self.check_available()?;
        self.write_calls.fetch_add(1, Ordering::Relaxed);

        let patch = as_object(patch)?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(entity)
            .and_then(|records| records.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| GatewayError::NotFound(format!("{entity}/{id}")))?;

        if let Value::Object(fields) = record {
            for (key, value) in patch {
                if key != "id" {
                    fields.insert(key, value);
                }
            }
            fields.insert(
                "updated_date".to_string(),
                Value::String(Utc::now().to_rfc3339()),
            );
        }
        Ok(record.clone())
    }

    async fn delete(&self, entity: &str, id: &str) -> Result<(), GatewayError> {
        self.check_available()?;
        self.write_calls.fetch_add(1, Ordering::Relaxed);

        let mut records = self.records.write().await;
        let list = records
            .get_mut(entity)
            .ok_or_else(|| GatewayError::NotFound(format!("{entity}/{id}")))?;
        let position = list
            .iter()
            .position(|r| record_id(r) == Some(id))
            .ok_or_else(|| GatewayError::NotFound(format!("{entity}/{id}")))?;
        list.remove(position);
        Ok(())
    }
}
