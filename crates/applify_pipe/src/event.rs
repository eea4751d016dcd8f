use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single emission on a [`crate::Channel`], as seen by its handlers.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub value: Value,
    pub timestamp: String,
}

impl Event {
    pub fn new<V: Into<Value>>(name: impl ToString, value: V) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        Self { id, name: name.to_string(), value: value.into(), timestamp }
    }
}
