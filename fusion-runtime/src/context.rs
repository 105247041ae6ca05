//! Process-wide context handed to every transport factory.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

/// Immutable, process-wide fields available to every subgraph's context.
///
/// Built once at startup and shared by `Arc` clone across every
/// `SubgraphExecCtx`; nothing here changes for the life of the runtime.
#[derive(Clone, Default)]
pub struct TransportContext {
    fields: Arc<HashMap<String, Value>>,
}

impl TransportContext {
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            fields: Arc::new(fields),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}
