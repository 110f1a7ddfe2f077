//! Memory - per-agent history log and key/value store
//!
//! Both the orchestrated and the conversational path append to the history
//! log, possibly from concurrently running tasks, so appends go through a
//! lock and readers get a snapshot.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use tracing::debug;

/// Process-local memory scoped to one agent
#[derive(Debug, Default)]
pub struct Memory {
    history: RwLock<Vec<String>>,
    store: RwLock<HashMap<String, Value>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous value
    pub fn store(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        debug!(%key, "Memory::store: called");
        self.store.write().unwrap_or_else(|e| e.into_inner()).insert(key, value);
    }

    /// Retrieve a copy of the value under `key`
    pub fn retrieve(&self, key: &str) -> Option<Value> {
        self.store.read().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    /// Append one entry to the history log
    pub fn add_to_history(&self, entry: impl Into<String>) {
        let entry = entry.into();
        debug!(entry_len = entry.len(), "Memory::add_to_history: called");
        self.history.write().unwrap_or_else(|e| e.into_inner()).push(entry);
    }

    /// Snapshot of the history log, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// History formatted one entry per line, for prompts
    pub fn formatted_history(&self) -> String {
        self.history().iter().map(|entry| format!("{}\n", entry)).collect()
    }

    /// Clear both the history and the store
    pub fn clear(&self) {
        debug!("Memory::clear: called");
        self.history.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.store.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
