// In-memory client store
use crate::application::client_store::ClientStore;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, key: &str, value: &str) -> Self {
        if let Ok(mut items) = self.items.write() {
            items.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().map(|items| items.is_empty()).unwrap_or(true)
    }
}

impl ClientStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut items = self
            .items
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.write() {
            items.remove(key);
        }
    }
}
