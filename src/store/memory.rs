use std::collections::HashMap;

use super::{SlotBackend, SlotError};

/// In-process slots, optionally capped like a browser storage quota.
#[derive(Debug, Default, Clone)]
pub struct MemorySlots {
    slots: HashMap<String, String>,
    capacity_bytes: Option<usize>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity_bytes: usize) -> Self {
        Self {
            slots: HashMap::new(),
            capacity_bytes: Some(capacity_bytes),
        }
    }

    #[cfg(test)]
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.slots.insert(key.to_string(), value.to_string());
        self
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.slots
            .iter()
            .filter(|(slot, _)| slot.as_str() != key)
            .map(|(slot, value)| slot.len() + value.len())
            .sum()
    }
}

impl SlotBackend for MemorySlots {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        if let Some(capacity) = self.capacity_bytes {
            if self.used_bytes_without(key) + key.len() + value.len() > capacity {
                return Err(SlotError::QuotaExceeded);
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SlotError> {
        self.slots.remove(key);
        Ok(())
    }
}
