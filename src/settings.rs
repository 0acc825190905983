//! Injected key-value settings capability.

use std::collections::HashMap;

/// Settings key under which the controller persists its page size.
pub const PAGE_SIZE_KEY: &str = "paging.page_size";

/// Host-provided key-value store for persisting preferences across runs.
///
/// The controller reads [`PAGE_SIZE_KEY`] once at construction and writes
/// it at most once per effective page-size change. The store is always
/// injected, never a process-wide singleton.
pub trait SettingsStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// In-memory [`SettingsStore`] for tests and hosts without persistence.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a single key, e.g. a page size remembered from a previous run.
    pub fn with(key: &str, value: impl ToString) -> Self {
        let mut settings = Self::default();
        settings.set(key, value.to_string());
        settings
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_settings_roundtrip() {
        let mut settings = MemorySettings::new();
        assert_eq!(settings.get(PAGE_SIZE_KEY), None);
        settings.set(PAGE_SIZE_KEY, "80".to_string());
        assert_eq!(settings.get(PAGE_SIZE_KEY), Some("80".to_string()));
    }

    #[test]
    fn seeded_settings_expose_the_value() {
        let settings = MemorySettings::with(PAGE_SIZE_KEY, 120);
        assert_eq!(settings.get(PAGE_SIZE_KEY), Some("120".to_string()));
    }
}
