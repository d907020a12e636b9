use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The visitor's choice for one authorization form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    #[serde(rename = "authorizationFormId")]
    pub form_id: String,
    pub value: bool,
}

impl PreferenceEntry {
    pub fn new(form_id: impl Into<String>, value: bool) -> Self {
        Self {
            form_id: form_id.into(),
            value,
        }
    }
}

/// Preferences keyed by form id.
///
/// Holds at most one entry per form id; writing an existing id replaces its
/// value in place, so iteration order is first-insertion order. Entries are
/// never removed.
#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    entries: Vec<PreferenceEntry>,
    index: HashMap<String, usize>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value from a section default.
    pub fn set_default(&mut self, form_id: &str, value: bool) {
        self.upsert(form_id, value);
    }

    /// Record a user toggle.
    pub fn update(&mut self, form_id: &str, value: bool) {
        self.upsert(form_id, value);
    }

    fn upsert(&mut self, form_id: &str, value: bool) {
        match self.index.get(form_id) {
            Some(&idx) => self.entries[idx].value = value,
            None => {
                self.index.insert(form_id.to_string(), self.entries.len());
                self.entries.push(PreferenceEntry::new(form_id, value));
            }
        }
    }

    pub fn get(&self, form_id: &str) -> Option<bool> {
        self.index.get(form_id).map(|&idx| self.entries[idx].value)
    }

    pub fn entries(&self) -> &[PreferenceEntry] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<PreferenceEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_entry_per_form() {
        let mut store = PreferenceStore::new();
        store.set_default("A", true);
        store.update("A", false);
        store.update("B", true);
        store.update("A", true);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("A"), Some(true));
        assert_eq!(
            store.to_vec(),
            vec![PreferenceEntry::new("A", true), PreferenceEntry::new("B", true)]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let mut store = PreferenceStore::new();
        store.set_default("0cI1", false);
        let json = serde_json::to_string(store.entries()).unwrap();
        assert_eq!(json, r#"[{"authorizationFormId":"0cI1","value":false}]"#);
    }
}
