//! In-memory store
//!
//! Serializes to JSON:
//!
//! ```json
//! {
//!   "languages": [{ "name": "English", "code": "en" }],
//!   "currentLanguage": "English",
//!   "terms": { "UI/TITLE": ["Blasphemous"] }
//! }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::{LocalizationStore, StoreLanguage};

/// A [`LocalizationStore`] held entirely in memory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStore {
    #[serde(default)]
    languages: Vec<StoreLanguage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_language: Option<String>,
    /// One text per language, in `languages` order
    #[serde(default)]
    terms: IndexMap<String, Vec<String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a store from a JSON file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse a store from JSON.
    ///
    /// Term rows are padded or truncated to the number of languages.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut store: Self = serde_json::from_str(json)?;
        let count = store.languages.len();
        for texts in store.terms.values_mut() {
            texts.resize(count, String::new());
        }
        Ok(store)
    }

    /// Write the store as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Add a term with empty text in every language; existing terms are kept
    pub fn insert_term(&mut self, key: impl Into<String>) {
        let count = self.languages.len();
        self.terms
            .entry(key.into())
            .or_insert_with(|| vec![String::new(); count]);
    }

    /// Text of `key` in the language named `language`
    #[must_use]
    pub fn text_in(&self, key: &str, language: &str) -> Option<&str> {
        let index = self.languages.iter().position(|l| l.name == language)?;
        self.terms.get(key)?.get(index).map(String::as_str)
    }

    /// Set the text of `key` in the language named `language`
    pub fn set_text_in(&mut self, key: &str, language: &str, value: &str) -> Result<()> {
        let index = self
            .languages
            .iter()
            .position(|l| l.name == language)
            .ok_or_else(|| Error::LanguageNotFound {
                language: language.to_string(),
            })?;
        self.set_text(key, index, value)
    }
}

impl LocalizationStore for MemoryStore {
    fn languages(&self) -> Vec<StoreLanguage> {
        self.languages.clone()
    }

    fn add_language(&mut self, name: &str, code: &str) {
        if self.languages.iter().any(|l| l.name == name) {
            return;
        }
        self.languages.push(StoreLanguage::new(name, code));
        for texts in self.terms.values_mut() {
            texts.push(String::new());
        }
    }

    fn remove_language(&mut self, name: &str) -> Result<()> {
        let index = self
            .languages
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| Error::LanguageNotFound {
                language: name.to_string(),
            })?;

        self.languages.remove(index);
        for texts in self.terms.values_mut() {
            if index < texts.len() {
                texts.remove(index);
            }
        }
        Ok(())
    }

    fn term_keys(&self) -> Vec<String> {
        self.terms.keys().cloned().collect()
    }

    fn has_term(&self, key: &str) -> bool {
        self.terms.contains_key(key)
    }

    fn text(&self, key: &str, language_index: usize) -> Option<String> {
        self.terms.get(key)?.get(language_index).cloned()
    }

    fn set_text(&mut self, key: &str, language_index: usize, value: &str) -> Result<()> {
        let count = self.languages.len();
        let texts = self.terms.get_mut(key).ok_or_else(|| Error::InvalidKey {
            key: key.to_string(),
        })?;
        let slot = texts
            .get_mut(language_index)
            .ok_or(Error::LanguageIndexOutOfRange {
                index: language_index,
                count,
            })?;
        value.clone_into(slot);
        Ok(())
    }

    fn current_language(&self) -> Option<String> {
        self.current_language.clone()
    }

    fn set_current_language(&mut self, name: &str) {
        self.current_language = Some(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_language_columns_follow_topology() {
        let mut store = MemoryStore::new();
        store.add_language("English", "en");
        store.insert_term("UI/TITLE");
        store.add_language("French", "fr");

        store.set_text_in("UI/TITLE", "English", "Title").unwrap();
        store.set_text_in("UI/TITLE", "French", "Titre").unwrap();
        assert_eq!(store.text("UI/TITLE", 1).as_deref(), Some("Titre"));

        store.remove_language("English").unwrap();
        assert_eq!(store.text("UI/TITLE", 0).as_deref(), Some("Titre"));
        assert_eq!(store.text_in("UI/TITLE", "English"), None);
    }

    #[test]
    fn test_set_text_errors() {
        let mut store = MemoryStore::new();
        store.add_language("English", "en");
        store.insert_term("UI/A");

        assert!(matches!(
            store.set_text("UI/B", 0, "x"),
            Err(Error::InvalidKey { .. })
        ));
        assert!(matches!(
            store.set_text("UI/A", 3, "x"),
            Err(Error::LanguageIndexOutOfRange { index: 3, count: 1 })
        ));
    }

    #[test]
    fn test_json_rows_are_padded() {
        let json = r#"{
            "languages": [{"name": "English", "code": "en"}, {"name": "German", "code": "de"}],
            "currentLanguage": "German",
            "terms": {"UI/A": ["a"]}
        }"#;
        let store = MemoryStore::from_json_str(json).unwrap();
        assert_eq!(store.text_in("UI/A", "German"), Some(""));
        assert_eq!(store.current_language().as_deref(), Some("German"));
        assert_eq!(store.term_keys(), vec!["UI/A"]);
    }

    #[test]
    fn test_save_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("store.json");

        let mut store = MemoryStore::new();
        store.add_language("English", "en");
        store.insert_term("UI/A");
        store.set_text_in("UI/A", "English", "hello").unwrap();
        store.save(&path).unwrap();

        assert_eq!(MemoryStore::read(&path).unwrap(), store);
    }
}
