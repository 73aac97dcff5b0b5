//! Store wrapper with a language index cache

use std::collections::HashMap;

use crate::error::{Error, Result};

use super::{LocalizationStore, StoreLanguage};

/// Owns a [`LocalizationStore`] and caches language name → slot index.
///
/// Language topology can only change through [`StoreSession::add_language`]
/// and [`StoreSession::remove_language`], and both clear the cache, so a
/// resolved index is never stale.
#[derive(Debug)]
pub struct StoreSession<S> {
    store: S,
    index_cache: HashMap<String, usize>,
}

impl<S: LocalizationStore> StoreSession<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            index_cache: HashMap::new(),
        }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    #[must_use]
    pub fn languages(&self) -> Vec<StoreLanguage> {
        self.store.languages()
    }

    #[must_use]
    pub fn language_names(&self) -> Vec<String> {
        self.store.languages().into_iter().map(|l| l.name).collect()
    }

    #[must_use]
    pub fn has_language(&self, name: &str) -> bool {
        self.store.languages().iter().any(|l| l.name == name)
    }

    /// Slot index of `name`, if the store knows it
    pub fn language_index(&mut self, name: &str) -> Option<usize> {
        if let Some(&index) = self.index_cache.get(name) {
            return Some(index);
        }

        let index = self.store.languages().iter().position(|l| l.name == name)?;
        self.index_cache.insert(name.to_string(), index);
        Some(index)
    }

    /// Slot index of `name`, adding the language to the store first if needed
    pub fn ensure_language(&mut self, name: &str, code: &str) -> Result<usize> {
        if let Some(index) = self.language_index(name) {
            return Ok(index);
        }

        tracing::info!("Adding language {} ({}) to the store", name, code);
        self.add_language(name, code);
        self.language_index(name)
            .ok_or_else(|| Error::LanguageNotFound {
                language: name.to_string(),
            })
    }

    pub fn add_language(&mut self, name: &str, code: &str) {
        self.store.add_language(name, code);
        self.index_cache.clear();
    }

    pub fn remove_language(&mut self, name: &str) -> Result<()> {
        let result = self.store.remove_language(name);
        self.index_cache.clear();
        result
    }

    #[must_use]
    pub fn term_keys(&self) -> Vec<String> {
        self.store.term_keys()
    }

    #[must_use]
    pub fn text(&self, key: &str, language_index: usize) -> Option<String> {
        self.store.text(key, language_index)
    }

    pub fn set_text(&mut self, key: &str, language_index: usize, value: &str) -> Result<()> {
        self.store.set_text(key, language_index, value)
    }

    #[must_use]
    pub fn current_language(&self) -> Option<String> {
        self.store.current_language()
    }

    pub fn set_current_language(&mut self, name: &str) {
        self.store.set_current_language(name);
    }
}
