//! The external string-lookup store
//!
//! The engine never owns the live localization tables. It talks to them
//! through [`LocalizationStore`], usually wrapped in a [`StoreSession`] that
//! caches where each language lives.

mod memory;
mod session;

pub use memory::MemoryStore;
pub use session::StoreSession;

use crate::error::Result;

/// A language as listed by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StoreLanguage {
    pub name: String,
    pub code: String,
}

impl StoreLanguage {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Live localization store the compiled languages are written into.
///
/// Each term holds one text per language; languages are addressed by their
/// position in [`LocalizationStore::languages`].
pub trait LocalizationStore {
    /// Languages in store order
    fn languages(&self) -> Vec<StoreLanguage>;

    /// Append a language. Every term gets an empty slot for it.
    fn add_language(&mut self, name: &str, code: &str);

    /// Remove a language and its text slots.
    ///
    /// # Errors
    /// Returns [`crate::Error::LanguageNotFound`] if no language has this name.
    fn remove_language(&mut self, name: &str) -> Result<()>;

    /// Every addressable term key
    fn term_keys(&self) -> Vec<String>;

    /// Whether `key` is addressable, without listing every key
    fn has_term(&self, key: &str) -> bool;

    /// Text of `key` in the language at `language_index`
    fn text(&self, key: &str, language_index: usize) -> Option<String>;

    /// Overwrite the text of `key` in the language at `language_index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidKey`] for an unknown key and
    /// [`crate::Error::LanguageIndexOutOfRange`] for a bad index.
    fn set_text(&mut self, key: &str, language_index: usize, value: &str) -> Result<()>;

    /// Name of the selected language
    fn current_language(&self) -> Option<String>;

    fn set_current_language(&mut self, name: &str);
}
