//! The fixed set of term keys

use indexmap::IndexSet;

/// Every term key the engine can address, fixed when the patcher starts.
///
/// Keys keep their first-seen order; a key's position is its slot in each
/// [`super::CompiledLanguage`]'s term arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermUniverse {
    keys: IndexSet<String>,
}

impl TermUniverse {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.keys.get_index_of(key)
    }

    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.keys.get_index(index).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
