//! Moving compiled text into and out of the store

use crate::error::{Error, Result};
use crate::patch::LanguagePatch;
use crate::registry::PatchRegistry;
use crate::store::{LocalizationStore, StoreSession};

use super::CompiledLanguage;

/// Outcome of a write into the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Keys written
    pub written: usize,
    /// Keys the store could not address
    pub skipped: usize,
}

/// Outcome of hydrating a language from the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadReport {
    pub read: usize,
    pub missing: usize,
}

impl CompiledLanguage {
    /// Write the resolved text of `keys` into the store.
    ///
    /// The language is added to the store first when the store does not know it.
    /// Keys the store cannot address are counted and logged, never fatal.
    pub fn write_keys<S, K>(&self, session: &mut StoreSession<S>, keys: &[K]) -> Result<SyncReport>
    where
        S: LocalizationStore,
        K: AsRef<str>,
    {
        let index = session.ensure_language(self.name(), self.code())?;
        let mut report = SyncReport::default();

        for key in keys {
            let key = key.as_ref();
            let text = match self.resolved_text(key) {
                Some(text) if session.store().has_term(key) => text,
                _ => {
                    tracing::error!("Key {} not found in the store", key);
                    report.skipped += 1;
                    continue;
                }
            };
            match session.set_text(key, index, &text) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    tracing::error!("Failed to write key {}: {}", key, e);
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            "Wrote {} of {} terms to {}",
            report.written,
            keys.len(),
            self.name()
        );
        if report.skipped > 0 {
            tracing::warn!("{} keys were not found in the store", report.skipped);
        }
        Ok(report)
    }

    /// Write this language into the store.
    ///
    /// A vanilla language without `force_all` only gets the keys touched by its
    /// applied patches; everything else gets every key of the universe.
    pub fn write_all<S: LocalizationStore>(
        &self,
        session: &mut StoreSession<S>,
        registry: &PatchRegistry,
        is_vanilla: bool,
        force_all: bool,
    ) -> Result<SyncReport> {
        let keys: Vec<String> = if is_vanilla && !force_all {
            tracing::debug!(
                "Writing only patched terms of vanilla language {}",
                self.name()
            );
            registry.term_keys_of(self.patches_applied())
        } else {
            self.universe().keys().map(str::to_string).collect()
        };
        self.write_keys(session, &keys)
    }

    /// Write only the keys of one applied patch
    pub fn write_patch<S: LocalizationStore>(
        &self,
        session: &mut StoreSession<S>,
        patch: &LanguagePatch,
    ) -> Result<SyncReport> {
        if !patch.is_applied() {
            tracing::warn!(
                "Patch {} must be applied before it can be written to the store",
                patch.name()
            );
            return Ok(SyncReport::default());
        }
        let keys: Vec<&str> = patch.term_keys().collect();
        self.write_keys(session, &keys)
    }

    /// Replace every content slot with the store's current text.
    ///
    /// Prefixes and suffixes are left alone; the store has no notion of them.
    pub fn read_all<S: LocalizationStore>(
        &mut self,
        session: &mut StoreSession<S>,
    ) -> Result<ReadReport> {
        let index = session
            .language_index(self.name())
            .ok_or_else(|| Error::LanguageNotFound {
                language: self.name().to_string(),
            })?;

        let mut report = ReadReport::default();
        for slot in 0..self.universe().len() {
            let text = self
                .universe()
                .key_at(slot)
                .and_then(|key| session.text(key, index));
            match text {
                Some(text) => {
                    self.set_content_at(slot, text);
                    report.read += 1;
                }
                None => report.missing += 1,
            }
        }

        tracing::info!("Read {} terms of {} from the store", report.read, self.name());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::compiled::TermUniverse;
    use crate::patch::{PatchActivation, TermOperation};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn session() -> StoreSession<MemoryStore> {
        let mut store = MemoryStore::new();
        store.add_language("English", "en");
        for key in ["A", "B", "C"] {
            store.insert_term(key);
            store.set_text_in(key, "English", &format!("vanilla {key}")).unwrap();
        }
        StoreSession::new(store)
    }

    fn universe(session: &StoreSession<MemoryStore>) -> Arc<TermUniverse> {
        Arc::new(TermUniverse::from_keys(session.term_keys()))
    }

    #[test]
    fn test_read_all_hydrates_contents() {
        let mut session = session();
        let mut english = CompiledLanguage::new("English", "en", universe(&session));

        let report = english.read_all(&mut session).unwrap();
        assert_eq!(report, ReadReport { read: 3, missing: 0 });
        assert_eq!(english.content("B"), Some("vanilla B"));
        assert_eq!(english.prefix("B"), Some(""));
    }

    #[test]
    fn test_read_all_unknown_language() {
        let mut session = session();
        let mut german = CompiledLanguage::new("German", "de", universe(&session));
        assert!(matches!(
            german.read_all(&mut session),
            Err(Error::LanguageNotFound { .. })
        ));
    }

    #[test]
    fn test_vanilla_write_only_touches_patched_keys() {
        let mut session = session();
        let mut english = CompiledLanguage::new("English", "en", universe(&session));
        english.read_all(&mut session).unwrap();

        let (patch, _) = LanguagePatch::from_text(
            "p",
            "English",
            "en",
            "B -> Suffix : !",
            PatchActivation::OnInit,
            0,
        )
        .unwrap();
        let mut registry = PatchRegistry::new();
        registry.register("Mod", patch);
        english.fold(registry.get_mut("p").unwrap());

        // Overwrite the store behind the language's back to see what gets written.
        session.set_text("A", 0, "changed").unwrap();

        let report = english.write_all(&mut session, &registry, true, false).unwrap();
        assert_eq!(report, SyncReport { written: 1, skipped: 0 });
        assert_eq!(session.store().text_in("A", "English"), Some("changed"));
        assert_eq!(session.store().text_in("B", "English"), Some("vanilla B!"));

        let report = english.write_all(&mut session, &registry, true, true).unwrap();
        assert_eq!(report.written, 3);
        assert_eq!(session.store().text_in("A", "English"), Some("vanilla A"));
    }

    #[test]
    fn test_write_adds_missing_language() {
        let mut session = session();
        let mut german = CompiledLanguage::new("German", "de", universe(&session));
        german.apply("A", "Hallo", TermOperation::Replace).unwrap();

        let report = german
            .write_all(&mut session, &PatchRegistry::new(), false, false)
            .unwrap();
        assert_eq!(report.written, 3);
        assert!(session.has_language("German"));
        assert_eq!(session.store().text_in("A", "German"), Some("Hallo"));
    }

    #[test]
    fn test_write_keys_counts_missing_keys() {
        let mut session = session();
        let english = CompiledLanguage::new("English", "en", universe(&session));

        let report = english.write_keys(&mut session, &["A", "Z"]).unwrap();
        assert_eq!(report, SyncReport { written: 1, skipped: 1 });
    }

    #[test]
    fn test_write_patch_requires_applied_patch() {
        let mut session = session();
        let english = CompiledLanguage::new("English", "en", universe(&session));
        let (patch, _) = LanguagePatch::from_text(
            "p",
            "English",
            "en",
            "A -> Replace : x",
            PatchActivation::Manual,
            0,
        )
        .unwrap();

        let report = english.write_patch(&mut session, &patch).unwrap();
        assert_eq!(report, SyncReport::default());
        assert_eq!(session.store().text_in("A", "English"), Some("vanilla A"));
    }
}
