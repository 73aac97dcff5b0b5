//! Resolved per-language term state and the composition rules

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::patch::{LanguagePatch, PatchTerm, TermOperation};

use super::universe::TermUniverse;

/// Outcome of folding one patch into a language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FoldReport {
    /// Terms applied
    pub applied: usize,
    /// Terms rejected (unknown key)
    pub failed: usize,
    /// Prefix/suffix terms skipped because the patch was already applied
    pub skipped: usize,
    /// Whether the patch had been folded before
    pub reapplied: bool,
}

impl FoldReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied + self.failed + self.skipped
    }
}

/// The compiled string table of one language.
///
/// Every key of the [`TermUniverse`] has a prefix, a content and a suffix slot;
/// the display text of a key is always `prefix + content + suffix`.
#[derive(Debug, Clone)]
pub struct CompiledLanguage {
    name: String,
    code: String,
    universe: Arc<TermUniverse>,
    prefixes: Vec<String>,
    contents: Vec<String>,
    suffixes: Vec<String>,
    patches_applied: Vec<String>,
}

impl CompiledLanguage {
    pub fn new(name: impl Into<String>, code: impl Into<String>, universe: Arc<TermUniverse>) -> Self {
        let count = universe.len();
        Self {
            name: name.into(),
            code: code.into(),
            universe,
            prefixes: vec![String::new(); count],
            contents: vec![String::new(); count],
            suffixes: vec![String::new(); count],
            patches_applied: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn universe(&self) -> &TermUniverse {
        &self.universe
    }

    /// Names of the folded patches, in the order they were first folded
    #[must_use]
    pub fn patches_applied(&self) -> &[String] {
        &self.patches_applied
    }

    fn slot(&self, key: &str) -> Result<usize> {
        self.universe.index_of(key).ok_or_else(|| Error::InvalidKey {
            key: key.to_string(),
        })
    }

    /// Apply one edit to `key`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidKey`] when `key` is outside the universe; the
    /// language is left untouched.
    pub fn apply(&mut self, key: &str, text: &str, operation: TermOperation) -> Result<()> {
        let slot = match self.slot(key) {
            Ok(slot) => slot,
            Err(e) => {
                tracing::error!("Term key `{}` is invalid for {}", key, self.name);
                return Err(e);
            }
        };

        match operation {
            TermOperation::Replace => {
                text.clone_into(&mut self.contents[slot]);
            }
            TermOperation::ReplaceAll => {
                text.clone_into(&mut self.contents[slot]);
                self.prefixes[slot].clear();
                self.suffixes[slot].clear();
            }
            TermOperation::Prefix => {
                self.prefixes[slot].insert_str(0, text);
            }
            TermOperation::Suffix => {
                self.suffixes[slot].push_str(text);
            }
        }
        Ok(())
    }

    pub fn apply_term(&mut self, term: &PatchTerm) -> Result<()> {
        self.apply(term.key(), term.content(), term.operation())
    }

    /// Fold every term of `patch` into this language and mark it applied.
    ///
    /// Failed terms are counted and skipped. Re-folding an applied patch re-runs
    /// its `Replace`/`ReplaceAll` terms but skips its `Prefix`/`Suffix` terms so
    /// they do not accumulate twice. An affix term that follows a `ReplaceAll`
    /// of the same patch on the same key still runs, since that key's affixes
    /// were just cleared.
    pub fn fold(&mut self, patch: &mut LanguagePatch) -> FoldReport {
        let mut report = FoldReport {
            reapplied: patch.is_applied(),
            ..FoldReport::default()
        };
        if report.reapplied {
            tracing::warn!("Attempting to reapply patch {}!", patch.name());
        }

        if !self.patches_applied.iter().any(|p| p == patch.name()) {
            self.patches_applied.push(patch.name().to_string());
        }

        // Slots cleared by a ReplaceAll of this patch during this pass
        let mut cleared = HashSet::new();
        for term in patch.terms() {
            let slot = self.universe.index_of(term.key());
            if report.reapplied
                && term.operation().is_affix()
                && !slot.is_some_and(|slot| cleared.contains(&slot))
            {
                report.skipped += 1;
                continue;
            }
            match self.apply_term(term) {
                Ok(()) => {
                    report.applied += 1;
                    if term.operation() == TermOperation::ReplaceAll
                        && let Some(slot) = slot
                    {
                        cleared.insert(slot);
                    }
                }
                Err(_) => report.failed += 1,
            }
        }

        tracing::info!(
            "Patched {} of {} terms for {} from patch `{}`",
            report.applied,
            patch.terms().len(),
            self.name,
            patch.name()
        );
        if report.failed > 0 {
            tracing::warn!("Skipped {} terms with invalid keys", report.failed);
        }
        if report.skipped > 0 {
            tracing::warn!(
                "Skipped {} prefix/suffix terms of already applied patch `{}`",
                report.skipped,
                patch.name()
            );
        }

        patch.mark_applied();
        report
    }

    /// Resolved display text of `key`
    #[must_use]
    pub fn resolved_text(&self, key: &str) -> Option<String> {
        let slot = self.universe.index_of(key)?;
        Some(self.resolved_at(slot))
    }

    pub(crate) fn resolved_at(&self, slot: usize) -> String {
        let mut text = String::with_capacity(
            self.prefixes[slot].len() + self.contents[slot].len() + self.suffixes[slot].len(),
        );
        text.push_str(&self.prefixes[slot]);
        text.push_str(&self.contents[slot]);
        text.push_str(&self.suffixes[slot]);
        text
    }

    #[must_use]
    pub fn prefix(&self, key: &str) -> Option<&str> {
        self.universe.index_of(key).map(|i| self.prefixes[i].as_str())
    }

    #[must_use]
    pub fn content(&self, key: &str) -> Option<&str> {
        self.universe.index_of(key).map(|i| self.contents[i].as_str())
    }

    #[must_use]
    pub fn suffix(&self, key: &str) -> Option<&str> {
        self.universe.index_of(key).map(|i| self.suffixes[i].as_str())
    }

    pub(crate) fn set_content_at(&mut self, slot: usize, text: String) {
        self.contents[slot] = text;
    }
}
