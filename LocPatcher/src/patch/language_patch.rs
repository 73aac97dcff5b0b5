//! Language patches: ordered bundles of terms for one language

use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

use super::document::PatchDocument;
use super::term::PatchTerm;
use super::text::{LoadReport, parse_text};

/// When a patch gets folded into its language
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PatchActivation {
    /// Folded during the startup compile pass
    #[default]
    OnInit,
    /// Folded the first time the named flag becomes true
    OnFlag(String),
    /// Folded only on an explicit request
    Manual,
}

impl PatchActivation {
    /// Flag name of an [`PatchActivation::OnFlag`] activation
    #[must_use]
    pub fn flag(&self) -> Option<&str> {
        match self {
            Self::OnFlag(flag) => Some(flag),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnInit => "OnInit",
            Self::OnFlag(_) => "OnFlag",
            Self::Manual => "Manual",
        }
    }
}

impl fmt::Display for PatchActivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnFlag(flag) => write!(f, "OnFlag({flag})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Normalize a patch name: trimmed, spaces replaced with underscores
#[must_use]
pub fn normalize_patch_name(name: &str) -> String {
    name.trim().replace(' ', "_")
}

/// A named, ordered collection of term edits for one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePatch {
    name: String,
    language_name: String,
    language_code: String,
    parent_id: Option<String>,
    order: i32,
    activation: PatchActivation,
    terms: Vec<PatchTerm>,
    applied: bool,
}

impl LanguagePatch {
    /// Create an empty patch.
    ///
    /// # Errors
    /// Returns [`Error::MissingFlag`] for an `OnFlag` activation with an empty flag name.
    pub fn new(
        name: &str,
        language_name: impl Into<String>,
        language_code: impl Into<String>,
        activation: PatchActivation,
        order: i32,
    ) -> Result<Self> {
        let name = normalize_patch_name(name);

        if let PatchActivation::OnFlag(flag) = &activation
            && flag.trim().is_empty()
        {
            tracing::error!(
                "Missing flag for patch {} that must be triggered by a specific flag!",
                name
            );
            return Err(Error::MissingFlag { patch: name });
        }

        Ok(Self {
            name,
            language_name: language_name.into(),
            language_code: language_code.into(),
            parent_id: None,
            order,
            activation,
            terms: Vec::new(),
            applied: false,
        })
    }

    /// Create a patch holding the given terms
    pub fn with_terms(
        name: &str,
        language_name: impl Into<String>,
        language_code: impl Into<String>,
        terms: Vec<PatchTerm>,
        activation: PatchActivation,
        order: i32,
    ) -> Result<Self> {
        let mut patch = Self::new(name, language_name, language_code, activation, order)?;
        patch.terms = terms;
        Ok(patch)
    }

    /// Create a patch from the line-oriented text form
    pub fn from_text(
        name: &str,
        language_name: impl Into<String>,
        language_code: impl Into<String>,
        raw: &str,
        activation: PatchActivation,
        order: i32,
    ) -> Result<(Self, LoadReport)> {
        let mut patch = Self::new(name, language_name, language_code, activation, order)?;
        let report = patch.load_text(raw);
        Ok((patch, report))
    }

    /// Parse a patch from its structured JSON form
    pub fn from_json_str(json: &str) -> Result<Self> {
        let document: PatchDocument = serde_json::from_str(json)?;
        Self::try_from(document)
    }

    /// Read a patch from a structured JSON file
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize the patch to its structured JSON form (pretty-printed)
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&PatchDocument::from(self))?)
    }

    /// Append terms parsed from the text form; problems are collected in the report
    pub fn load_text(&mut self, raw: &str) -> LoadReport {
        let (terms, report) = parse_text(raw);
        self.terms.extend(terms);

        tracing::info!(
            "Successfully loaded {} of {} terms of {} for patch `{}`",
            report.loaded,
            report.total_lines,
            self.language_name,
            self.name
        );
        if report.skipped() > 0 {
            tracing::warn!(
                "Skipped {} near-empty terms, {} terms with empty values and {} malformed lines",
                report.near_empty,
                report.empty_values,
                report.errors.len()
            );
        } else {
            tracing::debug!("Loading process encountered no error");
        }

        report
    }

    /// Unique patch name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn language_name(&self) -> &str {
        &self.language_name
    }

    #[must_use]
    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Contributor that registered the patch, set by the registry
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub(crate) fn set_parent_id(&mut self, parent_id: impl Into<String>) {
        self.parent_id = Some(parent_id.into());
    }

    /// Tiebreak among patches of the same contributor; higher folds first
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    #[must_use]
    pub fn activation(&self) -> &PatchActivation {
        &self.activation
    }

    #[must_use]
    pub fn terms(&self) -> &[PatchTerm] {
        &self.terms
    }

    /// Whether the patch has been folded at least once
    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.applied
    }

    pub(crate) fn mark_applied(&mut self) {
        self.applied = true;
    }

    /// Term keys touched by this patch, in first-seen order without duplicates
    pub fn term_keys(&self) -> impl Iterator<Item = &str> {
        let mut seen = std::collections::HashSet::new();
        self.terms
            .iter()
            .map(PatchTerm::key)
            .filter(move |key| seen.insert(*key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::TermOperation;

    #[test]
    fn test_name_normalization() {
        let patch = LanguagePatch::new(
            "  My Cool Patch ",
            "English",
            "en",
            PatchActivation::OnInit,
            0,
        )
        .unwrap();
        assert_eq!(patch.name(), "My_Cool_Patch");
        assert!(patch.parent_id().is_none());
        assert!(!patch.is_applied());
    }

    #[test]
    fn test_on_flag_requires_flag_name() {
        let err = LanguagePatch::new(
            "flagged",
            "English",
            "en",
            PatchActivation::OnFlag("  ".to_string()),
            0,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MissingFlag { patch } if patch == "flagged"));

        let ok = LanguagePatch::new(
            "flagged",
            "English",
            "en",
            PatchActivation::OnFlag("D01Z01S01_BOSS_DEAD".to_string()),
            0,
        )
        .unwrap();
        assert_eq!(ok.activation().flag(), Some("D01Z01S01_BOSS_DEAD"));
    }

    #[test]
    fn test_from_text() {
        let raw = "UI/TITLE -> Replace : Hello@World\nUI/TITLE -> AppendAtEnd : !\nbad line here";
        let (patch, report) =
            LanguagePatch::from_text("p", "English", "en", raw, PatchActivation::Manual, 3)
                .unwrap();

        assert_eq!(patch.terms().len(), 2);
        assert_eq!(patch.terms()[1].operation(), TermOperation::Suffix);
        assert_eq!(patch.order(), 3);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(patch.term_keys().collect::<Vec<_>>(), vec!["UI/TITLE"]);
    }

    #[test]
    fn test_json_round_trip_keeps_metadata() {
        let (patch, _) = LanguagePatch::from_text(
            "Boss Names",
            "Español",
            "es",
            "BOSS/01 -> ReplaceAll : Ten Piedad",
            PatchActivation::OnFlag("BOSS_01_MET".to_string()),
            -2,
        )
        .unwrap();

        let json = patch.to_json_string().unwrap();
        let parsed = LanguagePatch::from_json_str(&json).unwrap();
        assert_eq!(parsed, patch);
    }
}
