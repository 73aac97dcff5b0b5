//! Patch terms and the term operation alias table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Operation a patch term performs on the compiled text of its key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermOperation {
    /// Replace the content. Prefixes and suffixes from earlier patches are kept.
    Replace,
    /// Replace the content and clear every accumulated prefix and suffix.
    ReplaceAll,
    /// Prepend to the accumulated prefix.
    Prefix,
    /// Append to the accumulated suffix.
    Suffix,
}

/// Every operation with the aliases accepted at the parse boundary
const OPERATION_ALIASES: &[(TermOperation, &[&str])] = &[
    (TermOperation::Replace, &["Replace"]),
    (TermOperation::ReplaceAll, &["ReplaceAll"]),
    (TermOperation::Prefix, &["Prefix", "AppendAtBeginning"]),
    (TermOperation::Suffix, &["Suffix", "AppendAtEnd"]),
];

impl TermOperation {
    /// All operations, in alias table order
    pub const ALL: [TermOperation; 4] = [
        TermOperation::Replace,
        TermOperation::ReplaceAll,
        TermOperation::Prefix,
        TermOperation::Suffix,
    ];

    /// Resolve an operation alias.
    ///
    /// Matching is exact unless `ignore_case` is set, in which case both sides
    /// are lower-cased before comparing.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedOperation`] when no alias matches.
    pub fn parse(input: &str, ignore_case: bool) -> Result<Self> {
        let lowered = ignore_case.then(|| input.to_lowercase());

        for (operation, aliases) in OPERATION_ALIASES {
            let hit = match &lowered {
                Some(lowered) => aliases.iter().any(|a| a.to_lowercase() == *lowered),
                None => aliases.iter().any(|a| *a == input),
            };
            if hit {
                return Ok(*operation);
            }
        }

        Err(Error::UnsupportedOperation {
            operation: input.to_string(),
        })
    }

    /// Aliases that resolve to this operation
    #[must_use]
    pub fn aliases(self) -> &'static [&'static str] {
        for (operation, aliases) in OPERATION_ALIASES {
            if *operation == self {
                return aliases;
            }
        }
        &[]
    }

    /// Canonical name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replace => "Replace",
            Self::ReplaceAll => "ReplaceAll",
            Self::Prefix => "Prefix",
            Self::Suffix => "Suffix",
        }
    }

    /// Whether this operation accumulates into a prefix or suffix
    #[must_use]
    pub fn is_affix(self) -> bool {
        matches!(self, Self::Prefix | Self::Suffix)
    }
}

impl FromStr for TermOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, false)
    }
}

impl fmt::Display for TermOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single edit to one localization term.
///
/// The content of a constructed term is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPatchTerm")]
pub struct PatchTerm {
    #[serde(rename = "termKey")]
    key: String,
    #[serde(rename = "termContent")]
    content: String,
    #[serde(rename = "termOperation")]
    operation: TermOperation,
}

impl PatchTerm {
    /// Create a term.
    ///
    /// # Errors
    /// Returns [`Error::EmptyTermContent`] if `content` is empty.
    pub fn new(
        key: impl Into<String>,
        content: impl Into<String>,
        operation: TermOperation,
    ) -> Result<Self> {
        let key = key.into();
        let content = content.into();
        if content.is_empty() {
            return Err(Error::EmptyTermContent { key });
        }
        Ok(Self {
            key,
            content,
            operation,
        })
    }

    /// Key of the term in the store
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Text inserted by the operation
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn operation(&self) -> TermOperation {
        self.operation
    }
}

/// Unvalidated serde form of [`PatchTerm`]
#[derive(Deserialize)]
struct RawPatchTerm {
    #[serde(rename = "termKey")]
    key: String,
    #[serde(rename = "termContent")]
    content: String,
    #[serde(rename = "termOperation")]
    operation: TermOperation,
}

impl TryFrom<RawPatchTerm> for PatchTerm {
    type Error = Error;

    fn try_from(raw: RawPatchTerm) -> Result<Self> {
        PatchTerm::new(raw.key, raw.content, raw.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        for op in TermOperation::ALL {
            assert_eq!(TermOperation::parse(op.as_str(), false).unwrap(), op);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            TermOperation::parse("AppendAtBeginning", false).unwrap(),
            TermOperation::Prefix
        );
        assert_eq!(
            TermOperation::parse("AppendAtEnd", false).unwrap(),
            TermOperation::Suffix
        );
        assert_eq!(TermOperation::Prefix.aliases(), &["Prefix", "AppendAtBeginning"]);
    }

    #[test]
    fn test_parse_is_case_sensitive_by_default() {
        assert!(matches!(
            TermOperation::parse("replaceall", false),
            Err(Error::UnsupportedOperation { operation }) if operation == "replaceall"
        ));
        assert_eq!(
            TermOperation::parse("replaceall", true).unwrap(),
            TermOperation::ReplaceAll
        );
        assert_eq!(
            TermOperation::parse("APPENDATEND", true).unwrap(),
            TermOperation::Suffix
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!(TermOperation::parse("Insert", true).is_err());
        assert!("".parse::<TermOperation>().is_err());
    }

    #[test]
    fn test_term_rejects_empty_content() {
        let err = PatchTerm::new("UI/TITLE", "", TermOperation::Replace).unwrap_err();
        assert!(matches!(err, Error::EmptyTermContent { key } if key == "UI/TITLE"));
    }

    #[test]
    fn test_term_serde_names() {
        let term = PatchTerm::new("UI/TITLE", "Hello", TermOperation::Suffix).unwrap();
        let json = serde_json::to_string(&term).unwrap();
        assert_eq!(
            json,
            r#"{"termKey":"UI/TITLE","termContent":"Hello","termOperation":"Suffix"}"#
        );

        let parsed: PatchTerm = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, term);
    }

    #[test]
    fn test_term_deserialize_rejects_empty_content() {
        let json = r#"{"termKey":"K","termContent":"","termOperation":"Replace"}"#;
        assert!(serde_json::from_str::<PatchTerm>(json).is_err());
    }
}
