//! Structured (JSON) patch form
//!
//! ```json
//! {
//!   "patchName": "Boss_Names",
//!   "languageName": "English",
//!   "languageCode": "en",
//!   "patchTerms": [
//!     { "termKey": "BOSS/01", "termContent": "Ten Piedad", "termOperation": "ReplaceAll" }
//!   ],
//!   "patchType": "OnFlag",
//!   "patchFlag": "BOSS_01_MET",
//!   "patchOrder": 0
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Error;

use super::language_patch::{LanguagePatch, PatchActivation};
use super::term::PatchTerm;

/// Activation names as written in structured patches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PatchType {
    #[default]
    #[serde(alias = "OnInit")]
    OnInitialize,
    OnFlag,
    #[serde(alias = "Manual")]
    Manually,
}

/// Serde mirror of a [`LanguagePatch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDocument {
    pub patch_name: String,
    pub language_name: String,
    pub language_code: String,
    #[serde(default)]
    pub patch_terms: Vec<PatchTerm>,
    #[serde(default)]
    pub patch_type: PatchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_flag: Option<String>,
    #[serde(default)]
    pub patch_order: i32,
}

impl TryFrom<PatchDocument> for LanguagePatch {
    type Error = Error;

    fn try_from(doc: PatchDocument) -> Result<Self, Error> {
        let activation = match doc.patch_type {
            PatchType::OnInitialize => PatchActivation::OnInit,
            PatchType::OnFlag => PatchActivation::OnFlag(doc.patch_flag.unwrap_or_default()),
            PatchType::Manually => PatchActivation::Manual,
        };

        LanguagePatch::with_terms(
            &doc.patch_name,
            doc.language_name,
            doc.language_code,
            doc.patch_terms,
            activation,
            doc.patch_order,
        )
    }
}

impl From<&LanguagePatch> for PatchDocument {
    fn from(patch: &LanguagePatch) -> Self {
        let (patch_type, patch_flag) = match patch.activation() {
            PatchActivation::OnInit => (PatchType::OnInitialize, None),
            PatchActivation::OnFlag(flag) => (PatchType::OnFlag, Some(flag.clone())),
            PatchActivation::Manual => (PatchType::Manually, None),
        };

        Self {
            patch_name: patch.name().to_string(),
            language_name: patch.language_name().to_string(),
            language_code: patch.language_code().to_string(),
            patch_terms: patch.terms().to_vec(),
            patch_type,
            patch_flag,
            patch_order: patch.order(),
        }
    }
}
