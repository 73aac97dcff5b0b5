//! Patcher configuration
//!
//! User-editable ordering and exclusion lists, persisted as JSON:
//!
//! ```json
//! {
//!   "languageOrder": ["English", "Spanish"],
//!   "disabledLanguages": [],
//!   "patchingModOrder": ["Blasphemous.Andalusian"],
//!   "disabledPatches": [],
//!   "languageOnStartup": "English"
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Persisted patcher configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Display order of the languages in the store
    #[serde(default)]
    pub language_order: Vec<String>,
    /// Languages removed from the store before patching
    #[serde(default)]
    pub disabled_languages: Vec<String>,
    /// Contributor order for folding patches
    #[serde(default)]
    pub patching_mod_order: Vec<String>,
    /// Patches never folded at startup
    #[serde(default)]
    pub disabled_patches: Vec<String>,
    /// Language selected once patching completes
    #[serde(default)]
    pub language_on_startup: String,
}

impl Config {
    /// `<config_dir>/LocPatcher/config.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("LocPatcher").join("config.json"))
    }

    /// Load config from `path`, or defaults when the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save config to `path` as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    #[must_use]
    pub fn is_patch_disabled(&self, name: &str) -> bool {
        self.disabled_patches.iter().any(|p| p == name)
    }

    #[must_use]
    pub fn is_language_disabled(&self, name: &str) -> bool {
        self.disabled_languages.iter().any(|l| l == name)
    }
}

/// Bring a persisted order list in line with the current elements.
///
/// Entries that are no longer elements (or repeat) are dropped, elements
/// missing from the order are appended in their own order. Returns whether
/// `order` changed.
pub fn resolve_sorting_order<S: AsRef<str>>(order: &mut Vec<String>, elements: &[S]) -> bool {
    let present: HashSet<&str> = elements.iter().map(AsRef::as_ref).collect();
    let original = order.clone();

    let mut seen = HashSet::new();
    order.retain(|entry| {
        let keep = present.contains(entry.as_str()) && seen.insert(entry.clone());
        if !keep {
            tracing::debug!("Dropping stale order entry {}", entry);
        }
        keep
    });

    for element in elements {
        let element = element.as_ref();
        if seen.insert(element.to_string()) {
            tracing::debug!("Appending {} to the end of the order", element);
            order.push(element.to_string());
        }
    }

    *order != original
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_prunes_and_appends() {
        let mut order = vec!["Y".to_string(), "W".to_string()];
        let changed = resolve_sorting_order(&mut order, &["X", "Y", "Z"]);

        assert!(changed);
        assert_eq!(order, vec!["Y", "X", "Z"]);
    }

    #[test]
    fn test_resolve_unchanged() {
        let mut order = vec!["B".to_string(), "A".to_string()];
        assert!(!resolve_sorting_order(&mut order, &["A", "B"]));
        assert_eq!(order, vec!["B", "A"]);
    }

    #[test]
    fn test_resolve_drops_repeats() {
        let mut order = vec!["A".to_string(), "A".to_string()];
        assert!(resolve_sorting_order(&mut order, &["A"]));
        assert_eq!(order, vec!["A"]);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            language_order: vec!["English".into(), "Andalusian".into()],
            disabled_patches: vec!["broken".into()],
            language_on_startup: "Andalusian".into(),
            ..Config::default()
        };
        config.save(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"languageOnStartup\": \"Andalusian\""));
        assert_eq!(Config::load(&path).unwrap(), config);
        assert!(config.is_patch_disabled("broken"));
    }

    #[test]
    fn test_partial_file_defaults_missing_fields() {
        let config: Config =
            serde_json::from_str(r#"{"disabledLanguages": ["Russian"]}"#).unwrap();
        assert!(config.is_language_disabled("Russian"));
        assert!(config.language_order.is_empty());
    }
}
