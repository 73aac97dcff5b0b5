//! Patch registry
//!
//! Collects the patches of every contributor, refuses duplicate names and
//! computes the fold order:
//!
//! 1. contributors in the configured order (unknown contributors last),
//! 2. within a contributor, higher `order` first,
//! 3. remaining ties keep registration order.

use std::collections::HashSet;

use crate::patch::{LanguagePatch, PatchActivation};

/// Every registered patch, owned by the orchestrator
#[derive(Debug, Clone, Default)]
pub struct PatchRegistry {
    patches: Vec<LanguagePatch>,
}

impl PatchRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a patch on behalf of `contributor`.
    ///
    /// Returns `false` without touching the registry when a patch with the same
    /// name is already registered.
    pub fn register(&mut self, contributor: &str, mut patch: LanguagePatch) -> bool {
        if self.contains(patch.name()) {
            tracing::debug!("Ignoring repeated registration of patch {}", patch.name());
            return false;
        }

        patch.set_parent_id(contributor);
        tracing::info!("Registered language patch: {}", patch.name());
        self.patches.push(patch);
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.patches.iter().any(|p| p.name() == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&LanguagePatch> {
        self.patches.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut LanguagePatch> {
        self.patches.iter_mut().find(|p| p.name() == name)
    }

    /// Patches in current registry order
    pub fn iter(&self) -> impl Iterator<Item = &LanguagePatch> {
        self.patches.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// Patches that have been folded at least once
    pub fn applied(&self) -> impl Iterator<Item = &LanguagePatch> {
        self.patches.iter().filter(|p| p.is_applied())
    }

    /// Patches that have never been folded
    pub fn inactive(&self) -> impl Iterator<Item = &LanguagePatch> {
        self.patches.iter().filter(|p| !p.is_applied())
    }

    /// Distinct contributors in first-registration order
    #[must_use]
    pub fn contributors(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.patches
            .iter()
            .filter_map(LanguagePatch::parent_id)
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect()
    }

    /// Sort patches into fold order for the given contributor order.
    ///
    /// The sort is stable: equal keys keep their registration order.
    pub fn sort_by_contributor_order(&mut self, contributor_order: &[String]) {
        self.patches.sort_by_key(|patch| {
            let rank = patch
                .parent_id()
                .and_then(|id| contributor_order.iter().position(|c| c == id))
                .unwrap_or(usize::MAX);
            (rank, std::cmp::Reverse(patch.order()))
        });
    }

    /// Names of the startup patches in current order
    #[must_use]
    pub fn startup_patch_names(&self) -> Vec<String> {
        self.patches
            .iter()
            .filter(|p| *p.activation() == PatchActivation::OnInit)
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Term keys touched by the named patches, deduplicated, in first-seen order.
    ///
    /// Unknown patch names are ignored.
    #[must_use]
    pub fn term_keys_of<S: AsRef<str>>(&self, patch_names: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for name in patch_names {
            let Some(patch) = self.get(name.as_ref()) else {
                continue;
            };
            for key in patch.term_keys() {
                if seen.insert(key) {
                    keys.push(key.to_string());
                }
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{PatchTerm, TermOperation};
    use pretty_assertions::assert_eq;

    fn patch(name: &str, order: i32) -> LanguagePatch {
        LanguagePatch::new(name, "English", "en", PatchActivation::OnInit, order).unwrap()
    }

    fn names(registry: &PatchRegistry) -> Vec<&str> {
        registry.iter().map(LanguagePatch::name).collect()
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let mut registry = PatchRegistry::new();
        assert!(registry.register("ModA", patch("p", 0)));
        assert!(!registry.register("ModB", patch("p", 5)));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("p").unwrap().parent_id(), Some("ModA"));
        assert_eq!(registry.get("p").unwrap().order(), 0);
    }

    #[test]
    fn test_fold_order() {
        let mut registry = PatchRegistry::new();
        registry.register("B", patch("b0", 0));
        registry.register("A", patch("a5", 5));
        registry.register("A", patch("a10", 10));

        registry.sort_by_contributor_order(&["A".to_string(), "B".to_string()]);
        assert_eq!(names(&registry), vec!["a10", "a5", "b0"]);
    }

    #[test]
    fn test_unordered_contributors_go_last_in_registration_order() {
        let mut registry = PatchRegistry::new();
        registry.register("Z", patch("z", 100));
        registry.register("Y", patch("y1", 0));
        registry.register("A", patch("a", 0));
        registry.register("Y", patch("y2", 0));

        registry.sort_by_contributor_order(&["A".to_string()]);
        assert_eq!(names(&registry), vec!["a", "z", "y1", "y2"]);
    }

    #[test]
    fn test_contributors_first_seen() {
        let mut registry = PatchRegistry::new();
        registry.register("B", patch("1", 0));
        registry.register("A", patch("2", 0));
        registry.register("B", patch("3", 0));
        assert_eq!(registry.contributors(), vec!["B", "A"]);
    }

    #[test]
    fn test_term_keys_of_dedupes_across_patches() {
        let term = |k: &str| PatchTerm::new(k, "x", TermOperation::Replace).unwrap();
        let mut registry = PatchRegistry::new();
        registry.register(
            "A",
            LanguagePatch::with_terms(
                "one",
                "English",
                "en",
                vec![term("K1"), term("K2"), term("K1")],
                PatchActivation::OnInit,
                0,
            )
            .unwrap(),
        );
        registry.register(
            "A",
            LanguagePatch::with_terms(
                "two",
                "English",
                "en",
                vec![term("K3"), term("K2")],
                PatchActivation::OnInit,
                0,
            )
            .unwrap(),
        );

        assert_eq!(
            registry.term_keys_of(&["one", "two", "missing"]),
            vec!["K1", "K2", "K3"]
        );
    }

    #[test]
    fn test_activation_filters() {
        let mut registry = PatchRegistry::new();
        registry.register("A", patch("init", 0));
        registry.register(
            "A",
            LanguagePatch::new(
                "flagged",
                "English",
                "en",
                PatchActivation::OnFlag("F".to_string()),
                0,
            )
            .unwrap(),
        );
        registry.register(
            "A",
            LanguagePatch::new("manual", "English", "en", PatchActivation::Manual, 0).unwrap(),
        );

        assert_eq!(registry.startup_patch_names(), vec!["init"]);
        assert_eq!(registry.inactive().count(), 3);
    }
}
