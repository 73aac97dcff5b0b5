//! The compile pipeline
//!
//! [`Patcher`] owns the store session, the patch registry and one
//! [`CompiledLanguage`] per language. [`Patcher::run`] performs the startup
//! pass:
//!
//! 1. remember the store's selected language,
//! 2. remove disabled languages from the store,
//! 3. snapshot every remaining store language,
//! 4. resolve and persist the contributor order, then sort the registry,
//! 5. fold every enabled startup patch,
//! 6. resolve and persist the language order, rebuilding the store's language
//!    list when it does not match,
//! 7. write every compiled language into the store,
//! 8. resolve the startup language.
//!
//! Flag and manual patches are folded later through
//! [`Patcher::process_flag_events`] and [`Patcher::apply_manual`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::compiled::{CompiledLanguage, FoldReport, SyncReport, TermUniverse};
use crate::config::{Config, resolve_sorting_order};
use crate::error::{Error, Result};
use crate::flags::{FlagChannel, FlagListeners, FlagNotifier, FlagSource};
use crate::patch::{DiscoveredPatch, LanguagePatch};
use crate::registry::PatchRegistry;
use crate::store::{LocalizationStore, StoreSession};

/// Startup language when neither the config nor the store selection is usable
pub const DEFAULT_STARTUP_LANGUAGE: &str = "English";

/// Counts gathered by [`Patcher::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub languages_removed: usize,
    pub patches_folded: usize,
    pub patches_skipped: usize,
    pub terms_applied: usize,
    pub terms_failed: usize,
    pub languages_reordered: bool,
    pub keys_written: usize,
    pub keys_skipped: usize,
    pub startup_language: String,
}

impl RunSummary {
    fn add_fold(&mut self, report: &FoldReport) {
        self.patches_folded += 1;
        self.terms_applied += report.applied;
        self.terms_failed += report.failed;
    }

    fn add_sync(&mut self, report: &SyncReport) {
        self.keys_written += report.written;
        self.keys_skipped += report.skipped;
    }
}

/// Drives patches from the registry into the store
#[derive(Debug)]
pub struct Patcher<S> {
    session: StoreSession<S>,
    registry: PatchRegistry,
    languages: IndexMap<String, CompiledLanguage>,
    universe: Arc<TermUniverse>,
    vanilla: HashSet<String>,
    config: Config,
    config_path: Option<PathBuf>,
    flags: FlagChannel,
    listeners: FlagListeners,
    stored_selection: Option<String>,
    startup_restored: bool,
}

impl<S: LocalizationStore> Patcher<S> {
    /// Create a patcher over `store`.
    ///
    /// The term universe and the set of vanilla languages are taken from the
    /// store as it is now.
    pub fn new(store: S, config: Config) -> Self {
        let session = StoreSession::new(store);
        let universe = Arc::new(TermUniverse::from_keys(session.term_keys()));
        let vanilla = session.language_names().into_iter().collect();
        tracing::debug!("Term universe holds {} keys", universe.len());

        Self {
            session,
            registry: PatchRegistry::new(),
            languages: IndexMap::new(),
            universe,
            vanilla,
            config,
            config_path: None,
            flags: FlagChannel::new(),
            listeners: FlagListeners::new(),
            stored_selection: None,
            startup_restored: false,
        }
    }

    /// Persist the config to `path` whenever the pipeline changes it
    #[must_use]
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    // ==================== Accessors ====================

    #[must_use]
    pub fn session(&self) -> &StoreSession<S> {
        &self.session
    }

    #[must_use]
    pub fn store(&self) -> &S {
        self.session.store()
    }

    pub fn into_store(self) -> S {
        self.session.into_inner()
    }

    #[must_use]
    pub fn registry(&self) -> &PatchRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    #[must_use]
    pub fn universe(&self) -> &TermUniverse {
        &self.universe
    }

    #[must_use]
    pub fn compiled_language(&self, name: &str) -> Option<&CompiledLanguage> {
        self.languages.get(name)
    }

    /// Compiled languages in creation order
    pub fn compiled_languages(&self) -> impl Iterator<Item = &CompiledLanguage> {
        self.languages.values()
    }

    #[must_use]
    pub fn is_vanilla(&self, language: &str) -> bool {
        self.vanilla.contains(language)
    }

    /// Sender the host uses to report flag changes
    #[must_use]
    pub fn flag_notifier(&self) -> FlagNotifier {
        self.flags.notifier()
    }

    // ==================== Registration ====================

    /// Register a patch on behalf of `contributor`; `false` for a repeated name
    pub fn register_patch(&mut self, contributor: &str, patch: LanguagePatch) -> bool {
        let name = patch.name().to_string();
        let flag = patch.activation().flag().map(str::to_string);
        if !self.registry.register(contributor, patch) {
            return false;
        }
        if let Some(flag) = flag {
            self.listeners.listen(&flag, &name);
        }
        true
    }

    /// Register every discovered patch, returning how many were new
    pub fn register_discovered(&mut self, discovered: Vec<DiscoveredPatch>) -> usize {
        let mut registered = 0;
        for found in discovered {
            if self.register_patch(&found.contributor, found.patch) {
                registered += 1;
            }
        }
        registered
    }

    /// Create the compiled language `name`.
    ///
    /// Refused with a warning when a compiled language with the same name or
    /// code already exists.
    pub fn register_language(&mut self, name: &str, code: &str) -> bool {
        if self.languages.contains_key(name) || self.languages.values().any(|l| l.code() == code) {
            tracing::warn!(
                "Aborted attempt to register already-existing compiled language `{}`",
                name
            );
            return false;
        }
        self.languages.insert(
            name.to_string(),
            CompiledLanguage::new(name, code, Arc::clone(&self.universe)),
        );
        true
    }

    // ==================== Startup pass ====================

    /// Run the startup pass. Failures are logged and never abort the run.
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        tracing::info!("Loaded {} language patches", self.registry.len());

        self.stored_selection = self.session.current_language();
        tracing::info!(
            "Stored current language selection: {}",
            self.stored_selection.as_deref().unwrap_or("<none>")
        );

        summary.languages_removed = self.remove_disabled_languages();
        self.snapshot_store_languages();

        let contributors = self.registry.contributors();
        resolve_sorting_order(&mut self.config.patching_mod_order, &contributors);
        self.save_config();
        self.registry
            .sort_by_contributor_order(&self.config.patching_mod_order);

        for name in self.registry.startup_patch_names() {
            if self.config.is_patch_disabled(&name) {
                tracing::info!("Skipping disabled patch {}", name);
                summary.patches_skipped += 1;
                continue;
            }
            match self.fold_patch(&name) {
                Ok(report) => summary.add_fold(&report),
                Err(e) => {
                    tracing::warn!("Skipping patch {}: {}", name, e);
                    summary.patches_skipped += 1;
                }
            }
        }

        summary.languages_reordered = self.resolve_language_order();
        self.save_config();

        for name in self.config.language_order.clone() {
            let Some(language) = self.languages.get(&name) else {
                continue;
            };
            let is_vanilla = self.vanilla.contains(&name);
            match language.write_all(
                &mut self.session,
                &self.registry,
                is_vanilla,
                summary.languages_reordered,
            ) {
                Ok(report) => summary.add_sync(&report),
                Err(e) => tracing::error!("Failed to write {} to the store: {}", name, e),
            }
        }

        summary.startup_language = self.resolve_startup_language();
        self.save_config();

        tracing::info!(
            "Folded {} patches ({} skipped), applied {} terms ({} failed), wrote {} keys",
            summary.patches_folded,
            summary.patches_skipped,
            summary.terms_applied,
            summary.terms_failed,
            summary.keys_written
        );
        summary
    }

    fn remove_disabled_languages(&mut self) -> usize {
        if self.config.disabled_languages.is_empty() {
            return 0;
        }

        tracing::info!("Removing disabled languages:");
        let mut removed = 0;
        for name in &self.config.disabled_languages {
            match self.session.remove_language(name) {
                Ok(()) => {
                    tracing::info!("  Removed {}", name);
                    removed += 1;
                }
                Err(e) => tracing::error!("  Failed disabling language: {}", e),
            }
        }
        tracing::info!("Removed {} languages", removed);
        removed
    }

    fn snapshot_store_languages(&mut self) {
        for language in self.session.languages() {
            if !self.register_language(&language.name, &language.code) {
                continue;
            }
            let Some(compiled) = self.languages.get_mut(&language.name) else {
                continue;
            };
            if let Err(e) = compiled.read_all(&mut self.session) {
                tracing::error!("Failed to read {} from the store: {}", language.name, e);
            }
        }
    }

    /// Resolve `languageOrder`; when the store's languages do not lead with it,
    /// remove them all so they are re-added in order. Returns whether they were removed.
    fn resolve_language_order(&mut self) -> bool {
        let names: Vec<String> = self.languages.keys().cloned().collect();
        resolve_sorting_order(&mut self.config.language_order, &names);

        let store_names = self.session.language_names();
        let mismatch = store_names
            .iter()
            .enumerate()
            .any(|(i, name)| self.config.language_order.get(i) != Some(name));
        if !mismatch {
            return false;
        }

        tracing::info!("Store language order differs from the configured order, rebuilding");
        for name in store_names {
            if !self.languages.contains_key(&name) {
                tracing::error!(
                    "Store language {} has no compiled language and will not be re-added",
                    name
                );
            }
            if let Err(e) = self.session.remove_language(&name) {
                tracing::error!("Failed to remove {}: {}", name, e);
            }
        }
        true
    }

    fn resolve_startup_language(&mut self) -> String {
        let available = self.session.language_names();
        let usable = |name: &str| !name.is_empty() && available.iter().any(|l| l == name);

        if usable(&self.config.language_on_startup) {
            tracing::info!(
                "Using language on startup from config: {}",
                self.config.language_on_startup
            );
        } else {
            let language = match self.stored_selection.as_deref() {
                Some(selection) if usable(selection) => selection.to_string(),
                _ => DEFAULT_STARTUP_LANGUAGE.to_string(),
            };
            tracing::info!(
                "No usable language on startup in config, using language: {}",
                language
            );
            self.config.language_on_startup = language;
        }
        self.config.language_on_startup.clone()
    }

    // ==================== Folding ====================

    /// Fold the named patch into its compiled language, creating it if needed
    fn fold_patch(&mut self, name: &str) -> Result<FoldReport> {
        let patch = self.registry.get(name).ok_or_else(|| Error::PatchNotFound {
            patch: name.to_string(),
        })?;
        let language_name = patch.language_name().to_string();
        let language_code = patch.language_code().to_string();

        if self.config.is_language_disabled(&language_name) {
            return Err(Error::LanguageNotFound {
                language: language_name,
            });
        }
        if !self.languages.contains_key(&language_name) {
            self.register_language(&language_name, &language_code);
        }

        let language =
            self.languages
                .get_mut(&language_name)
                .ok_or_else(|| Error::LanguageNotFound {
                    language: language_name.clone(),
                })?;
        let patch = self
            .registry
            .get_mut(name)
            .ok_or_else(|| Error::PatchNotFound {
                patch: name.to_string(),
            })?;
        Ok(language.fold(patch))
    }

    /// Write a compiled language into the store, vanilla languages partially
    fn write_language(&mut self, name: &str) -> Result<SyncReport> {
        let language = self
            .languages
            .get(name)
            .ok_or_else(|| Error::LanguageNotFound {
                language: name.to_string(),
            })?;
        language.write_all(
            &mut self.session,
            &self.registry,
            self.vanilla.contains(name),
            false,
        )
    }

    /// Fold the named patch and write its language, whatever its activation.
    ///
    /// The result lives only in the store; nothing is persisted.
    pub fn apply_manual(&mut self, name: &str) -> Result<FoldReport> {
        let report = self.fold_patch(name)?;
        if let Some(language) = self
            .registry
            .get(name)
            .map(|p| p.language_name().to_string())
        {
            self.write_language(&language)?;
        }
        tracing::info!("Successfully applied patch {}", name);
        Ok(report)
    }

    // ==================== Flags ====================

    /// Fold every not yet applied patch waiting on `flag`, if `flag` is set.
    ///
    /// Returns the names of the folded patches.
    pub fn on_flag_changed<F: FlagSource + ?Sized>(&mut self, flag: &str, flags: &F) -> Vec<String> {
        if !flags.is_set(flag) {
            return Vec::new();
        }

        let mut folded = Vec::new();
        for name in self.listeners.patches_for(flag).to_vec() {
            let already_applied = self.registry.get(&name).is_some_and(LanguagePatch::is_applied);
            if already_applied {
                tracing::debug!("Flag patch {} is already applied", name);
                self.listeners.forget(&name);
                continue;
            }
            match self.fold_patch(&name) {
                Ok(_) => {
                    self.listeners.forget(&name);
                    folded.push(name);
                }
                Err(e) => tracing::warn!("Flag {} could not apply patch {}: {}", flag, name, e),
            }
        }

        let mut written = HashSet::new();
        for name in &folded {
            let Some(language) = self.registry.get(name).map(|p| p.language_name().to_string())
            else {
                continue;
            };
            if written.insert(language.clone())
                && let Err(e) = self.write_language(&language)
            {
                tracing::error!("Failed to write {} to the store: {}", language, e);
            }
        }
        folded
    }

    /// Dispatch every queued flag change. Returns the names of the folded patches.
    pub fn process_flag_events<F: FlagSource + ?Sized>(&mut self, flags: &F) -> Vec<String> {
        let mut folded = Vec::new();
        for flag in self.flags.drain() {
            folded.extend(self.on_flag_changed(&flag, flags));
        }
        folded
    }

    // ==================== Host lifecycle ====================

    /// Select the startup language in the store, once.
    ///
    /// Returns `false` if it was already restored.
    pub fn restore_startup_language(&mut self) -> bool {
        if self.startup_restored {
            return false;
        }
        self.startup_restored = true;
        if self.config.language_on_startup.is_empty() {
            return false;
        }
        self.session
            .set_current_language(&self.config.language_on_startup);
        tracing::info!("Selected language {}", self.config.language_on_startup);
        true
    }

    /// Remember the store's selected language for the next startup
    pub fn shutdown(&mut self) {
        if let Some(current) = self.session.current_language() {
            self.config.language_on_startup = current;
        }
        self.save_config();
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save(path) {
            tracing::error!("Failed to save config to {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::patch::PatchActivation;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.add_language("English", "en");
        store.add_language("Spanish", "es");
        for key in ["GREETING", "UI/TITLE"] {
            store.insert_term(key);
            store.set_text_in(key, "English", &format!("{key} en")).unwrap();
            store.set_text_in(key, "Spanish", &format!("{key} es")).unwrap();
        }
        store.set_current_language("Spanish");
        store
    }

    fn patch(
        name: &str,
        language: &str,
        code: &str,
        text: &str,
        activation: PatchActivation,
    ) -> LanguagePatch {
        LanguagePatch::from_text(name, language, code, text, activation, 0)
            .unwrap()
            .0
    }

    #[test]
    fn test_register_language_refuses_duplicates() {
        let mut patcher = Patcher::new(store(), Config::default());
        assert!(patcher.register_language("English", "en"));
        assert!(!patcher.register_language("English", "xx"));
        assert!(!patcher.register_language("Other", "en"));
    }

    #[test]
    fn test_disabled_patch_is_not_folded() {
        let config = Config {
            disabled_patches: vec!["off".into()],
            ..Config::default()
        };
        let mut patcher = Patcher::new(store(), config);
        patcher.register_patch(
            "Mod",
            patch("off", "English", "en", "GREETING -> Replace : Off", PatchActivation::OnInit),
        );

        let summary = patcher.run();
        assert_eq!(summary.patches_skipped, 1);
        assert!(!patcher.registry().get("off").unwrap().is_applied());
        assert_eq!(patcher.store().text_in("GREETING", "English"), Some("GREETING en"));
    }

    #[test]
    fn test_disabled_language_is_removed() {
        let config = Config {
            disabled_languages: vec!["Spanish".into(), "Klingon".into()],
            ..Config::default()
        };
        let mut patcher = Patcher::new(store(), config);
        patcher.register_patch(
            "Mod",
            patch("es", "Spanish", "es", "GREETING -> Replace : Hola", PatchActivation::OnInit),
        );

        let summary = patcher.run();
        assert_eq!(summary.languages_removed, 1);
        assert_eq!(summary.patches_skipped, 1);
        assert_eq!(patcher.session().language_names(), vec!["English"]);
        assert!(patcher.compiled_language("Spanish").is_none());
    }

    #[test]
    fn test_startup_language_falls_back_to_selection() {
        let config = Config {
            language_on_startup: "Klingon".into(),
            ..Config::default()
        };
        let mut patcher = Patcher::new(store(), config);
        let summary = patcher.run();
        assert_eq!(summary.startup_language, "Spanish");
    }

    #[test]
    fn test_startup_language_defaults_to_english() {
        let mut store = store();
        store.set_current_language("Klingon");
        let mut patcher = Patcher::new(store, Config::default());
        assert_eq!(patcher.run().startup_language, DEFAULT_STARTUP_LANGUAGE);
    }

    #[test]
    fn test_restore_startup_language_once() {
        let config = Config {
            language_on_startup: "English".into(),
            ..Config::default()
        };
        let mut patcher = Patcher::new(store(), config);
        patcher.run();

        assert!(patcher.restore_startup_language());
        assert_eq!(patcher.store().current_language().as_deref(), Some("English"));
        assert!(!patcher.restore_startup_language());
    }

    #[test]
    fn test_language_reorder_rebuilds_store() {
        let config = Config {
            language_order: vec!["Spanish".into(), "English".into()],
            ..Config::default()
        };
        let mut patcher = Patcher::new(store(), config);
        let summary = patcher.run();

        assert!(summary.languages_reordered);
        assert_eq!(patcher.session().language_names(), vec!["Spanish", "English"]);
        assert_eq!(patcher.store().text_in("UI/TITLE", "English"), Some("UI/TITLE en"));
        assert_eq!(patcher.store().text_in("UI/TITLE", "Spanish"), Some("UI/TITLE es"));
    }

    #[test]
    fn test_store_language_sharing_a_code_is_dropped_on_rebuild() {
        let mut store = store();
        store.add_language("Castilian", "es");
        let mut patcher = Patcher::new(store, Config::default());
        let summary = patcher.run();

        assert!(summary.languages_reordered);
        assert!(patcher.compiled_language("Castilian").is_none());
        assert_eq!(patcher.session().language_names(), vec!["English", "Spanish"]);
        assert_eq!(patcher.config().language_order, vec!["English", "Spanish"]);
    }

    #[test]
    fn test_flag_patch_folds_once() {
        let mut patcher = Patcher::new(store(), Config::default());
        patcher.register_patch(
            "Mod",
            patch(
                "flagged",
                "English",
                "en",
                "GREETING -> Suffix : !",
                PatchActivation::OnFlag("BOSS_DEAD".into()),
            ),
        );
        patcher.run();
        assert_eq!(patcher.store().text_in("GREETING", "English"), Some("GREETING en"));

        let mut flags = HashSet::new();
        let notifier = patcher.flag_notifier();
        notifier.notify("BOSS_DEAD");
        assert!(patcher.process_flag_events(&flags).is_empty());

        flags.insert("BOSS_DEAD".to_string());
        notifier.notify("BOSS_DEAD");
        notifier.notify("BOSS_DEAD");
        assert_eq!(patcher.process_flag_events(&flags), vec!["flagged"]);
        assert_eq!(patcher.store().text_in("GREETING", "English"), Some("GREETING en!"));
    }

    #[test]
    fn test_apply_manual() {
        let mut patcher = Patcher::new(store(), Config::default());
        patcher.register_patch(
            "Mod",
            patch("manual", "English", "en", "UI/TITLE -> Replace : Manual", PatchActivation::Manual),
        );
        patcher.run();
        assert_eq!(patcher.store().text_in("UI/TITLE", "English"), Some("UI/TITLE en"));

        let report = patcher.apply_manual("manual").unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(patcher.store().text_in("UI/TITLE", "English"), Some("Manual"));

        assert!(matches!(
            patcher.apply_manual("missing"),
            Err(Error::PatchNotFound { .. })
        ));
    }

    #[test]
    fn test_shutdown_saves_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut patcher = Patcher::new(store(), Config::default()).with_config_path(&path);
        patcher.run();
        patcher.shutdown();

        let saved = Config::load(&path).unwrap();
        assert_eq!(saved.language_on_startup, "Spanish");
        assert_eq!(saved.language_order, vec!["English", "Spanish"]);
    }
}
