//! # LocPatcher
//!
//! A layered localization patching engine. Independently authored patches add,
//! replace, prefix or suffix translated strings by term key; the engine orders
//! them, folds them into one string table per language and writes the result
//! into a live localization store.
//!
//! ## Patch Formats
//!
//! - **Text** - one `KEY -> OPERATION : VALUE` edit per line, `@` for a newline
//! - **JSON** - `{ patchName, languageName, languageCode, patchTerms, patchType, patchFlag, patchOrder }`
//!
//! ## Quick Start
//!
//! ```
//! use locpatcher::prelude::*;
//!
//! let mut store = MemoryStore::new();
//! store.add_language("English", "en");
//! store.insert_term("GREETING");
//!
//! let (hello, _) = LanguagePatch::from_text(
//!     "hello", "English", "en", "GREETING -> Replace : Hi", PatchActivation::OnInit, 0,
//! )?;
//! let (bang, _) = LanguagePatch::from_text(
//!     "bang", "English", "en", "GREETING -> Suffix : !", PatchActivation::OnInit, 0,
//! )?;
//!
//! let mut patcher = Patcher::new(store, Config::default());
//! patcher.register_patch("MyMod", hello);
//! patcher.register_patch("MyMod", bang);
//! patcher.run();
//!
//! assert_eq!(patcher.store().text_in("GREETING", "English"), Some("Hi!"));
//! # Ok::<(), locpatcher::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `locpatcher` command-line binary

pub mod compiled;
pub mod config;
pub mod error;
pub mod flags;
pub mod patch;
pub mod patcher;
pub mod registry;
pub mod store;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    pub use crate::patch::{
        LanguagePatch, PatchActivation, PatchDocument, PatchTerm, PatchType, TermOperation,
        discover_patches, parse_text,
    };

    pub use crate::compiled::{CompiledLanguage, FoldReport, SyncReport, TermUniverse};
    pub use crate::config::{Config, resolve_sorting_order};
    pub use crate::flags::{FlagNotifier, FlagSource};
    pub use crate::patcher::{Patcher, RunSummary};
    pub use crate::registry::PatchRegistry;
    pub use crate::store::{LocalizationStore, MemoryStore, StoreLanguage, StoreSession};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
