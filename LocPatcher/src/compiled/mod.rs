//! Compiled languages
//!
//! A [`CompiledLanguage`] holds the resolved prefix, content and suffix of every
//! key in the [`TermUniverse`] for one language, folds patches into that state
//! and synchronizes it with the store.

mod language;
mod sync;
mod universe;

pub use language::{CompiledLanguage, FoldReport};
pub use sync::{ReadReport, SyncReport};
pub use universe::TermUniverse;
