//! Localization patches
//!
//! A patch is a named list of term edits for one language, authored by one
//! contributor. Patches come in two on-disk forms:
//!
//! - **Text**: one `KEY -> OPERATION : VALUE` edit per line (see [`text`])
//! - **Structured**: a JSON [`PatchDocument`]

mod discover;
mod document;
mod language_patch;
mod term;
pub mod text;

pub use discover::{DiscoveredPatch, PATCH_EXTENSION, discover_patches};
pub use document::{PatchDocument, PatchType};
pub use language_patch::{LanguagePatch, PatchActivation, normalize_patch_name};
pub use term::{PatchTerm, TermOperation};
pub use text::{LineError, LineErrorKind, LoadReport, parse_text};
