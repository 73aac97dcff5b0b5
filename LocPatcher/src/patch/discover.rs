//! Patch discovery on disk
//!
//! Patches live under `<root>/<contributor>/**/*.json`. The first directory
//! below the root names the contributor that registers them.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

use super::language_patch::LanguagePatch;

/// Extension of structured patch files
pub const PATCH_EXTENSION: &str = "json";

/// A patch found on disk together with its contributor
#[derive(Debug, Clone)]
pub struct DiscoveredPatch {
    pub contributor: String,
    pub path: PathBuf,
    pub patch: LanguagePatch,
}

/// Find and parse every structured patch below `root`.
///
/// Files that cannot be read or parsed are logged and skipped; files directly
/// in `root` have no contributor and are skipped as well. Results are sorted by
/// path so discovery is deterministic.
///
/// # Errors
/// Returns an error if `root` itself cannot be traversed.
pub fn discover_patches<P: AsRef<Path>>(root: P) -> Result<Vec<DiscoveredPatch>> {
    let root = root.as_ref();
    let mut paths = Vec::new();

    for entry in WalkDir::new(root).min_depth(2).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let is_patch = entry.file_type().is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(PATCH_EXTENSION));
        if is_patch {
            paths.push(path.to_path_buf());
        }
    }

    tracing::info!("Found {} patch files in {}", paths.len(), root.display());

    let mut discovered = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(contributor) = contributor_of(root, &path) else {
            continue;
        };

        match LanguagePatch::read_json(&path) {
            Ok(patch) => discovered.push(DiscoveredPatch {
                contributor,
                path,
                patch,
            }),
            Err(e) => tracing::error!("Failed to load patch {}: {}", path.display(), e),
        }
    }

    Ok(discovered)
}

fn contributor_of(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()?
        .components()
        .next()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_patch(dir: &Path, file: &str, name: &str) {
        fs::create_dir_all(dir).unwrap();
        let json = format!(
            r#"{{"patchName":"{name}","languageName":"English","languageCode":"en",
                "patchTerms":[{{"termKey":"UI/A","termContent":"x","termOperation":"Replace"}}]}}"#
        );
        fs::write(dir.join(file), json).unwrap();
    }

    #[test]
    fn test_discovers_by_contributor() {
        let root = tempdir().unwrap();
        write_patch(&root.path().join("ModB"), "b.json", "b");
        write_patch(&root.path().join("ModA").join("nested"), "a.json", "a");
        write_patch(root.path(), "orphan.json", "orphan");
        fs::write(root.path().join("ModA").join("notes.txt"), "ignored").unwrap();
        fs::write(root.path().join("ModA").join("broken.json"), "{").unwrap();

        let found = discover_patches(root.path()).unwrap();
        let summary: Vec<_> = found
            .iter()
            .map(|d| (d.contributor.as_str(), d.patch.name()))
            .collect();
        assert_eq!(summary, vec![("ModA", "a"), ("ModB", "b")]);
    }
}
