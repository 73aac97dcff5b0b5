//! CLI commands for single patch files

use std::fs;
use std::path::Path;

use anyhow::Context;
use console::style;

use crate::cli::progress::{DOCUMENT, print_step};
use crate::patch::{LanguagePatch, PATCH_EXTENSION, PatchActivation, parse_text};

use super::ActivationArg;

/// Parse a patch file and report what it contains
pub fn check(file: &Path) -> anyhow::Result<()> {
    let is_json = file
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PATCH_EXTENSION));

    if is_json {
        let patch = LanguagePatch::read_json(file)
            .with_context(|| format!("Invalid patch {}", file.display()))?;
        println!("Patch: {}", style(patch.name()).cyan());
        println!("Language: {} ({})", patch.language_name(), patch.language_code());
        println!("Activation: {}", patch.activation());
        println!("Order: {}", patch.order());
        println!("Terms: {}", patch.terms().len());
        return Ok(());
    }

    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let (terms, report) = parse_text(&raw);

    println!("Lines: {}", report.total_lines);
    println!("Terms loaded: {}", style(terms.len()).green());
    println!("Near-empty lines: {}", report.near_empty);
    println!("Empty values: {}", report.empty_values);
    if report.has_errors() {
        println!("Malformed lines: {}", style(report.errors.len()).red().bold());
        for error in &report.errors {
            let error = crate::Error::from(error.clone());
            println!("  {error}");
        }
        anyhow::bail!("{} malformed lines in {}", report.errors.len(), file.display());
    }
    Ok(())
}

/// Convert a text patch into the structured form
pub fn export(
    file: &Path,
    name: Option<&str>,
    language: &str,
    code: &str,
    activation: ActivationArg,
    flag: Option<&str>,
    order: i32,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    print_step(1, 2, DOCUMENT, &format!("Reading {}...", file.display()));
    let raw = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let name = name.unwrap_or(&stem);

    let activation = match activation {
        ActivationArg::OnInit => PatchActivation::OnInit,
        ActivationArg::OnFlag => PatchActivation::OnFlag(flag.unwrap_or_default().to_string()),
        ActivationArg::Manual => PatchActivation::Manual,
    };

    let (patch, report) = LanguagePatch::from_text(name, language, code, &raw, activation, order)?;
    if report.has_errors() {
        println!(
            "  {} malformed lines were skipped",
            style(report.errors.len()).yellow().bold()
        );
    }

    let output = output.map_or_else(|| file.with_extension(PATCH_EXTENSION), Path::to_path_buf);
    print_step(2, 2, DOCUMENT, &format!("Writing {}...", output.display()));
    fs::write(&output, patch.to_json_string()?)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Exported {} terms to {}", patch.terms().len(), output.display());
    Ok(())
}
