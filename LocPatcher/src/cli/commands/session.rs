//! CLI commands that run the patcher over a store file

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use console::style;

use crate::cli::progress::{
    DISK, GEAR, LOOKING_GLASS, print_done, print_step, simple_spinner, styled_count,
};
use crate::config::Config;
use crate::patch::{LanguagePatch, discover_patches};
use crate::patcher::{Patcher, RunSummary};
use crate::store::MemoryStore;

use super::{ListFilter, SessionArgs};

const STEPS: usize = 4;

/// Load the store and config, register the discovered patches and run the startup pass
fn start(args: &SessionArgs, quiet: bool) -> anyhow::Result<(Patcher<MemoryStore>, RunSummary)> {
    if !quiet {
        print_step(1, STEPS, LOOKING_GLASS, "Reading store and config...");
    }
    let store = MemoryStore::read(&args.store)
        .with_context(|| format!("Failed to read store {}", args.store.display()))?;

    let config_path = args.config.clone().or_else(Config::default_path);
    let config = match &config_path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::default(),
    };

    let mut patcher = Patcher::new(store, config);
    if let Some(path) = config_path {
        patcher = patcher.with_config_path(path);
    }

    if !quiet {
        print_step(2, STEPS, LOOKING_GLASS, "Discovering patches...");
    }
    let discovered = discover_patches(&args.patches)
        .with_context(|| format!("Failed to scan {}", args.patches.display()))?;
    let found = discovered.len();
    let registered = patcher.register_discovered(discovered);
    if !quiet {
        println!("  Registered {registered} of {found} patches");
    }

    if !quiet {
        print_step(3, STEPS, GEAR, "Compiling patches...");
    }
    let spinner = simple_spinner("Folding patches into languages", quiet);
    let summary = patcher.run();
    spinner.finish_and_clear();

    if !quiet {
        print_summary(&summary);
    }
    Ok((patcher, summary))
}

/// Select the startup language, remember it and write the store
fn finish(mut patcher: Patcher<MemoryStore>, args: &SessionArgs, quiet: bool) -> anyhow::Result<()> {
    patcher.restore_startup_language();
    patcher.shutdown();

    let output: PathBuf = args.output.clone().unwrap_or_else(|| args.store.clone());
    if !quiet {
        print_step(STEPS, STEPS, DISK, &format!("Writing {}...", output.display()));
    }
    patcher
        .into_store()
        .save(&output)
        .with_context(|| format!("Failed to write store {}", output.display()))?;
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "  Patches folded: {}  skipped: {}",
        styled_count(summary.patches_folded, false),
        styled_count(summary.patches_skipped, true)
    );
    println!(
        "  Terms applied: {}  failed: {}",
        styled_count(summary.terms_applied, false),
        styled_count(summary.terms_failed, true)
    );
    println!(
        "  Keys written: {}  skipped: {}",
        styled_count(summary.keys_written, false),
        styled_count(summary.keys_skipped, true)
    );
    if summary.languages_reordered {
        println!("  Store languages rebuilt in configured order");
    }
    println!("  Language on startup: {}", summary.startup_language);
}

/// Compile every startup patch into the store
pub fn compile(args: &SessionArgs, quiet: bool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let (patcher, _) = start(args, quiet)?;
    finish(patcher, args, quiet)?;
    if !quiet {
        print_done(start_time.elapsed());
    }
    Ok(())
}

/// Compile, then apply the named patches
pub fn apply(args: &SessionArgs, names: &[String], quiet: bool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let (mut patcher, _) = start(args, quiet)?;

    for name in names {
        let report = patcher
            .apply_manual(name)
            .with_context(|| format!("Failed to apply patch {name}"))?;
        if !quiet {
            println!(
                "  Applied {} ({} terms, {} failed)",
                style(name).cyan(),
                report.applied,
                report.failed
            );
        }
    }

    finish(patcher, args, quiet)?;
    if !quiet {
        print_done(start_time.elapsed());
    }
    Ok(())
}

/// Compile, then raise `flags` and apply the patches waiting on them
pub fn flag(args: &SessionArgs, flags: &[String], quiet: bool) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let (mut patcher, _) = start(args, quiet)?;

    let set: HashSet<String> = flags.iter().cloned().collect();
    let notifier = patcher.flag_notifier();
    for flag in flags {
        notifier.notify(flag.as_str());
    }
    let folded = patcher.process_flag_events(&set);

    if !quiet {
        if folded.is_empty() {
            println!("  No patches were waiting on these flags");
        }
        for name in &folded {
            println!("  Applied {}", style(name).cyan());
        }
    }

    finish(patcher, args, quiet)?;
    if !quiet {
        print_done(start_time.elapsed());
    }
    Ok(())
}

/// Compile, then list the registered patches
pub fn list(args: &SessionArgs, filter: ListFilter, quiet: bool) -> anyhow::Result<()> {
    let (patcher, _) = start(args, quiet)?;
    let registry = patcher.registry();

    let (title, patches): (&str, Vec<&LanguagePatch>) = match filter {
        ListFilter::All => ("All loaded language patches", registry.iter().collect()),
        ListFilter::Applied => ("All applied language patches", registry.applied().collect()),
        ListFilter::Inactive => ("All inactive language patches", registry.inactive().collect()),
    };

    println!("{title}:");
    for patch in patches {
        println!(
            "  {:<32} {:<12} {:<16} {:<24} order {}",
            patch.name(),
            patch.language_name(),
            patch.activation().to_string(),
            patch.parent_id().unwrap_or("-"),
            patch.order()
        );
    }
    Ok(())
}
