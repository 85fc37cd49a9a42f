//! Migrate command - Repaint Options API components as `<script setup>`

use clap::Args;
use glob::glob;
use ignore::Walk;
use pentimento_atelier::{migrate_sfc, MigrateOptions, MigrateOutcome};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use crate::config::load_config;

#[derive(Args)]
pub struct MigrateArgs {
    /// Glob pattern(s) or directories to search for .vue files
    #[arg(default_value = "./**/*.vue")]
    pub patterns: Vec<String>,

    /// Write migrated output to files
    #[arg(short, long)]
    pub write: bool,

    /// Check without writing (exit with error if files would be migrated)
    #[arg(long)]
    pub check: bool,

    /// Config file path (default: ./pentimento.config.json)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Keep the generated script unformatted
    #[arg(long)]
    pub no_format: bool,
}

impl Default for MigrateArgs {
    fn default() -> Self {
        Self {
            patterns: vec!["./**/*.vue".to_string()],
            write: false,
            check: false,
            config: None,
            no_format: false,
        }
    }
}

/// What happened to one file
enum FileStatus {
    Migrated { unresolved: usize },
    Unchanged,
    Skipped,
}

pub fn run(args: MigrateArgs) {
    let start = Instant::now();

    let mut options = load_config(args.config.as_deref()).migrate;
    if args.no_format {
        options.format = false;
    }

    let files = collect_files(&args.patterns);
    if files.is_empty() {
        eprintln!("No .vue files found matching patterns: {:?}", args.patterns);
        return;
    }

    eprintln!("Found {} .vue file(s)", files.len());

    let has_errors = AtomicBool::new(false);
    let files_migrated = AtomicUsize::new(0);
    let files_unchanged = AtomicUsize::new(0);
    let files_skipped = AtomicUsize::new(0);
    let files_errored = AtomicUsize::new(0);
    let unresolved = AtomicUsize::new(0);

    files
        .par_iter()
        .for_each(|path| match process_file(path, &options, &args) {
            Ok(FileStatus::Migrated { unresolved: count }) => {
                files_migrated.fetch_add(1, Ordering::Relaxed);
                unresolved.fetch_add(count, Ordering::Relaxed);
                if args.check {
                    has_errors.store(true, Ordering::Relaxed);
                }
            }
            Ok(FileStatus::Unchanged) => {
                files_unchanged.fetch_add(1, Ordering::Relaxed);
            }
            Ok(FileStatus::Skipped) => {
                files_skipped.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                eprintln!("Error migrating {}: {}", path.display(), err);
                files_errored.fetch_add(1, Ordering::Relaxed);
                has_errors.store(true, Ordering::Relaxed);
            }
        });

    // Print summary
    let migrated = files_migrated.load(Ordering::Relaxed);
    let unchanged = files_unchanged.load(Ordering::Relaxed);
    let skipped = files_skipped.load(Ordering::Relaxed);
    let errored = files_errored.load(Ordering::Relaxed);
    let unresolved = unresolved.load(Ordering::Relaxed);

    eprintln!();
    if args.write && !args.check {
        eprintln!(
            "Migrated {} file(s) in {:.2?}",
            migrated,
            start.elapsed()
        );
    } else {
        eprintln!(
            "Checked {} file(s) in {:.2?} (use --write to apply changes)",
            files.len(),
            start.elapsed()
        );
        if migrated > 0 {
            eprintln!("  {} file(s) would be migrated", migrated);
        }
    }
    if unchanged > 0 {
        eprintln!("  {} file(s) unchanged", unchanged);
    }
    if skipped > 0 {
        eprintln!("  {} file(s) skipped", skipped);
    }
    if unresolved > 0 {
        eprintln!(
            "  {} unresolved reference(s) flagged with // [pentimento] markers",
            unresolved
        );
    }
    if errored > 0 {
        eprintln!("  {} file(s) had errors", errored);
    }

    if has_errors.load(Ordering::Relaxed) {
        std::process::exit(1);
    }
}

fn collect_files(patterns: &[String]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = patterns
        .iter()
        .flat_map(|pattern| {
            if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
                glob(pattern)
                    .ok()
                    .into_iter()
                    .flatten()
                    .filter_map(|r| r.ok())
                    .filter(|p| is_vue_file(p) && !in_node_modules(p))
                    .collect::<Vec<_>>()
            } else {
                // Directory walking respects .gitignore
                Walk::new(pattern)
                    .filter_map(|e| e.ok())
                    .filter(|e| is_vue_file(e.path()))
                    .map(|e| e.path().to_path_buf())
                    .collect::<Vec<_>>()
            }
        })
        .collect();

    files.sort();
    files.dedup();
    files
}

#[inline]
fn is_vue_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "vue")
}

#[inline]
fn in_node_modules(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == "node_modules")
}

fn process_file(
    path: &Path,
    options: &MigrateOptions,
    args: &MigrateArgs,
) -> Result<FileStatus, String> {
    let source = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;

    let result = migrate_sfc(&source, options).map_err(|e| format!("Invalid SFC: {}", e))?;

    if let MigrateOutcome::Skipped(reason) = &result.outcome {
        tracing::info!("{}: skipped ({})", path.display(), reason);
        return Ok(FileStatus::Skipped);
    }
    if result.code == source {
        return Ok(FileStatus::Unchanged);
    }

    for diagnostic in &result.diagnostics {
        tracing::info!("{}: {}", path.display(), diagnostic.message);
    }

    if args.write && !args.check {
        fs::write(path, &result.code).map_err(|e| format!("Failed to write file: {}", e))?;
        eprintln!("Migrated: {}", path.display());
    } else {
        eprintln!("Would migrate: {}", path.display());
    }

    Ok(FileStatus::Migrated {
        unresolved: result.unresolved_count(),
    })
}
