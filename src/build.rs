//! `apidoc build`: render every configured page into `outDir`.
//!
//! Pages are only rewritten when their content hash changes, so a rebuild
//! with nothing new leaves file timestamps alone.

use anyhow::{Context, Result, bail};
use apidoc_render::{ApiModel, Severity};
use colored::Colorize;
use notify::{EventKind, RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

use crate::config::{self, CONFIG_FILE};

/// Options for a build run.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOpts {
    pub dry_run: bool,
    pub prune: bool,
    pub quiet: bool,
}

/// What a build did to the output directory.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub pruned: usize,
    pub warnings: usize,
    pub dry_run: bool,
}

impl BuildReport {
    pub fn print_summary(&self) {
        println!();
        println!("{}", "========================================".dimmed());
        if self.dry_run {
            println!("{}", "Dry run complete (nothing written)".yellow().bold());
        } else {
            println!("{}", "Build complete!".green().bold());
        }
        println!();

        let mut parts = Vec::new();
        if self.created > 0 {
            parts.push(format!("{} created", self.created));
        }
        if self.updated > 0 {
            parts.push(format!("{} updated", self.updated));
        }
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if self.pruned > 0 {
            parts.push(format!("{} pruned", self.pruned));
        }

        if !parts.is_empty() {
            println!("Pages: {}", parts.join(", "));
        }
        if self.warnings > 0 {
            println!(
                "{}",
                format!("{} warning(s), see above", self.warnings).yellow()
            );
        }
        println!("{}", "========================================".dimmed());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStatus {
    Created,
    Updated,
    Unchanged,
}

/// Discover the repo root from the working directory and build it.
pub fn run_build(opts: &BuildOpts) -> Result<BuildReport> {
    let repo_root = config::find_repo_root()?;
    build_repo(&repo_root, opts)
}

/// Build every page configured in `repo_root/apidoc.json`.
pub fn build_repo(repo_root: &Path, opts: &BuildOpts) -> Result<BuildReport> {
    let config = config::load_config(repo_root)?;
    let model_path = repo_root.join(&config.model);
    let raw = fs::read_to_string(&model_path)
        .with_context(|| format!("Failed to read {}", model_path.display()))?;
    let model = ApiModel::from_json(&raw)
        .with_context(|| format!("Failed to parse {}", model_path.display()))?;

    if !opts.quiet {
        println!(
            "{} {} {}",
            "apidoc".bold(),
            model.package_name,
            format!("({} pages)", config.site.pages.len()).dimmed()
        );
    }

    let site = apidoc_render::render_site(&model, &config.site)?;

    let mut report = BuildReport {
        dry_run: opts.dry_run,
        ..Default::default()
    };

    for diag in &site.diagnostics {
        if diag.severity != Severity::Info {
            report.warnings += 1;
        }
        eprintln!("{}", crate::format_diagnostic(&config.model, diag));
    }

    let out_dir = repo_root.join(&config.out_dir);
    let mut written = BTreeSet::new();

    for page in &site.pages {
        let rel = page_relative_path(&page.path)?;
        let dst = out_dir.join(&rel);
        let status = write_page(&dst, &page.markdown, opts.dry_run)?;
        match status {
            FileStatus::Created => report.created += 1,
            FileStatus::Updated => report.updated += 1,
            FileStatus::Unchanged => report.unchanged += 1,
        }
        if !opts.quiet && status != FileStatus::Unchanged {
            let label = match status {
                FileStatus::Created => "create".green(),
                _ => "update".cyan(),
            };
            println!("  {} {}", label, page.path);
        }
        written.insert(rel);
    }

    if opts.prune {
        for stale in list_markdown_files(&out_dir)?
            .into_iter()
            .filter(|rel| !written.contains(rel))
        {
            if !opts.dry_run {
                let path = out_dir.join(&stale);
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
            if !opts.quiet {
                println!("  {} {}", "prune".red(), stale.display());
            }
            report.pruned += 1;
        }
    }

    Ok(report)
}

/// Normalize a configured page path, refusing anything that would land
/// outside `outDir`.
fn page_relative_path(page_path: &str) -> Result<PathBuf> {
    let mut rel = PathBuf::new();
    for component in Path::new(page_path).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("Page path '{page_path}' escapes outDir");
            }
        }
    }
    if rel.as_os_str().is_empty() {
        bail!("Page path '{page_path}' names no file");
    }
    Ok(rel)
}

/// Write `content` to `dst` unless the file already holds exactly that.
fn write_page(dst: &Path, content: &str, dry_run: bool) -> Result<FileStatus> {
    let status = if !dst.exists() {
        FileStatus::Created
    } else if file_hash(dst)? == content_hash(content.as_bytes()) {
        return Ok(FileStatus::Unchanged);
    } else {
        FileStatus::Updated
    };

    if !dry_run {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(dst, content).with_context(|| format!("Failed to write {}", dst.display()))?;
    }

    Ok(status)
}

/// Compute SHA-256 hash of file contents.
fn file_hash(path: &Path) -> Result<String> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content_hash(&content))
}

fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Recursively list `.md` files under a directory, returning relative paths.
fn list_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !dir.exists() {
        return Ok(files);
    }

    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let is_markdown = entry.path().extension().is_some_and(|ext| ext == "md");
        if entry.file_type().is_file() && is_markdown {
            let rel = entry
                .path()
                .strip_prefix(dir)
                .unwrap_or(entry.path())
                .to_path_buf();
            files.push(rel);
        }
    }

    Ok(files)
}

/// Watch apidoc.json and the API model and rebuild on each save.
///
/// Debounces rapid events (e.g. an extractor that writes in stages) with a
/// 200ms window. Ctrl+C exits cleanly.
pub fn watch_and_rebuild(opts: &BuildOpts) -> Result<()> {
    let repo_root = config::find_repo_root()?;
    let config = config::load_config(&repo_root)?;
    let watched: Vec<PathBuf> = [repo_root.join(CONFIG_FILE), repo_root.join(&config.model)]
        .iter()
        .map(|p| fs::canonicalize(p).with_context(|| format!("Cannot resolve {}", p.display())))
        .collect::<Result<_>>()?;

    println!(
        "{} {} for changes (Ctrl+C to stop)",
        "Watching".cyan().bold(),
        watched
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    let dirs: BTreeSet<&Path> = watched.iter().filter_map(|p| p.parent()).collect();
    for dir in dirs {
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
    }

    let mut last_rebuild = Instant::now();
    let debounce = Duration::from_millis(200);

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => {
                let relevant_kind =
                    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
                let affects_inputs = event
                    .paths
                    .iter()
                    .any(|p| p.canonicalize().is_ok_and(|p| watched.contains(&p)));

                if relevant_kind && affects_inputs && last_rebuild.elapsed() > debounce {
                    // Let the writer finish.
                    std::thread::sleep(Duration::from_millis(50));

                    match build_repo(&repo_root, opts) {
                        Ok(report) => {
                            if !opts.quiet {
                                report.print_summary();
                            }
                            last_rebuild = Instant::now();
                        }
                        Err(e) => {
                            eprintln!("{} {:#}", "Build error:".red().bold(), e);
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}
