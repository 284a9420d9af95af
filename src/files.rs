use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use globset::{Glob, GlobSet, GlobSetBuilder};
use walkdir::{DirEntry, WalkDir};

const BINARY_CHECK_BYTES: usize = 4096;

/// Directory names that are never entered during a walk.
const SKIPPED_DIRS: &[&str] = &["node_modules"];

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub is_probably_binary: bool,
}

#[derive(Debug, Clone)]
pub struct WalkOptions<'a> {
    /// Accepted extensions without the leading dot, matched case-insensitively.
    pub extensions: &'a [&'a str],
    /// File names skipped with a log line wherever they appear.
    pub exclude_names: &'a [&'a str],
    /// Optional exclude globs matched against slash-normalized paths.
    pub exclude_globs: &'a [String],
}

/// Walks `root` and returns the sorted list of files whose extension is in
/// `options.extensions`. The root must exist; per-entry walk errors abort
/// the walk with context but do not affect other walks.
pub fn walk_tree(root: &Path, options: &WalkOptions<'_>) -> Result<Vec<FileEntry>> {
    let root = fs::canonicalize(root)
        .with_context(|| format!("resolving walk root {}", root.display()))?;
    let exclude = build_exclude_globs(options.exclude_globs)?;

    let mut entries = Vec::new();
    let walker = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if !has_accepted_extension(&path, options.extensions) {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
            if options.exclude_names.iter().any(|excluded| *excluded == name) {
                println!("excluding {} from processing", path.display());
                continue;
            }
        }
        if let Some(set) = &exclude {
            if set.is_match(normalize_slashes(&path)) {
                continue;
            }
        }
        entries.push(FileEntry {
            metadata: FileMetadata {
                is_probably_binary: detect_binary(&path)?,
            },
            path,
        });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| SKIPPED_DIRS.contains(&name))
            .unwrap_or(false)
}

fn has_accepted_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

fn normalize_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn detect_binary(path: &Path) -> Result<bool> {
    let mut file = fs::File::open(path)
        .with_context(|| format!("opening '{}' for binary detection", path.display()))?;
    let mut buf = [0u8; BINARY_CHECK_BYTES];
    let read = file.read(&mut buf)?;
    Ok(buf[..read].contains(&0))
}

fn build_exclude_globs(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).map_err(|err| anyhow!("invalid exclude glob '{pattern}': {err}"))?;
        builder.add(glob);
    }

    builder
        .build()
        .map(Some)
        .map_err(|err| anyhow!("unable to build exclude globs: {err}"))
}
