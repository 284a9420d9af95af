//! Configuration for the extraction flow.
//!
//! A JSON file looked up in the invocation directory, merged over
//! compiled-in defaults. Key casing is normalized, unknown keys are
//! tolerated, and anything malformed falls back to the defaults with a log
//! line. Directory fields resolve against the executable's directory, not
//! the invocation cwd.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

pub const CONFIG_FILE_NAME: &str = "sfctidy.config.json";

const DEFAULT_SOURCE_DIR: &str = "../src/components";
const DEFAULT_OUTPUT_DIR: &str = "../src/styles/components";
const DEFAULT_ALIAS_ROOT: &str = "@/styles/components";

#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Source root as configured (possibly relative).
    pub source_dir: PathBuf,
    /// Output directory as configured (possibly relative).
    pub output_dir: PathBuf,
    /// Alias prefix used in rewritten `@use` statements.
    pub style_alias_root: String,
    /// Component file names excluded from processing.
    pub exclude_files: Vec<String>,
    /// Where the configuration was loaded from (or looked for).
    pub config_file: PathBuf,
    /// `source_dir` resolved against the anchor directory.
    pub source_dir_full: PathBuf,
    /// `output_dir` resolved against the anchor directory.
    pub output_dir_full: PathBuf,
}

pub fn load(explicit: Option<&Path>) -> ExtractConfig {
    let config_path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    println!("looking for config {}", config_path.display());
    let overrides = read_overrides(&config_path);
    resolve(overrides, &anchor_dir(), &config_path)
}

fn read_overrides(path: &Path) -> Option<Map<String, Value>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => {
            println!(
                "configuration file {} not found; using defaults",
                path.display()
            );
            return None;
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => {
            println!("loaded configuration from {}", path.display());
            Some(map)
        }
        Ok(_) => {
            println!(
                "configuration in {} is not a JSON object; using defaults",
                path.display()
            );
            None
        }
        Err(err) => {
            println!("failed to parse {}: {err}; using defaults", path.display());
            None
        }
    }
}

fn resolve(
    overrides: Option<Map<String, Value>>,
    anchor: &Path,
    config_path: &Path,
) -> ExtractConfig {
    let mut source_dir = PathBuf::from(DEFAULT_SOURCE_DIR);
    let mut output_dir = PathBuf::from(DEFAULT_OUTPUT_DIR);
    let mut style_alias_root = DEFAULT_ALIAS_ROOT.to_string();
    let mut exclude_files = Vec::new();

    if let Some(map) = overrides {
        for (key, value) in map {
            match (camel_case_key(&key).as_str(), value) {
                ("sourceDir", Value::String(dir)) => source_dir = PathBuf::from(dir),
                ("outputDir", Value::String(dir)) => output_dir = PathBuf::from(dir),
                ("styleAliasRoot", Value::String(alias)) => style_alias_root = alias,
                ("excludeFiles", value) => exclude_files = string_list(value),
                // unknown keys are tolerated
                _ => {}
            }
        }
    }

    ExtractConfig {
        source_dir_full: resolve_against(anchor, &source_dir),
        output_dir_full: resolve_against(anchor, &output_dir),
        source_dir,
        output_dir,
        style_alias_root,
        exclude_files,
        config_file: config_path.to_path_buf(),
    }
}

/// Normalizes `snake_case`/`kebab-case` keys to camelCase: the letter after
/// each separator is uppercased and the separator dropped.
fn camel_case_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '-' || ch == '_' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    chars.next();
                    out.extend(next.to_uppercase());
                    continue;
                }
            }
        }
        out.push(ch);
    }
    out
}

/// A non-sequence value falls back to the default empty list.
fn string_list(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(name),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn resolve_against(anchor: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        anchor.join(path)
    }
}

/// The fixed anchor for directory resolution: the executable's directory,
/// falling back to the invocation cwd.
fn anchor_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
