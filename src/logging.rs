use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const LOG_DIR: &str = ".sfctidy";
const LOG_FILE: &str = "change_log.jsonl";
const MAX_ENTRIES: usize = 500;

#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub timestamp: String,
    pub flow: String,
    pub path: String,
    pub action: String,
    pub detail: String,
}

pub fn record_change(flow: &str, path: &Path, action: &str, detail: &str) -> Result<()> {
    let log_path = ensure_log_file()?;
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".into());
    let entry = ChangeLogEntry {
        timestamp,
        flow: flow.to_string(),
        path: path.display().to_string(),
        action: action.to_string(),
        detail: detail.to_string(),
    };
    let json = serde_json::to_string(&entry)?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;
    writeln!(file, "{json}")?;
    truncate_log(&log_path)?;
    Ok(())
}

/// Reads the whole journal; a missing file is an empty journal. Lines that
/// fail to parse are skipped.
pub fn read_all() -> Result<Vec<ChangeLogEntry>> {
    read_from(&PathBuf::from(LOG_DIR).join(LOG_FILE))
}

fn read_from(log_path: &Path) -> Result<Vec<ChangeLogEntry>> {
    if !log_path.exists() {
        return Ok(Vec::new());
    }
    let file = fs::File::open(log_path)
        .with_context(|| format!("opening {}", log_path.display()))?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Ok(entry) = serde_json::from_str(&line) {
            entries.push(entry);
        }
    }
    Ok(entries)
}

fn ensure_log_file() -> Result<PathBuf> {
    let dir = PathBuf::from(LOG_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(dir.join(LOG_FILE))
}

fn truncate_log(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let reader = BufReader::new(file);
    let lines: Vec<_> = reader.lines().collect::<Result<_, _>>()?;
    if lines.len() <= MAX_ENTRIES {
        return Ok(());
    }
    let keep = &lines[lines.len() - MAX_ENTRIES..];
    fs::write(path, keep.join("\n") + "\n")?;
    Ok(())
}
