//! Idempotent, atomic file commits.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Written,
    Unchanged,
}

/// Replaces `path` with `new_text` encoded via `encoding`. A byte-identical
/// candidate is a no-op. The write goes through a temp file plus rename so
/// the target is never left partially written.
pub fn commit(
    path: &Path,
    old_text: &str,
    new_text: &str,
    encoding: &'static Encoding,
    undo_dir: Option<&Path>,
) -> Result<CommitOutcome> {
    if new_text == old_text {
        return Ok(CommitOutcome::Unchanged);
    }
    if let Some(dir) = undo_dir {
        write_undo_patch(dir, path, old_text, new_text)?;
    }
    let (encoded, _, had_errors) = encoding.encode(new_text);
    if had_errors {
        println!(
            "warning: encoding fallback while writing {}; output may be lossy",
            path.display()
        );
    }
    write_via_temp(path, encoded.as_ref())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(CommitOutcome::Written)
}

/// Creates or overwrites a standalone file with UTF-8 text, creating parent
/// directories as needed.
pub fn commit_new(path: &Path, text: &str) -> Result<()> {
    write_via_temp(path, text.as_bytes()).with_context(|| format!("writing {}", path.display()))
}

fn write_via_temp(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;
    }
    let base_dir = parent.unwrap_or_else(|| Path::new("."));
    let unique = format!(
        ".sfctidy-tmp-{}-{}",
        std::process::id(),
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    );
    let temp_path = base_dir.join(unique);
    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("creating temp file {}", temp_path.display()))?;
        file.write_all(data)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("syncing temp file {}", temp_path.display()))?;
    }
    fs::rename(&temp_path, path).or_else(|err| {
        let _ = fs::remove_file(&temp_path);
        Err(err).with_context(|| format!("replacing {}", path.display()))
    })?;
    Ok(())
}

/// Writes a reverse unified patch; applying it restores the pre-commit text.
fn write_undo_patch(dir: &Path, path: &Path, old_text: &str, new_text: &str) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating undo dir {}", dir.display()))?;
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".into());
    let file_name = format!("{timestamp}_{}.patch", sanitize_path(path));
    let patch_path = dir.join(file_name);
    let patch = diffy::create_patch(new_text, old_text);
    fs::write(&patch_path, patch.to_string())
        .with_context(|| format!("writing undo patch {}", patch_path.display()))?;
    Ok(())
}

fn sanitize_path(path: &Path) -> String {
    path.display()
        .to_string()
        .chars()
        .map(|ch| match ch {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            _ => ch,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::UTF_8;
    use tempfile::tempdir;

    #[test]
    fn identical_candidate_is_a_noop() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("a.scss");
        fs::write(&path, "body {}").expect("write");

        let outcome = commit(&path, "body {}", "body {}", UTF_8, None).expect("commit");
        assert_eq!(outcome, CommitOutcome::Unchanged);
        assert_eq!(fs::read_to_string(&path).expect("read"), "body {}");
    }

    #[test]
    fn commit_replaces_content() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("a.scss");
        fs::write(&path, "old").expect("write");

        let outcome = commit(&path, "old", "new", UTF_8, None).expect("commit");
        assert_eq!(outcome, CommitOutcome::Written);
        assert_eq!(fs::read_to_string(&path).expect("read"), "new");
    }

    #[test]
    fn commit_records_reverse_patch() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("a.scss");
        let undo = temp.path().join("undo");
        fs::write(&path, "old\n").expect("write");

        commit(&path, "old\n", "new\n", UTF_8, Some(&undo)).expect("commit");

        let patches: Vec<_> = fs::read_dir(&undo)
            .expect("undo dir")
            .filter_map(|entry| entry.ok())
            .collect();
        assert_eq!(patches.len(), 1);
        let body = fs::read_to_string(patches[0].path()).expect("patch");
        assert!(body.contains("-new"));
        assert!(body.contains("+old"));
    }

    #[test]
    fn commit_new_creates_parent_directories() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("styles").join("Card.scss");

        commit_new(&path, ".btn { color: red; }").expect("commit");
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            ".btn { color: red; }"
        );
    }

    #[test]
    fn sanitize_flattens_separators() {
        assert_eq!(sanitize_path(Path::new("a/b\\c:d")), "a_b_c_d");
    }
}
