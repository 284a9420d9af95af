use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use encoding_rs::UTF_8;
use is_terminal::IsTerminal;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

mod comments;
mod config;
mod confirm;
mod diff;
mod encoding;
mod files;
mod logging;
mod sfc;
mod style;
mod writer;

use config::ExtractConfig;
use confirm::{ReviewOutcome, Session};
use diff::DiffConfig;
use encoding::EncodingStrategy;
use files::{FileEntry, WalkOptions};
use style::StylePlan;

/// The legacy refactor script this tool replaces; never processed.
const STRIP_SELF_EXCLUSION: &str = "remove-comments-confirm.ts";

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Default)]
enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn should_color(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stdout().is_terminal(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Strip(cmd) => handle_strip(cmd),
        Command::Extract(cmd) => handle_extract(cmd),
        Command::Log(cmd) => handle_log(cmd),
    }
}

fn handle_strip(cmd: StripCommand) -> Result<()> {
    let encoding = EncodingStrategy::new(cmd.encoding.as_deref())?;
    let diff_config = DiffConfig {
        context: cmd.context,
        colorize: cmd.color.should_color(),
    };
    let mut session = Session::new(cmd.auto_apply);
    let mut stats = FlowStats::default();
    let stdin = io::stdin();
    let mut input = stdin.lock();

    println!(
        "starting interactive comment removal under {}",
        cmd.root.display()
    );

    let style_files = files::walk_tree(
        &cmd.root,
        &WalkOptions {
            extensions: &["scss"],
            exclude_names: &[],
            exclude_globs: &cmd.exclude,
        },
    )?;
    println!("processing {} stylesheet file(s)...", style_files.len());
    if !process_batch(
        &style_files,
        &encoding,
        &mut session,
        &mut input,
        &diff_config,
        cmd.undo_log.as_deref(),
        &mut stats,
    )? {
        return Ok(());
    }

    let script_files = files::walk_tree(
        &cmd.root,
        &WalkOptions {
            extensions: &["vue", "ts"],
            exclude_names: &[STRIP_SELF_EXCLUSION],
            exclude_globs: &cmd.exclude,
        },
    )?;
    println!(
        "processing {} component and script file(s)...",
        script_files.len()
    );
    if !process_batch(
        &script_files,
        &encoding,
        &mut session,
        &mut input,
        &diff_config,
        cmd.undo_log.as_deref(),
        &mut stats,
    )? {
        return Ok(());
    }

    stats.print("strip");
    Ok(())
}

/// Runs one batch to completion. Returns false when the operator quit; the
/// per-file read/transform/confirm/write sequence never overlaps between
/// files.
fn process_batch(
    entries: &[FileEntry],
    encoding: &EncodingStrategy,
    session: &mut Session,
    input: &mut dyn BufRead,
    diff_config: &DiffConfig,
    undo_log: Option<&Path>,
    stats: &mut FlowStats,
) -> Result<bool> {
    for entry in entries {
        match strip_file(entry, encoding, session, input, diff_config, undo_log, stats) {
            Ok(true) => {}
            Ok(false) => {
                println!("stopping at operator request.");
                return Ok(false);
            }
            Err(err) => {
                println!("error processing {}: {err:#}", entry.path.display());
                stats.failed += 1;
            }
        }
    }
    Ok(true)
}

fn strip_file(
    entry: &FileEntry,
    encoding: &EncodingStrategy,
    session: &mut Session,
    input: &mut dyn BufRead,
    diff_config: &DiffConfig,
    undo_log: Option<&Path>,
    stats: &mut FlowStats,
) -> Result<bool> {
    if entry.metadata.is_probably_binary {
        println!("skipping {} (suspected binary file)", entry.path.display());
        stats.no_op += 1;
        return Ok(true);
    }

    let bytes =
        fs::read(&entry.path).with_context(|| format!("reading {}", entry.path.display()))?;
    let decoded = encoding.decode(&bytes);
    if decoded.had_errors {
        println!(
            "warning: decoding errors in {}; continuing",
            entry.path.display()
        );
    }

    let candidate = candidate_for(&entry.path, &decoded.text);
    match confirm::review_change(
        session,
        &entry.path,
        &decoded.text,
        &candidate,
        input,
        diff_config,
    )? {
        ReviewOutcome::NoChange => stats.no_op += 1,
        ReviewOutcome::Apply | ReviewOutcome::AutoApply => {
            writer::commit(
                &entry.path,
                &decoded.text,
                &candidate,
                decoded.decision.encoding,
                undo_log,
            )?;
            println!("saved {}", entry.path.display());
            stats.applied += 1;
            let _ = logging::record_change(
                "strip",
                &entry.path,
                "applied",
                &diff::summarize_lines(&decoded.text, &candidate),
            );
        }
        ReviewOutcome::Skip => {
            stats.skipped += 1;
            let _ = logging::record_change(
                "strip",
                &entry.path,
                "skipped",
                &diff::summarize_lines(&decoded.text, &candidate),
            );
        }
        ReviewOutcome::Quit => return Ok(false),
    }
    Ok(true)
}

fn candidate_for(path: &Path, text: &str) -> String {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("scss") => comments::strip_style_comments(text),
        Some(ext) if ext.eq_ignore_ascii_case("vue") => comments::strip_vue_comments(text),
        _ => comments::strip_script_comments(text),
    }
}

fn handle_extract(cmd: ExtractCommand) -> Result<()> {
    println!("starting style extraction and migration");
    let cfg = config::load(cmd.config.as_deref());
    fs::create_dir_all(&cfg.output_dir_full).with_context(|| {
        format!(
            "creating output directory {}",
            cfg.output_dir_full.display()
        )
    })?;

    let entries = files::walk_tree(
        &cfg.source_dir_full,
        &WalkOptions {
            extensions: &["vue"],
            exclude_names: &[],
            exclude_globs: &[],
        },
    )?;
    if entries.is_empty() {
        println!("no .vue files found in {}", cfg.source_dir_full.display());
        return Ok(());
    }
    println!("found {} component file(s) to process", entries.len());
    if !cfg.exclude_files.is_empty() {
        println!("excluding: {}", cfg.exclude_files.join(", "));
    }

    let mut stats = FlowStats::default();
    for entry in &entries {
        match extract_one(&entry.path, &cfg) {
            Ok(ExtractAction::Migrated) | Ok(ExtractAction::Extracted) => stats.applied += 1,
            Ok(ExtractAction::Excluded) => stats.skipped += 1,
            Ok(ExtractAction::NoStyleBlock) | Ok(ExtractAction::NothingToMigrate) => {
                stats.no_op += 1
            }
            Err(err) => {
                println!("error processing {}: {err:#}", entry.path.display());
                stats.failed += 1;
            }
        }
    }
    stats.print("extract");
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractAction {
    Excluded,
    NoStyleBlock,
    NothingToMigrate,
    Migrated,
    Extracted,
}

fn extract_one(path: &Path, cfg: &ExtractConfig) -> Result<ExtractAction> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if cfg.exclude_files.iter().any(|name| name == file_name) {
        println!("excluding {file_name} (listed in excludeFiles)");
        return Ok(ExtractAction::Excluded);
    }
    let base_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

    match style::plan_rewrite(&content, &base_name, &cfg.style_alias_root) {
        StylePlan::NoStyleBlock => {
            println!("no style block found in {base_name}");
            Ok(ExtractAction::NoStyleBlock)
        }
        StylePlan::NothingToMigrate => {
            println!(
                "style block in {base_name}.vue contains only @use/comments; nothing to migrate"
            );
            Ok(ExtractAction::NothingToMigrate)
        }
        StylePlan::Migrate { document } => {
            writer::commit(path, &content, &document, UTF_8, None)?;
            println!("migrated @import to @use in {base_name}.vue");
            let _ = logging::record_change("extract", path, "migrated", "@import -> @use");
            Ok(ExtractAction::Migrated)
        }
        StylePlan::Extract {
            stylesheet,
            document,
        } => {
            let target = cfg.output_dir_full.join(format!("{base_name}.scss"));
            writer::commit_new(&target, &stylesheet)?;
            println!("extracted styles to {}", target.display());
            writer::commit(path, &content, &document, UTF_8, None)?;
            println!("rewrote {base_name}.vue to @use the extracted stylesheet");
            let _ = logging::record_change(
                "extract",
                path,
                "extracted",
                "styles moved to sibling stylesheet",
            );
            Ok(ExtractAction::Extracted)
        }
    }
}

fn handle_log(cmd: LogCommand) -> Result<()> {
    let mut entries = logging::read_all()?;
    if let Some(ref raw) = cmd.since {
        let min = OffsetDateTime::parse(raw, &Rfc3339)
            .with_context(|| format!("parsing --since '{raw}' as RFC3339 timestamp"))?;
        entries.retain(|entry| {
            OffsetDateTime::parse(&entry.timestamp, &Rfc3339)
                .map(|ts| ts >= min)
                .unwrap_or(false)
        });
    }
    if entries.is_empty() {
        println!("change log is empty.");
        return Ok(());
    }
    let start = entries.len().saturating_sub(cmd.tail);
    for entry in &entries[start..] {
        println!(
            "[{}] {:<8} {:<10} {:<10} {}",
            entry.timestamp, entry.flow, entry.action, entry.detail, entry.path
        );
    }
    Ok(())
}

#[derive(Default)]
struct FlowStats {
    applied: usize,
    skipped: usize,
    no_op: usize,
    failed: usize,
}

impl FlowStats {
    fn print(&self, label: &str) {
        println!(
            "{label} summary: applied={}, skipped={}, no-op={}, failed={}",
            self.applied, self.skipped, self.no_op, self.failed
        );
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sfctidy",
    version,
    about = "Interactive comment stripping and style-block migration for component trees"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactively strip comments from .scss, .vue, and .ts files.
    Strip(StripCommand),
    /// Extract style blocks to standalone stylesheets and migrate @import to @use.
    Extract(ExtractCommand),
    /// Show recent change-journal entries.
    Log(LogCommand),
}

#[derive(Debug, Args)]
struct StripCommand {
    #[arg(long = "root", default_value = ".", value_hint = ValueHint::DirPath)]
    root: PathBuf,
    #[arg(long = "yes", action = ArgAction::SetTrue)]
    auto_apply: bool,
    #[arg(long, default_value_t = 3)]
    context: usize,
    #[arg(long = "color", value_enum, default_value = "auto")]
    color: ColorChoice,
    #[arg(long, value_name = "ENCODING")]
    encoding: Option<String>,
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,
    #[arg(long = "undo-log", value_name = "DIR", value_hint = ValueHint::DirPath)]
    undo_log: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ExtractCommand {
    #[arg(long = "config", value_name = "FILE", value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct LogCommand {
    #[arg(long = "tail", default_value_t = 20)]
    tail: usize,
    #[arg(long = "since", value_name = "RFC3339")]
    since: Option<String>,
}

#[cfg(test)]
mod strip_flow_tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn walk_scss(root: &Path) -> Vec<FileEntry> {
        files::walk_tree(
            root,
            &WalkOptions {
                extensions: &["scss"],
                exclude_names: &[],
                exclude_globs: &[],
            },
        )
        .expect("walk")
    }

    fn run_batch(entries: &[FileEntry], session: &mut Session, input: &str) -> bool {
        let encoding = EncodingStrategy::new(None).expect("strategy");
        let diff_config = DiffConfig {
            context: 3,
            colorize: false,
        };
        let mut stats = FlowStats::default();
        let mut cursor = Cursor::new(input.to_string());
        process_batch(
            entries,
            &encoding,
            session,
            &mut cursor,
            &diff_config,
            None,
            &mut stats,
        )
        .expect("batch")
    }

    #[test]
    fn quit_leaves_current_and_later_files_unwritten() {
        let temp = tempdir().expect("temp dir");
        let first = temp.path().join("a.scss");
        let second = temp.path().join("b.scss");
        fs::write(&first, "// gone\n.a {}\n").expect("write");
        fs::write(&second, "// gone\n.b {}\n").expect("write");

        let entries = walk_scss(temp.path());
        let mut session = Session::default();
        let finished = run_batch(&entries, &mut session, "q\n");

        assert!(!finished);
        assert!(session.quit);
        assert_eq!(fs::read_to_string(&first).expect("read"), "// gone\n.a {}\n");
        assert_eq!(
            fs::read_to_string(&second).expect("read"),
            "// gone\n.b {}\n"
        );
    }

    #[test]
    fn accept_all_answer_covers_the_rest_of_the_run() {
        let temp = tempdir().expect("temp dir");
        let first = temp.path().join("a.scss");
        let second = temp.path().join("b.scss");
        fs::write(&first, "// gone\n.a {}\n").expect("write");
        fs::write(&second, "// gone\n.b {}\n").expect("write");

        let entries = walk_scss(temp.path());
        let mut session = Session::default();
        // one answer only; the second file must not prompt
        let finished = run_batch(&entries, &mut session, "a\n");

        assert!(finished);
        assert!(session.accept_all);
        assert_eq!(fs::read_to_string(&first).expect("read"), "\n.a {}\n");
        assert_eq!(fs::read_to_string(&second).expect("read"), "\n.b {}\n");
    }

    #[test]
    fn skip_answer_continues_to_later_files() {
        let temp = tempdir().expect("temp dir");
        let first = temp.path().join("a.scss");
        let second = temp.path().join("b.scss");
        fs::write(&first, "// gone\n.a {}\n").expect("write");
        fs::write(&second, "// gone\n.b {}\n").expect("write");

        let entries = walk_scss(temp.path());
        let mut session = Session::default();
        let finished = run_batch(&entries, &mut session, "n\ny\n");

        assert!(finished);
        assert_eq!(fs::read_to_string(&first).expect("read"), "// gone\n.a {}\n");
        assert_eq!(fs::read_to_string(&second).expect("read"), "\n.b {}\n");
    }

    #[test]
    fn unchanged_files_need_no_input() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("clean.scss");
        fs::write(&path, ".a { color: red; }\n").expect("write");

        let entries = walk_scss(temp.path());
        let mut session = Session::default();
        let finished = run_batch(&entries, &mut session, "");

        assert!(finished);
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            ".a { color: red; }\n"
        );
    }

    #[test]
    fn dialect_dispatch_follows_extension() {
        assert_eq!(
            candidate_for(Path::new("a.scss"), "/*! keep */ .a {} // tail\n"),
            "/*! keep */ .a {} \n"
        );
        assert_eq!(
            candidate_for(Path::new("a.ts"), "let x = 1; /*! gone */\n"),
            "let x = 1; \n"
        );
        assert_eq!(
            candidate_for(Path::new("A.vue"), "<p>// kept</p><script>// gone\n</script>"),
            "<p>// kept</p><script>\n</script>"
        );
    }
}

#[cfg(test)]
mod extract_flow_tests {
    use super::*;
    use tempfile::tempdir;

    fn test_config(root: &Path) -> ExtractConfig {
        ExtractConfig {
            source_dir: PathBuf::from("components"),
            output_dir: PathBuf::from("styles"),
            style_alias_root: "@/styles/components".to_string(),
            exclude_files: Vec::new(),
            config_file: PathBuf::from(config::CONFIG_FILE_NAME),
            source_dir_full: root.join("components"),
            output_dir_full: root.join("styles"),
        }
    }

    #[test]
    fn extracts_real_styles_to_sibling_stylesheet() {
        let temp = tempdir().expect("temp dir");
        let cfg = test_config(temp.path());
        fs::create_dir_all(&cfg.source_dir_full).expect("source dir");
        let card = cfg.source_dir_full.join("Card.vue");
        fs::write(
            &card,
            "<template/>\n<style scoped>\n.btn { color: red; }\n</style>\n",
        )
        .expect("write");

        let action = extract_one(&card, &cfg).expect("extract");
        assert_eq!(action, ExtractAction::Extracted);
        assert_eq!(
            fs::read_to_string(cfg.output_dir_full.join("Card.scss")).expect("scss"),
            ".btn { color: red; }"
        );
        assert_eq!(
            fs::read_to_string(&card).expect("vue"),
            "<template/>\n<style lang=\"scss\" scoped>\n  @use \"@/styles/components/Card\" as *;\n</style>\n"
        );
    }

    #[test]
    fn migration_is_idempotent() {
        let temp = tempdir().expect("temp dir");
        let cfg = test_config(temp.path());
        fs::create_dir_all(&cfg.source_dir_full).expect("source dir");
        let widget = cfg.source_dir_full.join("Widget.vue");
        fs::write(
            &widget,
            "<template/>\n<style scoped>\n@import \"./_vars.scss\";\n</style>\n",
        )
        .expect("write");

        assert_eq!(
            extract_one(&widget, &cfg).expect("first pass"),
            ExtractAction::Migrated
        );
        let migrated = fs::read_to_string(&widget).expect("read");
        assert!(migrated.contains("@use \"./vars\" as *;"));

        assert_eq!(
            extract_one(&widget, &cfg).expect("second pass"),
            ExtractAction::NothingToMigrate
        );
        assert_eq!(fs::read_to_string(&widget).expect("read"), migrated);
    }

    #[test]
    fn excluded_files_are_skipped_before_reading() {
        let temp = tempdir().expect("temp dir");
        let mut cfg = test_config(temp.path());
        cfg.exclude_files = vec!["BaseLayout.vue".to_string()];
        // no file on disk: exclusion must resolve before any read
        let action = extract_one(&cfg.source_dir_full.join("BaseLayout.vue"), &cfg)
            .expect("excluded");
        assert_eq!(action, ExtractAction::Excluded);
    }

    #[test]
    fn document_without_style_block_is_a_noop() {
        let temp = tempdir().expect("temp dir");
        let cfg = test_config(temp.path());
        fs::create_dir_all(&cfg.source_dir_full).expect("source dir");
        let bare = cfg.source_dir_full.join("Bare.vue");
        fs::write(&bare, "<template><p/></template>\n").expect("write");

        assert_eq!(
            extract_one(&bare, &cfg).expect("noop"),
            ExtractAction::NoStyleBlock
        );
        assert_eq!(
            fs::read_to_string(&bare).expect("read"),
            "<template><p/></template>\n"
        );
    }
}
