//! Style-block migration and extraction planning.
//!
//! Pure planning: callers decide where the rewritten document and any
//! extracted stylesheet get written.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::sfc;

static LANG_TYPE_ATTRS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s*(?:lang|type)=["'][^"']+["']\s*"#).expect("valid attribute pattern")
});
static IMPORT_PRESENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+(?:"[^"]+"|'[^']+')"#).expect("valid import test pattern")
});
static IMPORT_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)@import\s+(?:"([^"]+)"|'([^']+)')\s*;"#).expect("valid import pattern")
});
static STYLE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:scss|sass)$").expect("valid extension pattern"));
static PARTIAL_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/_([^/]+)$").expect("valid partial pattern"));

/// Classification of one line inside a style-block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    Use,
    Import,
    Rule,
}

pub fn classify_line(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if trimmed.starts_with("@use") {
        return LineKind::Use;
    }
    if trimmed.starts_with("@import") {
        return LineKind::Import;
    }
    if trimmed.starts_with("//") {
        return LineKind::Comment;
    }
    if trimmed.starts_with("/*") && trimmed.ends_with("*/") {
        return LineKind::Comment;
    }
    LineKind::Rule
}

/// Normalizes an `@import` path into a `@use` path: drops a trailing
/// stylesheet extension and the partial-file underscore convention.
pub fn use_path(import_path: &str) -> String {
    let no_ext = STYLE_EXTENSION.replace(import_path, "");
    let no_partial = PARTIAL_SEGMENT.replace(&no_ext, "/$1");
    match no_partial.strip_prefix('_') {
        Some(rest) => rest.to_string(),
        None => no_partial.into_owned(),
    }
}

/// Outcome of planning the rewrite for one component document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylePlan {
    /// The document has no style block.
    NoStyleBlock,
    /// Directive-only body without any `@import`; nothing to migrate.
    NothingToMigrate,
    /// Directive-only body whose `@import`s were rewritten to `@use` in place.
    Migrate { document: String },
    /// Real style rules, moved out to a standalone stylesheet.
    Extract {
        stylesheet: String,
        document: String,
    },
}

pub fn plan_rewrite(document: &str, base_name: &str, alias_root: &str) -> StylePlan {
    let Some(block) = sfc::find_style_block(document) else {
        return StylePlan::NoStyleBlock;
    };
    let body = block.body.trim();
    let directive_only = body
        .lines()
        .all(|line| !matches!(classify_line(line), LineKind::Rule));

    if directive_only && !body.is_empty() {
        if !IMPORT_PRESENT.is_match(body) {
            return StylePlan::NothingToMigrate;
        }
        let new_block = format!(
            "{}\n{}\n{}",
            opening_tag(block.attributes),
            rewrite_imports(body),
            block.closing_tag
        );
        return StylePlan::Migrate {
            document: splice(document, &block, &new_block),
        };
    }

    // A body with rule lines is extracted; so is an empty body.
    let new_block = format!(
        "{}\n  @use \"{alias_root}/{base_name}\" as *;\n{}",
        opening_tag(block.attributes),
        block.closing_tag
    );
    StylePlan::Extract {
        stylesheet: body.to_string(),
        document: splice(document, &block, &new_block),
    }
}

/// Rebuilds the opening tag: `lang`/`type` attributes dropped, `lang="scss"`
/// forced first, every other attribute kept in its original order.
fn opening_tag(attributes: &str) -> String {
    let cleaned = LANG_TYPE_ATTRS.replace_all(attributes, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "<style lang=\"scss\">".to_string()
    } else {
        format!("<style lang=\"scss\" {cleaned}>")
    }
}

fn rewrite_imports(body: &str) -> String {
    IMPORT_STATEMENT
        .replace_all(body, |caps: &Captures<'_>| {
            let path = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            format!("@use \"{}\" as *;", use_path(path))
        })
        .into_owned()
}

fn splice(document: &str, block: &sfc::StyleBlock<'_>, replacement: &str) -> String {
    let mut out = String::with_capacity(document.len() + replacement.len());
    out.push_str(&document[..block.start]);
    out.push_str(replacement);
    out.push_str(&document[block.end..]);
    out
}
