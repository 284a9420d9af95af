//! Comment stripping for stylesheet and script sources.
//!
//! Bounded scanners, not lexers: comment markers inside string literals are
//! still treated as comments. Both dialects are total over any input and
//! idempotent.

use crate::sfc;

/// Strips `//` line comments and `/* ... */` block comments from stylesheet
/// source. A block comment is removed only when the text between `/*` and
/// the first `*/` contains neither `!` nor a newline; `/*! ... */` markers
/// and multi-line comments survive.
pub fn strip_style_comments(input: &str) -> String {
    strip_comments(input, true)
}

/// Strips `//` line comments and `/* ... */` block comments from script
/// source unconditionally. An unterminated `/*` is left in place.
pub fn strip_script_comments(input: &str) -> String {
    strip_comments(input, false)
}

/// Applies the script dialect to the body of each `<script ...>` region of a
/// composite document, in document order. The tags and everything outside
/// the regions are untouched.
pub fn strip_vue_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut cursor = 0;
    for region in sfc::script_bodies(input) {
        out.push_str(&input[cursor..region.start]);
        out.push_str(&strip_script_comments(&input[region.clone()]));
        cursor = region.end;
    }
    out.push_str(&input[cursor..]);
    out
}

fn strip_comments(input: &str, keep_marked_blocks: bool) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    loop {
        let Some(pos) = rest.find('/') else {
            out.push_str(rest);
            break;
        };
        match rest.as_bytes().get(pos + 1) {
            Some(b'/') => {
                // line comment: drop to end of line, keep the newline
                out.push_str(&rest[..pos]);
                match rest[pos..].find('\n') {
                    Some(newline) => rest = &rest[pos + newline..],
                    None => break,
                }
            }
            Some(b'*') => match rest[pos + 2..].find("*/") {
                Some(offset) => {
                    let body = &rest[pos + 2..pos + 2 + offset];
                    let end = pos + 2 + offset + 2;
                    out.push_str(&rest[..pos]);
                    if keep_marked_blocks && (body.contains('!') || body.contains('\n')) {
                        out.push_str(&rest[pos..end]);
                    }
                    rest = &rest[end..];
                }
                None => {
                    // unterminated opener stays as written
                    out.push_str(&rest[..pos + 2]);
                    rest = &rest[pos + 2..];
                }
            },
            _ => {
                out.push_str(&rest[..pos + 1]);
                rest = &rest[pos + 1..];
            }
        }
    }
    out
}
