//! Bounded scanners for tag-delimited regions of component documents.
//!
//! Deliberately not a parser: first match only for style blocks, no nested
//! blocks, and quotes inside attribute text are not interpreted.

use std::ops::Range;

/// The first `<style ...>...</style>` block of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBlock<'a> {
    /// Byte offset of `<style`.
    pub start: usize,
    /// Byte offset one past the closing tag.
    pub end: usize,
    /// Raw attribute text between `<style` and the first `>`.
    pub attributes: &'a str,
    /// Raw body between the opening `>` and the closing tag.
    pub body: &'a str,
    /// The closing tag as written (case preserved).
    pub closing_tag: &'a str,
}

/// Locates the first style block, matching both tags ASCII case-insensitively.
pub fn find_style_block(document: &str) -> Option<StyleBlock<'_>> {
    let start = find_ignore_ascii_case(document, "<style", 0)?;
    let attrs_start = start + "<style".len();
    let tag_close = attrs_start + document[attrs_start..].find('>')?;
    let body_start = tag_close + 1;
    let close = find_ignore_ascii_case(document, "</style>", body_start)?;
    let end = close + "</style>".len();
    Some(StyleBlock {
        start,
        end,
        attributes: &document[attrs_start..tag_close],
        body: &document[body_start..close],
        closing_tag: &document[close..end],
    })
}

/// Byte ranges of every `<script ...>` body, in document order. The tag
/// match is case-sensitive; a region without a closing tag is ignored.
pub fn script_bodies(document: &str) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut from = 0;
    while let Some(open_rel) = document[from..].find("<script") {
        let open = from + open_rel;
        let Some(gt_rel) = document[open..].find('>') else {
            break;
        };
        let body_start = open + gt_rel + 1;
        let Some(close_rel) = document[body_start..].find("</script>") else {
            break;
        };
        let body_end = body_start + close_rel;
        regions.push(body_start..body_end);
        from = body_end + "</script>".len();
    }
    regions
}

fn find_ignore_ascii_case(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || hay.len() < needle.len() || from > hay.len() - needle.len() {
        return None;
    }
    (from..=hay.len() - needle.len())
        .find(|&idx| hay[idx..idx + needle.len()].eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_block_with_attributes() {
        let doc = "<template/>\n<style scoped lang=\"css\">\n.a {}\n</style>\n";
        let block = find_style_block(doc).expect("block");
        assert_eq!(block.attributes, " scoped lang=\"css\"");
        assert_eq!(block.body, "\n.a {}\n");
        assert_eq!(block.closing_tag, "</style>");
        assert_eq!(&doc[block.start..block.end], "<style scoped lang=\"css\">\n.a {}\n</style>");
    }

    #[test]
    fn matches_tags_case_insensitively() {
        let doc = "<STYLE SCOPED>.a {}</Style>";
        let block = find_style_block(doc).expect("block");
        assert_eq!(block.attributes, " SCOPED");
        assert_eq!(block.closing_tag, "</Style>");
    }

    #[test]
    fn only_the_first_block_is_reported() {
        let doc = "<style>.a {}</style><style>.b {}</style>";
        let block = find_style_block(doc).expect("block");
        assert_eq!(block.body, ".a {}");
        assert_eq!(&doc[block.end..], "<style>.b {}</style>");
    }

    #[test]
    fn missing_block_or_closing_tag_yields_none() {
        assert!(find_style_block("<template/>").is_none());
        assert!(find_style_block("<style scoped>.a {}").is_none());
    }

    #[test]
    fn script_bodies_in_document_order() {
        let doc = "<script setup>one</script><p/><script>two</script>";
        let bodies: Vec<_> = script_bodies(doc)
            .into_iter()
            .map(|range| &doc[range])
            .collect();
        assert_eq!(bodies, vec!["one", "two"]);
    }

    #[test]
    fn script_without_closing_tag_is_ignored() {
        assert!(script_bodies("<script>never closed").is_empty());
    }
}
