//! Partition gate and source block extraction
//!
//! A table definition is only eligible when it declares `partition <name> = m`.
//! The first `source =` line of an eligible document opens the block that the
//! rewriters work on; it runs to the next line starting with `annotation`, or
//! to the end of the document.

use regex::Regex;
use std::sync::LazyLock;

static PARTITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*partition\s+(?:"[^"]+"|'[^']+'|\S+)\s*=\s*m\b"#).unwrap()
});

static SOURCE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*source[ \t]*=").unwrap());

static BLOCK_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*annotation").unwrap());

/// The four slices of a document around its source block.
/// `before + prefix + body + after` is the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceBlock<'a> {
    pub before: &'a str,
    pub prefix: &'a str,
    pub body: &'a str,
    pub after: &'a str,
}

impl<'a> SourceBlock<'a> {
    /// Rebuild the document with a new body; everything else is copied verbatim
    pub fn reassemble(&self, body: &str) -> String {
        let mut out = String::with_capacity(
            self.before.len() + self.prefix.len() + body.len() + self.after.len(),
        );
        out.push_str(self.before);
        out.push_str(self.prefix);
        out.push_str(body);
        out.push_str(self.after);
        out
    }
}

/// What the extractor found in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction<'a> {
    /// No `partition <name> = m` line
    Ineligible,
    /// Eligible, but there is no `source =` line to rewrite
    NoBlock,
    Block(SourceBlock<'a>),
}

/// Whether the document declares an M-expression partition
pub fn has_partition_marker(document: &str) -> bool {
    PARTITION_RE.is_match(document)
}

pub fn extract(document: &str) -> Extraction<'_> {
    if !has_partition_marker(document) {
        return Extraction::Ineligible;
    }

    let Some(prefix) = SOURCE_PREFIX_RE.find(document) else {
        return Extraction::NoBlock;
    };

    let body_start = prefix.end();
    let body_end = BLOCK_END_RE
        .find_at(document, body_start)
        .map(|m| m.start())
        .unwrap_or(document.len());

    Extraction::Block(SourceBlock {
        before: &document[..prefix.start()],
        prefix: prefix.as_str(),
        body: &document[body_start..body_end],
        after: &document[body_end..],
    })
}
