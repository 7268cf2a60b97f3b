//! Generic two-step source idiom
//!
//! ```text
//!     Source = Excel.Workbook(File.Contents("sales.xlsx"), null, true),
//!     Sales = Source{[Item="Sheet1",Kind="Sheet"]}[Data],
//! ```
//!
//! The `Source` line ends with a comma and the projection line below it starts
//! with the same indentation.

use super::ConnectionTarget;
use regex::Regex;
use std::sync::LazyLock;

static SOURCE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([ \t]*)Source\s*=\s*.+,[ \t]*\r?$").unwrap());

static PROJECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\A(.+?)\s*=\s*Source\{[^}]+\}\[Data\]").unwrap());

/// Location of a matched idiom inside a block body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoStepIdiom<'a> {
    /// Offset of the first byte of the `Source` line
    pub start: usize,
    /// Offset just past `[Data]` on the projection line
    pub end: usize,
    pub indent: &'a str,
    pub var: &'a str,
    pub line_ending: &'a str,
}

/// Find the first two-step idiom in `body`
pub fn find_idiom(body: &str) -> Option<TwoStepIdiom<'_>> {
    let mut line_start = 0;

    for line in body.split_inclusive('\n') {
        let next_start = line_start + line.len();

        if let Some(idiom) = match_at(body, line_start, line, next_start) {
            return Some(idiom);
        }

        line_start = next_start;
    }

    None
}

fn match_at<'a>(
    body: &'a str,
    line_start: usize,
    line: &'a str,
    next_start: usize,
) -> Option<TwoStepIdiom<'a>> {
    let content = line.strip_suffix('\n')?;
    let caps = SOURCE_LINE_RE.captures(content)?;
    let indent = caps.get(1)?.as_str();

    let next_line = body.get(next_start..)?;
    let projection = next_line.strip_prefix(indent)?;
    let proj = PROJECTION_RE.captures(projection)?;
    let var = proj.get(1)?.as_str();

    let line_ending = if content.ends_with('\r') { "\r\n" } else { "\n" };

    Some(TwoStepIdiom {
        start: line_start,
        end: next_start + indent.len() + proj.get(0)?.end(),
        indent,
        var,
        line_ending,
    })
}

/// Rewrite the first idiom to read the table straight from the database.
/// `None` when the body has no idiom.
pub fn rewrite(body: &str, target: &ConnectionTarget, table: &str) -> Option<String> {
    let idiom = find_idiom(body)?;

    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(&body[..idiom.start]);
    out.push_str(&format!(
        "{indent}Source = {connect},{eol}{indent}{var} = {selection}",
        indent = idiom.indent,
        connect = target.connect_expression(),
        eol = idiom.line_ending,
        var = idiom.var,
        selection = super::table_selection(table),
    ));
    out.push_str(&body[idiom.end..]);

    Some(out)
}
