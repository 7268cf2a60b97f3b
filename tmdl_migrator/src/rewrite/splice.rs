//! Header-promotion splicing
//!
//! Once the source is a database table the `Table.PromoteHeaders` step is
//! redundant: its line is dropped and whatever consumed it now consumes its input.
//! When the dropped binding was the last one before `in`, the binding above it
//! keeps its trailing comma.

use super::rename::{rename_step, CaseMode};
use regex::Regex;
use std::sync::LazyLock;

static PROMOTE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*(#"[^"]*"|\w+)[ \t]*=\s*Table\.PromoteHeaders\(\s*(#"[^"]*"|\w+)\s*,[^)]*\),?[ \t]*(?:\r?\n|$)"#,
    )
    .unwrap()
});

/// The step that was removed and the step its consumers now point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splice {
    pub step: String,
    pub input: String,
    pub references_renamed: usize,
}

/// Remove every header-promotion binding, one at a time, so chained steps
/// collapse onto the first input
pub fn splice_header_steps(body: &str) -> (String, Vec<Splice>) {
    let mut text = body.to_string();
    let mut splices = Vec::new();

    // Each pass removes one line, so the loop ends.
    while let (next, Some(splice)) = splice_header_step(&text) {
        text = next;
        splices.push(splice);
    }

    (text, splices)
}

/// Remove the first header-promotion binding and re-point its consumers.
/// The body comes back unchanged when there is none.
pub fn splice_header_step(body: &str) -> (String, Option<Splice>) {
    let Some(caps) = PROMOTE_LINE_RE.captures(body) else {
        return (body.to_string(), None);
    };

    let (Some(line), Some(step), Some(input)) = (caps.get(0), caps.get(1), caps.get(2)) else {
        return (body.to_string(), None);
    };

    let mut without = String::with_capacity(body.len());
    without.push_str(&body[..line.start()]);
    without.push_str(&body[line.end()..]);

    let (renamed, count) = if step.as_str() == input.as_str() {
        (without, 0)
    } else {
        rename_step(&without, step.as_str(), input.as_str(), CaseMode::Sensitive)
    };

    (
        renamed,
        Some(Splice {
            step: step.as_str().to_string(),
            input: input.as_str().to_string(),
            references_renamed: count,
        }),
    )
}
