//! Flat-file (`Csv.Document`) sources
//!
//! Every `Source = Csv.Document(...)` site becomes a database connection, then
//! the `#"Promoted Headers"` step that followed the CSV read is replaced by a
//! direct table selection and its consumers are re-pointed at the new step.

use super::rename::{rename_step, CaseMode};
use super::ConnectionTarget;
use crate::config::compile_time::rewrite::MAX_CALL_SITES_PER_BLOCK;
use crate::scanner::find_call_end;
use regex::Regex;
use std::sync::LazyLock;

static CALL_HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Source\s*=\s*Csv\.Document\(").unwrap());

static HEADER_STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)#"Promoted Headers"\s*=\s*Table\.PromoteHeaders\(\s*Source\s*,[^)]*\)"#)
        .unwrap()
});

const HEADER_STEP_NAME: &str = "#\"Promoted Headers\"";

/// What the flat-file rewrite did to a body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatFileRewrite {
    pub body: String,
    pub sites_rewritten: usize,
    /// Sites the scanner could not bound; left as they were
    pub sites_unbounded: usize,
    /// Sites past the per-block limit; left as they were
    pub sites_over_limit: usize,
    pub step_name: String,
    pub header_step_replaced: bool,
    pub references_renamed: usize,
}

pub fn has_call_site(body: &str) -> bool {
    CALL_HEAD_RE.is_match(body)
}

/// Step name derived from the table name: spaces and parentheses removed
pub fn normalized_step_name(table: &str) -> String {
    table
        .chars()
        .filter(|c| !matches!(c, ' ' | '(' | ')'))
        .collect()
}

pub fn rewrite(body: &str, target: &ConnectionTarget, table: &str) -> FlatFileRewrite {
    let mut result = FlatFileRewrite::default();

    let sites: Vec<usize> = CALL_HEAD_RE.find_iter(body).map(|m| m.start()).collect();
    let within_limit = sites.len().min(MAX_CALL_SITES_PER_BLOCK);
    result.sites_over_limit = sites.len() - within_limit;

    let replacement = format!("Source = {}", target.connect_expression());
    let mut text = body.to_string();

    // Right to left, so earlier offsets stay valid as lengths change.
    for &start in sites[..within_limit].iter().rev() {
        match find_call_end(&text, start) {
            Some(end) => {
                text.replace_range(start..end, &replacement);
                result.sites_rewritten += 1;
            }
            None => result.sites_unbounded += 1,
        }
    }

    let step_name = normalized_step_name(table);
    let selection = format!("{} = {}", step_name, super::table_selection(table));

    if let Some(header) = HEADER_STEP_RE.find(&text) {
        text.replace_range(header.range(), &selection);
        result.header_step_replaced = true;
    }

    let (renamed, count) = rename_step(&text, HEADER_STEP_NAME, &step_name, CaseMode::Insensitive);
    result.body = renamed;
    result.references_renamed = count;
    result.step_name = step_name;

    result
}
