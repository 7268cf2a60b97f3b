//! Word-bounded step renaming

use std::borrow::Cow;

/// How step names are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Sensitive,
    /// ASCII case folding; step names in practice are ASCII
    Insensitive,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_free_standing(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !is_word_char(c));
    let after_ok = text[end..]
        .chars()
        .next()
        .map_or(true, |c| !is_word_char(c));
    before_ok && after_ok
}

/// Replace every occurrence of `name` that is not glued to a word character
/// on either side. Returns the new text and the number of replacements.
pub fn rename_step(text: &str, name: &str, replacement: &str, case: CaseMode) -> (String, usize) {
    if name.is_empty() {
        return (text.to_string(), 0);
    }

    // ASCII folding keeps byte offsets identical between haystack and text.
    let (haystack, needle): (Cow<str>, Cow<str>) = match case {
        CaseMode::Sensitive => (Cow::Borrowed(text), Cow::Borrowed(name)),
        CaseMode::Insensitive => (
            Cow::Owned(text.to_ascii_lowercase()),
            Cow::Owned(name.to_ascii_lowercase()),
        ),
    };

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;
    let mut count = 0;

    while let Some(found) = haystack[pos..].find(needle.as_ref()).map(|i| i + pos) {
        let end = found + needle.len();

        if is_free_standing(text, found, end) {
            out.push_str(&text[copied..found]);
            out.push_str(replacement);
            copied = end;
            pos = end;
            count += 1;
        } else {
            pos = found + text[found..].chars().next().map_or(1, char::len_utf8);
        }
    }

    out.push_str(&text[copied..]);
    (out, count)
}
