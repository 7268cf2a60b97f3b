//! Balanced call scanner
//!
//! Bounds a call expression such as `Csv.Document(File.Contents("a (1).csv"), [Delimiter=")"])`
//! without a regex: parentheses are only counted outside double-quoted literals,
//! and a backslash suppresses the meaning of the character after it.

/// Scanner state, kept separate so the walk reads as a small state machine
#[derive(Debug, Default, Clone, Copy)]
struct ScanState {
    in_quote: bool,
    escape_pending: bool,
    depth: usize,
    opened: bool,
}

/// Return the byte offset one past the `)` that closes the first call opened
/// at or after `start`, or `None` if the text ends before it closes.
pub fn find_call_end(text: &str, start: usize) -> Option<usize> {
    let tail = text.get(start..)?;
    let mut state = ScanState::default();

    for (offset, ch) in tail.char_indices() {
        if state.escape_pending {
            state.escape_pending = false;
            continue;
        }

        match ch {
            '\\' => state.escape_pending = true,
            '"' => state.in_quote = !state.in_quote,
            '(' if !state.in_quote => {
                state.depth += 1;
                state.opened = true;
            }
            ')' if !state.in_quote && state.opened => {
                state.depth -= 1;
                if state.depth == 0 {
                    return Some(start + offset + ch.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounded<'a>(text: &'a str, start: usize) -> Option<&'a str> {
        find_call_end(text, start).map(|end| &text[start..end])
    }

    #[test]
    fn simple_call() {
        let text = r#"Source = Csv.Document(File.Contents("a.csv")), next"#;
        assert_eq!(
            bounded(text, 0),
            Some(r#"Source = Csv.Document(File.Contents("a.csv"))"#)
        );
    }

    #[test]
    fn parens_inside_literals_are_ignored() {
        let text = r#"Csv.Document(File.Contents("C:/data/q(1).csv"), [Delimiter=")", Columns=3]) rest"#;
        let end = find_call_end(text, 0).unwrap();
        assert_eq!(&text[end..], " rest");
    }

    #[test]
    fn escaped_quote_does_not_close_literal() {
        let text = r#"Csv.Document("say \" ) still quoted") tail"#;
        let end = find_call_end(text, 0).unwrap();
        assert_eq!(&text[end..], " tail");
    }

    #[test]
    fn escape_outside_quotes_suppresses_paren() {
        let text = r"f(a \) b) tail";
        let end = find_call_end(text, 0).unwrap();
        assert_eq!(&text[end..], " tail");
    }

    #[test]
    fn nested_calls() {
        let text = "Table.Combine({f(g(1), h(2)), k()}) after";
        let end = find_call_end(text, 0).unwrap();
        assert_eq!(&text[end..], " after");
    }

    #[test]
    fn unbalanced_call_is_not_found() {
        assert_eq!(find_call_end("Csv.Document(File.Contents(\"a.csv\")", 0), None);
        assert_eq!(find_call_end("Csv.Document(\"unterminated)", 0), None);
    }

    #[test]
    fn stray_close_before_open_is_ignored() {
        let text = ") f(x) tail";
        let end = find_call_end(text, 0).unwrap();
        assert_eq!(&text[end..], " tail");
    }

    #[test]
    fn start_offset_is_respected() {
        let text = "a(1), b(2)";
        assert_eq!(bounded(text, 6), Some("b(2)"));
        assert_eq!(find_call_end(text, 100), None);
    }

    #[test]
    fn multibyte_text_is_handled() {
        let text = "Csv.Document(\"données (été).csv\") ok";
        let end = find_call_end(text, 0).unwrap();
        assert_eq!(&text[end..], " ok");
    }
}
