use crate::FormulaError;

fn is_open_paren(ch: char) -> bool {
    matches!(ch, '(' | '{' | '[')
}

fn is_close_paren(ch: char) -> bool {
    matches!(ch, ')' | '}' | ']')
}

/// Check if text is a formula.
pub fn is_a_formula(text: &str) -> bool {
    text.trim_start().starts_with('=')
}

/// Byte index just past the quoted segment starting at `start`.
///
/// `start` must point at the opening quote (`"` for strings, `'` for sheet
/// names). Doubled quotes inside the segment are escapes. An unterminated
/// segment runs to the end of the text.
pub fn skip_quoted(text: &str, start: usize) -> usize {
    quoted_end(text, start).unwrap_or(text.len())
}

/// Like [`skip_quoted`], but `None` when the closing quote is missing.
pub fn quoted_end(text: &str, start: usize) -> Option<usize> {
    let quote = text[start..].chars().next()?;
    let base = start + quote.len_utf8();
    let mut chars = text[base..].char_indices().peekable();
    while let Some((offset, ch)) = chars.next() {
        if ch == quote {
            if matches!(chars.peek(), Some((_, next)) if *next == quote) {
                chars.next();
                continue;
            }
            return Some(base + offset + ch.len_utf8());
        }
    }
    None
}

/// Index of the bracket closing the one at `open`, honoring nesting and
/// skipping quoted segments. `None` when the text ends first.
pub fn find_matching_close(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut idx = open;
    while idx < text.len() {
        let ch = text[idx..].chars().next()?;
        if ch == '"' || ch == '\'' {
            idx = skip_quoted(text, idx);
            continue;
        }
        if is_open_paren(ch) {
            depth += 1;
        } else if is_close_paren(ch) {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(idx);
            }
        }
        idx += ch.len_utf8();
    }
    None
}

/// Split on any of `separators` at bracket depth zero, outside quotes.
pub fn split_top_level<'a>(text: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut last = 0;
    let mut idx = 0;
    while idx < text.len() {
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        if ch == '"' || ch == '\'' {
            idx = skip_quoted(text, idx);
            continue;
        }
        if is_open_paren(ch) {
            depth += 1;
        } else if is_close_paren(ch) {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && separators.contains(&ch) {
            parts.push(&text[last..idx]);
            last = idx + ch.len_utf8();
        }
        idx += ch.len_utf8();
    }
    parts.push(&text[last..]);
    parts
}

/// Check if brackets are balanced, ignoring anything inside quotes.
pub fn is_balanced_parenthesis(input: &str) -> bool {
    let mut stack: Vec<char> = Vec::new();
    let mut idx = 0;
    while idx < input.len() {
        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        if ch == '"' || ch == '\'' {
            idx = skip_quoted(input, idx);
            continue;
        }
        if is_open_paren(ch) {
            stack.push(ch);
        } else if is_close_paren(ch) {
            let expected = match ch {
                ')' => '(',
                '}' => '{',
                _ => '[',
            };
            if stack.pop() != Some(expected) {
                return false;
            }
        }
        idx += ch.len_utf8();
    }
    stack.is_empty()
}

/// Validate that a formula has balanced brackets and terminated strings.
///
/// `parse` never fails; this lets callers surface a soft warning for text
/// the parser had to fall back on.
pub fn check_formula(text: &str) -> Result<(), FormulaError> {
    let mut idx = 0;
    while idx < text.len() {
        let Some(ch) = text[idx..].chars().next() else {
            break;
        };
        if ch == '"' || ch == '\'' {
            if quoted_end(text, idx).is_none() {
                return Err(FormulaError::MalformedFormula(format!(
                    "unterminated {} at byte {idx}",
                    if ch == '"' { "string" } else { "sheet name" }
                )));
            }
            idx = skip_quoted(text, idx);
            continue;
        }
        idx += ch.len_utf8();
    }
    if !is_balanced_parenthesis(text) {
        return Err(FormulaError::MalformedFormula(
            "unbalanced parentheses".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_quoted_with_escapes() {
        let text = r#""a""b",1"#;
        assert_eq!(skip_quoted(text, 0), 6);
        assert_eq!(skip_quoted("\"open", 0), 5);
    }

    #[test]
    fn test_find_matching_close_skips_strings() {
        let text = r#"IF(A1=")",(1),2)"#;
        assert_eq!(find_matching_close(text, 2), Some(text.len() - 1));
        assert_eq!(find_matching_close("SUM(A1", 3), None);
    }

    #[test]
    fn test_split_top_level() {
        let parts = split_top_level(r#"A1>0,"a,b",SUM(1,2),{1,2}"#, &[',']);
        assert_eq!(parts, vec!["A1>0", r#""a,b""#, "SUM(1,2)", "{1,2}"]);
        assert_eq!(split_top_level("", &[',']), vec![""]);
    }

    #[test]
    fn test_is_a_formula() {
        assert!(is_a_formula("=A1"));
        assert!(is_a_formula("  =A1"));
        assert!(!is_a_formula("10"));
        assert!(!is_a_formula(""));
    }

    #[test]
    fn test_check_formula() {
        assert!(check_formula("=SUM(A1:A3)").is_ok());
        assert!(check_formula(r#"=IF(A1,"(",1)"#).is_ok());
        assert!(matches!(
            check_formula("=SUM(A1"),
            Err(FormulaError::MalformedFormula(_))
        ));
        assert!(check_formula("=\"open").is_err());
        assert!(check_formula("=SUM(A1))").is_err());
    }
}
