//! Splitting of engine tuple syntax: `(A=1,B="x, y",C=(D:2))`.

/// Remove one pair of enclosing parentheses, if present.
pub fn strip_parens(s: &str) -> Option<&str> {
    let s = s.trim();
    s.strip_prefix('(')?.strip_suffix(')')
}

/// Remove one pair of enclosing double quotes, if present.
pub fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(s)
}

/// Split on commas that are outside double quotes and nested parentheses.
///
/// Fields are trimmed; empty fields are skipped so a trailing comma is harmless.
/// Returns `None` for an unterminated quote, an unclosed `(` or a stray `)`.
pub fn split_fields(s: &str) -> Option<Vec<&str>> {
    let mut fields = Vec::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.checked_sub(1)?,
            ',' if !in_quotes && depth == 0 => {
                fields.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes || depth != 0 {
        return None;
    }
    fields.push(s[start..].trim());
    fields.retain(|f| !f.is_empty());
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_plain() {
        assert_eq!(split_fields("A=1, B=2,C=3").unwrap(), ["A=1", "B=2", "C=3"]);
    }

    #[test]
    fn split_respects_quotes_and_parens() {
        let fields = split_fields(r#"Name="a, b",Inner=(X:1,Y:2),Last=x"#).unwrap();
        assert_eq!(fields, [r#"Name="a, b""#, "Inner=(X:1,Y:2)", "Last=x"]);
        let fields = split_fields(r#"Note="(not a group",Tag=")""#).unwrap();
        assert_eq!(fields, [r#"Note="(not a group""#, r#"Tag=")""#]);
    }

    #[test]
    fn split_skips_empty() {
        assert_eq!(split_fields("A=1,,B=2,").unwrap(), ["A=1", "B=2"]);
        assert!(split_fields("  ").unwrap().is_empty());
    }

    #[test]
    fn split_rejects_unbalanced_input() {
        assert_eq!(split_fields(r#"Name="My Server,Rate=2.0,PvP=maybe"#), None);
        assert_eq!(split_fields("List=(Steam,Rate=2.0,PvP=maybe"), None);
        assert_eq!(split_fields("Rate=2.0),PvP=true"), None);
        assert_eq!(split_fields("A=(B:(1)"), None);
        assert_eq!(split_fields(")("), None);
    }

    #[test]
    fn parens_and_quotes() {
        assert_eq!(strip_parens(" (a,b) "), Some("a,b"));
        assert_eq!(strip_parens("a,b"), None);
        assert_eq!(unquote("\"hello\""), "hello");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\""), "\"");
    }
}
