//! Escaping of text inside double-quoted PO strings

/// Escape text for a double-quoted string.
///
/// Only quotes, newlines and tabs are touched. Backslashes are left alone,
/// which makes this the exact inverse of [`unescape`] but not of
/// [`unescape_strict`].
pub fn escape(s: &str) -> String {
    s.replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
}

/// Unescape text taken from a double-quoted string (quotes not included).
///
/// Fast variant: a literal backslash followed by `n` in the original text
/// comes out wrong, but [`escape`] restores it exactly.
pub fn unescape(s: &str) -> String {
    s.replace("\\\"", "\"")
        .replace("\\n", "\n")
        .replace("\\t", "\t")
}

/// Escape text for a double-quoted string, backslashes included.
pub fn escape_strict(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Unescape any backslash sequence; unknown sequences are kept verbatim.
pub fn unescape_strict(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Split on `sep`, where a doubled separator stands for a literal one.
pub fn split_escaped(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == sep {
            if chars.peek() == Some(&sep) {
                chars.next();
                current.push(sep);
            } else {
                parts.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_basic() {
        assert_eq!(escape("say \"hi\"\n\tnow"), "say \\\"hi\\\"\\n\\tnow");
        assert_eq!(unescape("say \\\"hi\\\"\\n\\tnow"), "say \"hi\"\n\tnow");
    }

    #[test]
    fn test_fast_codec_leaves_backslash() {
        assert_eq!(escape("C:\\dir"), "C:\\dir");
        // Wrong on its own, but escape() restores the on-disk form.
        let on_disk = "a\\\\nb";
        assert_eq!(escape(&unescape(on_disk)), on_disk);
    }

    #[test]
    fn test_strict_codec() {
        let text = "path\\to \"x\"\n";
        let escaped = escape_strict(text);
        assert_eq!(escaped, "path\\\\to \\\"x\\\"\\n");
        assert_eq!(unescape_strict(&escaped), text);
        assert_eq!(unescape_strict("\\q"), "\\q");
    }

    #[test]
    fn test_split_escaped() {
        assert_eq!(split_escaped("a,b,,c,d", ','), vec!["a", "b,c", "d"]);
        assert_eq!(split_escaped("", ','), vec![""]);
    }
}
