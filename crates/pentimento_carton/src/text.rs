//! Line-oriented helpers for moving code fragments between nesting levels.

use crate::case::is_ident_byte;

/// Re-indent a block of code so its least indented line starts at `indent`.
///
/// Leading and trailing blank lines are dropped. When the first line was
/// written on the same line as an opening brace (`{ return 1 }`), it carries no
/// indentation of its own and is excluded from the common-indent computation.
pub fn reindent(text: &str, indent: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return String::new();
    }

    let first_inline = text.lines().next().is_some_and(|l| !l.trim().is_empty());

    let common = lines
        .iter()
        .enumerate()
        .filter(|(i, line)| !(first_inline && *i == 0) && !line.trim().is_empty())
        .map(|(_, line)| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(text.len() + lines.len() * indent.len());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if line.trim().is_empty() {
            continue;
        }
        out.push_str(indent);
        if first_inline && i == 0 {
            out.push_str(line.trim());
        } else {
            out.push_str(line.get(common..).unwrap_or(line.trim_start()).trim_end());
        }
    }
    out
}

/// Prefix every non-blank line with `indent`.
pub fn indent_lines(text: &str, indent: &str) -> String {
    let mut out = String::with_capacity(text.len() + indent.len() * 4);
    for (i, line) in text.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.trim().is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out
}

/// Whether `word` occurs in `haystack` as a whole identifier.
pub fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let bytes = haystack.as_bytes();
    haystack.match_indices(word).any(|(start, _)| {
        let end = start + word.len();
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        before_ok && after_ok
    })
}

/// Byte offset of the start of the line containing `offset`.
#[inline]
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindent_block_body() {
        let body = "\n      const a = 1\n      if (a) {\n        go()\n      }\n    ";
        assert_eq!(
            reindent(body, "  "),
            "  const a = 1\n  if (a) {\n    go()\n  }"
        );
    }

    #[test]
    fn test_reindent_single_line() {
        assert_eq!(reindent(" return this.count * 2 ", "  "), "  return this.count * 2");
    }

    #[test]
    fn test_reindent_inline_first_line() {
        let body = " a()\n      b()\n      c() ";
        assert_eq!(reindent(body, ""), "a()\nb()\nc()");
    }

    #[test]
    fn test_reindent_keeps_inner_blank_lines() {
        let body = "\n    a()\n\n    b()\n  ";
        assert_eq!(reindent(body, "  "), "  a()\n\n  b()");
    }

    #[test]
    fn test_indent_lines() {
        assert_eq!(indent_lines("a\n\nb", "  "), "  a\n\n  b");
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("const x = delay(fn)", "delay"));
        assert!(!contains_word("const x = delayed(fn)", "delay"));
        assert!(!contains_word("$delay", "delay"));
        assert!(contains_word("<Chart/>", "Chart"));
    }

    #[test]
    fn test_line_start() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_start(text, 5), 4);
        assert_eq!(line_start(text, 2), 0);
    }
}
