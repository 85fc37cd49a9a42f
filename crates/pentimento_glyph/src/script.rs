//! Script formatting using oxc_codegen.
//!
//! The program is parsed and printed back by OXC's code generator, then
//! post-processed line by line for Prettier-like output. Post-processing works
//! on bytes and never looks inside string literals, template literals or
//! comments.

use crate::error::FormatError;
use crate::options::FormatOptions;
use memchr::memchr;
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

/// Format JavaScript/TypeScript content using oxc_codegen
pub fn format_script(
    source: &str,
    source_type: SourceType,
    options: &FormatOptions,
) -> Result<String, FormatError> {
    // Fast path for empty content
    if source.trim().is_empty() {
        return Ok(String::new());
    }

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();

    if parsed.panicked || !parsed.errors.is_empty() {
        let error_messages: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
        return Err(FormatError::ScriptParseError(error_messages.join("; ")));
    }

    let codegen = Codegen::new().with_options(convert_to_codegen_options(options));
    let formatted = codegen.build(&parsed.program).code;

    post_process(&formatted, options)
}

#[inline]
fn convert_to_codegen_options(options: &FormatOptions) -> CodegenOptions {
    CodegenOptions {
        single_quote: options.single_quote,
        minify: false,
        comments: CommentOptions { normal: true, annotation: true, ..CommentOptions::default() },
        source_map_path: None,
        ..Default::default()
    }
}

fn post_process(source: &str, options: &FormatOptions) -> Result<String, FormatError> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut result = Vec::with_capacity(len + len / 4);

    let newline = options.newline_bytes();
    let indent = options.indent_unit();
    let mut pos = 0;

    while pos < len {
        // Codegen indents with one tab per level.
        let mut level = 0;
        while pos < len && bytes[pos] == b'\t' {
            level += 1;
            pos += 1;
        }

        let line_end = match memchr(b'\n', &bytes[pos..]) {
            Some(offset) => pos + offset,
            None => len,
        };
        let content_end = if line_end > pos && bytes[line_end - 1] == b'\r' {
            line_end - 1
        } else {
            line_end
        };

        for _ in 0..level {
            result.extend_from_slice(indent.as_bytes());
        }
        result.extend_from_slice(&bytes[pos..content_end]);
        result.push(b'\n');

        pos = if line_end < len { line_end + 1 } else { len };
    }

    let result = if options.semi {
        result
    } else {
        remove_optional_semicolons(&result)
    };

    let result = if options.bracket_spacing {
        ensure_bracket_spacing(&result)
    } else {
        result
    };

    let mut final_result = trim_trailing_whitespace(&result);
    if newline != b"\n" {
        final_result = replace_newlines(&final_result, newline);
    }
    final_result.extend_from_slice(newline);

    String::from_utf8(final_result).map_err(|e| FormatError::ScriptFormatError(e.to_string()))
}

/// Copy a string literal or comment starting at `i`, returning the index after it.
fn copy_opaque(source: &[u8], i: usize, out: &mut Vec<u8>) -> Option<usize> {
    let len = source.len();
    match source[i] {
        quote @ (b'"' | b'\'' | b'`') => {
            let mut j = i + 1;
            while j < len {
                match source[j] {
                    b'\\' => j += 2,
                    c if c == quote => {
                        j += 1;
                        break;
                    }
                    _ => j += 1,
                }
            }
            let end = j.min(len);
            out.extend_from_slice(&source[i..end]);
            Some(end)
        }
        b'/' if source.get(i + 1) == Some(&b'/') => {
            let end = memchr(b'\n', &source[i..]).map_or(len, |offset| i + offset);
            out.extend_from_slice(&source[i..end]);
            Some(end)
        }
        b'/' if source.get(i + 1) == Some(&b'*') => {
            let end = source[i + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .map_or(len, |offset| i + 2 + offset + 2);
            out.extend_from_slice(&source[i..end]);
            Some(end)
        }
        _ => None,
    }
}

/// First non-whitespace byte at or after `i`.
fn next_significant(source: &[u8], i: usize) -> Option<u8> {
    source[i..]
        .iter()
        .copied()
        .find(|b| !b.is_ascii_whitespace())
}

/// Remove semicolons at line ends unless the next line would continue the statement.
fn remove_optional_semicolons(source: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(source.len());
    let mut i = 0;
    let len = source.len();

    while i < len {
        if let Some(next) = copy_opaque(source, i, &mut result) {
            i = next;
            continue;
        }

        let b = source[i];
        if b == b';' {
            let at_line_end = i + 1 >= len || source[i + 1] == b'\n';
            let hazard = matches!(
                next_significant(source, i + 1),
                Some(b'(' | b'[' | b'`' | b'+' | b'-' | b'/')
            );
            if at_line_end && !hazard {
                i += 1;
                continue;
            }
        }

        result.push(b);
        i += 1;
    }

    result
}

/// Ensure proper spacing in braces
fn ensure_bracket_spacing(source: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(source.len() + source.len() / 10);
    let mut i = 0;
    let len = source.len();

    while i < len {
        if let Some(next) = copy_opaque(source, i, &mut result) {
            i = next;
            continue;
        }

        let b = source[i];
        if b == b'{' {
            result.push(b);
            i += 1;
            if i < len && !matches!(source[i], b'}' | b' ' | b'\n') {
                result.push(b' ');
            }
            continue;
        }

        if b == b'}' {
            if let Some(&last) = result.last() {
                if !matches!(last, b'{' | b' ' | b'\n') {
                    result.push(b' ');
                }
            }
        }

        result.push(b);
        i += 1;
    }

    result
}

/// Trim trailing whitespace from each line and drop trailing blank lines
fn trim_trailing_whitespace(source: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(source.len());

    for line in source.split(|&b| b == b'\n') {
        let end = line
            .iter()
            .rposition(|&b| !matches!(b, b' ' | b'\t' | b'\r'))
            .map_or(0, |p| p + 1);
        result.extend_from_slice(&line[..end]);
        result.push(b'\n');
    }

    while result.last().is_some_and(|&b| b == b'\n') {
        result.pop();
    }
    result
}

fn replace_newlines(source: &[u8], newline: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(source.len() + source.len() / 20);
    for &b in source {
        if b == b'\n' {
            result.extend_from_slice(newline);
        } else {
            result.push(b);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(source: &str) -> String {
        format_script(source, SourceType::mjs(), &FormatOptions::default()).unwrap()
    }

    #[test]
    fn test_format_simple_script() {
        let result = format("const x=1");
        assert!(result.contains("const x = 1"));
        assert!(result.ends_with('\n'));
    }

    #[test]
    fn test_format_with_imports() {
        let result = format("import {ref,computed} from 'vue'");
        assert!(result.contains("ref"));
        assert!(result.contains("computed"));
        assert!(result.contains("'vue';"));
    }

    #[test]
    fn test_format_empty_source() {
        assert!(format("").is_empty());
        assert!(format("   \n\t  ").is_empty());
    }

    #[test]
    fn test_format_parse_error() {
        let result = format_script("const = ;", SourceType::mjs(), &FormatOptions::default());
        assert!(matches!(result, Err(FormatError::ScriptParseError(_))));
    }

    #[test]
    fn test_format_typescript() {
        let source_type = SourceType::from_path("setup.ts").unwrap();
        let result =
            format_script("const n: number = 1", source_type, &FormatOptions::default()).unwrap();
        assert!(result.contains("const n: number = 1"));
    }

    #[test]
    fn test_bracket_spacing() {
        let result = ensure_bracket_spacing(b"const x = {a: 1}");
        assert_eq!(std::str::from_utf8(&result).unwrap(), "const x = { a: 1 }");
    }

    #[test]
    fn test_bracket_spacing_skips_strings() {
        let result = ensure_bracket_spacing(b"const s = '{a}'");
        assert_eq!(std::str::from_utf8(&result).unwrap(), "const s = '{a}'");
    }

    #[test]
    fn test_semicolons_removed_at_line_end() {
        let result = remove_optional_semicolons(b"a();\nb();\n");
        assert_eq!(std::str::from_utf8(&result).unwrap(), "a()\nb()\n");
    }

    #[test]
    fn test_semicolon_kept_before_paren() {
        let result = remove_optional_semicolons(b"a();\n(b || c)();\n");
        assert_eq!(std::str::from_utf8(&result).unwrap(), "a();\n(b || c)()\n");
    }

    #[test]
    fn test_semicolons_in_comments_and_strings() {
        let result = remove_optional_semicolons(b"// it's fine;\nconst s = 'a;';\n");
        assert_eq!(
            std::str::from_utf8(&result).unwrap(),
            "// it's fine;\nconst s = 'a;'\n"
        );
    }

    #[test]
    fn test_semi_option() {
        let options = FormatOptions {
            semi: false,
            ..Default::default()
        };
        let result = format_script("let a = 1;\nlet b = 2;", SourceType::mjs(), &options).unwrap();
        assert_eq!(result, "let a = 1\nlet b = 2\n");
    }
}
