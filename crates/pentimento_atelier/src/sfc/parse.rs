//! SFC splitting implementation.
//!
//! Zero-copy design with byte-level operations.

use super::types::*;
use memchr::{memchr, memchr_iter};
use pentimento_carton::FxHashMap;
use std::borrow::Cow;

const CLOSING_TEMPLATE: &[u8] = b"</template>";
const CLOSING_SCRIPT: &[u8] = b"</script>";
const CLOSING_STYLE: &[u8] = b"</style>";

const TAG_TEMPLATE: &[u8] = b"template";
const TAG_SCRIPT: &[u8] = b"script";
const TAG_STYLE: &[u8] = b"style";

type Attrs<'a> = FxHashMap<Cow<'a, str>, Cow<'a, str>>;

/// Split a Vue SFC into its top-level blocks
pub fn parse_sfc(source: &str) -> Result<SfcDescriptor<'_>, SfcError> {
    let mut descriptor = SfcDescriptor {
        source,
        ..Default::default()
    };

    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        let Some(next_lt) = memchr(b'<', &bytes[pos..]) else {
            break;
        };
        pos += next_lt;

        // Top-level HTML comments
        if bytes[pos..].starts_with(b"<!--") {
            pos = match find_bytes(&bytes[pos + 4..], b"-->") {
                Some(end) => pos + 4 + end + 3,
                None => len,
            };
            continue;
        }

        let Some(block) = parse_block(source, pos) else {
            pos += 1;
            continue;
        };
        pos = block.loc.tag_end;

        let tag = block.tag.as_bytes();
        if tag_name_eq(tag, TAG_TEMPLATE) {
            if descriptor.template.is_some() {
                return Err(duplicate("<template>", "DUPLICATE_TEMPLATE", block.loc));
            }
            descriptor.template = Some(block);
        } else if tag_name_eq(tag, TAG_SCRIPT) {
            if block.has_attr("setup") {
                if descriptor.script_setup.is_some() {
                    return Err(duplicate(
                        "<script setup>",
                        "DUPLICATE_SCRIPT_SETUP",
                        block.loc,
                    ));
                }
                descriptor.script_setup = Some(block);
            } else {
                if descriptor.script.is_some() {
                    return Err(duplicate("<script>", "DUPLICATE_SCRIPT", block.loc));
                }
                descriptor.script = Some(block);
            }
        } else if tag_name_eq(tag, TAG_STYLE) {
            descriptor.styles.push(block);
        } else {
            descriptor.custom_blocks.push(block);
        }
    }

    Ok(descriptor)
}

fn duplicate(block: &str, code: &str, loc: BlockLocation) -> SfcError {
    SfcError {
        message: format!("SFC can only contain one {} block", block),
        code: Some(code.into()),
        loc: Some(loc),
    }
}

#[inline(always)]
fn tag_name_eq(name: &[u8], expected: &[u8]) -> bool {
    name.len() == expected.len() && name.eq_ignore_ascii_case(expected)
}

/// Parse a single block starting at `<`
fn parse_block(source: &str, start: usize) -> Option<SfcBlock<'_>> {
    let bytes = source.as_bytes();
    let len = bytes.len();

    let mut pos = start + 1;
    let tag_start = pos;
    while pos < len && is_tag_name_char(bytes[pos]) {
        pos += 1;
    }
    if pos == tag_start {
        return None;
    }
    let tag = &source[tag_start..pos];

    let (attrs, mut pos) = parse_attrs(source, pos);
    let start_line = memchr_iter(b'\n', &bytes[..start]).count() + 1;

    // Self-closing block
    if pos > 0 && pos < len && bytes[pos - 1] == b'/' && bytes[pos] == b'>' {
        return Some(SfcBlock {
            tag: Cow::Borrowed(tag),
            content: Cow::Borrowed(""),
            loc: BlockLocation {
                start: pos + 1,
                end: pos + 1,
                tag_start: start,
                tag_end: pos + 1,
                start_line,
            },
            attrs,
        });
    }

    if pos < len && bytes[pos] == b'>' {
        pos += 1;
    } else {
        return None;
    }
    let content_start = pos;

    let (content_end, tag_end) = if tag.as_bytes().eq_ignore_ascii_case(TAG_TEMPLATE) {
        find_template_end(bytes, content_start)?
    } else {
        let closing: Cow<'_, [u8]> = if tag.as_bytes().eq_ignore_ascii_case(TAG_SCRIPT) {
            Cow::Borrowed(CLOSING_SCRIPT)
        } else if tag.as_bytes().eq_ignore_ascii_case(TAG_STYLE) {
            Cow::Borrowed(CLOSING_STYLE)
        } else {
            Cow::Owned(format!("</{}>", tag).into_bytes())
        };
        let offset = find_bytes_ignore_case(&bytes[content_start..], &closing)?;
        let content_end = content_start + offset;
        (content_end, content_end + closing.len())
    };

    Some(SfcBlock {
        tag: Cow::Borrowed(tag),
        content: Cow::Borrowed(&source[content_start..content_end]),
        loc: BlockLocation {
            start: content_start,
            end: content_end,
            tag_start: start,
            tag_end,
            start_line,
        },
        attrs,
    })
}

/// Parse attributes up to (not including) the closing `>` or `/>`
fn parse_attrs(source: &str, mut pos: usize) -> (Attrs<'_>, usize) {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut attrs: Attrs<'_> = FxHashMap::default();

    while pos < len && bytes[pos] != b'>' {
        while pos < len && is_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= len || bytes[pos] == b'>' {
            break;
        }
        if bytes[pos] == b'/' {
            if pos + 1 < len && bytes[pos + 1] == b'>' {
                pos += 1;
                break;
            }
            pos += 1;
            continue;
        }

        let name_start = pos;
        while pos < len && !matches!(bytes[pos], b'=' | b'>' | b'/') && !is_whitespace(bytes[pos])
        {
            pos += 1;
        }
        let name = &source[name_start..pos];

        while pos < len && matches!(bytes[pos], b' ' | b'\t') {
            pos += 1;
        }

        let value = if pos < len && bytes[pos] == b'=' {
            pos += 1;
            while pos < len && matches!(bytes[pos], b' ' | b'\t') {
                pos += 1;
            }
            if pos < len && matches!(bytes[pos], b'"' | b'\'') {
                let quote = bytes[pos];
                pos += 1;
                let value_start = pos;
                pos = memchr(quote, &bytes[pos..]).map_or(len, |offset| pos + offset);
                let value = &source[value_start..pos];
                if pos < len {
                    pos += 1;
                }
                value
            } else {
                let value_start = pos;
                while pos < len && bytes[pos] != b'>' && !is_whitespace(bytes[pos]) {
                    pos += 1;
                }
                &source[value_start..pos]
            }
        } else {
            ""
        };

        if !name.is_empty() {
            attrs.insert(Cow::Borrowed(name), Cow::Borrowed(value));
        }
    }

    (attrs, pos)
}

/// Find `</template>` for a template block, honoring nested `<template>` tags
fn find_template_end(bytes: &[u8], mut pos: usize) -> Option<(usize, usize)> {
    let len = bytes.len();
    let mut depth = 1;

    while pos < len {
        let offset = memchr(b'<', &bytes[pos..])?;
        pos += offset;

        if starts_with_ignore_case(&bytes[pos..], CLOSING_TEMPLATE) {
            depth -= 1;
            if depth == 0 {
                return Some((pos, pos + CLOSING_TEMPLATE.len()));
            }
            pos += CLOSING_TEMPLATE.len();
            continue;
        }

        let after = pos + 1 + TAG_TEMPLATE.len();
        if starts_with_ignore_case(&bytes[pos + 1..], TAG_TEMPLATE)
            && after < len
            && (is_whitespace(bytes[after]) || bytes[after] == b'>')
        {
            let close = memchr(b'>', &bytes[after..]).map(|o| after + o)?;
            if bytes[close - 1] != b'/' {
                depth += 1;
            }
            pos = close + 1;
            continue;
        }

        pos += 1;
    }

    None
}

#[inline(always)]
fn starts_with_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.len() >= needle.len() && haystack[..needle.len()].eq_ignore_ascii_case(needle)
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn find_bytes_ignore_case(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while pos < haystack.len() {
        let offset = memchr(b'<', &haystack[pos..])?;
        pos += offset;
        if starts_with_ignore_case(&haystack[pos..], needle) {
            return Some(pos);
        }
        pos += 1;
    }
    None
}

#[inline(always)]
fn is_tag_name_char(b: u8) -> bool {
    matches!(b, b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_')
}

#[inline(always)]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_sfc() {
        let result = parse_sfc("").unwrap();
        assert!(result.template.is_none());
        assert!(result.script.is_none());
        assert!(result.styles.is_empty());
    }

    #[test]
    fn test_parse_template_only() {
        let source = "<template><div>Hello</div></template>";
        let result = parse_sfc(source).unwrap();
        let template = result.template.unwrap();
        assert_eq!(template.content, "<div>Hello</div>");
        assert_eq!(template.open_tag(source), "<template>");
        assert_eq!(template.outer(source), source);
    }

    #[test]
    fn test_nested_template_tags() {
        let source = r#"<template><template v-if="a"><p/></template><template #x /></template>"#;
        let template = parse_sfc(source).unwrap().template.unwrap();
        assert_eq!(
            template.content,
            r#"<template v-if="a"><p/></template><template #x />"#
        );
    }

    #[test]
    fn test_parse_with_lang_attr() {
        let source = r#"<script lang="ts">const x: number = 1</script>"#;
        let script = parse_sfc(source).unwrap().script.unwrap();
        assert_eq!(script.lang(), Some("ts"));
        assert_eq!(script.content, "const x: number = 1");
    }

    #[test]
    fn test_script_content_may_contain_markup() {
        let source = "<script>\nconst html = '<div></div>'\n</script>";
        let script = parse_sfc(source).unwrap().script.unwrap();
        assert_eq!(script.content, "\nconst html = '<div></div>'\n");
    }

    #[test]
    fn test_parse_multiple_styles_and_custom_blocks() {
        let source = r#"
<!-- header <script> -->
<style>.a {}</style>
<i18n>{"en": {"hello": "Hello"}}</i18n>
<style scoped lang="scss">.b {}</style>
"#;
        let result = parse_sfc(source).unwrap();
        assert!(result.script.is_none());
        assert_eq!(result.styles.len(), 2);
        assert!(result.styles[1].has_attr("scoped"));
        assert_eq!(result.styles[1].lang(), Some("scss"));
        assert_eq!(result.custom_blocks.len(), 1);
        assert_eq!(result.custom_blocks[0].tag, "i18n");

        let order: Vec<_> = result.trailing_blocks().iter().map(|b| b.tag.as_ref()).collect();
        assert_eq!(order, vec!["style", "i18n", "style"]);
    }

    #[test]
    fn test_parse_script_setup() {
        let source = "<script setup lang=\"ts\">\nconst count = ref(0)\n</script>";
        let result = parse_sfc(source).unwrap();
        assert!(result.script.is_none());
        let script = result.script_setup.unwrap();
        assert_eq!(script.lang(), Some("ts"));
        assert_eq!(script.loc.start_line, 1);
    }

    #[test]
    fn test_duplicate_script() {
        let err = parse_sfc("<script>a</script>\n<script>b</script>").unwrap_err();
        assert_eq!(err.code.as_deref(), Some("DUPLICATE_SCRIPT"));
        assert_eq!(err.loc.unwrap().start_line, 2);
    }

    #[test]
    fn test_zero_copy_content() {
        let source = "<template><div>Hello World</div></template>";
        let template = parse_sfc(source).unwrap().template.unwrap();
        assert!(matches!(template.content, Cow::Borrowed(_)));
    }
}
