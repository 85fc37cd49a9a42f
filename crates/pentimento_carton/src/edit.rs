//! Offset-keyed text edits.
//!
//! Rewrites are recorded as `(start, end, replacement)` ranges against the
//! original text and spliced back-to-front, so the offsets of earlier edits
//! stay valid while later ones are applied.

/// A single replacement over a byte range of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// A pending list of edits against one source string.
#[derive(Debug, Default, Clone)]
pub struct EditList {
    edits: Vec<TextEdit>,
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a replacement of `start..end`. A zero-width range inserts.
    pub fn push(&mut self, start: usize, end: usize, replacement: impl Into<String>) {
        self.edits.push(TextEdit {
            start,
            end,
            replacement: replacement.into(),
        });
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextEdit> {
        self.edits.iter()
    }

    /// Apply every edit to `source`.
    ///
    /// Edits are applied from the highest start offset down. An edit that
    /// overlaps one already applied is dropped, and so is any range outside
    /// `source` or not on a char boundary.
    pub fn apply(&self, source: &str) -> String {
        if self.edits.is_empty() {
            return source.to_string();
        }

        let mut ordered: Vec<(usize, &TextEdit)> = self.edits.iter().enumerate().collect();
        // Inserts sharing an offset end up in the order they were pushed.
        ordered.sort_by(|(ia, a), (ib, b)| {
            b.start
                .cmp(&a.start)
                .then(b.end.cmp(&a.end))
                .then(ib.cmp(ia))
        });

        let mut out = source.to_string();
        let mut floor = source.len();
        for (_, edit) in ordered {
            if edit.start > edit.end
                || edit.end > floor
                || !source.is_char_boundary(edit.start)
                || !source.is_char_boundary(edit.end)
            {
                continue;
            }
            out.replace_range(edit.start..edit.end, &edit.replacement);
            floor = edit.start;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_back_to_front() {
        let source = "this.a + this.b";
        let mut edits = EditList::new();
        edits.push(0, 6, "a.value");
        edits.push(9, 15, "props.b");
        assert_eq!(edits.apply(source), "a.value + props.b");
    }

    #[test]
    fn test_apply_ignores_insertion_order() {
        let source = "one two three";
        let mut edits = EditList::new();
        edits.push(8, 13, "3");
        edits.push(0, 3, "1");
        edits.push(4, 7, "2");
        assert_eq!(edits.apply(source), "1 2 3");
    }

    #[test]
    fn test_overlapping_edit_is_dropped() {
        let source = "abcdef";
        let mut edits = EditList::new();
        edits.push(2, 5, "X");
        edits.push(0, 3, "Y");
        assert_eq!(edits.apply(source), "abXf");
    }

    #[test]
    fn test_insertion() {
        let mut edits = EditList::new();
        edits.push(0, 0, "// note\n");
        assert_eq!(edits.apply("foo();"), "// note\nfoo();");
    }

    #[test]
    fn test_insertions_at_same_offset_keep_order() {
        let mut edits = EditList::new();
        edits.push(0, 0, "a\n");
        edits.push(0, 0, "b\n");
        edits.push(0, 3, "bar");
        assert_eq!(edits.apply("foo();"), "a\nb\nbar();");
    }

    #[test]
    fn test_empty_list_is_identity() {
        assert_eq!(EditList::new().apply("unchanged"), "unchanged");
    }
}
