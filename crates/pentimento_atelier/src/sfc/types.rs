//! SFC type definitions.

use std::borrow::Cow;

use pentimento_carton::FxHashMap;
use thiserror::Error;

/// SFC Descriptor - the blocks of one `.vue` file
#[derive(Debug, Clone, Default)]
pub struct SfcDescriptor<'a> {
    /// Source code
    pub source: &'a str,

    /// Template block
    pub template: Option<SfcBlock<'a>>,

    /// Script block (options API or <script> without setup)
    pub script: Option<SfcBlock<'a>>,

    /// Script setup block
    pub script_setup: Option<SfcBlock<'a>>,

    /// Style blocks
    pub styles: Vec<SfcBlock<'a>>,

    /// Custom blocks (e.g., <i18n>, <docs>)
    pub custom_blocks: Vec<SfcBlock<'a>>,
}

impl<'a> SfcDescriptor<'a> {
    /// Styles and custom blocks in source order.
    pub fn trailing_blocks(&self) -> Vec<&SfcBlock<'a>> {
        let mut blocks: Vec<&SfcBlock<'a>> =
            self.styles.iter().chain(self.custom_blocks.iter()).collect();
        blocks.sort_by_key(|block| block.loc.tag_start);
        blocks
    }
}

/// One top-level block
#[derive(Debug, Clone)]
pub struct SfcBlock<'a> {
    /// Tag name as written
    pub tag: Cow<'a, str>,

    /// Block content
    pub content: Cow<'a, str>,

    /// Block location in source
    pub loc: BlockLocation,

    /// Attributes of the opening tag; boolean attributes map to ""
    pub attrs: FxHashMap<Cow<'a, str>, Cow<'a, str>>,
}

impl<'a> SfcBlock<'a> {
    /// `lang` attribute
    #[inline]
    pub fn lang(&self) -> Option<&str> {
        self.attrs.get("lang").map(|v| v.as_ref())
    }

    /// Whether the opening tag carries `name`
    #[inline]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Opening tag text, e.g. `<template lang="pug">`
    #[inline]
    pub fn open_tag<'s>(&self, source: &'s str) -> &'s str {
        &source[self.loc.tag_start..self.loc.start]
    }

    /// The whole block including its tags
    #[inline]
    pub fn outer<'s>(&self, source: &'s str) -> &'s str {
        &source[self.loc.tag_start..self.loc.tag_end]
    }
}

/// Location information for a block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockLocation {
    /// Content start offset in source
    pub start: usize,

    /// Content end offset in source
    pub end: usize,

    /// Offset of the opening `<`
    pub tag_start: usize,

    /// Offset just past the closing tag
    pub tag_end: usize,

    /// Start line (1-based)
    pub start_line: usize,
}

/// SFC structural error
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct SfcError {
    /// Error message
    pub message: String,

    /// Error code
    pub code: Option<String>,

    /// Location
    pub loc: Option<BlockLocation>,
}
