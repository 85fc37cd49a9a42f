//! # pentimento_atelier
//!
//! Atelier - The workshop of Pentimento.
//! Repaints Options API Single File Components as `<script setup>`.
//!
//! ## Name Origin
//!
//! An **atelier** (/ə.tɛl.je/) is the workshop where a painter works the canvas.
//! The original strokes of a component are still there in the model that
//! `pentimento_croquis` sketches; `pentimento_atelier` is where they are painted
//! over with Composition API code.
//!
//! ## Pipeline
//!
//! ```text
//! .vue source
//!     ↓ parse_sfc            (block boundaries)
//!     ↓ extract_component    (pentimento_croquis)
//!     ↓ scan_template        (identifiers, tags, directives, refs)
//!     ↓ StoreRegistry        (configured + discovered namespaces)
//!     ↓ rewrite_template     (renames, `$t`, `$store`, `$config`)
//!     ↓ assemble             (classify bodies, emit sections)
//!     ↓ format_script        (pentimento_glyph, best effort)
//! .vue output
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use pentimento_atelier::{migrate_sfc, MigrateOptions, MigrateOutcome};
//!
//! let result = migrate_sfc(source, &MigrateOptions::default())?;
//! if result.outcome == MigrateOutcome::Migrated {
//!     std::fs::write(path, &result.code)?;
//! }
//! ```

mod assemble;
pub mod classify;
pub mod diagnostic;
pub mod options;
pub mod registry;
pub mod sfc;
pub mod template;

use std::collections::BTreeSet;

use oxc_span::SourceType;
use pentimento_carton::CompactString;
use pentimento_croquis::{extract_component, source_type_for_lang, ExtractError};
use pentimento_glyph::format_script;
use thiserror::Error;

pub use assemble::Assembled;
pub use diagnostic::{Diagnostic, DiagnosticKind, MARKER_PREFIX};
pub use options::*;
pub use registry::{StoreEntry, StoreRegistry};
pub use sfc::{parse_sfc, BlockLocation, SfcBlock, SfcDescriptor, SfcError};
pub use template::{TemplateRenames, TemplateUsage};

use assemble::{assemble, AssembleContext};
use template::{rewrite_template, scan_template};

/// Why a file was returned unchanged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `<script>` block
    NoScript,
    /// The file already has `<script setup>`
    AlreadyComposition,
    /// The script has no `export default { .. }`
    NoDefaultExport,
    /// The script does not parse
    ScriptParse(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoScript => f.write_str("no <script> block"),
            Self::AlreadyComposition => f.write_str("already uses <script setup>"),
            Self::NoDefaultExport => f.write_str("no default export"),
            Self::ScriptParse(message) => write!(f, "script does not parse: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrateOutcome {
    Migrated,
    Skipped(SkipReason),
}

/// Result of migrating one file
#[derive(Debug, Clone)]
pub struct MigrateResult {
    /// The new file, or the original text when skipped
    pub code: String,
    pub outcome: MigrateOutcome,
    pub diagnostics: Vec<Diagnostic>,
}

impl MigrateResult {
    fn skipped(source: &str, reason: SkipReason) -> Self {
        tracing::debug!("skipping file: {}", reason);
        Self {
            code: source.to_string(),
            outcome: MigrateOutcome::Skipped(reason),
            diagnostics: Vec::new(),
        }
    }

    #[inline]
    pub fn is_migrated(&self) -> bool {
        self.outcome == MigrateOutcome::Migrated
    }

    /// Number of references left for manual review behind a marker comment.
    pub fn unresolved_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| {
                matches!(
                    d.kind,
                    DiagnosticKind::UnresolvedReference | DiagnosticKind::ReadOnlyBinding
                )
            })
            .count()
    }
}

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error(transparent)]
    Sfc(#[from] SfcError),
}

/// Migrate one Single File Component.
pub fn migrate_sfc(source: &str, options: &MigrateOptions) -> Result<MigrateResult, MigrateError> {
    let descriptor = parse_sfc(source)?;

    if descriptor.script_setup.is_some() {
        return Ok(MigrateResult::skipped(source, SkipReason::AlreadyComposition));
    }
    let Some(script) = descriptor.script.as_ref() else {
        return Ok(MigrateResult::skipped(source, SkipReason::NoScript));
    };

    let source_type = source_type_for_lang(script.lang());
    let model = match extract_component(&script.content, source_type, &options.mixins) {
        Ok(model) => model,
        Err(ExtractError::ScriptParse(message)) => {
            return Ok(MigrateResult::skipped(
                source,
                SkipReason::ScriptParse(message),
            ));
        }
    };
    if !model.has_default_export {
        return Ok(MigrateResult::skipped(source, SkipReason::NoDefaultExport));
    }

    let mut diagnostics = Vec::new();

    let template = descriptor.template.as_ref();
    let markup = template.filter(|t| t.lang().map_or(true, |lang| lang == "html"));
    let usage = match markup.map(|t| scan_template(&t.content)) {
        Some(Ok(usage)) => usage,
        Some(Err(err)) => {
            tracing::warn!("template could not be scanned: {}", err);
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::TemplateFallback,
                format!("template kept as written: {}", err),
            ));
            TemplateUsage::opaque()
        }
        None if template.is_some() => {
            tracing::debug!("template language is not html, keeping it as written");
            TemplateUsage::opaque()
        }
        None => TemplateUsage::default(),
    };

    let discovered: BTreeSet<&str> = model
        .store_namespaces
        .iter()
        .chain(model.store_bindings.iter().map(|b| &b.namespace))
        .chain(usage.store_namespaces.iter())
        .map(CompactString::as_str)
        .collect();
    let registry = StoreRegistry::snapshot(&options.stores, discovered);

    let mut template_stores = BTreeSet::new();
    let mut template_code = template.map(|t| t.content.to_string());
    if let (Some(markup), false) = (markup, usage.opaque) {
        match rewrite_template(&markup.content, &registry, &template_renames(options)) {
            Ok((rewritten, stores)) => {
                template_code = Some(rewritten);
                template_stores = stores;
            }
            Err(err) => {
                tracing::warn!("template could not be rewritten: {}", err);
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::TemplateFallback,
                    format!("template kept as written: {}", err),
                ));
            }
        }
    }

    let assembled = assemble(AssembleContext {
        model: &model,
        options,
        registry: &registry,
        template: &usage,
        template_stores: &template_stores,
        source_type,
    });
    diagnostics.extend(assembled.diagnostics.iter().cloned());

    let script_code = if options.format {
        format_sections(&assembled, source_type, options, &mut diagnostics)
    } else {
        assembled.to_script()
    };

    // Blocks keep their original relative order.
    let mut blocks: Vec<(usize, String)> = Vec::new();
    if let (Some(template), Some(code)) = (template, template_code) {
        blocks.push((
            template.loc.tag_start,
            format!("{}{}</template>", template.open_tag(source), code),
        ));
    }
    let lang = script
        .lang()
        .map(|lang| format!(" lang=\"{}\"", lang))
        .unwrap_or_default();
    blocks.push((
        script.loc.tag_start,
        format!("<script setup{}>\n{}</script>", lang, script_code),
    ));
    for block in descriptor.trailing_blocks() {
        blocks.push((block.loc.tag_start, block.outer(source).to_string()));
    }
    blocks.sort_by_key(|(offset, _)| *offset);

    let mut code = blocks
        .into_iter()
        .map(|(_, block)| block)
        .collect::<Vec<_>>()
        .join("\n\n");
    code.push('\n');

    Ok(MigrateResult {
        code,
        outcome: MigrateOutcome::Migrated,
        diagnostics,
    })
}

fn template_renames(options: &MigrateOptions) -> TemplateRenames {
    let mut renames = TemplateRenames::default();
    for rule in options.imports_rewrite.values() {
        renames.components.extend(
            rule.component_rewrite
                .iter()
                .map(|(from, to)| (from.clone(), to.clone())),
        );
        renames.directives.extend(
            rule.directives
                .iter()
                .map(|(from, to)| (from.clone(), to.clone())),
        );
    }
    for (name, import) in &options.additional_imports {
        if let Some(to) = &import.rewrite_to {
            renames.components.push((name.clone(), to.clone()));
        }
    }
    // Map iteration order is unspecified.
    renames.components.sort();
    renames.directives.sort();
    renames
}

/// Format each section on its own, keeping the unformatted text of any
/// section the formatter rejects or that would lose a marker comment.
fn format_sections(
    assembled: &Assembled,
    source_type: SourceType,
    options: &MigrateOptions,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let sections: Vec<String> = assembled
        .sections
        .iter()
        .map(|section| {
            match format_script(section, source_type, &options.format_options) {
                Ok(formatted)
                    if formatted.matches(MARKER_PREFIX).count()
                        >= section.matches(MARKER_PREFIX).count() =>
                {
                    formatted.trim_end().to_string()
                }
                Ok(_) => {
                    tracing::warn!("formatter dropped a marker comment, keeping section as written");
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::FormatterFallback,
                        "formatter dropped a marker comment",
                    ));
                    section.clone()
                }
                Err(err) => {
                    tracing::warn!("formatter failed, keeping section as written: {}", err);
                    diagnostics.push(Diagnostic::new(
                        DiagnosticKind::FormatterFallback,
                        err.to_string(),
                    ));
                    section.clone()
                }
            }
        })
        .collect();

    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}
