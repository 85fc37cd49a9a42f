//! Top-level imports and the statements kept beside the component.

use oxc_ast::ast::{
    BindingPattern, Declaration, Expression, ImportDeclaration, ImportDeclarationSpecifier,
    Statement, VariableDeclaration,
};
use oxc_span::{GetSpan, Span};
use pentimento_carton::CompactString;

use crate::model::{ImportBinding, ImportRecord, ImportSpecifier, PreservedDeclaration};

#[inline]
fn slice(source: &str, span: Span) -> &str {
    &source[span.start as usize..span.end as usize]
}

pub(super) fn record_import(decl: &ImportDeclaration<'_>, source: &str) -> ImportRecord {
    let specifiers = decl
        .specifiers
        .as_ref()
        .map(|specifiers| {
            specifiers
                .iter()
                .map(|specifier| match specifier {
                    ImportDeclarationSpecifier::ImportSpecifier(s) => ImportSpecifier {
                        binding: ImportBinding::Named,
                        imported: CompactString::new(s.imported.name().as_str()),
                        local: CompactString::new(s.local.name.as_str()),
                    },
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => ImportSpecifier {
                        binding: ImportBinding::Default,
                        imported: CompactString::const_new("default"),
                        local: CompactString::new(s.local.name.as_str()),
                    },
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => ImportSpecifier {
                        binding: ImportBinding::Namespace,
                        imported: CompactString::const_new("*"),
                        local: CompactString::new(s.local.name.as_str()),
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    ImportRecord {
        source: decl.source.value.to_string(),
        text: slice(source, decl.span).to_string(),
        specifiers,
        type_only: decl.import_kind.is_type(),
        side_effect: decl.specifiers.is_none(),
    }
}

/// Text of a top-level statement that survives into the setup script.
///
/// `export` is dropped from named declarations since a setup script cannot
/// export bindings; re-exports are discarded.
pub(super) fn preserve_statement(
    stmt: &Statement<'_>,
    source: &str,
) -> Option<PreservedDeclaration> {
    match stmt {
        Statement::EmptyStatement(_) => None,
        Statement::ExportAllDeclaration(_) => {
            tracing::debug!("dropping re-export");
            None
        }
        Statement::ExportNamedDeclaration(export) => match &export.declaration {
            Some(Declaration::VariableDeclaration(var)) => Some(variable(var, source)),
            Some(declaration) => Some(PreservedDeclaration {
                text: slice(source, declaration.span()).to_string(),
                async_component: None,
            }),
            None => {
                tracing::debug!("dropping export list");
                None
            }
        },
        Statement::VariableDeclaration(var) => Some(variable(var, source)),
        other => Some(PreservedDeclaration {
            text: slice(source, other.span()).to_string(),
            async_component: None,
        }),
    }
}

fn variable(var: &VariableDeclaration<'_>, source: &str) -> PreservedDeclaration {
    let async_component = var
        .declarations
        .first()
        .filter(|_| var.declarations.len() == 1)
        .and_then(|declarator| match (&declarator.id, &declarator.init) {
            (BindingPattern::BindingIdentifier(id), Some(init)) if is_function(init) => {
                let loader = slice(source, init.span());
                loader
                    .contains("import(")
                    .then(|| (CompactString::new(id.name.as_str()), loader.to_string()))
            }
            _ => None,
        });

    PreservedDeclaration {
        text: slice(source, var.span).to_string(),
        async_component,
    }
}

fn is_function(expr: &Expression<'_>) -> bool {
    matches!(
        expr,
        Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_)
    )
}
