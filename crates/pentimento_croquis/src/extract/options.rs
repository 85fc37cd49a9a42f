//! Options object walker.
//!
//! Each recognized key is matched by the shape of its value rather than by a
//! grammar of the whole options format, so unrelated keys and odd values are
//! skipped instead of failing the component.

use oxc_ast::ast::{
    ArrayExpressionElement, Expression, ObjectExpression, ObjectPropertyKind, Statement,
};
use oxc_span::{GetSpan, Span};
use pentimento_carton::{CompactString, FxHashMap};

use super::store_map::collect_store_bindings;
use crate::config::MixinConfig;
use crate::lifecycle::LifecycleKind;
use crate::model::{
    upsert, AsyncDataBlock, ComponentModel, ComponentRegistration, ComputedKind,
    ComputedProperty, DataProperty, FunctionText, HeadBlock, LifecycleHook, Method, MethodForm,
    MixinUsage, PropSet, Watcher, WatcherForm,
};

/// Option keys that can never be methods.
const RESERVED_METHOD_NAMES: &[&str] = &["data", "head", "asyncData", "fetch"];

pub(super) struct OptionsWalker<'s, 'm> {
    source: &'s str,
    model: &'m mut ComponentModel,
    mixins: &'m FxHashMap<String, MixinConfig>,
}

impl<'s, 'm> OptionsWalker<'s, 'm> {
    pub(super) fn new(
        source: &'s str,
        model: &'m mut ComponentModel,
        mixins: &'m FxHashMap<String, MixinConfig>,
    ) -> Self {
        Self {
            source,
            model,
            mixins,
        }
    }

    pub(super) fn walk(&mut self, object: &ObjectExpression<'_>) {
        for property in object.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(property) = property else {
                tracing::debug!("skipping spread in component options");
                continue;
            };
            let Some(key) = property.key.static_name() else {
                continue;
            };

            match key.as_ref() {
                "name" => {
                    if let Expression::StringLiteral(name) = &property.value {
                        self.model.name = Some(CompactString::new(name.value.as_str()));
                    }
                }
                "props" => self.props(&property.value),
                "emits" => self.emits(&property.value),
                "data" => self.data(&property.value),
                "computed" => self.computed(&property.value),
                "methods" => self.methods(&property.value),
                "watch" => self.watch(&property.value),
                "mixins" => self.mixins(&property.value),
                "components" => self.components(&property.value),
                "asyncData" => self.async_data(&property.value),
                "head" => self.head(&property.value),
                "fetch" => self.model.fetch = self.function_text(&property.value),
                "nuxtI18n" => {
                    self.model.nuxt_i18n = Some(self.slice(property.value.span()).to_string());
                }
                other => match LifecycleKind::from_option(other) {
                    Some(kind) => self.hook(kind, other, &property.value),
                    None => self
                        .model
                        .unsupported_options
                        .push(CompactString::new(other)),
                },
            }
        }
    }

    #[inline]
    fn slice(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    /// Parameters, body and async-ness of a function or arrow value.
    fn function_text(&self, value: &Expression<'_>) -> Option<FunctionText> {
        self.function_with_form(value).map(|(function, _)| function)
    }

    fn function_with_form(&self, value: &Expression<'_>) -> Option<(FunctionText, MethodForm)> {
        match value {
            Expression::FunctionExpression(func) => {
                let body = func.body.as_ref()?;
                Some((
                    FunctionText {
                        params: strip_parens(self.slice(func.params.span)).to_string(),
                        body: strip_braces(self.slice(body.span)).to_string(),
                        is_async: func.r#async,
                    },
                    MethodForm::Function,
                ))
            }
            Expression::ArrowFunctionExpression(arrow) => {
                let body = if arrow.expression {
                    let expression = arrow.body.statements.first()?;
                    format!("return {};", self.slice(expression.span()))
                } else {
                    strip_braces(self.slice(arrow.body.span)).to_string()
                };
                Some((
                    FunctionText {
                        params: strip_parens(self.slice(arrow.params.span)).to_string(),
                        body,
                        is_async: arrow.r#async,
                    },
                    MethodForm::Arrow,
                ))
            }
            _ => None,
        }
    }

    fn props(&mut self, value: &Expression<'_>) {
        let names = match value {
            Expression::ArrayExpression(array) => array
                .elements
                .iter()
                .filter_map(|element| match element {
                    ArrayExpressionElement::StringLiteral(s) => {
                        Some(CompactString::new(s.value.as_str()))
                    }
                    _ => None,
                })
                .collect(),
            Expression::ObjectExpression(object) => object_keys(object),
            _ => Vec::new(),
        };
        self.model.props = Some(PropSet {
            raw: self.slice(value.span()).to_string(),
            names,
        });
    }

    fn emits(&mut self, value: &Expression<'_>) {
        let names: Vec<CompactString> = match value {
            Expression::ArrayExpression(array) => array
                .elements
                .iter()
                .filter_map(|element| match element {
                    ArrayExpressionElement::StringLiteral(s) => {
                        Some(CompactString::new(s.value.as_str()))
                    }
                    _ => None,
                })
                .collect(),
            Expression::ObjectExpression(object) => object_keys(object),
            _ => Vec::new(),
        };
        for name in names {
            self.model.add_emit(&name);
        }
    }

    fn data(&mut self, value: &Expression<'_>) {
        let object = match value {
            Expression::ObjectExpression(object) => Some(&**object),
            Expression::FunctionExpression(func) => match &func.body {
                Some(body) => self.returned_data(&body.statements, body.span),
                None => None,
            },
            Expression::ArrowFunctionExpression(arrow) if arrow.expression => {
                match arrow.body.statements.first() {
                    Some(Statement::ExpressionStatement(stmt)) => {
                        object_expression(&stmt.expression)
                    }
                    _ => None,
                }
            }
            Expression::ArrowFunctionExpression(arrow) => {
                self.returned_data(&arrow.body.statements, arrow.body.span)
            }
            _ => None,
        };

        let Some(object) = object else {
            tracing::debug!("data option does not return an object literal");
            return;
        };

        for property in object.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(property) = property else {
                continue;
            };
            let Some(name) = property.key.static_name() else {
                continue;
            };
            let init = self.slice(property.value.span()).to_string();
            upsert(
                &mut self.model.data,
                DataProperty {
                    name: CompactString::new(name.as_ref()),
                    init,
                },
                |d| d.name.as_str(),
            );
        }
    }

    /// Object returned at the top level of a `data` body; records any
    /// statements before that return as the data prelude.
    fn returned_data<'b, 'a>(
        &mut self,
        statements: &'b [Statement<'a>],
        body_span: Span,
    ) -> Option<&'b ObjectExpression<'a>> {
        statements.iter().find_map(|stmt| {
            let Statement::ReturnStatement(ret) = stmt else {
                return None;
            };
            let object = object_expression(ret.argument.as_ref()?)?;
            let prelude = self.source[body_span.start as usize + 1..ret.span.start as usize].trim();
            if !prelude.is_empty() {
                self.model.data_prelude = Some(prelude.to_string());
            }
            Some(object)
        })
    }

    fn computed(&mut self, value: &Expression<'_>) {
        let Expression::ObjectExpression(object) = value else {
            return;
        };
        for property in object.properties.iter() {
            match property {
                ObjectPropertyKind::SpreadProperty(spread) => self.store_spread(&spread.argument),
                ObjectPropertyKind::ObjectProperty(property) => {
                    let Some(name) = property.key.static_name() else {
                        continue;
                    };
                    let kind = match &property.value {
                        Expression::ObjectExpression(accessors) => self.get_set(accessors),
                        other => self.function_text(other).map(ComputedKind::Plain),
                    };
                    match kind {
                        Some(kind) => upsert(
                            &mut self.model.computed,
                            ComputedProperty {
                                name: CompactString::new(name.as_ref()),
                                kind,
                            },
                            |c| c.name.as_str(),
                        ),
                        None => tracing::debug!("computed `{}` is not a function", name),
                    }
                }
            }
        }
    }

    fn get_set(&self, accessors: &ObjectExpression<'_>) -> Option<ComputedKind> {
        let mut get = None;
        let mut set = None;
        for property in accessors.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(property) = property else {
                continue;
            };
            match property.key.static_name().as_deref() {
                Some("get") => get = self.function_text(&property.value),
                Some("set") => set = self.function_text(&property.value),
                _ => {}
            }
        }
        Some(ComputedKind::GetSet { get: get?, set })
    }

    fn methods(&mut self, value: &Expression<'_>) {
        let Expression::ObjectExpression(object) = value else {
            return;
        };
        for property in object.properties.iter() {
            match property {
                ObjectPropertyKind::SpreadProperty(spread) => self.store_spread(&spread.argument),
                ObjectPropertyKind::ObjectProperty(property) => {
                    let Some(name) = property.key.static_name() else {
                        continue;
                    };
                    let (function, form) = self.function_with_form(&property.value).unwrap_or_else(
                        || {
                            (
                                FunctionText {
                                    body: self.slice(property.value.span()).to_string(),
                                    ..Default::default()
                                },
                                MethodForm::Expression,
                            )
                        },
                    );
                    upsert(
                        &mut self.model.methods,
                        Method {
                            name: CompactString::new(name.as_ref()),
                            function,
                            form,
                        },
                        |m| m.name.as_str(),
                    );
                }
            }
        }
    }

    fn store_spread(&mut self, argument: &Expression<'_>) {
        for binding in collect_store_bindings(argument) {
            self.model
                .store_namespaces
                .insert(binding.namespace.clone());
            upsert(&mut self.model.store_bindings, binding, |b| b.local.as_str());
        }
    }

    fn watch(&mut self, value: &Expression<'_>) {
        let Expression::ObjectExpression(object) = value else {
            return;
        };
        for property in object.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(property) = property else {
                continue;
            };
            let Some(target) = property.key.static_name() else {
                continue;
            };
            let form = match self.function_text(&property.value) {
                Some(function) => WatcherForm::Function(function),
                None => WatcherForm::Unsupported(self.slice(property.value.span()).to_string()),
            };
            upsert(
                &mut self.model.watchers,
                Watcher {
                    target: CompactString::new(target.as_ref()),
                    form,
                },
                |w| w.target.as_str(),
            );
        }
    }

    fn mixins(&mut self, value: &Expression<'_>) {
        let Expression::ArrayExpression(array) = value else {
            return;
        };
        for element in array.elements.iter() {
            let ArrayExpressionElement::Identifier(ident) = element else {
                continue;
            };
            let local = ident.name.as_str();
            let source = self
                .model
                .imports
                .iter()
                .find(|import| import.binds(local))
                .map(|import| import.source.clone());

            let config = source
                .as_deref()
                .and_then(|source| self.mixins.get(source).or_else(|| self.mixins.get(mixin_key(source))));

            match (source, config) {
                (Some(source), Some(config)) => {
                    let usage = MixinUsage::new(local, &source, config);
                    upsert(&mut self.model.mixins, usage, |m| m.local.as_str());
                }
                _ => self.model.unmapped_mixins.push(CompactString::new(local)),
            }
        }
    }

    fn components(&mut self, value: &Expression<'_>) {
        let Expression::ObjectExpression(object) = value else {
            return;
        };
        for property in object.properties.iter() {
            let ObjectPropertyKind::ObjectProperty(property) = property else {
                continue;
            };
            let Some(name) = property.key.static_name() else {
                continue;
            };
            let loader = match &property.value {
                Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_) => {
                    Some(self.slice(property.value.span()).to_string())
                }
                _ => None,
            };
            upsert(
                &mut self.model.components,
                ComponentRegistration {
                    name: CompactString::new(name.as_ref()),
                    loader,
                },
                |c| c.name.as_str(),
            );
        }
    }

    fn async_data(&mut self, value: &Expression<'_>) {
        let Some(function) = self.function_text(value) else {
            return;
        };
        let mut returned = Vec::new();
        match value {
            Expression::FunctionExpression(func) => {
                if let Some(body) = &func.body {
                    collect_return_keys(&body.statements, &mut returned);
                }
            }
            Expression::ArrowFunctionExpression(arrow) if arrow.expression => {
                if let Some(Statement::ExpressionStatement(stmt)) = arrow.body.statements.first() {
                    if let Some(object) = object_expression(&stmt.expression) {
                        push_unique_keys(object, &mut returned);
                    }
                }
            }
            Expression::ArrowFunctionExpression(arrow) => {
                collect_return_keys(&arrow.body.statements, &mut returned);
            }
            _ => {}
        }
        self.model.async_data = Some(AsyncDataBlock { function, returned });
    }

    fn head(&mut self, value: &Expression<'_>) {
        if let Expression::ObjectExpression(object) = value {
            self.model.head = Some(HeadBlock::SimpleReturn(self.slice(object.span).to_string()));
            return;
        }
        let Some(function) = self.function_text(value) else {
            return;
        };
        let statements = match value {
            Expression::FunctionExpression(func) => func.body.as_ref().map(|b| &b.statements),
            Expression::ArrowFunctionExpression(arrow) => Some(&arrow.body.statements),
            _ => None,
        };
        let simple = statements
            .filter(|statements| statements.len() == 1)
            .and_then(|statements| match statements.first() {
                Some(Statement::ReturnStatement(ret)) => {
                    ret.argument.as_ref().and_then(object_expression)
                }
                Some(Statement::ExpressionStatement(stmt)) => object_expression(&stmt.expression),
                _ => None,
            });
        self.model.head = Some(match simple {
            Some(object) => HeadBlock::SimpleReturn(self.slice(object.span).to_string()),
            None => HeadBlock::Complex(function),
        });
    }

    fn hook(&mut self, kind: LifecycleKind, option: &str, value: &Expression<'_>) {
        let Some(function) = self.function_text(value) else {
            return;
        };
        upsert(
            &mut self.model.hooks,
            LifecycleHook {
                kind,
                option: CompactString::new(option),
                function,
            },
            |h| h.option.as_str(),
        );
    }
}

/// Drop methods whose names are claimed by another category.
pub(super) fn finish(model: &mut ComponentModel) {
    let claimed: Vec<CompactString> = model
        .computed
        .iter()
        .map(|c| c.name.clone())
        .chain(model.watchers.iter().map(|w| w.target.clone()))
        .collect();
    model.methods.retain(|method| {
        let name = method.name.as_str();
        !RESERVED_METHOD_NAMES.contains(&name)
            && !LifecycleKind::is_lifecycle_option(name)
            && !claimed.iter().any(|c| c == name)
    });
}

/// Mixin config key derived from an import path: `@/mixins/form.js` → `form`.
fn mixin_key(source: &str) -> &str {
    let file = source.rsplit('/').next().unwrap_or(source);
    file.split('.').next().unwrap_or(file)
}

fn object_keys(object: &ObjectExpression<'_>) -> Vec<CompactString> {
    object
        .properties
        .iter()
        .filter_map(|property| match property {
            ObjectPropertyKind::ObjectProperty(property) => property
                .key
                .static_name()
                .map(|name| CompactString::new(name.as_ref())),
            ObjectPropertyKind::SpreadProperty(_) => None,
        })
        .collect()
}

/// Unwrap parentheses and type assertions around an object literal.
pub(super) fn object_expression<'b, 'a>(
    expr: &'b Expression<'a>,
) -> Option<&'b ObjectExpression<'a>> {
    match expr {
        Expression::ObjectExpression(object) => Some(&**object),
        Expression::ParenthesizedExpression(paren) => object_expression(&paren.expression),
        Expression::TSAsExpression(ts_as) => object_expression(&ts_as.expression),
        _ => None,
    }
}

fn push_unique_keys(object: &ObjectExpression<'_>, out: &mut Vec<CompactString>) {
    for key in object_keys(object) {
        if !out.contains(&key) {
            out.push(key);
        }
    }
}

/// Keys of object literals returned from a body, not descending into nested functions.
fn collect_return_keys(statements: &[Statement<'_>], out: &mut Vec<CompactString>) {
    for stmt in statements {
        collect_return_keys_in(stmt, out);
    }
}

fn collect_return_keys_in(stmt: &Statement<'_>, out: &mut Vec<CompactString>) {
    match stmt {
        Statement::ReturnStatement(ret) => {
            if let Some(object) = ret.argument.as_ref().and_then(object_expression) {
                push_unique_keys(object, out);
            }
        }
        Statement::BlockStatement(block) => collect_return_keys(&block.body, out),
        Statement::IfStatement(if_stmt) => {
            collect_return_keys_in(&if_stmt.consequent, out);
            if let Some(alternate) = &if_stmt.alternate {
                collect_return_keys_in(alternate, out);
            }
        }
        Statement::TryStatement(try_stmt) => {
            collect_return_keys(&try_stmt.block.body, out);
            if let Some(handler) = &try_stmt.handler {
                collect_return_keys(&handler.body.body, out);
            }
            if let Some(finalizer) = &try_stmt.finalizer {
                collect_return_keys(&finalizer.body, out);
            }
        }
        _ => {}
    }
}

fn strip_parens(params: &str) -> &str {
    let trimmed = params.trim();
    trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn strip_braces(body: &str) -> &str {
    body.strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(body)
}
