//! Bulk store mapping helpers spread into `computed` or `methods`.

use oxc_ast::ast::{
    Argument, ArrayExpressionElement, BindingPattern, Expression, ObjectExpression,
    ObjectPropertyKind, Statement,
};
use pentimento_carton::CompactString;

use crate::model::StoreBinding;
use crate::store::{split_store_path, StoreKind, ROOT_NAMESPACE};

/// Expand `...mapX(ns?, [..] | {..})` into one binding per mapped name.
pub(super) fn collect_store_bindings(argument: &Expression<'_>) -> Vec<StoreBinding> {
    let Expression::CallExpression(call) = argument else {
        return Vec::new();
    };
    let helper = match &call.callee {
        Expression::Identifier(ident) => ident.name.as_str(),
        Expression::StaticMemberExpression(member) => member.property.name.as_str(),
        _ => return Vec::new(),
    };
    let Some(kind) = StoreKind::from_helper(helper) else {
        tracing::debug!("spread of `{}` is not a store helper", helper);
        return Vec::new();
    };

    let mut arguments = call.arguments.iter();
    let (namespace, mapping) = match arguments.next() {
        Some(Argument::StringLiteral(ns)) => (Some(ns.value.as_str()), arguments.next()),
        first => (None, first),
    };

    let mut bindings = Vec::new();
    match mapping {
        Some(Argument::ArrayExpression(array)) => {
            for element in array.elements.iter() {
                if let ArrayExpressionElement::StringLiteral(s) = element {
                    let (ns, remote) = resolve(namespace, s.value.as_str());
                    bindings.push(binding(ns, kind, remote, remote));
                }
            }
        }
        Some(Argument::ObjectExpression(object)) => {
            map_object(object, namespace, kind, &mut bindings);
        }
        _ => tracing::debug!("unrecognized `{}` arguments", helper),
    }
    bindings
}

fn map_object(
    object: &ObjectExpression<'_>,
    namespace: Option<&str>,
    kind: StoreKind,
    out: &mut Vec<StoreBinding>,
) {
    for property in object.properties.iter() {
        let ObjectPropertyKind::ObjectProperty(property) = property else {
            continue;
        };
        let Some(local) = property.key.static_name() else {
            continue;
        };
        let resolved = match &property.value {
            Expression::StringLiteral(s) => {
                let (ns, remote) = resolve(namespace, s.value.as_str());
                Some((ns, remote.to_string()))
            }
            Expression::ArrowFunctionExpression(_) => {
                state_path(&property.value).and_then(|segments| match (namespace, &segments[..]) {
                    (Some(ns), [_, ..]) => Some((ns, segments.join("."))),
                    (None, [remote]) => Some((ROOT_NAMESPACE, remote.to_string())),
                    (None, [ns, rest @ ..]) => Some((*ns, rest.join("."))),
                    _ => None,
                })
            }
            _ => None,
        };
        match resolved {
            Some((ns, remote)) => out.push(binding(ns, kind, &local, &remote)),
            None => tracing::debug!("cannot resolve store mapping for `{}`", local),
        }
    }
}

fn resolve<'a>(namespace: Option<&'a str>, path: &'a str) -> (&'a str, &'a str) {
    match namespace {
        Some(ns) => (ns, path),
        None => split_store_path(path),
    }
}

fn binding(namespace: &str, kind: StoreKind, local: &str, remote: &str) -> StoreBinding {
    StoreBinding {
        namespace: CompactString::new(namespace),
        kind,
        local: CompactString::new(local),
        remote: CompactString::new(remote),
    }
}

/// Member segments read from the arrow's first parameter: `state => state.cart.items`.
///
/// The whole path is kept; `s => s.items.length` maps to `items.length`.
fn state_path<'a>(value: &Expression<'a>) -> Option<Vec<&'a str>> {
    let Expression::ArrowFunctionExpression(arrow) = value else {
        return None;
    };
    if !arrow.expression {
        return None;
    }
    let param = match &arrow.params.items.first()?.pattern {
        BindingPattern::BindingIdentifier(ident) => ident.name.as_str(),
        _ => return None,
    };
    let Some(Statement::ExpressionStatement(stmt)) = arrow.body.statements.first() else {
        return None;
    };

    let mut segments = Vec::new();
    let mut current = &stmt.expression;
    loop {
        match current {
            Expression::StaticMemberExpression(member) => {
                segments.push(member.property.name.as_str());
                current = &member.object;
            }
            Expression::Identifier(ident) if ident.name.as_str() == param => break,
            _ => return None,
        }
    }
    segments.reverse();
    (!segments.is_empty()).then_some(segments)
}
