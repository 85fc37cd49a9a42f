//! Collects what framework accessors declare about the component:
//! template refs read through `this.$refs`, events sent with `this.$emit`,
//! and store namespaces reached through `this.$store`.

use oxc_ast::ast::{
    Argument, CallExpression, ComputedMemberExpression, Expression, StaticMemberExpression,
};
use oxc_ast_visit::{walk, Visit};
use pentimento_carton::CompactString;

use crate::model::ComponentModel;
use crate::store::{split_store_path, ROOT_NAMESPACE};

pub(super) struct ThisAccessCollector<'m> {
    model: &'m mut ComponentModel,
}

impl<'m> ThisAccessCollector<'m> {
    pub(super) fn new(model: &'m mut ComponentModel) -> Self {
        Self { model }
    }

    fn namespace(&mut self, namespace: &str) {
        self.model
            .store_namespaces
            .insert(CompactString::new(namespace));
    }

    fn referenced_ref(&mut self, name: &str) {
        self.model
            .refs
            .referenced
            .insert(CompactString::new(name));
    }
}

/// Property name of `this.<name>`.
fn this_property<'b>(expr: &'b Expression<'_>) -> Option<&'b str> {
    match expr {
        Expression::StaticMemberExpression(member)
            if matches!(member.object, Expression::ThisExpression(_)) =>
        {
            Some(member.property.name.as_str())
        }
        _ => None,
    }
}

/// `this.$store.<segment>`.
fn store_segment<'b>(expr: &'b Expression<'_>) -> Option<&'b str> {
    match expr {
        Expression::StaticMemberExpression(member) => {
            (this_property(&member.object) == Some("$store"))
                .then(|| member.property.name.as_str())
        }
        _ => None,
    }
}

impl<'a> Visit<'a> for ThisAccessCollector<'_> {
    fn visit_static_member_expression(&mut self, member: &StaticMemberExpression<'a>) {
        if this_property(&member.object) == Some("$refs") {
            self.referenced_ref(member.property.name.as_str());
        } else if store_segment(&member.object) == Some("getters") {
            self.namespace(ROOT_NAMESPACE);
        }

        walk::walk_static_member_expression(self, member);
    }

    fn visit_computed_member_expression(&mut self, member: &ComputedMemberExpression<'a>) {
        if let Expression::StringLiteral(key) = &member.expression {
            let key = key.value.as_str();
            if this_property(&member.object) == Some("$refs") {
                self.referenced_ref(key);
            } else if store_segment(&member.object) == Some("getters") {
                let (namespace, _) = split_store_path(key);
                self.namespace(namespace);
            }
        }

        walk::walk_computed_member_expression(self, member);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        let first = match call.arguments.first() {
            Some(Argument::StringLiteral(s)) => Some(s.value.as_str()),
            _ => None,
        };

        if let Some(first) = first {
            if this_property(&call.callee) == Some("$emit") {
                self.model.add_emit(first);
            } else if let Expression::StaticMemberExpression(callee) = &call.callee {
                let method = callee.property.name.as_str();
                if matches!(method, "dispatch" | "commit")
                    && this_property(&callee.object) == Some("$store")
                {
                    let (namespace, _) = split_store_path(first);
                    self.namespace(namespace);
                }
            }
        }

        walk::walk_call_expression(self, call);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn collect(expr: &str) -> ComponentModel {
        let allocator = Allocator::default();
        let expression = Parser::new(&allocator, expr, SourceType::mjs())
            .parse_expression()
            .unwrap();
        let mut model = ComponentModel::default();
        ThisAccessCollector::new(&mut model).visit_expression(&expression);
        model
    }

    #[test]
    fn test_emit_is_recorded() {
        let model = collect("this.$emit('input', 1)");
        assert_eq!(model.emits, vec!["update:value"]);
    }

    #[test]
    fn test_store_state_is_not_a_namespace() {
        let model = collect("this.$store.state['cart']");
        assert!(model.store_namespaces.is_empty());
    }

    #[test]
    fn test_getters_namespace() {
        let model = collect("[this.$store.getters['user/name'], this.$store.getters.ready]");
        let namespaces: Vec<_> = model.store_namespaces.iter().map(|n| n.as_str()).collect();
        assert_eq!(namespaces, vec!["root", "user"]);
    }

    #[test]
    fn test_refs_by_member_and_index() {
        let model = collect("[this.$refs.form, this.$refs['list']]");
        let refs: Vec<_> = model.refs.referenced.iter().map(|r| r.as_str()).collect();
        assert_eq!(refs, vec!["form", "list"]);
    }
}
