use std::{collections::HashSet, sync::Arc};

use serde_json::Value;
use shared::{
    domain::{GroupNode, NameLabel, Node, NodeId, NodeKind, RuleNode},
    protocol::{RawGroup, RawNode, RawRule},
};
use tracing::{debug, warn};

use crate::{
    id::IdGenerator, locator::has_duplicate_ids, normalize::normalize, resolver::Resolver,
};

/// Turns an externally supplied tree into one that satisfies the tree
/// invariants: unique ids, known combinators, operators valid for their
/// field, and no empty subgroups.
pub struct Canonicalizer<'a> {
    resolver: &'a Resolver,
    ids: &'a mut dyn IdGenerator,
    combinators: &'a [NameLabel],
    default_field: &'a str,
    seen: HashSet<NodeId>,
    repairs: usize,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(
        resolver: &'a Resolver,
        ids: &'a mut dyn IdGenerator,
        combinators: &'a [NameLabel],
        default_field: &'a str,
    ) -> Self {
        Self {
            resolver,
            ids,
            combinators,
            default_field,
            seen: HashSet::new(),
            repairs: 0,
        }
    }

    pub fn canonicalize(mut self, raw: &RawGroup) -> Arc<GroupNode> {
        let root = Arc::new(self.group(raw));
        if self.repairs > 0 {
            warn!(
                root_id = %root.id,
                repairs = self.repairs,
                "repaired invalid nodes while adopting query"
            );
        }
        debug_assert!(!has_duplicate_ids(&root), "adopted tree repeats an id");
        normalize(&root)
    }

    fn group(&mut self, raw: &RawGroup) -> GroupNode {
        let id = self.claim_id(raw.id.as_deref(), NodeKind::Group);
        let combinator = self.combinator(raw.combinator.as_deref());
        let rules = raw
            .rules
            .iter()
            .map(|child| match child {
                RawNode::Group(group) => Node::Group(Arc::new(self.group(group))),
                RawNode::Rule(rule) => Node::Rule(self.rule(rule)),
            })
            .collect();
        GroupNode {
            id,
            combinator,
            not: raw.not.unwrap_or(false),
            rules,
            name: raw.name.clone(),
            email: raw.email.clone(),
            is_active: raw.is_active,
        }
    }

    fn rule(&mut self, raw: &RawRule) -> RuleNode {
        let id = self.claim_id(raw.id.as_deref(), NodeKind::Rule);
        let field = match raw.field.as_deref() {
            Some(field) if !field.is_empty() => field.to_string(),
            _ => self.default_field.to_string(),
        };
        let mut rule = RuleNode {
            id,
            operator: String::new(),
            value: raw.value.clone().unwrap_or(Value::Null),
            field,
        };
        match raw.operator.as_deref() {
            Some(operator) if self.resolver.has_operator(&rule.field, operator) => {
                rule.operator = operator.to_string();
                if raw.value.is_none() {
                    rule.value = self.resolver.default_value(&rule);
                }
            }
            requested => {
                if requested.is_some() {
                    self.repairs += 1;
                    warn!(
                        rule_id = %rule.id,
                        field = %rule.field,
                        ?requested,
                        "operator not offered for field; using default"
                    );
                }
                rule.operator = self.resolver.default_operator(&rule.field);
                rule.value = self.resolver.default_value(&rule);
            }
        }
        rule
    }

    fn combinator(&mut self, requested: Option<&str>) -> String {
        let fallback = self
            .combinators
            .first()
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "and".to_string());
        match requested {
            Some(name)
                if !name.is_empty()
                    && (self.combinators.is_empty()
                        || self.combinators.iter().any(|c| c.name == name)) =>
            {
                name.to_string()
            }
            Some(name) => {
                self.repairs += 1;
                warn!(combinator = name, fallback = %fallback, "unknown combinator replaced");
                fallback
            }
            None => fallback,
        }
    }

    fn claim_id(&mut self, requested: Option<&str>, kind: NodeKind) -> NodeId {
        if let Some(raw) = requested.filter(|raw| !raw.is_empty()) {
            let id = NodeId::from(raw);
            if self.seen.insert(id.clone()) {
                return id;
            }
            self.repairs += 1;
            warn!(%id, "duplicate node id replaced");
        }
        loop {
            let id = self.ids.next_id(kind);
            if self.seen.insert(id.clone()) {
                debug!(%id, ?kind, "assigned node id");
                return id;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/canonical_tests.rs"]
mod tests;
