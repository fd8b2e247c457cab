use std::{collections::HashSet, sync::Arc};

use serde_json::Value;
use shared::{
    domain::{GroupNode, NameLabel, Node, NodeId, NodeKind, RuleNode},
    error::TreeError,
    protocol::Property,
};
use tracing::debug;

use crate::{
    locator::{collect_ids, find_path, group_at_path_mut},
    normalize::normalize,
    resolver::Resolver,
};

/// Which dependent properties are recomputed when a rule's field or operator changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    pub on_field_change: bool,
    pub on_operator_change: bool,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            on_field_change: true,
            on_operator_change: false,
        }
    }
}

/// Id-addressed edits over immutable snapshots. Each operation leaves its
/// input untouched and returns the next snapshot, copying only the groups
/// on the path to the edit.
pub struct MutationEngine<'a> {
    resolver: &'a Resolver,
    combinators: &'a [NameLabel],
    resets: ResetPolicy,
}

impl<'a> MutationEngine<'a> {
    pub fn new(resolver: &'a Resolver, combinators: &'a [NameLabel], resets: ResetPolicy) -> Self {
        Self {
            resolver,
            combinators,
            resets,
        }
    }

    /// Adds `rule` to the group `parent_id`, ahead of the group's first subgroup.
    pub fn add_rule(
        &self,
        root: &Arc<GroupNode>,
        mut rule: RuleNode,
        parent_id: &NodeId,
    ) -> Result<Arc<GroupNode>, TreeError> {
        ensure_fresh_ids(root, std::iter::once(&rule.id))?;
        self.prepare_rule(&mut rule);

        let mut next = Arc::clone(root);
        let parent = group_mut(&mut next, parent_id)?;
        debug!(rule_id = %rule.id, parent_id = %parent_id, "adding rule");
        parent.insert_rule(rule);
        Ok(next)
    }

    /// Appends `group` to `parent_id` after seeding it with `seed_rule`, so a
    /// group never enters the tree empty. `group` must arrive without children
    /// and with a configured combinator.
    pub fn add_group(
        &self,
        root: &Arc<GroupNode>,
        mut group: GroupNode,
        mut seed_rule: RuleNode,
        parent_id: &NodeId,
    ) -> Result<Arc<GroupNode>, TreeError> {
        if !group.is_empty() {
            return Err(TreeError::GroupNotEmpty(group.id));
        }
        self.check_combinator(&group.combinator)?;
        self.prepare_rule(&mut seed_rule);
        group.rules.push(Node::Rule(seed_rule));

        let incoming = collect_ids(&group);
        let mut local = HashSet::new();
        if let Some(repeated) = incoming.iter().find(|id| !local.insert(*id)) {
            return Err(TreeError::DuplicateId((*repeated).clone()));
        }
        ensure_fresh_ids(root, incoming.iter())?;

        let mut next = Arc::clone(root);
        let parent = group_mut(&mut next, parent_id)?;
        debug!(group_id = %group.id, parent_id = %parent_id, "adding group");
        parent.rules.push(Node::Group(Arc::new(group)));
        Ok(next)
    }

    /// Sets one property on the node `node_id`, applying the reset policy for
    /// `field` and `operator` edits on rules.
    pub fn change_property(
        &self,
        root: &Arc<GroupNode>,
        prop: Property,
        value: Value,
        node_id: &NodeId,
    ) -> Result<Arc<GroupNode>, TreeError> {
        let path =
            find_path(node_id, root).ok_or_else(|| TreeError::NodeNotFound(node_id.clone()))?;
        let mut next = Arc::clone(root);
        match path.split_last() {
            None => self.set_group_property(Arc::make_mut(&mut next), prop, value)?,
            Some((&index, parent_path)) => {
                let parent = group_at_path_mut(&mut next, parent_path)
                    .ok_or_else(|| TreeError::NodeNotFound(node_id.clone()))?;
                match parent.rules.get_mut(index) {
                    Some(Node::Rule(rule)) => self.set_rule_property(rule, prop, value)?,
                    Some(Node::Group(group)) => {
                        self.set_group_property(Arc::make_mut(group), prop, value)?
                    }
                    None => return Err(TreeError::NodeNotFound(node_id.clone())),
                }
            }
        }
        debug!(node_id = %node_id, prop = %prop, "changed property");
        Ok(next)
    }

    pub fn remove_rule(
        &self,
        root: &Arc<GroupNode>,
        rule_id: &NodeId,
        parent_id: &NodeId,
    ) -> Result<Arc<GroupNode>, TreeError> {
        remove_child(root, rule_id, parent_id, NodeKind::Rule)
    }

    pub fn remove_group(
        &self,
        root: &Arc<GroupNode>,
        group_id: &NodeId,
        parent_id: &NodeId,
    ) -> Result<Arc<GroupNode>, TreeError> {
        remove_child(root, group_id, parent_id, NodeKind::Group)
    }

    /// Drops every child of the root, keeping its id, combinator and metadata.
    pub fn clear_all(&self, root: &GroupNode) -> Arc<GroupNode> {
        Arc::new(root.with_rules(Vec::new()))
    }

    /// Swaps an operator the field does not offer for the field's default and
    /// resets the value.
    fn prepare_rule(&self, rule: &mut RuleNode) {
        if !self.resolver.has_operator(&rule.field, &rule.operator) {
            rule.operator = self.resolver.default_operator(&rule.field);
        }
        rule.value = self.resolver.default_value(rule);
    }

    fn check_combinator(&self, combinator: &str) -> Result<(), TreeError> {
        let known = self.combinators.is_empty()
            || self.combinators.iter().any(|c| c.name == combinator);
        if combinator.is_empty() || !known {
            return Err(TreeError::InvalidValue {
                prop: Property::Combinator,
                expected: "a configured combinator",
            });
        }
        Ok(())
    }

    fn set_rule_property(
        &self,
        rule: &mut RuleNode,
        prop: Property,
        value: Value,
    ) -> Result<(), TreeError> {
        match prop {
            Property::Field => {
                rule.field = expect_string(prop, value)?;
                if self.resets.on_field_change {
                    rule.operator = self.resolver.default_operator(&rule.field);
                    rule.value = self.resolver.default_value(rule);
                }
            }
            Property::Operator => {
                let operator = expect_string(prop, value)?;
                if !self.resolver.has_operator(&rule.field, &operator) {
                    return Err(TreeError::InvalidValue {
                        prop,
                        expected: "an operator offered for the rule's field",
                    });
                }
                let previous = std::mem::replace(&mut rule.operator, operator);
                if self.resets.on_operator_change {
                    rule.value = self.resolver.value_on_operator_change(rule, &previous);
                }
            }
            Property::Value => rule.value = value,
            _ => {
                return Err(TreeError::UnsupportedProperty {
                    prop,
                    kind: NodeKind::Rule,
                    id: rule.id.clone(),
                })
            }
        }
        Ok(())
    }

    fn set_group_property(
        &self,
        group: &mut GroupNode,
        prop: Property,
        value: Value,
    ) -> Result<(), TreeError> {
        match prop {
            Property::Combinator => {
                let combinator = expect_string(prop, value)?;
                self.check_combinator(&combinator)?;
                group.combinator = combinator;
            }
            Property::Not => group.not = expect_bool(prop, value)?,
            Property::Name => group.name = optional_string(prop, value)?,
            Property::Email => group.email = optional_string(prop, value)?,
            Property::IsActive => {
                group.is_active = match value {
                    Value::Null => None,
                    other => Some(expect_bool(prop, other)?),
                }
            }
            Property::Field | Property::Operator | Property::Value => {
                return Err(TreeError::UnsupportedProperty {
                    prop,
                    kind: NodeKind::Group,
                    id: group.id.clone(),
                })
            }
        }
        Ok(())
    }
}

fn remove_child(
    root: &Arc<GroupNode>,
    child_id: &NodeId,
    parent_id: &NodeId,
    kind: NodeKind,
) -> Result<Arc<GroupNode>, TreeError> {
    let mut next = Arc::clone(root);
    let parent = group_mut(&mut next, parent_id)?;
    let index = parent
        .rules
        .iter()
        .position(|child| child.id() == child_id && child.kind() == kind)
        .ok_or_else(|| TreeError::ChildNotFound {
            parent: parent_id.clone(),
            child: child_id.clone(),
            kind,
        })?;
    parent.rules.remove(index);
    debug!(child_id = %child_id, parent_id = %parent_id, ?kind, "removed child");
    Ok(normalize(&next))
}

fn group_mut<'t>(
    root: &'t mut Arc<GroupNode>,
    id: &NodeId,
) -> Result<&'t mut GroupNode, TreeError> {
    let path = find_path(id, root).ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
    group_at_path_mut(root, &path).ok_or_else(|| TreeError::NotAGroup(id.clone()))
}

fn ensure_fresh_ids<'i>(
    root: &GroupNode,
    incoming: impl IntoIterator<Item = &'i NodeId>,
) -> Result<(), TreeError> {
    let existing: HashSet<NodeId> = collect_ids(root).into_iter().collect();
    match incoming.into_iter().find(|id| existing.contains(*id)) {
        Some(id) => Err(TreeError::DuplicateId(id.clone())),
        None => Ok(()),
    }
}

fn expect_string(prop: Property, value: Value) -> Result<String, TreeError> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(TreeError::InvalidValue {
            prop,
            expected: "a string",
        }),
    }
}

fn expect_bool(prop: Property, value: Value) -> Result<bool, TreeError> {
    value.as_bool().ok_or(TreeError::InvalidValue {
        prop,
        expected: "a boolean",
    })
}

fn optional_string(prop: Property, value: Value) -> Result<Option<String>, TreeError> {
    match value {
        Value::Null => Ok(None),
        other => expect_string(prop, other).map(Some),
    }
}

#[cfg(test)]
#[path = "tests/mutation_tests.rs"]
mod tests;
