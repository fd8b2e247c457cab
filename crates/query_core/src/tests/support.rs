use std::sync::Arc;

use serde_json::{json, Value};
use shared::domain::{GroupNode, Node, NodeId, RuleNode};

pub fn rule(id: &str, field: &str) -> RuleNode {
    rule_with(id, field, "=", json!(""))
}

pub fn rule_with(id: &str, field: &str, operator: &str, value: Value) -> RuleNode {
    RuleNode {
        id: NodeId::from(id),
        field: field.to_string(),
        operator: operator.to_string(),
        value,
    }
}

pub fn group(id: &str, children: Vec<Node>) -> GroupNode {
    let mut group = GroupNode::new(NodeId::from(id), "and");
    group.rules = children;
    group
}

pub fn tree(id: &str, children: Vec<Node>) -> Arc<GroupNode> {
    Arc::new(group(id, children))
}

pub fn r(id: &str) -> Node {
    Node::Rule(rule(id, "name"))
}

pub fn g(id: &str, children: Vec<Node>) -> Node {
    Node::Group(Arc::new(group(id, children)))
}

pub fn child_ids(group: &GroupNode) -> Vec<&str> {
    group.rules.iter().map(|child| child.id().as_str()).collect()
}

/// Every non-root group has at least one child.
pub fn no_empty_subgroups(root: &GroupNode) -> bool {
    root.rules.iter().all(|child| match child {
        Node::Rule(_) => true,
        Node::Group(sub) => !sub.rules.is_empty() && no_empty_subgroups(sub),
    })
}
