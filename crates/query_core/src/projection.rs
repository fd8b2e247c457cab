use std::sync::Arc;

use shared::domain::{GroupNode, Node};

/// Single-level view of the root: its direct rule children, in order.
/// Child groups are dropped without being looked into.
pub fn project_flat(root: &GroupNode) -> Arc<GroupNode> {
    let rules = root
        .rules
        .iter()
        .filter(|child| matches!(child, Node::Rule(_)))
        .cloned()
        .collect();
    Arc::new(root.with_rules(rules))
}

/// True when the flat view would show no filters at all.
pub fn is_empty_view(root: &GroupNode) -> bool {
    !root.rules.iter().any(|child| matches!(child, Node::Rule(_)))
}
