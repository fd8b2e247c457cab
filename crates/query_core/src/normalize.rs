use std::sync::Arc;

use shared::domain::{GroupNode, Node};

/// Rebuilds the tree without groups that end up with no children. The root
/// is kept even when empty. Subtrees with nothing to prune are shared with
/// the input rather than copied.
pub fn normalize(root: &Arc<GroupNode>) -> Arc<GroupNode> {
    match pruned_children(root) {
        Some(rules) => Arc::new(root.with_rules(rules)),
        None => Arc::clone(root),
    }
}

/// `None` when nothing below `group` changed.
fn pruned_children(group: &GroupNode) -> Option<Vec<Node>> {
    let mut changed = false;
    let mut rules = Vec::with_capacity(group.rules.len());
    for child in &group.rules {
        match child {
            Node::Rule(_) => rules.push(child.clone()),
            Node::Group(sub) => {
                let pruned = normalize(sub);
                if pruned.is_empty() {
                    changed = true;
                    continue;
                }
                if !Arc::ptr_eq(&pruned, sub) {
                    changed = true;
                }
                rules.push(Node::Group(pruned));
            }
        }
    }
    changed.then_some(rules)
}

#[cfg(test)]
#[path = "tests/normalize_tests.rs"]
mod tests;
