use std::{collections::HashSet, sync::Arc};

use shared::domain::{GroupNode, Node, NodeId, RuleNode};

/// A node found by id. The root is reported as a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Group(&'a GroupNode),
    Rule(&'a RuleNode),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &'a NodeId {
        match self {
            NodeRef::Group(group) => &group.id,
            NodeRef::Rule(rule) => &rule.id,
        }
    }

    pub fn as_group(&self) -> Option<&'a GroupNode> {
        match self {
            NodeRef::Group(group) => Some(group),
            NodeRef::Rule(_) => None,
        }
    }
}

/// Depth-first preorder search, the root included.
pub fn find_node<'a>(id: &NodeId, root: &'a GroupNode) -> Option<NodeRef<'a>> {
    if &root.id == id {
        return Some(NodeRef::Group(root));
    }
    for child in &root.rules {
        match child {
            Node::Rule(rule) if &rule.id == id => return Some(NodeRef::Rule(rule)),
            Node::Rule(_) => {}
            Node::Group(group) => {
                if let Some(found) = find_node(id, group) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Child-index path from the root to the node with `id`; empty for the root itself.
pub fn find_path(id: &NodeId, root: &GroupNode) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    if search_path(id, root, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn search_path(id: &NodeId, group: &GroupNode, path: &mut Vec<usize>) -> bool {
    if &group.id == id {
        return true;
    }
    for (index, child) in group.rules.iter().enumerate() {
        path.push(index);
        let found = match child {
            Node::Rule(rule) => &rule.id == id,
            Node::Group(sub) => search_path(id, sub, path),
        };
        if found {
            return true;
        }
        path.pop();
    }
    false
}

/// Nesting level of the node with `id`: the root is 0, every child group adds
/// one, and a rule sits at the level of the group holding it. `None` when the
/// id is not in the tree.
pub fn level_of(id: &NodeId, root: &GroupNode) -> Option<usize> {
    level_from(id, 0, root)
}

fn level_from(id: &NodeId, level: usize, group: &GroupNode) -> Option<usize> {
    if &group.id == id {
        return Some(level);
    }
    group.rules.iter().find_map(|child| match child {
        Node::Rule(rule) => (&rule.id == id).then_some(level),
        Node::Group(sub) => level_from(id, level + 1, sub),
    })
}

pub fn contains_id(root: &GroupNode, id: &NodeId) -> bool {
    find_node(id, root).is_some()
}

pub fn collect_ids(root: &GroupNode) -> Vec<NodeId> {
    let mut ids = vec![root.id.clone()];
    collect_into(root, &mut ids);
    ids
}

fn collect_into(group: &GroupNode, ids: &mut Vec<NodeId>) {
    for child in &group.rules {
        ids.push(child.id().clone());
        if let Node::Group(sub) = child {
            collect_into(sub, ids);
        }
    }
}

/// True when any id occurs more than once.
pub fn has_duplicate_ids(root: &GroupNode) -> bool {
    let mut seen = HashSet::new();
    collect_ids(root).into_iter().any(|id| !seen.insert(id))
}

/// Walks `path` from the root, copying each shared group on the way.
pub(crate) fn group_at_path_mut<'a>(
    root: &'a mut Arc<GroupNode>,
    path: &[usize],
) -> Option<&'a mut GroupNode> {
    let mut group = Arc::make_mut(root);
    for &index in path {
        group = match group.rules.get_mut(index)? {
            Node::Group(child) => Arc::make_mut(child),
            Node::Rule(_) => return None,
        };
    }
    Some(group)
}

#[cfg(test)]
#[path = "tests/locator_tests.rs"]
mod tests;
