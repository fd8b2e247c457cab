use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Rule,
    Group,
}

impl NodeKind {
    /// Prefix used for generated ids (`r-...` / `g-...`).
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Rule => "r",
            NodeKind::Group => "g",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    #[default]
    Text,
    Textarea,
    Select,
    Checkbox,
    Radio,
    Autocomplete,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameLabel {
    pub name: String,
    pub label: String,
}

impl NameLabel {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Field metadata as supplied by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<NameLabel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_editor_type: Option<EditorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<NameLabel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            label: label.into(),
            operators: None,
            value_editor_type: None,
            input_type: None,
            values: None,
            placeholder: None,
        }
    }

    /// The "nothing selected yet" entry shown first when fields are not auto-selected.
    pub fn unselected() -> Self {
        let mut field = Self::new("~", "------");
        field.id = Some("~".to_string());
        field
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleNode {
    pub id: NodeId,
    pub field: String,
    pub operator: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    pub id: NodeId,
    pub combinator: String,
    #[serde(default)]
    pub not: bool,
    pub rules: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl GroupNode {
    pub fn new(id: NodeId, combinator: impl Into<String>) -> Self {
        Self {
            id,
            combinator: combinator.into(),
            not: false,
            rules: Vec::new(),
            name: None,
            email: None,
            is_active: None,
        }
    }

    /// Copy of this group's identity and metadata with a different child list.
    pub fn with_rules(&self, rules: Vec<Node>) -> Self {
        Self {
            id: self.id.clone(),
            combinator: self.combinator.clone(),
            not: self.not,
            rules,
            name: self.name.clone(),
            email: self.email.clone(),
            is_active: self.is_active,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn first_group_index(&self) -> Option<usize> {
        self.rules.iter().position(Node::is_group)
    }

    pub fn child_index(&self, id: &NodeId) -> Option<usize> {
        self.rules.iter().position(|child| child.id() == id)
    }

    /// Inserts a rule before the first subgroup, or at the end when there is none.
    pub fn insert_rule(&mut self, rule: RuleNode) {
        match self.first_group_index() {
            Some(index) => self.rules.insert(index, Node::Rule(rule)),
            None => self.rules.push(Node::Rule(rule)),
        }
    }
}

/// A child of a group. Deserialization picks `Group` for records carrying
/// `combinator` and `rules`, `Rule` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Group(Arc<GroupNode>),
    Rule(RuleNode),
}

impl Node {
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Group(group) => &group.id,
            Node::Rule(rule) => &rule.id,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Group(_) => NodeKind::Group,
            Node::Rule(_) => NodeKind::Rule,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    pub fn as_rule(&self) -> Option<&RuleNode> {
        match self {
            Node::Rule(rule) => Some(rule),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Arc<GroupNode>> {
        match self {
            Node::Group(group) => Some(group),
            Node::Rule(_) => None,
        }
    }
}

impl From<RuleNode> for Node {
    fn from(value: RuleNode) -> Self {
        Node::Rule(value)
    }
}

impl From<GroupNode> for Node {
    fn from(value: GroupNode) -> Self {
        Node::Group(Arc::new(value))
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
