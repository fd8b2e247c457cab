use std::{fmt, str::FromStr, sync::Arc};

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    domain::{GroupNode, NodeId},
    error::TreeError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    Field,
    Operator,
    Value,
    Combinator,
    Not,
    Name,
    Email,
    IsActive,
}

impl Property {
    pub fn as_str(self) -> &'static str {
        match self {
            Property::Field => "field",
            Property::Operator => "operator",
            Property::Value => "value",
            Property::Combinator => "combinator",
            Property::Not => "not",
            Property::Name => "name",
            Property::Email => "email",
            Property::IsActive => "isActive",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Property {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "field" => Ok(Property::Field),
            "operator" => Ok(Property::Operator),
            "value" => Ok(Property::Value),
            "combinator" => Ok(Property::Combinator),
            "not" => Ok(Property::Not),
            "name" => Ok(Property::Name),
            "email" => Ok(Property::Email),
            "isActive" | "is_active" => Ok(Property::IsActive),
            other => Err(TreeError::UnknownProperty(other.to_string())),
        }
    }
}

/// Payload handed to the change listener after mount and after every applied mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryChange {
    pub query: Arc<GroupNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_prop: Option<Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_id: Option<NodeId>,
}

impl QueryChange {
    pub fn new(query: Arc<GroupNode>) -> Self {
        Self {
            query,
            changed_prop: None,
            changed_id: None,
        }
    }

    pub fn with_property(mut self, prop: Property, id: NodeId) -> Self {
        self.changed_prop = Some(prop);
        self.changed_id = Some(id);
        self
    }
}

/// Loosely-shaped tree as received from the outside. Every key is optional
/// and unknown keys are dropped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGroup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub combinator: Option<String>,
    #[serde(default)]
    pub not: Option<bool>,
    #[serde(default)]
    pub rules: Vec<RawNode>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    Group(RawGroup),
    Rule(RawRule),
}

impl<'de> Deserialize<'de> for RawNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(de::Error::custom("query node must be an object"));
        }
        let is_group = value.get("combinator").is_some() || value.get("rules").is_some();
        if is_group {
            serde_json::from_value(value)
                .map(RawNode::Group)
                .map_err(de::Error::custom)
        } else {
            serde_json::from_value(value)
                .map(RawNode::Rule)
                .map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
