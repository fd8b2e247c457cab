//! JSON edit scripts replayed against a session.

use query_session::{Applied, QuerySession};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::NodeId,
    error::{ErrorReport, TreeError},
};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    AddRule {
        parent_id: NodeId,
        #[serde(default)]
        field: Option<String>,
    },
    AddRuleAtRoot,
    AddGroup {
        parent_id: NodeId,
    },
    RemoveRule {
        id: NodeId,
        parent_id: NodeId,
    },
    RemoveGroup {
        id: NodeId,
        parent_id: NodeId,
    },
    ChangeProperty {
        prop: String,
        value: Value,
        id: NodeId,
    },
    ClearAll,
}

impl ScriptOp {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptOp::AddRule { .. } => "add_rule",
            ScriptOp::AddRuleAtRoot => "add_rule_at_root",
            ScriptOp::AddGroup { .. } => "add_group",
            ScriptOp::RemoveRule { .. } => "remove_rule",
            ScriptOp::RemoveGroup { .. } => "remove_group",
            ScriptOp::ChangeProperty { .. } => "change_property",
            ScriptOp::ClearAll => "clear_all",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

pub fn parse_script(raw: &str) -> serde_json::Result<Vec<ScriptOp>> {
    serde_json::from_str(raw)
}

/// Applies every op in order. A rejected op is reported and the script goes on.
pub fn run_script(session: &mut QuerySession, ops: Vec<ScriptOp>) -> Vec<StepReport> {
    ops.into_iter()
        .enumerate()
        .map(|(step, op)| {
            let name = op.name();
            let outcome = apply(session, op);
            if let Err(err) = &outcome {
                warn!(step, op = name, error = %err, "script step rejected");
            }
            StepReport {
                step,
                op: name,
                changed: matches!(outcome, Ok(Applied::Changed)),
                error: outcome.as_ref().err().map(ErrorReport::from),
            }
        })
        .collect()
}

fn apply(session: &mut QuerySession, op: ScriptOp) -> Result<Applied, TreeError> {
    match op {
        ScriptOp::AddRule { parent_id, field } => {
            let mut rule = session.create_rule();
            if let Some(field) = field {
                rule.operator = session.resolver().default_operator(&field);
                rule.field = field;
            }
            session.add_rule(rule, &parent_id)
        }
        ScriptOp::AddRuleAtRoot => session.add_rule_at_root(),
        ScriptOp::AddGroup { parent_id } => {
            let group = session.create_group();
            session.add_group(group, &parent_id)
        }
        ScriptOp::RemoveRule { id, parent_id } => session.remove_rule(&id, &parent_id),
        ScriptOp::RemoveGroup { id, parent_id } => session.remove_group(&id, &parent_id),
        ScriptOp::ChangeProperty { prop, value, id } => {
            session.change_property_named(&prop, value, &id)
        }
        ScriptOp::ClearAll => session.clear_all(),
    }
}
