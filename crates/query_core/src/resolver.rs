use serde_json::Value;
use shared::domain::{EditorKind, Field, NameLabel, RuleNode};

/// Optional host-supplied answers about fields. Every method defaults to
/// `None`, which makes the [`Resolver`] use its built-in fallback.
pub trait FieldPolicy {
    fn operators(&self, _field: &str) -> Option<Vec<NameLabel>> {
        None
    }

    fn editor_kind(&self, _field: &str, _operator: &str) -> Option<EditorKind> {
        None
    }

    fn input_type(&self, _field: &str, _operator: &str) -> Option<String> {
        None
    }

    fn values(&self, _field: &str, _operator: &str) -> Option<Vec<NameLabel>> {
        None
    }

    fn placeholder(&self, _field: &str, _operator: &str) -> Option<String> {
        None
    }

    /// Field preselected for new rules instead of the first field.
    fn default_field(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPolicy;

impl FieldPolicy for NoPolicy {}

/// Policy answered from per-field metadata records.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<Field>,
    default_field: Option<String>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            default_field: None,
        }
    }

    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.default_field = Some(field.into());
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

impl FieldPolicy for FieldCatalog {
    fn operators(&self, field: &str) -> Option<Vec<NameLabel>> {
        self.field(field)?.operators.clone()
    }

    fn editor_kind(&self, field: &str, _operator: &str) -> Option<EditorKind> {
        self.field(field)?.value_editor_type
    }

    fn input_type(&self, field: &str, _operator: &str) -> Option<String> {
        self.field(field)?.input_type.clone()
    }

    fn values(&self, field: &str, _operator: &str) -> Option<Vec<NameLabel>> {
        self.field(field)?.values.clone()
    }

    fn placeholder(&self, field: &str, _operator: &str) -> Option<String> {
        self.field(field)?.placeholder.clone()
    }

    fn default_field(&self) -> Option<String> {
        self.default_field.clone()
    }
}

pub fn default_operators() -> Vec<NameLabel> {
    [
        ("=", "="),
        ("!=", "!="),
        ("<", "<"),
        (">", ">"),
        ("<=", "<="),
        (">=", ">="),
        ("contains", "contains"),
        ("beginsWith", "begins with"),
        ("endsWith", "ends with"),
        ("doesNotContain", "does not contain"),
        ("doesNotBeginWith", "does not begin with"),
        ("doesNotEndWith", "does not end with"),
        ("null", "is null"),
        ("notNull", "is not null"),
        ("in", "in"),
        ("notIn", "not in"),
    ]
    .into_iter()
    .map(|(name, label)| NameLabel::new(name, label))
    .collect()
}

pub fn default_combinators() -> Vec<NameLabel> {
    vec![NameLabel::new("and", "And"), NameLabel::new("or", "Or")]
}

/// Resolves operators, editors and default values for rules, falling back
/// to built-in answers wherever the policy is silent.
pub struct Resolver {
    policy: Box<dyn FieldPolicy>,
    operators: Vec<NameLabel>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(NoPolicy)
    }
}

impl Resolver {
    pub fn new(policy: impl FieldPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
            operators: default_operators(),
        }
    }

    /// Replaces the fallback operator list. An empty list keeps the built-in one.
    pub fn with_operators(mut self, operators: Vec<NameLabel>) -> Self {
        if !operators.is_empty() {
            self.operators = operators;
        }
        self
    }

    pub fn operators(&self, field: &str) -> Vec<NameLabel> {
        self.policy
            .operators(field)
            .filter(|ops| !ops.is_empty())
            .unwrap_or_else(|| self.operators.clone())
    }

    pub fn has_operator(&self, field: &str, operator: &str) -> bool {
        self.operators(field).iter().any(|op| op.name == operator)
    }

    pub fn editor_kind(&self, field: &str, operator: &str) -> EditorKind {
        self.policy
            .editor_kind(field, operator)
            .unwrap_or_default()
    }

    pub fn input_type(&self, field: &str, operator: &str) -> String {
        self.policy
            .input_type(field, operator)
            .filter(|kind| !kind.is_empty())
            .unwrap_or_else(|| "text".to_string())
    }

    pub fn values(&self, field: &str, operator: &str) -> Vec<NameLabel> {
        self.policy.values(field, operator).unwrap_or_default()
    }

    pub fn placeholder(&self, field: &str, operator: &str) -> String {
        self.policy.placeholder(field, operator).unwrap_or_default()
    }

    pub fn default_field(&self) -> Option<String> {
        self.policy.default_field().filter(|field| !field.is_empty())
    }

    pub fn default_operator(&self, field: &str) -> String {
        self.operators(field)
            .into_iter()
            .next()
            .map(|op| op.name)
            .unwrap_or_default()
    }

    /// Initial value for a rule: a checkbox starts unchecked, everything else
    /// (including editors with a discrete value list) starts empty.
    pub fn default_value(&self, rule: &RuleNode) -> Value {
        if !self.values(&rule.field, &rule.operator).is_empty() {
            return Value::String(String::new());
        }
        match self.editor_kind(&rule.field, &rule.operator) {
            EditorKind::Checkbox => Value::Bool(false),
            _ => Value::String(String::new()),
        }
    }

    /// Value to keep after `rule.operator` replaced `previous_operator`.
    pub fn value_on_operator_change(&self, rule: &RuleNode, previous_operator: &str) -> Value {
        let previous = self.editor_kind(&rule.field, previous_operator);
        let current = self.editor_kind(&rule.field, &rule.operator);
        if previous == current {
            return rule.value.clone();
        }
        match current {
            EditorKind::Checkbox | EditorKind::Radio => Value::Bool(true),
            _ => Value::String(String::new()),
        }
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
