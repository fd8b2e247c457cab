use std::sync::Arc;

use query_core::{
    contains_id, default_combinators, is_empty_view, level_of, project_flat, Canonicalizer,
    IdGenerator, MutationEngine, Resolver, UuidIdGenerator,
};
use serde_json::Value;
use shared::{
    domain::{Field, GroupNode, NameLabel, NodeId, NodeKind, RuleNode},
    error::TreeError,
    protocol::{Property, QueryChange, RawGroup},
};
use tracing::{debug, info};

use crate::{
    config::{AddressingMode, SessionSettings},
    listener::ChangeListener,
    schema::Schema,
};

/// Result of an operation that was not rejected.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A new snapshot was stored and the listener notified.
    Changed,
    /// The operation addressed nothing; tree and listener untouched.
    Unchanged,
}

pub struct SessionBuilder {
    fields: Vec<Field>,
    combinators: Vec<NameLabel>,
    resolver: Resolver,
    ids: Box<dyn IdGenerator>,
    settings: SessionSettings,
    query: Option<RawGroup>,
}

impl SessionBuilder {
    pub fn combinators(mut self, combinators: Vec<NameLabel>) -> Self {
        self.combinators = combinators;
        self
    }

    pub fn resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn query(mut self, query: RawGroup) -> Self {
        self.query = Some(query);
        self
    }

    /// Adopts the initial tree and emits the mount notification.
    pub fn mount(self, listener: impl ChangeListener + 'static) -> QuerySession {
        let mut fields = self.fields;
        if !self.settings.auto_select_field {
            fields.insert(0, Field::unselected());
        }
        let combinators = if self.combinators.is_empty() {
            default_combinators()
        } else {
            self.combinators
        };

        let mut ids = self.ids;
        let root = match &self.query {
            Some(raw) => {
                let default_field = preselected_field(&self.resolver, &fields);
                Canonicalizer::new(&self.resolver, ids.as_mut(), &combinators, &default_field)
                    .canonicalize(raw)
            }
            None => Arc::new(GroupNode::new(
                ids.next_id(NodeKind::Group),
                first_combinator(&combinators),
            )),
        };

        let mut session = QuerySession {
            root,
            fields,
            combinators,
            resolver: self.resolver,
            ids,
            settings: self.settings,
            listener: Box::new(listener),
        };
        info!(
            root_id = %session.root.id,
            children = session.root.rules.len(),
            "query session mounted"
        );
        if session.settings.notify_on_mount {
            session.notify(QueryChange::new(Arc::clone(&session.root)));
        }
        session
    }
}

/// Owns the authoritative query tree. Every edit replaces the snapshot and
/// notifies the listener exactly once; edits that address nothing do neither.
pub struct QuerySession {
    root: Arc<GroupNode>,
    fields: Vec<Field>,
    combinators: Vec<NameLabel>,
    resolver: Resolver,
    ids: Box<dyn IdGenerator>,
    settings: SessionSettings,
    listener: Box<dyn ChangeListener>,
}

impl QuerySession {
    pub fn builder(fields: Vec<Field>) -> SessionBuilder {
        SessionBuilder {
            fields,
            combinators: default_combinators(),
            resolver: Resolver::default(),
            ids: Box::new(UuidIdGenerator),
            settings: SessionSettings::default(),
            query: None,
        }
    }

    /// The current tree. Later edits never show through a returned snapshot.
    pub fn snapshot(&self) -> Arc<GroupNode> {
        Arc::clone(&self.root)
    }

    /// The tree to present: the flat projection in normal view, the full tree otherwise.
    pub fn view(&self) -> Arc<GroupNode> {
        if self.settings.enable_normal_view {
            project_flat(&self.root)
        } else {
            self.snapshot()
        }
    }

    /// Normal view is on and there is no rule to show.
    pub fn has_no_rules_applied(&self) -> bool {
        self.settings.enable_normal_view && is_empty_view(&self.root)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn combinators(&self) -> &[NameLabel] {
        &self.combinators
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn schema(&self) -> Schema<'_> {
        Schema::new(self)
    }

    pub fn level_of(&self, id: &NodeId) -> Option<usize> {
        level_of(id, &self.root)
    }

    /// A fresh rule on the preselected (or first) field with its default operator.
    pub fn create_rule(&mut self) -> RuleNode {
        let field = preselected_field(&self.resolver, &self.fields);
        RuleNode {
            id: self.fresh_id(NodeKind::Rule),
            operator: self.resolver.default_operator(&field),
            field,
            value: Value::String(String::new()),
        }
    }

    pub fn create_group(&mut self) -> GroupNode {
        let combinator = first_combinator(&self.combinators);
        GroupNode::new(self.fresh_id(NodeKind::Group), combinator)
    }

    pub fn add_rule(&mut self, rule: RuleNode, parent_id: &NodeId) -> Result<Applied, TreeError> {
        let outcome = self.engine().add_rule(&self.root, rule, parent_id);
        self.commit("add_rule", outcome, None)
    }

    /// Adds a rule to the root. Always applies.
    pub fn add_rule_at_root(&mut self) -> Result<Applied, TreeError> {
        let rule = self.create_rule();
        let root_id = self.root.id.clone();
        self.add_rule(rule, &root_id)
    }

    pub fn add_group(
        &mut self,
        group: GroupNode,
        parent_id: &NodeId,
    ) -> Result<Applied, TreeError> {
        let seed = self.create_rule();
        let outcome = self.engine().add_group(&self.root, group, seed, parent_id);
        self.commit("add_group", outcome, None)
    }

    pub fn remove_rule(
        &mut self,
        rule_id: &NodeId,
        parent_id: &NodeId,
    ) -> Result<Applied, TreeError> {
        let outcome = self.engine().remove_rule(&self.root, rule_id, parent_id);
        self.commit("remove_rule", outcome, None)
    }

    pub fn remove_group(
        &mut self,
        group_id: &NodeId,
        parent_id: &NodeId,
    ) -> Result<Applied, TreeError> {
        let outcome = self.engine().remove_group(&self.root, group_id, parent_id);
        self.commit("remove_group", outcome, None)
    }

    pub fn change_property(
        &mut self,
        prop: Property,
        value: Value,
        node_id: &NodeId,
    ) -> Result<Applied, TreeError> {
        let outcome = self
            .engine()
            .change_property(&self.root, prop, value, node_id);
        self.commit("change_property", outcome, Some((prop, node_id.clone())))
    }

    /// [`Self::change_property`] with the property given by its wire name.
    pub fn change_property_named(
        &mut self,
        prop: &str,
        value: Value,
        node_id: &NodeId,
    ) -> Result<Applied, TreeError> {
        match prop.parse::<Property>() {
            Ok(prop) => self.change_property(prop, value, node_id),
            Err(err) => self.reject("change_property", err),
        }
    }

    pub fn clear_all(&mut self) -> Result<Applied, TreeError> {
        let outcome = Ok(self.engine().clear_all(&self.root));
        self.commit("clear_all", outcome, None)
    }

    /// Replaces the whole tree with a newly supplied one. Not a merge, and
    /// not notified: the host already holds the tree it passed in.
    pub fn replace_query(&mut self, query: &RawGroup) {
        self.root = self.adopt(query);
        info!(root_id = %self.root.id, "query replaced");
    }

    fn adopt(&mut self, raw: &RawGroup) -> Arc<GroupNode> {
        let default_field = preselected_field(&self.resolver, &self.fields);
        Canonicalizer::new(
            &self.resolver,
            self.ids.as_mut(),
            &self.combinators,
            &default_field,
        )
        .canonicalize(raw)
    }

    fn engine(&self) -> MutationEngine<'_> {
        MutationEngine::new(&self.resolver, &self.combinators, self.settings.resets())
    }

    fn fresh_id(&mut self, kind: NodeKind) -> NodeId {
        loop {
            let id = self.ids.next_id(kind);
            if !contains_id(&self.root, &id) {
                return id;
            }
        }
    }

    fn commit(
        &mut self,
        op: &'static str,
        outcome: Result<Arc<GroupNode>, TreeError>,
        tag: Option<(Property, NodeId)>,
    ) -> Result<Applied, TreeError> {
        let next = match outcome {
            Ok(next) => next,
            Err(err) => return self.reject(op, err),
        };
        self.root = next;
        debug!(op, root_id = %self.root.id, "query updated");
        let mut change = QueryChange::new(Arc::clone(&self.root));
        if let Some((prop, id)) = tag {
            change = change.with_property(prop, id);
        }
        self.notify(change);
        Ok(Applied::Changed)
    }

    fn reject(&self, op: &'static str, err: TreeError) -> Result<Applied, TreeError> {
        match self.settings.addressing {
            AddressingMode::Silent => {
                debug!(op, error = %err, "operation addressed nothing; ignored");
                Ok(Applied::Unchanged)
            }
            AddressingMode::Strict => {
                debug!(op, error = %err, "operation rejected");
                Err(err)
            }
        }
    }

    fn notify(&mut self, change: QueryChange) {
        self.listener.on_query_change(change);
    }
}

/// Field for new rules: the policy's preselection, else the first field.
fn preselected_field(resolver: &Resolver, fields: &[Field]) -> String {
    resolver
        .default_field()
        .or_else(|| fields.first().map(|field| field.name.clone()))
        .unwrap_or_default()
}

fn first_combinator(combinators: &[NameLabel]) -> String {
    combinators
        .first()
        .map(|c| c.name.clone())
        .unwrap_or_else(|| "and".to_string())
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
