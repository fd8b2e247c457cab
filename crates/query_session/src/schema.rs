use shared::domain::{EditorKind, Field, NameLabel, Node, NodeId};

use crate::{config::DisplayOptions, session::QuerySession};

/// Read-only bundle handed to the rendering layer on every render.
#[derive(Clone, Copy)]
pub struct Schema<'a> {
    session: &'a QuerySession,
}

impl<'a> Schema<'a> {
    pub(crate) fn new(session: &'a QuerySession) -> Self {
        Self { session }
    }

    pub fn fields(&self) -> &'a [Field] {
        self.session.fields()
    }

    pub fn combinators(&self) -> &'a [NameLabel] {
        self.session.combinators()
    }

    pub fn display(&self) -> DisplayOptions {
        self.session.settings().display
    }

    pub fn operators(&self, field: &str) -> Vec<NameLabel> {
        self.session.resolver().operators(field)
    }

    pub fn editor_kind(&self, field: &str, operator: &str) -> EditorKind {
        self.session.resolver().editor_kind(field, operator)
    }

    pub fn input_type(&self, field: &str, operator: &str) -> String {
        self.session.resolver().input_type(field, operator)
    }

    pub fn values(&self, field: &str, operator: &str) -> Vec<NameLabel> {
        self.session.resolver().values(field, operator)
    }

    pub fn placeholder(&self, field: &str, operator: &str) -> String {
        self.session.resolver().placeholder(field, operator)
    }

    pub fn level_of(&self, id: &NodeId) -> Option<usize> {
        self.session.level_of(id)
    }

    pub fn is_group(&self, node: &Node) -> bool {
        node.is_group()
    }
}
