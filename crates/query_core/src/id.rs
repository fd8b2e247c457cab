use shared::domain::{NodeId, NodeKind};
use uuid::Uuid;

/// Source of node ids. Ids carry the kind prefix (`r-` / `g-`).
pub trait IdGenerator {
    fn next_id(&mut self, kind: NodeKind) -> NodeId;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self, kind: NodeKind) -> NodeId {
        NodeId(format!("{}-{}", kind.prefix(), Uuid::new_v4()))
    }
}

/// Counter-backed generator, deterministic across runs.
#[derive(Debug, Clone, Default)]
pub struct SequentialIdGenerator {
    next: u64,
}

impl SequentialIdGenerator {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self, kind: NodeKind) -> NodeId {
        self.next += 1;
        NodeId(format!("{}-{}", kind.prefix(), self.next))
    }
}

#[cfg(test)]
#[path = "tests/id_tests.rs"]
mod tests;
