use shared::protocol::QueryChange;

/// Receives the tree after mount and after every applied mutation.
pub trait ChangeListener {
    fn on_query_change(&mut self, change: QueryChange);
}

impl<F> ChangeListener for F
where
    F: FnMut(QueryChange),
{
    fn on_query_change(&mut self, change: QueryChange) {
        self(change)
    }
}
