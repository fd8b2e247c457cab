//! Session layer over the query tree: owns the authoritative snapshot,
//! exposes the editing operations, and notifies a listener of every change.

pub mod config;
pub mod listener;
pub mod schema;
mod session;

pub use config::{load_config, AddressingMode, BuilderConfig, DisplayOptions, SessionSettings};
pub use listener::ChangeListener;
pub use schema::Schema;
pub use session::{Applied, QuerySession, SessionBuilder};
