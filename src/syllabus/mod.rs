//! Topic hierarchy view state: the fetched records, the forest derived from
//! them, which nodes are expanded, which are filtered out and which one is
//! selected.
//!
//! Everything here is synchronous and owned by [`crate::app::App`]; the pure
//! functions take borrowed snapshots.

mod expansion;
mod selection;
mod store;
mod tree;
mod visibility;

pub use expansion::ExpansionSet;
pub use selection::{Resolution, Selection};
pub use store::TopicStore;
pub use tree::TopicForest;
pub use visibility::{is_visible, visible_rows, VisibleRow};
