//! Terminal user interface.
//!
//! - `loop_runner`: main event loop and terminal management
//! - `input`: keyboard dispatch
//! - `events`: background task results
//! - `helpers`: background task spawning
//! - `render`, `tree`, `detail`, `status`, `help`: drawing

mod detail;
mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
mod render;
mod status;
mod tree;

pub use detail::render_markdown;
pub use events::handle_app_event;
pub use helpers::{spawn_models_load, spawn_topics_load};
pub use input::handle_input;
pub use loop_runner::{run, Action};
