//! Terminal client for an LLM-backed syllabus service.
//!
//! The backend stores topics as a flat list linked by `parent_id`; this crate
//! rebuilds the hierarchy, tracks which nodes are expanded, filters completed
//! topics and keeps the open detail pane in sync across refetches.

pub mod api;
pub mod app;
pub mod config;
pub mod keybindings;
pub mod syllabus;
pub mod theme;
pub mod ui;
pub mod util;
