//! Terminal progress output driven by run events

mod renderer;

pub use renderer::{ProgressRenderer, spawn_progress_renderer};
