//! Core of nudge: task storage, settings and the prompt box layout.

pub mod affirmation;
pub mod commands;
pub mod layout;
pub mod palette;
pub mod settings;
pub mod store;
pub mod tasks;
pub mod width;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
