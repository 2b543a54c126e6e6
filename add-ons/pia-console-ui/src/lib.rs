//! pia-console-ui: Ratatui TUI add-on.
//!
//! Keyboard-driven screens over the pia-core components: prompt and curriculum
//! lists, rendered views, the form editor, the cognitive module dashboard and
//! simulation runs. Requests run on tokio tasks and report back over an mpsc channel.

pub mod app;
pub mod bridge;
pub mod forms;
pub mod ui;

pub use app::{App, Screen};
pub use bridge::{event_channel, AppEvent, Dispatcher, Envelope, Job};
