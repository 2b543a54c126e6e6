//! pia-core: headless PiaAGI console components (resource client, editors, module panels).
//!
//! Every component owns its own [`TaskBoard`] and talks to the backends through a
//! [`ResourceClient`]. Components expose `begin_*` / `finish_*` pairs so a front-end
//! can run requests on its own executor and feed completions back in any order;
//! the `async fn` convenience methods do both in one call.

mod client;
mod config;
mod dashboard;
mod error;
mod form_editor;
mod list_view;
mod resources;
mod routes;
mod simulation;
mod tasks;
mod view_renderer;
pub mod documents;
pub mod modules;

// Transport + configuration
pub use client::{decode, http_error, Backends, Method, ResourceClient};
pub use config::{ConsoleConfig, DEFAULT_API_BASE_URL, DEFAULT_CML_BASE_URL};
pub use error::{ConsoleError, ConsoleResult, ErrorKind};
pub use tasks::{PendingOperation, TaskBoard, Ticket};

// Prompt engineering resources
pub use documents::{CurriculumDocument, CurriculumStep, PromptDocument, ResourceDocument};
pub use resources::{LoadedResource, MutationReceipt, ResourceKind, ResourceSummary};
pub use form_editor::{EditorMode, FormEditor, SubmitRequest};
pub use list_view::{decode_summaries, delete_question, Confirm, ListPhase, ListView};
pub use view_renderer::ViewRenderer;
pub use routes::Route;

// Cognitive modules + simulation
pub use dashboard::DashboardShell;
pub use modules::{
    ActionRequest, ActionStart, GoalAction, GoalForm, ModuleAction, ModuleKind, ModuleStatusPanel,
    SnapshotFetch, SnapshotKind,
};
pub use simulation::{SimulationConsole, SimulationRun, SimulationSummary};

/// Task keys used by the components, for front-ends that render per-action state.
pub mod keys {
    pub use crate::form_editor::{EDIT, LOAD, SUBMIT};
    pub use crate::list_view::{delete_key, REFRESH};
    pub use crate::simulation::RUN;
    pub use crate::view_renderer::{DELETE, RENDER};
}
