//! Create/edit form state for one prompt or curriculum.
//!
//! The editor owns the draft exclusively. The server copy is only read by `load`
//! and only written by `submit`.

use crate::client::{decode, Method, ResourceClient};
use crate::documents::ResourceDocument;
use crate::error::{ConsoleError, ConsoleResult};
use crate::resources::{create_body, LoadedResource, MutationReceipt, ResourceKind};
use crate::routes::Route;
use crate::tasks::{TaskBoard, Ticket};
use serde_json::Value;

pub const LOAD: &str = "load";
pub const SUBMIT: &str = "submit";
pub const EDIT: &str = "edit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit { id: String },
}

/// HTTP call a submit resolves to.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitRequest {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

impl SubmitRequest {
    pub async fn send(&self, client: &ResourceClient) -> ConsoleResult<Value> {
        client
            .request(self.method.clone(), &self.path, Some(&self.body))
            .await
    }
}

#[derive(Debug)]
pub struct FormEditor {
    kind: ResourceKind,
    mode: EditorMode,
    draft: Option<ResourceDocument>,
    requested_id: String,
    tasks: TaskBoard,
}

impl FormEditor {
    /// Editor for a new resource, seeded with the default document.
    pub fn create(kind: ResourceKind) -> Self {
        Self {
            kind,
            mode: EditorMode::Create,
            draft: Some(ResourceDocument::new_default(kind)),
            requested_id: String::new(),
            tasks: TaskBoard::new(),
        }
    }

    /// Editor for an existing resource. Nothing can be submitted until [`load`](Self::load) succeeds.
    pub fn edit(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            mode: EditorMode::Edit { id: id.into() },
            draft: None,
            requested_id: String::new(),
            tasks: TaskBoard::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn mode(&self) -> &EditorMode {
        &self.mode
    }

    pub fn draft(&self) -> Option<&ResourceDocument> {
        self.draft.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.draft.is_some()
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    /// Fixed id in edit mode, the requested one (possibly empty) in create mode.
    pub fn identifier(&self) -> &str {
        match &self.mode {
            EditorMode::Edit { id } => id,
            EditorMode::Create => &self.requested_id,
        }
    }

    pub fn set_identifier(&mut self, id: &str) -> ConsoleResult<()> {
        match self.mode {
            EditorMode::Create => {
                self.requested_id = id.to_string();
                Ok(())
            }
            EditorMode::Edit { .. } => self.record_edit(Err(ConsoleError::input(
                "The filename of an existing resource can not be changed",
            ))),
        }
    }

    /// Start loading the document being edited. `None` in create mode.
    pub fn begin_load(&mut self) -> Option<Ticket> {
        match &self.mode {
            EditorMode::Edit { .. } => Some(self.tasks.begin(LOAD)),
            EditorMode::Create => None,
        }
    }

    /// Apply a fetched document. Failures become [`ConsoleError::Load`].
    pub fn finish_load(&mut self, ticket: &Ticket, outcome: ConsoleResult<LoadedResource>) -> bool {
        if !self.tasks.is_current(ticket) {
            return false;
        }
        let id = self.identifier().to_string();
        match outcome {
            Ok(loaded) if loaded.document.kind() != self.kind => self.tasks.finish(
                ticket,
                Err(ConsoleError::Load {
                    id,
                    message: format!("not a {} document", self.kind.label()),
                }),
            ),
            Ok(loaded) => {
                self.draft = Some(loaded.document);
                self.tasks
                    .finish(ticket, Ok(serde_json::json!({ "filename": loaded.filename })))
            }
            Err(err) => self.tasks.finish(
                ticket,
                Err(ConsoleError::Load {
                    id,
                    message: err.to_string(),
                }),
            ),
        }
    }

    pub async fn load(&mut self, client: &ResourceClient) -> ConsoleResult<()> {
        let Some(ticket) = self.begin_load() else {
            return Ok(());
        };
        let outcome = client.fetch_resource(self.kind, self.identifier()).await;
        self.finish_load(&ticket, outcome);
        match self.tasks.error(LOAD) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn draft_mut(&mut self) -> ConsoleResult<&mut ResourceDocument> {
        self.draft
            .as_mut()
            .ok_or_else(|| ConsoleError::input(format!("The {} has not been loaded", self.kind.label())))
    }

    fn record_edit(&mut self, outcome: ConsoleResult<()>) -> ConsoleResult<()> {
        let ticket = self.tasks.begin(EDIT);
        self.tasks
            .finish(&ticket, outcome.clone().map(|_| Value::Null));
        outcome
    }

    /// Set a dot-separated field. Siblings and every `__type__` are kept; on error the draft is unchanged.
    pub fn set_field(&mut self, path: &str, value: Value) -> ConsoleResult<()> {
        let outcome = self.draft_mut().and_then(|draft| {
            *draft = draft.with_field(path, value)?;
            Ok(())
        });
        self.record_edit(outcome)
    }

    pub fn set_text(&mut self, path: &str, text: &str) -> ConsoleResult<()> {
        self.set_field(path, Value::String(text.to_string()))
    }

    /// Comma-separated list field: items are trimmed and blanks dropped.
    pub fn set_list(&mut self, path: &str, text: &str) -> ConsoleResult<()> {
        let items: Vec<Value> = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect();
        self.set_field(path, Value::Array(items))
    }

    /// Free-form JSON field. Text that does not parse is an input error.
    pub fn set_json(&mut self, path: &str, text: &str) -> ConsoleResult<()> {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.set_field(path, value),
            Err(e) => self.record_edit(Err(ConsoleError::input(format!(
                "Invalid JSON for '{}': {}",
                path, e
            )))),
        }
    }

    fn steps_mut(&mut self) -> ConsoleResult<&mut crate::documents::CurriculumDocument> {
        let kind = self.kind;
        self.draft_mut()?
            .as_curriculum_mut()
            .ok_or_else(|| ConsoleError::input(format!("A {} has no ordered steps", kind.label())))
    }

    /// Append a blank step with `order = len + 1`; returns its index.
    pub fn add_item(&mut self) -> ConsoleResult<usize> {
        let index = self.steps_mut()?.push_step();
        Ok(index)
    }

    /// Remove the step at `index`. Other steps keep their order.
    pub fn remove_item(&mut self, index: usize) -> ConsoleResult<()> {
        match self.steps_mut()?.remove_step(index) {
            Some(_) => Ok(()),
            None => Err(ConsoleError::input(format!("There is no step {}", index + 1))),
        }
    }

    /// Reassign step orders `1..=n` from their positions.
    pub fn renumber_items(&mut self) -> ConsoleResult<()> {
        self.steps_mut()?.renumber_steps();
        Ok(())
    }

    /// Client-side checks run before any submit.
    pub fn validate(&self) -> ConsoleResult<()> {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| ConsoleError::input(format!("The {} has not been loaded", self.kind.label())))?;
        if let Some(field) = draft.missing_required() {
            return Err(ConsoleError::input(format!("{} is required", capitalize(field))));
        }
        if self.mode == EditorMode::Create {
            let id = self.requested_id.trim();
            if !id.is_empty() || self.kind.id_required() {
                self.kind.validate_id(id)?;
            }
        }
        if let Some(problem) = draft.as_curriculum().and_then(|c| c.order_problem()) {
            return Err(ConsoleError::Input(problem));
        }
        Ok(())
    }

    /// Validate and describe the submit call. `None` when a submit is already in
    /// flight or validation failed (the error is then recorded under `submit`).
    pub fn begin_submit(&mut self) -> Option<(Ticket, SubmitRequest)> {
        if self.tasks.is_pending(SUBMIT) {
            return None;
        }
        let request = match self.validate().and_then(|_| self.submit_request()) {
            Ok(request) => request,
            Err(err) => {
                self.tasks.reject(SUBMIT, err);
                return None;
            }
        };
        let ticket = self.tasks.try_begin(SUBMIT)?;
        Some((ticket, request))
    }

    fn submit_request(&self) -> ConsoleResult<SubmitRequest> {
        let draft = self
            .draft
            .as_ref()
            .ok_or_else(|| ConsoleError::input("Nothing to submit"))?;
        match &self.mode {
            EditorMode::Create => {
                let id = self.requested_id.trim();
                let filename = if id.is_empty() { None } else { Some(id) };
                Ok(SubmitRequest {
                    method: Method::POST,
                    path: self.kind.collection_path().to_string(),
                    body: create_body(draft, filename)?,
                })
            }
            EditorMode::Edit { id } => Ok(SubmitRequest {
                method: Method::PUT,
                path: self.kind.item_path(id),
                body: draft.to_value()?,
            }),
        }
    }

    /// Apply the submit response. Returns the view route of the id the server
    /// reported, or `None` for a stale completion.
    pub fn finish_submit(
        &mut self,
        ticket: &Ticket,
        outcome: ConsoleResult<Value>,
    ) -> Option<ConsoleResult<Route>> {
        if !self.tasks.is_current(ticket) {
            return None;
        }
        let routed = outcome.and_then(|body| {
            let receipt: MutationReceipt = if body.is_null() {
                MutationReceipt::default()
            } else {
                decode(body.clone())?
            };
            let filename = match (&self.mode, receipt.filename) {
                (_, Some(name)) if !name.trim().is_empty() => name,
                (EditorMode::Edit { id }, _) => id.clone(),
                (EditorMode::Create, _) => {
                    return Err(ConsoleError::Decode(
                        "create response did not include the new filename".into(),
                    ))
                }
            };
            Ok((body, Route::View(self.kind, filename)))
        });
        match routed {
            Ok((body, route)) => {
                tracing::info!(kind = %self.kind, %route, "submitted");
                self.tasks.finish(ticket, Ok(body));
                Some(Ok(route))
            }
            Err(err) => {
                self.tasks.finish(ticket, Err(err.clone()));
                Some(Err(err))
            }
        }
    }

    /// Validate, send and apply in one step.
    pub async fn submit(&mut self, client: &ResourceClient) -> ConsoleResult<Route> {
        let Some((ticket, request)) = self.begin_submit() else {
            return Err(self
                .tasks
                .error(SUBMIT)
                .cloned()
                .unwrap_or_else(|| ConsoleError::input("A submission is already in progress")));
        };
        let outcome = request.send(client).await;
        self.finish_submit(&ticket, outcome)
            .unwrap_or_else(|| Err(ConsoleError::input("Submission was superseded")))
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
