//! Collection listing with delete-with-confirmation.

use crate::client::{decode, ResourceClient};
use crate::error::{ConsoleError, ConsoleResult};
use crate::resources::{ResourceKind, ResourceSummary};
use crate::routes::Route;
use crate::tasks::{TaskBoard, Ticket};
use serde_json::Value;

pub const REFRESH: &str = "refresh";

/// Task key for deleting `id`. Each row has its own key so only that row is locked.
pub fn delete_key(id: &str) -> String {
    format!("delete:{}", id)
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ListPhase {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<ResourceSummary>),
    Failed(ConsoleError),
}

/// Yes/no prompt shown before a destructive call.
pub trait Confirm {
    fn confirm(&self, question: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, question: &str) -> bool {
        self(question)
    }
}

pub fn delete_question(kind: ResourceKind, id: &str) -> String {
    format!("Are you sure you want to delete {}: {}?", kind.label(), id)
}

#[derive(Debug)]
pub struct ListView {
    kind: ResourceKind,
    phase: ListPhase,
    /// Rows kept on screen while a refresh is in flight.
    last_loaded: Vec<ResourceSummary>,
    tasks: TaskBoard,
}

impl ListView {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            phase: ListPhase::Idle,
            last_loaded: Vec::new(),
            tasks: TaskBoard::new(),
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn phase(&self) -> &ListPhase {
        &self.phase
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    /// Rows in server order: the current list, or the previous one while reloading.
    pub fn items(&self) -> &[ResourceSummary] {
        match &self.phase {
            ListPhase::Loaded(items) => items,
            _ => &self.last_loaded,
        }
    }

    pub fn begin_refresh(&mut self) -> Ticket {
        if let ListPhase::Loaded(items) = std::mem::take(&mut self.phase) {
            self.last_loaded = items;
        }
        self.phase = ListPhase::Loading;
        self.tasks.begin(REFRESH)
    }

    pub fn finish_refresh(
        &mut self,
        ticket: &Ticket,
        outcome: ConsoleResult<Vec<ResourceSummary>>,
    ) -> bool {
        if !self.tasks.is_current(ticket) {
            return false;
        }
        match outcome {
            Ok(items) => {
                let count = items.len();
                self.last_loaded.clear();
                self.phase = ListPhase::Loaded(items);
                self.tasks.finish(ticket, Ok(Value::from(count)))
            }
            Err(err) => {
                self.phase = ListPhase::Failed(err.clone());
                self.tasks.finish(ticket, Err(err))
            }
        }
    }

    pub async fn refresh(&mut self, client: &ResourceClient) {
        let ticket = self.begin_refresh();
        let outcome = client.list_resources(self.kind).await;
        self.finish_refresh(&ticket, outcome);
    }

    /// Ask for confirmation and lock the row. `None` when declined or when a delete
    /// of the same row is already in flight.
    pub fn begin_delete(&mut self, id: &str, confirm: &dyn Confirm) -> Option<Ticket> {
        let key = delete_key(id);
        if self.tasks.is_pending(&key) {
            return None;
        }
        if !confirm.confirm(&delete_question(self.kind, id)) {
            return None;
        }
        self.tasks.try_begin(&key)
    }

    /// Record a delete outcome. Returns true when the list should be re-fetched.
    /// A failed delete leaves the list as it is.
    pub fn finish_delete(&mut self, ticket: &Ticket, outcome: ConsoleResult<Value>) -> bool {
        let ok = outcome.is_ok();
        self.tasks.finish(ticket, outcome) && ok
    }

    pub fn delete_error(&self, id: &str) -> Option<&ConsoleError> {
        self.tasks.error(&delete_key(id))
    }

    pub fn is_deleting(&self, id: &str) -> bool {
        self.tasks.is_pending(&delete_key(id))
    }

    /// Confirm, delete, and re-fetch on success. Returns the delete outcome;
    /// `Ok(false)` when nothing was sent.
    pub async fn delete(
        &mut self,
        client: &ResourceClient,
        id: &str,
        confirm: &dyn Confirm,
    ) -> ConsoleResult<bool> {
        let Some(ticket) = self.begin_delete(id, confirm) else {
            return Ok(false);
        };
        let outcome = client.delete(&self.kind.item_path(id)).await;
        let failure = outcome.as_ref().err().cloned();
        if self.finish_delete(&ticket, outcome) {
            self.refresh(client).await;
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(true),
        }
    }

    pub fn view_route(&self, id: &str) -> Route {
        Route::View(self.kind, id.to_string())
    }

    pub fn edit_route(&self, id: &str) -> Route {
        Route::Edit(self.kind, id.to_string())
    }

    pub fn create_route(&self) -> Route {
        Route::New(self.kind)
    }
}

/// Decode a raw list response (used by front-ends that drive the request themselves).
pub fn decode_summaries(body: Value) -> ConsoleResult<Vec<ResourceSummary>> {
    decode(body)
}
