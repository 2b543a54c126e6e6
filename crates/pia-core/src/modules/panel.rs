//! Status panel for one cognitive module.
//!
//! Snapshots are never updated optimistically: a successful mutating action
//! re-fetches every snapshot the panel shows.

use super::{ActionRequest, ModuleAction, ModuleKind, SnapshotKind};
use crate::client::ResourceClient;
use crate::error::{ConsoleError, ConsoleResult};
use crate::tasks::{TaskBoard, Ticket};
use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;

/// One in-flight snapshot request.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotFetch {
    pub kind: SnapshotKind,
    pub ticket: Ticket,
    pub path: String,
}

impl SnapshotFetch {
    pub async fn send(&self, client: &ResourceClient) -> ConsoleResult<Value> {
        client.get(&self.path).await
    }
}

/// One in-flight action request.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionStart {
    pub ticket: Ticket,
    pub request: ActionRequest,
}

#[derive(Debug)]
pub struct ModuleStatusPanel {
    module: ModuleKind,
    snapshots: HashMap<SnapshotKind, Value>,
    tasks: TaskBoard,
}

impl ModuleStatusPanel {
    pub fn new(module: ModuleKind) -> Self {
        Self {
            module,
            snapshots: HashMap::new(),
            tasks: TaskBoard::new(),
        }
    }

    pub fn module(&self) -> ModuleKind {
        self.module
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn snapshot(&self, kind: SnapshotKind) -> Option<&Value> {
        self.snapshots.get(&kind)
    }

    pub fn snapshot_error(&self, kind: SnapshotKind) -> Option<&ConsoleError> {
        self.tasks.error(&kind.key())
    }

    pub fn is_fetching(&self, kind: SnapshotKind) -> bool {
        self.tasks.is_pending(&kind.key())
    }

    /// Start a snapshot fetch. A newer fetch of the same kind supersedes this one.
    pub fn begin_fetch(&mut self, kind: SnapshotKind) -> SnapshotFetch {
        SnapshotFetch {
            kind,
            ticket: self.tasks.begin(&kind.key()),
            path: self.module.endpoint(kind.endpoint()),
        }
    }

    /// Apply a snapshot response unless a newer fetch of that kind was started since.
    pub fn finish_fetch(&mut self, fetch: &SnapshotFetch, outcome: ConsoleResult<Value>) -> bool {
        if !self.tasks.is_current(&fetch.ticket) {
            tracing::debug!(module = %self.module, snapshot = fetch.kind.label(), "stale snapshot dropped");
            return false;
        }
        match &outcome {
            Ok(value) => {
                self.snapshots.insert(fetch.kind, value.clone());
            }
            Err(_) => {
                self.snapshots.remove(&fetch.kind);
            }
        }
        self.tasks.finish(&fetch.ticket, outcome.map(|_| Value::Bool(true)))
    }

    pub async fn fetch(&mut self, client: &ResourceClient, kind: SnapshotKind) {
        let fetch = self.begin_fetch(kind);
        let outcome = fetch.send(client).await;
        self.finish_fetch(&fetch, outcome);
    }

    pub fn begin_refresh_all(&mut self) -> Vec<SnapshotFetch> {
        self.module
            .snapshots()
            .iter()
            .map(|kind| self.begin_fetch(*kind))
            .collect()
    }

    /// Re-fetch every snapshot concurrently.
    pub async fn refresh(&mut self, client: &ResourceClient) {
        let fetches = self.begin_refresh_all();
        self.complete_fetches(client, fetches).await;
    }

    async fn complete_fetches(&mut self, client: &ResourceClient, fetches: Vec<SnapshotFetch>) {
        let outcomes = join_all(fetches.iter().map(|f| f.send(client))).await;
        for (fetch, outcome) in fetches.iter().zip(outcomes) {
            self.finish_fetch(fetch, outcome);
        }
    }

    /// Validate an action form. Input errors are recorded under the action's key and nothing is sent.
    pub fn begin_action(&mut self, action: &ModuleAction) -> Option<ActionStart> {
        let prepared = if action.module() != self.module {
            Err(ConsoleError::input(format!(
                "'{}' is not a {} action",
                action.key(),
                self.module
            )))
        } else {
            action.prepare()
        };
        match prepared {
            Ok(request) => Some(ActionStart {
                ticket: self.tasks.begin(action.key()),
                request,
            }),
            Err(err) => {
                self.tasks.reject(action.key(), err);
                None
            }
        }
    }

    /// Record an action outcome. Returns the snapshot fetches to run next: all of
    /// them after a successful mutating call, none otherwise.
    pub fn finish_action(&mut self, start: &ActionStart, outcome: ConsoleResult<Value>) -> Vec<SnapshotFetch> {
        let ok = outcome.is_ok();
        let applied = self.tasks.finish(&start.ticket, outcome);
        if applied && ok && start.request.mutating {
            tracing::info!(module = %self.module, action = %start.ticket.key, "action applied; refreshing");
            self.begin_refresh_all()
        } else {
            Vec::new()
        }
    }

    pub fn action_result(&self, key: &str) -> Option<&Value> {
        self.tasks.result(key)
    }

    pub fn action_error(&self, key: &str) -> Option<&ConsoleError> {
        self.tasks.error(key)
    }

    /// Validate, send, record, then refresh snapshots when the call mutated state.
    pub async fn run(&mut self, client: &ResourceClient, action: &ModuleAction) -> ConsoleResult<Value> {
        let Some(start) = self.begin_action(action) else {
            return Err(self
                .tasks
                .error(action.key())
                .cloned()
                .unwrap_or_else(|| ConsoleError::input("Action was not started")));
        };
        let outcome = start.request.send(client).await;
        let fetches = self.finish_action(&start, outcome.clone());
        self.complete_fetches(client, fetches).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stale_snapshot_never_overwrites_fresher_one() {
        let mut panel = ModuleStatusPanel::new(ModuleKind::Emotion);
        let first = panel.begin_fetch(SnapshotKind::Status);
        let second = panel.begin_fetch(SnapshotKind::Status);

        assert!(panel.finish_fetch(&second, Ok(json!({"n": 2}))));
        assert!(!panel.finish_fetch(&first, Ok(json!({"n": 1}))));
        assert_eq!(panel.snapshot(SnapshotKind::Status), Some(&json!({"n": 2})));
    }

    #[test]
    fn snapshot_kinds_are_independent() {
        let mut panel = ModuleStatusPanel::new(ModuleKind::WorkingMemory);
        let fetches = panel.begin_refresh_all();
        assert_eq!(fetches.len(), 3);
        assert_eq!(fetches[2].path, "/cml/wm/get_focus");

        panel.finish_fetch(&fetches[1], Ok(json!(["item"])));
        panel.finish_fetch(&fetches[0], Err(ConsoleError::Network("down".into())));
        assert_eq!(panel.snapshot(SnapshotKind::Contents), Some(&json!(["item"])));
        assert!(panel.snapshot(SnapshotKind::Status).is_none());
        assert!(panel.snapshot_error(SnapshotKind::Status).is_some());
        assert!(panel.is_fetching(SnapshotKind::Focus));
    }

    #[test]
    fn invalid_form_records_input_error_without_request() {
        let mut panel = ModuleStatusPanel::new(ModuleKind::Emotion);
        let action = ModuleAction::Appraise {
            event_info: r#"{"bad": }"#.into(),
            context: String::new(),
        };
        assert!(panel.begin_action(&action).is_none());
        assert!(panel.action_error("appraise").is_some());
        assert!(!panel.tasks().any_pending());
    }

    #[test]
    fn wrong_module_action_is_rejected() {
        let mut panel = ModuleStatusPanel::new(ModuleKind::Perception);
        assert!(panel.begin_action(&ModuleAction::Express).is_none());
    }

    #[test]
    fn only_successful_mutations_cascade() {
        let mut panel = ModuleStatusPanel::new(ModuleKind::Emotion);

        let start = panel.begin_action(&ModuleAction::Express).unwrap();
        assert!(panel.finish_action(&start, Ok(json!({"expression": "calm"}))).is_empty());

        let appraise = ModuleAction::Appraise {
            event_info: r#"{"type": "praise"}"#.into(),
            context: String::new(),
        };
        let start = panel.begin_action(&appraise).unwrap();
        assert!(panel
            .finish_action(&start, Err(ConsoleError::Http { status: 500, message: "x".into() }))
            .is_empty());

        let start = panel.begin_action(&appraise).unwrap();
        let kinds: Vec<SnapshotKind> = panel
            .finish_action(&start, Ok(json!({"ok": true})))
            .into_iter()
            .map(|f| f.kind)
            .collect();
        assert_eq!(kinds, vec![SnapshotKind::Status, SnapshotKind::CurrentEmotion]);
        assert!(panel.action_error("appraise").is_none());
    }
}
