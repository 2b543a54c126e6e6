//! Per-component action state: one entry per action key, guarded by sequence numbers.

use crate::error::ConsoleError;
use serde_json::Value;
use std::collections::HashMap;

/// State of one user action (`load`, `submit`, `delete:<id>`, `status`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingOperation {
    pub in_flight: bool,
    pub error: Option<ConsoleError>,
    pub result: Option<Value>,
    /// Sequence number of the latest attempt.
    pub seq: u64,
}

/// Handle for one attempt. Completing with a ticket that is no longer the latest is a no-op.
#[must_use = "a ticket must be passed back to finish()"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub key: String,
    pub seq: u64,
}

#[derive(Debug, Default, Clone)]
pub struct TaskBoard {
    ops: HashMap<String, PendingOperation>,
    next_seq: u64,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new attempt for `key`. Resets that key's error and result; supersedes older attempts.
    pub fn begin(&mut self, key: &str) -> Ticket {
        self.next_seq += 1;
        let seq = self.next_seq;
        let op = self.ops.entry(key.to_string()).or_default();
        op.in_flight = true;
        op.error = None;
        op.result = None;
        op.seq = seq;
        Ticket {
            key: key.to_string(),
            seq,
        }
    }

    /// Like [`begin`](Self::begin) but refuses while an attempt for `key` is still in flight.
    pub fn try_begin(&mut self, key: &str) -> Option<Ticket> {
        if self.is_pending(key) {
            tracing::debug!(key, "action already in flight");
            return None;
        }
        Some(self.begin(key))
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.ops
            .get(&ticket.key)
            .map(|op| op.seq == ticket.seq)
            .unwrap_or(false)
    }

    /// Record the outcome of an attempt. Returns false (and changes nothing) for a stale ticket.
    pub fn finish(&mut self, ticket: &Ticket, outcome: Result<Value, ConsoleError>) -> bool {
        let Some(op) = self.ops.get_mut(&ticket.key) else {
            return false;
        };
        if op.seq != ticket.seq {
            tracing::debug!(key = %ticket.key, seq = ticket.seq, latest = op.seq, "dropping stale completion");
            return false;
        }
        op.in_flight = false;
        match outcome {
            Ok(value) => {
                op.error = None;
                op.result = Some(value);
            }
            Err(err) => {
                tracing::warn!(key = %ticket.key, error = %err, "action failed");
                op.error = Some(err);
                op.result = None;
            }
        }
        true
    }

    /// Fail `key` immediately without a network attempt (client-side validation).
    pub fn reject(&mut self, key: &str, err: ConsoleError) {
        let ticket = self.begin(key);
        self.finish(&ticket, Err(err));
    }

    pub fn get(&self, key: &str) -> Option<&PendingOperation> {
        self.ops.get(key)
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.ops.get(key).map(|op| op.in_flight).unwrap_or(false)
    }

    pub fn error(&self, key: &str) -> Option<&ConsoleError> {
        self.ops.get(key).and_then(|op| op.error.as_ref())
    }

    pub fn result(&self, key: &str) -> Option<&Value> {
        self.ops.get(key).and_then(|op| op.result.as_ref())
    }

    /// Server `message` from the last successful result of `key`, if any.
    pub fn message(&self, key: &str) -> Option<&str> {
        self.result(key)
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
    }

    pub fn any_pending(&self) -> bool {
        self.ops.values().any(|op| op.in_flight)
    }
}
