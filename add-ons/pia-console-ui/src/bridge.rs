//! Async bridge between the draw loop and the backends.
//!
//! The UI thread never awaits. Key handling produces [`Job`]s, the [`Dispatcher`]
//! runs each on the tokio runtime and sends the completion back as an
//! [`Envelope`] tagged with the screen generation it was started from.

use pia_core::{
    ActionStart, Backends, ConsoleResult, LoadedResource, ResourceKind, ResourceSummary,
    SimulationRun, SnapshotFetch, SubmitRequest, Ticket,
};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// Network work requested by the UI. Each carries the ticket its completion is matched against.
#[derive(Debug, Clone)]
pub enum Job {
    List { kind: ResourceKind, ticket: Ticket },
    /// Delete from the list screen (`from_view == false`) or the view screen.
    Delete {
        kind: ResourceKind,
        id: String,
        ticket: Ticket,
        from_view: bool,
    },
    Render { kind: ResourceKind, id: String, ticket: Ticket },
    Load { kind: ResourceKind, id: String, ticket: Ticket },
    Submit { ticket: Ticket, request: SubmitRequest },
    Snapshot(SnapshotFetch),
    Action(ActionStart),
    Simulate(Ticket),
}

impl Job {
    /// Perform the request. PES resources and simulations go to `pes`, module calls to `cml`.
    pub async fn run(self, backends: &Backends) -> AppEvent {
        match self {
            Job::List { kind, ticket } => AppEvent::Listed {
                ticket,
                outcome: backends.pes.list_resources(kind).await,
            },
            Job::Delete {
                kind,
                id,
                ticket,
                from_view,
            } => AppEvent::Deleted {
                outcome: backends.pes.delete(&kind.item_path(&id)).await,
                ticket,
                from_view,
            },
            Job::Render { kind, id, ticket } => AppEvent::Rendered {
                ticket,
                outcome: backends.pes.render_resource(kind, &id).await,
            },
            Job::Load { kind, id, ticket } => AppEvent::Loaded {
                ticket,
                outcome: backends.pes.fetch_resource(kind, &id).await,
            },
            Job::Submit { ticket, request } => AppEvent::Submitted {
                outcome: request.send(&backends.pes).await,
                ticket,
            },
            Job::Snapshot(fetch) => AppEvent::Snapshot {
                outcome: fetch.send(&backends.cml).await,
                fetch,
            },
            Job::Action(start) => AppEvent::ActionDone {
                outcome: start.request.send(&backends.cml).await,
                start,
            },
            Job::Simulate(ticket) => AppEvent::Simulated {
                ticket,
                outcome: backends.pes.run_simulation().await,
            },
        }
    }
}

/// Completion of a [`Job`].
#[derive(Debug, Clone)]
pub enum AppEvent {
    Listed {
        ticket: Ticket,
        outcome: ConsoleResult<Vec<ResourceSummary>>,
    },
    Deleted {
        ticket: Ticket,
        outcome: ConsoleResult<Value>,
        from_view: bool,
    },
    Rendered {
        ticket: Ticket,
        outcome: ConsoleResult<String>,
    },
    Loaded {
        ticket: Ticket,
        outcome: ConsoleResult<LoadedResource>,
    },
    Submitted {
        ticket: Ticket,
        outcome: ConsoleResult<Value>,
    },
    Snapshot {
        fetch: SnapshotFetch,
        outcome: ConsoleResult<Value>,
    },
    ActionDone {
        start: ActionStart,
        outcome: ConsoleResult<Value>,
    },
    Simulated {
        ticket: Ticket,
        outcome: ConsoleResult<SimulationRun>,
    },
}

/// An event plus the screen generation that requested it.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub generation: u64,
    pub event: AppEvent,
}

pub type EventSender = mpsc::UnboundedSender<Envelope>;
pub type EventReceiver = mpsc::UnboundedReceiver<Envelope>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Spawns jobs on a runtime and reports completions on the event channel.
#[derive(Clone)]
pub struct Dispatcher {
    handle: Handle,
    backends: Backends,
    tx: EventSender,
}

impl Dispatcher {
    pub fn new(handle: Handle, backends: Backends, tx: EventSender) -> Self {
        Self {
            handle,
            backends,
            tx,
        }
    }

    pub fn spawn(&self, generation: u64, job: Job) {
        let backends = self.backends.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let event = job.run(&backends).await;
            if tx.send(Envelope { generation, event }).is_err() {
                tracing::debug!("ui gone; completion dropped");
            }
        });
    }

    pub fn spawn_all(&self, generation: u64, jobs: Vec<Job>) {
        for job in jobs {
            self.spawn(generation, job);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pia_core::{ConsoleConfig, ListView};

    #[tokio::test]
    async fn unreachable_backend_reports_failure_on_channel() {
        let config = ConsoleConfig {
            api_base_url: "http://127.0.0.1:9".into(),
            cml_base_url: "http://127.0.0.1:9".into(),
            request_timeout_secs: 2,
            ..ConsoleConfig::default()
        };
        let backends = Backends::from_config(&config).unwrap();
        let (tx, mut rx) = event_channel();
        let dispatcher = Dispatcher::new(Handle::current(), backends, tx);

        let mut view = ListView::new(ResourceKind::Prompt);
        let ticket = view.begin_refresh();
        dispatcher.spawn(7, Job::List { kind: ResourceKind::Prompt, ticket });

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.generation, 7);
        match envelope.event {
            AppEvent::Listed { outcome, .. } => assert!(outcome.is_err()),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
