//! Simulation runs on the scenario engine backend.

use crate::client::{decode, ResourceClient};
use crate::error::ConsoleResult;
use crate::tasks::{TaskBoard, Ticket};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const RUN_PATH: &str = "/api/piase/run_simulation";
pub const RUN: &str = "run";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    #[serde(default)]
    pub agent_reached_goal: bool,
    #[serde(default)]
    pub total_steps_taken: u64,
    /// Opaque position value (usually `[x, y]`).
    #[serde(default)]
    pub final_agent_position: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub run_id: String,
    #[serde(default)]
    pub summary: SimulationSummary,
    #[serde(default)]
    pub text_log: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

impl ResourceClient {
    pub async fn run_simulation(&self) -> ConsoleResult<SimulationRun> {
        let run: SimulationRun = decode(self.post(RUN_PATH, &json!({})).await?)?;
        tracing::info!(run_id = %run.run_id, steps = run.summary.total_steps_taken, "simulation finished");
        Ok(run)
    }
}

#[derive(Debug, Default)]
pub struct SimulationConsole {
    last_run: Option<SimulationRun>,
    tasks: TaskBoard,
}

impl SimulationConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_run(&self) -> Option<&SimulationRun> {
        self.last_run.as_ref()
    }

    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    pub fn is_running(&self) -> bool {
        self.tasks.is_pending(RUN)
    }

    /// Start a run; the previous result is cleared. `None` while a run is in flight.
    pub fn begin_run(&mut self) -> Option<Ticket> {
        let ticket = self.tasks.try_begin(RUN)?;
        self.last_run = None;
        Some(ticket)
    }

    pub fn finish_run(&mut self, ticket: &Ticket, outcome: ConsoleResult<SimulationRun>) -> bool {
        if !self.tasks.is_current(ticket) {
            return false;
        }
        match outcome {
            Ok(run) => {
                let id = Value::String(run.run_id.clone());
                self.last_run = Some(run);
                self.tasks.finish(ticket, Ok(id))
            }
            Err(err) => self.tasks.finish(ticket, Err(err)),
        }
    }

    pub async fn run(&mut self, client: &ResourceClient) -> bool {
        let Some(ticket) = self.begin_run() else {
            return false;
        };
        let outcome = client.run_simulation().await;
        self.finish_run(&ticket, outcome)
    }

    /// Image URLs of the last run, resolved against the backend base URL.
    pub fn image_urls(&self, client: &ResourceClient) -> Vec<String> {
        self.last_run
            .iter()
            .flat_map(|run| run.image_urls.iter())
            .filter_map(|url| client.resolve(url).ok())
            .map(|url| url.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConsoleError;

    #[test]
    fn decodes_run_with_defaults() {
        let run: SimulationRun = serde_json::from_value(json!({
            "run_id": "r1",
            "summary": {"agent_reached_goal": true, "total_steps_taken": 12, "final_agent_position": [3, 4]},
            "text_log": "step 1\nstep 2",
            "image_urls": ["/static/sim/r1/step_0.png"]
        }))
        .unwrap();
        assert!(run.summary.agent_reached_goal);
        assert_eq!(run.summary.final_agent_position, json!([3, 4]));

        let sparse: SimulationRun = serde_json::from_value(json!({"run_id": "r2"})).unwrap();
        assert!(sparse.image_urls.is_empty());
    }

    #[test]
    fn image_urls_resolve_against_base() {
        let client = ResourceClient::new("http://localhost:5001").unwrap();
        let mut console = SimulationConsole::new();
        let ticket = console.begin_run().unwrap();
        assert!(console.begin_run().is_none());
        console.finish_run(
            &ticket,
            Ok(SimulationRun {
                run_id: "r1".into(),
                summary: SimulationSummary::default(),
                text_log: String::new(),
                image_urls: vec!["/static/a.png".into()],
            }),
        );
        assert_eq!(console.image_urls(&client), vec!["http://localhost:5001/static/a.png"]);
    }

    #[test]
    fn failed_run_keeps_error() {
        let mut console = SimulationConsole::new();
        let ticket = console.begin_run().unwrap();
        console.finish_run(&ticket, Err(ConsoleError::Http { status: 500, message: "engine crashed".into() }));
        assert!(console.last_run().is_none());
        assert_eq!(console.tasks().error(RUN).unwrap().to_string(), "engine crashed");
    }
}
