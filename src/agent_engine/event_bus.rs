use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::agent_engine::state::{RunnerState, StepOutcome, TaskRun};
use crate::llm::types::StreamChunk;

/// Everything the runner reports to the outside world. Write-only from the
/// runner's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Human-readable progress line for log views.
    Progress(String),
    StateChanged(RunnerState),
    LlmChunk(StreamChunk),
    StepFinished(StepOutcome),
    TaskEnded(TaskRun),
}

/// Progress sink handed to the runner and the model transport.
pub trait Observer: Send + Sync {
    fn emit(&self, event: AgentEvent);

    fn progress(&self, message: &str) {
        self.emit(AgentEvent::Progress(message.to_string()));
    }
}

/// Drops every event.
pub struct NullObserver;

impl Observer for NullObserver {
    fn emit(&self, _event: AgentEvent) {}
}

/// Mirrors progress lines into the tracing log.
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn emit(&self, event: AgentEvent) {
        match event {
            AgentEvent::Progress(line) => tracing::info!(target: "phoneclaw::progress", "{line}"),
            AgentEvent::StateChanged(state) => tracing::debug!(?state, "state changed"),
            AgentEvent::LlmChunk(_) => {}
            AgentEvent::StepFinished(outcome) => tracing::debug!(
                step = outcome.step,
                executed = outcome.executed,
                terminal = outcome.terminal,
                "step finished"
            ),
            AgentEvent::TaskEnded(run) => {
                tracing::info!(id = %run.id, cause = ?run.cause, steps = run.steps, "task ended")
            }
        }
    }
}

/// Fan-out of runner events to any number of subscribers (UI, loggers, tests).
pub struct EventBus {
    tx: broadcast::Sender<AgentEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for EventBus {
    fn emit(&self, event: AgentEvent) {
        // No subscribers is fine.
        let _ = self.tx.send(event);
    }
}
