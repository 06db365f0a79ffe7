// Task control surface for the host application (UI, service, CLI).
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::agent_engine::engine::TaskRunner;
use crate::agent_engine::loop_control::{stop_signal, StopHandle};
use crate::agent_engine::state::TaskRun;
use crate::errors::{PhoneClawError, PhoneClawResult};

/// Stays in the slot until the next start replaces it, so stop and status
/// keep working while someone is waiting on the result.
struct ActiveTask {
    stop: StopHandle,
    result: watch::Receiver<Option<TaskRun>>,
    join: JoinHandle<()>,
}

impl ActiveTask {
    fn is_running(&self) -> bool {
        self.result.borrow().is_none() && !self.join.is_finished()
    }
}

/// Owns the runner and the at-most-one task currently driving it.
pub struct AgentHandle {
    runner: Arc<Mutex<TaskRunner>>,
    active: StdMutex<Option<ActiveTask>>,
}

impl AgentHandle {
    pub fn new(runner: TaskRunner) -> Self {
        Self {
            runner: Arc::new(Mutex::new(runner)),
            active: StdMutex::new(None),
        }
    }

    fn slot(&self) -> PhoneClawResult<std::sync::MutexGuard<'_, Option<ActiveTask>>> {
        self.active
            .lock()
            .map_err(|e| PhoneClawError::Agent(format!("task slot poisoned: {e}")))
    }

    /// Spawns a run for `instruction` on the current tokio runtime.
    pub fn start_task(&self, instruction: &str) -> PhoneClawResult<()> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(PhoneClawError::EmptyInstruction);
        }

        let mut active = self.slot()?;
        if active.as_ref().is_some_and(ActiveTask::is_running) {
            return Err(PhoneClawError::TaskAlreadyRunning);
        }

        let (stop, stop_rx) = stop_signal();
        let (result_tx, result) = watch::channel(None);
        let runner = self.runner.clone();
        let instruction = instruction.to_string();
        tracing::info!(task = %instruction, "start_task invoked");
        let join = tokio::spawn(async move {
            let mut runner = runner.lock().await;
            let run = runner.run_task(&instruction, stop_rx).await;
            result_tx.send_replace(Some(run));
        });
        *active = Some(ActiveTask { stop, result, join });
        Ok(())
    }

    /// Requests a stop; the run ends at its next step boundary. Returns false
    /// when nothing was running.
    pub fn stop_task(&self) -> bool {
        let Ok(active) = self.active.lock() else {
            return false;
        };
        match active.as_ref() {
            Some(task) if task.is_running() => {
                tracing::info!("stop_task invoked");
                task.stop.stop();
                true
            }
            _ => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .map(|a| a.as_ref().is_some_and(ActiveTask::is_running))
            .unwrap_or(false)
    }

    /// Waits for the latest run and returns its record. `None` if no task was started.
    pub async fn wait(&self) -> PhoneClawResult<Option<TaskRun>> {
        let result = {
            let slot = self.slot()?;
            slot.as_ref().map(|t| t.result.clone())
        };
        let Some(mut result) = result else {
            return Ok(None);
        };
        let run = result
            .wait_for(Option::is_some)
            .await
            .map_err(|_| PhoneClawError::Agent("task ended without a result".into()))?
            .clone();
        Ok(run)
    }
}
