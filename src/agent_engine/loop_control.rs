use std::time::Duration;

use tokio::sync::watch;

use crate::agent_engine::state::TerminationCause;

/// Sender half of the cooperative stop signal.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Creates a linked stop handle and the receiver the runner observes.
pub fn stop_signal() -> (StopHandle, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, rx)
}

/// Step ceiling plus the stop flag, checked at every step boundary.
pub struct LoopController {
    max_steps: u32,
    steps: u32,
    failure_count: u32,
    stop_rx: watch::Receiver<bool>,
}

impl LoopController {
    pub fn new(max_steps: u32, stop_rx: watch::Receiver<bool>) -> Self {
        Self {
            max_steps,
            steps: 0,
            failure_count: 0,
            stop_rx,
        }
    }

    /// Claims the next step number, or reports why the run must end.
    pub fn next_step(&mut self) -> Result<u32, TerminationCause> {
        if self.is_stopped() {
            return Err(TerminationCause::Cancelled);
        }
        if self.steps >= self.max_steps {
            return Err(TerminationCause::StepLimitReached);
        }
        self.steps += 1;
        Ok(self.steps)
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Sleeps for `duration`, waking early when a stop is requested.
    pub async fn pause(&mut self, duration: Duration) {
        if duration.is_zero() || self.is_stopped() {
            return;
        }
        let mut rx = self.stop_rx.clone();
        let stopped = async move {
            // A dropped handle can never stop us; fall back to the plain sleep.
            if rx.wait_for(|stopped| *stopped).await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = stopped => {}
        }
    }
}
