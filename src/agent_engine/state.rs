/// One device operation decided by the model.
///
/// Coordinates are normalized to the 0–999 grid; required fields are always
/// present because the parser falls back to `Unknown` rather than building a
/// partial variant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Launch { app: String },
    Tap {
        x: u16,
        y: u16,
        warn_message: Option<String>,
    },
    Type { text: String },
    Swipe { x1: u16, y1: u16, x2: u16, y2: u16 },
    LongPress { x: u16, y: u16 },
    DoubleTap { x: u16, y: u16 },
    Back,
    Home,
    Wait { duration_ms: u64 },
    TakeOver { message: Option<String> },
    Finish { message: String },
    Unknown,
}

impl Action {
    /// Finish and TakeOver end the run.
    pub fn is_terminal(&self) -> bool {
        self.termination().is_some()
    }

    /// How this action ends the run, with the message it carries.
    pub fn termination(&self) -> Option<(TerminationCause, Option<String>)> {
        match self {
            Action::Finish { message } => Some((TerminationCause::Finished, Some(message.clone()))),
            Action::TakeOver { message } => Some((TerminationCause::TookOver, message.clone())),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Launch { .. } => "launch",
            Action::Tap { .. } => "tap",
            Action::Type { .. } => "type",
            Action::Swipe { .. } => "swipe",
            Action::LongPress { .. } => "long_press",
            Action::DoubleTap { .. } => "double_tap",
            Action::Back => "back",
            Action::Home => "home",
            Action::Wait { .. } => "wait",
            Action::TakeOver { .. } => "take_over",
            Action::Finish { .. } => "finish",
            Action::Unknown => "unknown",
        }
    }
}

/// Result of one loop iteration. Produced fresh every step.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StepOutcome {
    pub step: u32,
    pub executed: bool,
    pub terminal: bool,
    pub action: Option<Action>,
    pub reasoning: String,
    pub note: Option<String>,
}

impl StepOutcome {
    pub(crate) fn failed(step: u32, note: impl Into<String>) -> Self {
        Self {
            step,
            executed: false,
            terminal: false,
            action: None,
            reasoning: String::new(),
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    Finished,
    TookOver,
    StepLimitReached,
    Cancelled,
    /// The command parser crashed. Never reported as success.
    ParserFault,
}

/// Lifecycle container for one instruction. Cannot be resumed once terminated.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TaskRun {
    pub id: String,
    pub instruction: String,
    pub steps: u32,
    pub failed_steps: u32,
    pub cause: Option<TerminationCause>,
    /// Message carried by the terminal action, or the fault description.
    pub message: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TaskRun {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            instruction: instruction.into(),
            steps: 0,
            failed_steps: 0,
            cause: None,
            message: None,
            started_at: chrono::Utc::now(),
            ended_at: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.cause.is_some()
    }

    pub(crate) fn terminate(&mut self, cause: TerminationCause, message: Option<String>) {
        if self.cause.is_some() {
            return;
        }
        self.cause = Some(cause);
        self.message = message;
        self.ended_at = Some(chrono::Utc::now());
    }
}

/// Lifecycle states of the task runner.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunnerState {
    Idle,
    Starting { instruction: String },
    Stepping { step: u32 },
    AwaitingModel { step: u32 },
    Executing { step: u32, action: Action },
    Terminal { cause: TerminationCause },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoopConfig {
    pub max_steps: u32,
    pub step_delay_ms: u64,
    pub takeover_on_sensitive_tap: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_steps: 100,
            step_delay_ms: 1500,
            takeover_on_sensitive_tap: false,
        }
    }
}

impl LoopConfig {
    pub fn from_app_config(cfg: &crate::config::AppConfig) -> Self {
        Self {
            max_steps: cfg.agent.max_steps,
            step_delay_ms: cfg.agent.step_delay_ms,
            takeover_on_sensitive_tap: cfg.safety.takeover_on_sensitive_tap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finish_and_takeover_are_terminal() {
        assert!(Action::Finish {
            message: "ok".into(),
        }
        .is_terminal());
        assert!(Action::TakeOver { message: None }.is_terminal());
        assert!(!Action::Back.is_terminal());
        assert!(!Action::Unknown.is_terminal());
    }

    #[test]
    fn termination_carries_message() {
        assert_eq!(
            Action::Finish {
                message: "ok".into(),
            }
            .termination(),
            Some((TerminationCause::Finished, Some("ok".to_string())))
        );
        assert_eq!(
            Action::TakeOver { message: None }.termination(),
            Some((TerminationCause::TookOver, None))
        );
        assert_eq!(Action::Home.termination(), None);
    }

    #[test]
    fn terminate_is_absorbing() {
        let mut run = TaskRun::new("open settings");
        run.terminate(TerminationCause::Finished, Some("done".into()));
        run.terminate(TerminationCause::Cancelled, None);
        assert_eq!(run.cause, Some(TerminationCause::Finished));
        assert_eq!(run.message.as_deref(), Some("done"));
        assert!(run.ended_at.is_some());
    }

    #[test]
    fn action_serializes_tagged() {
        let v = serde_json::to_value(Action::DoubleTap { x: 1, y: 2 }).unwrap();
        assert_eq!(v["type"], "double_tap");
        assert_eq!(v["x"], 1);
    }
}
