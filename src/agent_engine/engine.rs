use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::agent_engine::conversation::Conversation;
use crate::agent_engine::event_bus::{AgentEvent, Observer};
use crate::agent_engine::history::{self, HistoryEntry, SessionHistory};
use crate::agent_engine::loop_control::LoopController;
use crate::agent_engine::state::{
    Action, LoopConfig, RunnerState, StepOutcome, TaskRun, TerminationCause,
};
use crate::config::AppConfig;
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::executor::apps::AppResolver;
use crate::executor::dispatcher;
use crate::executor::input::DeviceInput;
use crate::executor::safety;
use crate::llm::action_parser;
use crate::llm::prompt;
use crate::llm::provider::LlmProvider;
use crate::llm::registry::ProviderRegistry;
use crate::llm::segmenter::{self, Segmented};
use crate::llm::types::CallConfig;
use crate::perception::screenshot;
use crate::perception::traits::{ScreenCapture, ScreenDescriptor};

/// Device-side collaborators, injected rather than looked up globally.
#[derive(Clone)]
pub struct DeviceBridge {
    pub capture: Arc<dyn ScreenCapture>,
    pub descriptor: Arc<dyn ScreenDescriptor>,
    pub input: Arc<dyn DeviceInput>,
    pub apps: Arc<dyn AppResolver>,
}

/// Signature of the action-expression parser.
pub type ActionParseFn = fn(&str) -> Action;

/// How a step ended the run, if it did.
type Ending = Option<(TerminationCause, Option<String>)>;

/// Per-run bookkeeping that does not outlive `run_task`.
struct RunContext<'a> {
    instruction: &'a str,
    instruction_sent: bool,
    history: Option<SessionHistory>,
}

impl RunContext<'_> {
    fn record(&mut self, entry: HistoryEntry) {
        if let Some(history) = self.history.as_mut() {
            if let Err(e) = history.record(entry) {
                tracing::warn!(error = %e, "history write failed");
            }
        }
    }
}

/// Perceive → decide → act loop for one natural-language instruction at a time.
pub struct TaskRunner {
    device: DeviceBridge,
    provider: Arc<dyn LlmProvider>,
    call_cfg: CallConfig,
    config: LoopConfig,
    observer: Arc<dyn Observer>,
    history_dir: Option<PathBuf>,
    parse_action: ActionParseFn,

    state: RunnerState,
    conversation: Conversation,
}

impl TaskRunner {
    pub fn new(
        device: DeviceBridge,
        provider: Arc<dyn LlmProvider>,
        call_cfg: CallConfig,
        config: LoopConfig,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            device,
            provider,
            call_cfg,
            config,
            observer,
            history_dir: None,
            parse_action: action_parser::parse,
            state: RunnerState::Idle,
            conversation: Conversation::new(String::new()),
        }
    }

    /// Runner wired to the active provider of `config.toml`.
    pub fn from_config(
        cfg: &AppConfig,
        device: DeviceBridge,
        observer: Arc<dyn Observer>,
    ) -> PhoneClawResult<Self> {
        let registry = ProviderRegistry::from_config(cfg)?;
        let (provider, call_cfg) = registry.active_call_config()?;
        let mut runner = Self::new(
            device,
            provider,
            call_cfg,
            LoopConfig::from_app_config(cfg),
            observer,
        );
        if cfg.agent.record_history {
            runner.history_dir = Some(history::default_session_dir());
        }
        Ok(runner)
    }

    /// Writes a JSONL replay log per task into `dir`.
    pub fn with_history_dir(mut self, dir: PathBuf) -> Self {
        self.history_dir = Some(dir);
        self
    }

    /// Replaces the command parser; a panic inside it ends the run as `ParserFault`.
    pub fn with_action_parser(mut self, parse: ActionParseFn) -> Self {
        self.parse_action = parse;
        self
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    fn set_state(&mut self, state: RunnerState) {
        self.state = state.clone();
        self.observer.emit(AgentEvent::StateChanged(state));
    }

    fn progress(&self, message: impl AsRef<str>) {
        self.observer.progress(message.as_ref());
    }

    /// Runs one instruction to completion. The previous conversation is discarded.
    pub async fn run_task(
        &mut self,
        instruction: &str,
        stop_rx: watch::Receiver<bool>,
    ) -> TaskRun {
        let mut run = TaskRun::new(instruction);
        self.set_state(RunnerState::Starting {
            instruction: instruction.to_string(),
        });
        self.conversation = Conversation::new(prompt::system_prompt());

        let mut ctx = RunContext {
            instruction,
            instruction_sent: false,
            history: self.history_dir.as_deref().map(|dir| {
                if let Err(e) = std::fs::create_dir_all(dir) {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "cannot create history dir"
                    );
                }
                SessionHistory::in_dir(dir)
            }),
        };
        ctx.record(HistoryEntry::now(0, "task").with_content(instruction));

        tracing::info!(id = %run.id, instruction = %instruction, "task started");
        self.progress(format!("Task goal: {instruction}"));

        let mut ctrl = LoopController::new(self.config.max_steps, stop_rx);
        let step_delay = Duration::from_millis(self.config.step_delay_ms);

        loop {
            let step = match ctrl.next_step() {
                Ok(step) => step,
                Err(cause) => {
                    if cause == TerminationCause::StepLimitReached {
                        tracing::warn!(max_steps = self.config.max_steps, "step limit reached");
                        self.progress(format!("Step limit reached ({})", self.config.max_steps));
                    } else {
                        tracing::info!("stop requested");
                        self.progress("Task stopped");
                    }
                    run.terminate(cause, None);
                    break;
                }
            };
            run.steps = step;

            let (outcome, ending) = self.step(step, &mut ctx, &mut ctrl).await;
            if !outcome.executed {
                ctrl.record_failure();
                run.failed_steps = ctrl.failure_count();
            }
            self.observer.emit(AgentEvent::StepFinished(outcome));

            if let Some((cause, message)) = ending {
                run.terminate(cause, message);
                break;
            }

            ctrl.pause(step_delay).await;
        }

        let cause = run.cause.unwrap_or(TerminationCause::Cancelled);
        self.set_state(RunnerState::Terminal { cause });
        tracing::info!(
            id = %run.id,
            cause = ?cause,
            steps = run.steps,
            failed_steps = run.failed_steps,
            "task ended"
        );
        self.observer.emit(AgentEvent::TaskEnded(run.clone()));
        run
    }

    async fn step(
        &mut self,
        step: u32,
        ctx: &mut RunContext<'_>,
        ctrl: &mut LoopController,
    ) -> (StepOutcome, Ending) {
        self.set_state(RunnerState::Stepping { step });
        self.progress(format!("━━━ Step {step} ━━━"));

        // ── Perceive ─────────────────────────────────────────────────────
        let frame = match self.device.capture.capture_screen().await {
            Ok(frame) => frame,
            Err(e) => return (self.capture_failed(step, e), None),
        };
        let size = frame.size();
        let image_url = match screenshot::to_data_url(frame) {
            Ok(url) => url,
            Err(e) => return (self.capture_failed(step, e), None),
        };

        let current_app = self.device.descriptor.current_foreground_label().await;
        self.progress(format!(
            "Current app: {current_app} ({}x{})",
            size.width, size.height
        ));

        let text = if ctx.instruction_sent {
            prompt::followup_turn_text(&current_app)
        } else {
            prompt::first_turn_text(ctx.instruction, &current_app)
        };
        let user_idx = self.conversation.push_user(text.clone(), Some(image_url));
        ctx.instruction_sent = true;
        ctx.record(HistoryEntry::now(step, "user").with_content(text));

        // ── Decide ───────────────────────────────────────────────────────
        self.set_state(RunnerState::AwaitingModel { step });
        self.progress("Asking the model...");
        let reply = match self
            .provider
            .chat(self.conversation.turns(), &self.call_cfg, self.observer.as_ref())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                // Keep the single-image invariant for the next step.
                self.conversation.strip_image(user_idx);
                if e.is_transport() {
                    tracing::error!(step, error = %e, "model call failed");
                } else {
                    tracing::warn!(step, error = %e, "model reply unusable");
                }
                self.progress(format!("Model call failed: {e}"));
                return (StepOutcome::failed(step, e.to_string()), None);
            }
        };

        let Segmented {
            reasoning,
            action: action_expr,
        } = segmenter::segment(&reply.content);
        tracing::debug!(
            step,
            reasoning_len = reasoning.len(),
            action = %action_expr,
            "model reply segmented"
        );
        if !reasoning.is_empty() {
            self.progress(format!("Thinking: {reasoning}"));
        }
        self.progress(format!("Decision: {action_expr}"));

        let parse = self.parse_action;
        let parsed = panic::catch_unwind(AssertUnwindSafe(|| parse(&action_expr)));

        self.conversation.strip_image(user_idx);
        self.conversation
            .push_assistant(segmenter::assistant_turn_text(&reasoning, &action_expr));

        let action = match parsed {
            Ok(action) => action,
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                tracing::error!(step, detail = %detail, "action parser crashed");
                self.progress(format!("Internal parser fault: {detail}"));
                ctx.record(HistoryEntry::now(step, "assistant").with_content(action_expr));
                let outcome = StepOutcome {
                    step,
                    executed: false,
                    terminal: true,
                    action: None,
                    reasoning,
                    note: Some(format!("parser fault: {detail}")),
                };
                return (outcome, Some((TerminationCause::ParserFault, Some(detail))));
            }
        };

        ctx.record(
            HistoryEntry::now(step, "assistant")
                .with_content(action_expr.clone())
                .with_action(serde_json::to_value(&action).unwrap_or_default()),
        );

        if action == Action::Unknown {
            let err = PhoneClawError::MalformedModelOutput(action_expr.clone());
            tracing::warn!(step, error = %err, "unparseable action");
        }

        // ── Act ──────────────────────────────────────────────────────────
        if let Some(notice) = safety::sensitive_notice(&action).map(str::to_string) {
            tracing::warn!(step, notice = %notice, "sensitive tap");
            self.progress(format!("Sensitive action: {notice}"));
            if safety::requires_takeover(&action, self.config.takeover_on_sensitive_tap) {
                let outcome = StepOutcome {
                    step,
                    executed: false,
                    terminal: true,
                    action: Some(action),
                    reasoning,
                    note: Some("sensitive tap handed over to the user".into()),
                };
                return (outcome, Some((TerminationCause::TookOver, Some(notice))));
            }
        }

        self.set_state(RunnerState::Executing {
            step,
            action: action.clone(),
        });

        let (executed, note) = match &action {
            Action::Wait { duration_ms } => {
                self.progress(format!("Waiting {duration_ms}ms"));
                ctrl.pause(Duration::from_millis(*duration_ms)).await;
                (true, None)
            }
            other => {
                match dispatcher::dispatch(
                    other,
                    size,
                    self.device.input.as_ref(),
                    self.device.apps.as_ref(),
                )
                .await
                {
                    Ok(msg) => {
                        self.progress(&msg);
                        (true, None)
                    }
                    Err(e) => {
                        tracing::warn!(
                            step,
                            action = other.name(),
                            error = %e,
                            "dispatch failed"
                        );
                        self.progress(format!("Action failed: {e}"));
                        (false, Some(e.to_string()))
                    }
                }
            }
        };

        let ending = action.termination();
        match &ending {
            Some((TerminationCause::Finished, message)) => self.progress(format!(
                "Task complete: {}",
                message.as_deref().unwrap_or_default()
            )),
            Some(_) => self.progress("User takeover requested"),
            None => {}
        }

        let outcome = StepOutcome {
            step,
            executed,
            terminal: action.is_terminal(),
            action: Some(action),
            reasoning,
            note,
        };
        (outcome, ending)
    }

    fn capture_failed(&self, step: u32, err: PhoneClawError) -> StepOutcome {
        tracing::warn!(step, error = %err, "screenshot unavailable, retrying next step");
        self.progress(format!("Screenshot failed: {err}"));
        StepOutcome::failed(step, err.to_string())
    }
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent_engine::loop_control::stop_signal;
    use crate::llm::types::Role;
    use crate::test_support::{
        bridge, call_config, DeviceCall, MockCapture, MockDevice, RecordingObserver,
        ScriptedProvider,
    };

    fn fast_config(max_steps: u32) -> LoopConfig {
        LoopConfig {
            max_steps,
            step_delay_ms: 0,
            takeover_on_sensitive_tap: false,
        }
    }

    struct Harness {
        runner: TaskRunner,
        device: Arc<MockDevice>,
        provider: Arc<ScriptedProvider>,
        observer: Arc<RecordingObserver>,
    }

    fn harness(capture: MockCapture, provider: ScriptedProvider, config: LoopConfig) -> Harness {
        let device = Arc::new(MockDevice::default());
        let provider = Arc::new(provider);
        let observer = Arc::new(RecordingObserver::default());
        let runner = TaskRunner::new(
            bridge(capture, device.clone()),
            provider.clone(),
            call_config(),
            config,
            observer.clone(),
        );
        Harness {
            runner,
            device,
            provider,
            observer,
        }
    }

    fn outcomes(observer: &RecordingObserver) -> Vec<StepOutcome> {
        observer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                AgentEvent::StepFinished(o) => Some(o),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn open_settings_end_to_end() {
        let mut h = harness(
            MockCapture::new(1080, 2400),
            ScriptedProvider::replying(&[
                "<think>Need the settings app.</think><answer>do(action=\"Launch\", app=\"设置\")</answer>",
                "<think>Settings is open.</think><answer>finish(message=\"done\")</answer>",
            ]),
            fast_config(100),
        );
        let (_stop, rx) = stop_signal();

        let run = h.runner.run_task("open settings", rx).await;

        assert_eq!(run.cause, Some(TerminationCause::Finished));
        assert_eq!(run.steps, 2);
        assert_eq!(run.message.as_deref(), Some("done"));
        assert_eq!(
            h.device.calls(),
            vec![DeviceCall::Launch("com.android.settings".into())]
        );
        assert_eq!(
            h.runner.state(),
            &RunnerState::Terminal {
                cause: TerminationCause::Finished
            }
        );

        let steps = outcomes(&h.observer);
        assert_eq!(steps.len(), 2);
        assert!(steps[0].executed && !steps[0].terminal);
        assert!(steps[0].reasoning.contains("Need the settings app."));
        assert!(steps[1].terminal);
        assert!(h
            .observer
            .progress_lines()
            .contains(&"Task complete: done".to_string()));
    }

    #[tokio::test]
    async fn conversation_shape_and_single_image() {
        let mut h = harness(
            MockCapture::new(100, 200),
            ScriptedProvider::replying(&[
                "do(action=\"Tap\", element=[500,500])",
                "do(action=\"Back\")",
                "finish(message=\"ok\")",
            ]),
            fast_config(10),
        );
        let (_stop, rx) = stop_signal();
        h.runner.run_task("go back twice", rx).await;

        // Every request carried exactly one image, on its newest user turn.
        let requests = h.provider.requests();
        assert_eq!(requests.len(), 3);
        for sent in &requests {
            let with_image: Vec<usize> = sent
                .iter()
                .enumerate()
                .filter(|(_, m)| m.has_image())
                .map(|(i, _)| i)
                .collect();
            assert_eq!(with_image, vec![sent.len() - 1]);
            assert_eq!(sent.last().unwrap().role, Role::User);
        }

        let conv = h.runner.conversation();
        assert_eq!(conv.image_count(), 0);
        let turns = conv.turns();
        assert_eq!(turns[0].role, Role::System);
        assert!(turns[1].text().starts_with("go back twice\n\n"));
        assert_eq!(turns[2].role, Role::Assistant);
        assert!(turns[3].text().starts_with("** Screen Info **"));
        assert!(!turns[3].text().contains("go back twice"));
        assert_eq!(
            turns[2].text(),
            "<think></think><answer>do(action=\"Tap\", element=[500,500])</answer>"
        );

        assert_eq!(h.device.calls(), vec![DeviceCall::Tap(50, 100), DeviceCall::Back]);
    }

    #[tokio::test]
    async fn capture_failure_keeps_looping() {
        let mut h = harness(
            MockCapture::new(100, 100).with_script(&[false, true]),
            ScriptedProvider::replying(&["finish(message=\"ok\")"]),
            fast_config(10),
        );
        let (_stop, rx) = stop_signal();
        let run = h.runner.run_task("check", rx).await;

        assert_eq!(run.cause, Some(TerminationCause::Finished));
        assert_eq!(run.steps, 2);
        assert_eq!(run.failed_steps, 1);

        let steps = outcomes(&h.observer);
        assert!(!steps[0].executed && !steps[0].terminal);
        assert!(steps[0].action.is_none());

        // The instruction rides on the first step that actually reached the model.
        let first_request = &h.provider.requests()[0];
        assert!(first_request[1].text().starts_with("check\n\n"));
    }

    #[tokio::test]
    async fn step_limit_is_distinct_from_success() {
        let replies: Vec<&str> = vec!["do(action=\"Back\")"; 3];
        let mut h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&replies),
            fast_config(3),
        );
        let (_stop, rx) = stop_signal();
        let run = h.runner.run_task("loop forever", rx).await;

        assert_eq!(run.cause, Some(TerminationCause::StepLimitReached));
        assert_eq!(run.steps, 3);
        assert_eq!(h.device.calls().len(), 3);
    }

    #[tokio::test]
    async fn transport_failure_is_non_terminal() {
        let mut h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::new(vec![
                Err(PhoneClawError::LlmProvider("502 Bad Gateway".into())),
                Ok("finish(message=\"recovered\")".into()),
            ]),
            fast_config(10),
        );
        let (_stop, rx) = stop_signal();
        let run = h.runner.run_task("retry", rx).await;

        assert_eq!(run.cause, Some(TerminationCause::Finished));
        assert_eq!(run.steps, 2);
        // The failed turn lost its image before the next one was sent.
        let second = &h.provider.requests()[1];
        assert_eq!(second.iter().filter(|m| m.has_image()).count(), 1);
    }

    #[tokio::test]
    async fn unknown_and_rejected_actions_continue() {
        let device = Arc::new(MockDevice::failing());
        let observer = Arc::new(RecordingObserver::default());
        let mut runner = TaskRunner::new(
            bridge(MockCapture::new(100, 100), device.clone()),
            Arc::new(ScriptedProvider::replying(&[
                "I am not sure what to do",
                "do(action=\"Home\")",
                "finish(message=\"ok\")",
            ])),
            call_config(),
            fast_config(10),
            observer.clone(),
        );
        let (_stop, rx) = stop_signal();
        let run = runner.run_task("anything", rx).await;

        assert_eq!(run.cause, Some(TerminationCause::Finished));
        let steps = outcomes(&observer);
        assert_eq!(steps[0].action, Some(Action::Unknown));
        assert!(!steps[0].executed);
        assert!(!steps[1].executed);
        assert!(steps[1].note.as_deref().unwrap().contains("rejected"));
        assert_eq!(device.calls(), vec![DeviceCall::Home]);
    }

    #[tokio::test]
    async fn take_over_ends_run() {
        let mut h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&["do(action=\"Take_over\", message=\"请登录\")"]),
            fast_config(10),
        );
        let (_stop, rx) = stop_signal();
        let run = h.runner.run_task("log in", rx).await;
        assert_eq!(run.cause, Some(TerminationCause::TookOver));
        assert_eq!(run.message.as_deref(), Some("请登录"));
        assert_eq!(run.steps, 1);
    }

    #[tokio::test]
    async fn sensitive_tap_can_require_takeover() {
        let mut config = fast_config(10);
        config.takeover_on_sensitive_tap = true;
        let mut h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&[
                "do(action=\"Tap\", element=[10,10], message=\"确认支付\")",
            ]),
            config,
        );
        let (_stop, rx) = stop_signal();
        let run = h.runner.run_task("pay", rx).await;
        assert_eq!(run.cause, Some(TerminationCause::TookOver));
        assert_eq!(run.message.as_deref(), Some("确认支付"));
        assert!(h.device.calls().is_empty());
    }

    #[tokio::test]
    async fn sensitive_tap_is_dispatched_by_default() {
        let mut h = harness(
            MockCapture::new(1000, 2000),
            ScriptedProvider::replying(&[
                "do(action=\"Tap\", element=[100,100], message=\"确认支付\")",
                "finish(message=\"paid\")",
            ]),
            fast_config(10),
        );
        let (_stop, rx) = stop_signal();
        let run = h.runner.run_task("pay", rx).await;
        assert_eq!(run.cause, Some(TerminationCause::Finished));
        assert_eq!(h.device.calls(), vec![DeviceCall::Tap(100, 200)]);
        assert!(h
            .observer
            .progress_lines()
            .contains(&"Sensitive action: 确认支付".to_string()));
    }

    fn exploding_parser(_: &str) -> Action {
        panic!("grammar table corrupted")
    }

    #[tokio::test]
    async fn parser_crash_is_not_success() {
        let h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&["finish(message=\"done\")"]),
            fast_config(10),
        );
        let mut runner = h.runner.with_action_parser(exploding_parser);
        let (_stop, rx) = stop_signal();
        let run = runner.run_task("anything", rx).await;

        assert_eq!(run.cause, Some(TerminationCause::ParserFault));
        assert_eq!(run.message.as_deref(), Some("grammar table corrupted"));
        assert_eq!(runner.conversation().image_count(), 0);
        assert!(h.device.calls().is_empty());
    }

    #[tokio::test]
    async fn stop_before_start_cancels() {
        let mut h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&["do(action=\"Back\")"]),
            fast_config(10),
        );
        let (stop, rx) = stop_signal();
        stop.stop();
        let run = h.runner.run_task("never", rx).await;
        assert_eq!(run.cause, Some(TerminationCause::Cancelled));
        assert_eq!(run.steps, 0);
        assert!(h.provider.requests().is_empty());
    }

    #[tokio::test]
    async fn stop_during_wait_ends_at_next_boundary() {
        let mut h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&["do(action=\"Wait\", duration=\"60 seconds\")"]),
            fast_config(10),
        );
        let (stop, rx) = stop_signal();
        let stopper = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stop.stop();
        });
        let run = tokio::time::timeout(Duration::from_secs(10), h.runner.run_task("wait", rx))
            .await
            .expect("stop should interrupt the wait");
        stopper.await.unwrap();

        assert_eq!(run.cause, Some(TerminationCause::Cancelled));
        assert_eq!(run.steps, 1);
    }

    #[tokio::test]
    async fn new_task_discards_old_conversation() {
        let mut h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&["finish(message=\"a\")", "finish(message=\"b\")"]),
            fast_config(10),
        );
        let (_s1, rx1) = stop_signal();
        h.runner.run_task("first", rx1).await;
        let (_s2, rx2) = stop_signal();
        let run = h.runner.run_task("second", rx2).await;

        assert_eq!(run.message.as_deref(), Some("b"));
        let turns = h.runner.conversation().turns();
        assert_eq!(turns.len(), 3);
        assert!(turns[1].text().starts_with("second"));
    }

    #[tokio::test]
    async fn history_is_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let h = harness(
            MockCapture::new(100, 100),
            ScriptedProvider::replying(&["finish(message=\"ok\")"]),
            fast_config(10),
        );
        let mut runner = h.runner.with_history_dir(dir.path().to_path_buf());
        let (_stop, rx) = stop_signal();
        runner.run_task("log me", rx).await;

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let text = std::fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(!text.contains("base64"));
    }
}
