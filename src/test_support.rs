//! Scripted collaborators shared by the unit tests.
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::agent_engine::engine::DeviceBridge;
use crate::agent_engine::event_bus::{AgentEvent, Observer};
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::executor::apps::StaticAppResolver;
use crate::executor::input::DeviceInput;
use crate::llm::provider::LlmProvider;
use crate::llm::types::{CallConfig, ChatMessage, LlmResponse};
use crate::perception::traits::{ScreenCapture, ScreenDescriptor};
use crate::perception::types::Frame;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Tap(u32, u32),
    LongPress(u32, u32),
    DoubleTap(u32, u32),
    Swipe(u32, u32, u32, u32),
    Type(String),
    Back,
    Home,
    Launch(String),
}

#[derive(Default)]
pub struct MockDevice {
    calls: Mutex<Vec<DeviceCall>>,
    fail: bool,
}

impl MockDevice {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: DeviceCall) -> PhoneClawResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(PhoneClawError::Dispatch("device rejected gesture".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DeviceInput for MockDevice {
    async fn tap(&self, x: u32, y: u32) -> PhoneClawResult<()> {
        self.record(DeviceCall::Tap(x, y))
    }

    async fn long_press(&self, x: u32, y: u32) -> PhoneClawResult<()> {
        self.record(DeviceCall::LongPress(x, y))
    }

    async fn double_tap(&self, x: u32, y: u32) -> PhoneClawResult<()> {
        self.record(DeviceCall::DoubleTap(x, y))
    }

    async fn swipe(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> PhoneClawResult<()> {
        self.record(DeviceCall::Swipe(x1, y1, x2, y2))
    }

    async fn type_text(&self, text: &str) -> PhoneClawResult<()> {
        self.record(DeviceCall::Type(text.to_string()))
    }

    async fn back(&self) -> PhoneClawResult<()> {
        self.record(DeviceCall::Back)
    }

    async fn home(&self) -> PhoneClawResult<()> {
        self.record(DeviceCall::Home)
    }

    async fn launch(&self, package_id: &str) -> PhoneClawResult<()> {
        self.record(DeviceCall::Launch(package_id.to_string()))
    }
}

/// Returns frames of a fixed size; scripted `false` entries are capture failures.
pub struct MockCapture {
    width: u32,
    height: u32,
    script: Mutex<VecDeque<bool>>,
}

impl MockCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            script: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_script(self, script: &[bool]) -> Self {
        *self.script.lock().unwrap() = script.iter().copied().collect();
        self
    }
}

#[async_trait]
impl ScreenCapture for MockCapture {
    async fn capture_screen(&self) -> PhoneClawResult<Frame> {
        let ok = self.script.lock().unwrap().pop_front().unwrap_or(true);
        if !ok {
            return Err(PhoneClawError::CaptureUnavailable("projection not ready".into()));
        }
        Ok(Frame {
            pixels: [0u8, 0, 0, 255].repeat((self.width * self.height) as usize),
            width: self.width,
            height: self.height,
        })
    }
}

pub struct FixedLabel(pub &'static str);

#[async_trait]
impl ScreenDescriptor for FixedLabel {
    async fn current_foreground_label(&self) -> String {
        self.0.to_string()
    }
}

/// Replies from a queue; once it runs dry every call fails.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<PhoneClawResult<String>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<PhoneClawResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    /// Conversations as they were sent, one per call.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _cfg: &CallConfig,
        _observer: &dyn Observer,
    ) -> PhoneClawResult<LlmResponse> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PhoneClawError::LlmProvider("script exhausted".into())));
        next.map(|content| LlmResponse {
            content,
            reasoning: String::new(),
        })
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<AgentEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<AgentEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AgentEvent::Progress(line) => Some(line),
                _ => None,
            })
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn emit(&self, event: AgentEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub fn call_config() -> CallConfig {
    CallConfig {
        model: "autoglm-phone".into(),
        stream: false,
        temperature: 0.0,
        top_p: 0.85,
        frequency_penalty: 0.2,
        max_tokens: 3000,
    }
}

pub fn bridge(capture: MockCapture, device: Arc<MockDevice>) -> DeviceBridge {
    DeviceBridge {
        capture: Arc::new(capture),
        descriptor: Arc::new(FixedLabel("System Home")),
        input: device,
        apps: Arc::new(StaticAppResolver::builtin()),
    }
}
