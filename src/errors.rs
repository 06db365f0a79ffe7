use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhoneClawError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("SSE parsing error: {0}")]
    SseParsing(String),

    #[error("Screen capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Dispatch error: {0}")]
    Dispatch(String),

    #[error("A task is already running; stop it first")]
    TaskAlreadyRunning,

    #[error("Task instruction is empty")]
    EmptyInstruction,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Agent error: {0}")]
    Agent(String),
}

impl PhoneClawError {
    /// True for failures of the model round-trip (network, HTTP status, stream decoding).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PhoneClawError::LlmProvider(_) | PhoneClawError::Http(_) | PhoneClawError::SseParsing(_)
        )
    }
}

impl serde::Serialize for PhoneClawError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type PhoneClawResult<T> = Result<T, PhoneClawError>;
