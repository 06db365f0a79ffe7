use async_trait::async_trait;

use crate::errors::PhoneClawResult;
use crate::perception::types::Frame;

/// Platform screen grabber. A failure means the frame is unavailable for this
/// step (`PhoneClawError::CaptureUnavailable`); the runner simply tries again
/// on the next step.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture_screen(&self) -> PhoneClawResult<Frame>;
}

/// Source of the textual screen descriptor (the foreground app label).
#[async_trait]
pub trait ScreenDescriptor: Send + Sync {
    async fn current_foreground_label(&self) -> String;
}
