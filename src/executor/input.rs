// Device input backend (accessibility service, adb, emulator bridge, ...).
use async_trait::async_trait;

use crate::errors::PhoneClawResult;

/// One method per device gesture, in physical pixels. A rejected gesture is
/// reported as `PhoneClawError::Dispatch`.
#[async_trait]
pub trait DeviceInput: Send + Sync {
    async fn tap(&self, x: u32, y: u32) -> PhoneClawResult<()>;

    async fn long_press(&self, x: u32, y: u32) -> PhoneClawResult<()>;

    async fn double_tap(&self, x: u32, y: u32) -> PhoneClawResult<()>;

    async fn swipe(&self, x1: u32, y1: u32, x2: u32, y2: u32) -> PhoneClawResult<()>;

    async fn type_text(&self, text: &str) -> PhoneClawResult<()>;

    async fn back(&self) -> PhoneClawResult<()>;

    async fn home(&self) -> PhoneClawResult<()>;

    async fn launch(&self, package_id: &str) -> PhoneClawResult<()>;
}
