use crate::agent_engine::state::Action;
use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::executor::apps::AppResolver;
use crate::executor::coordinator::point_to_physical;
use crate::executor::input::DeviceInput;
use crate::perception::types::FrameSize;

/// Sends one action to the device, mapping normalized coordinates with the
/// size of the frame the model looked at. Returns a short description of what
/// was done.
///
/// `Wait`, `Finish` and `TakeOver` produce no device input; sleeping for
/// `Wait` is left to the caller so it can honor a stop request.
pub async fn dispatch(
    action: &Action,
    size: FrameSize,
    device: &dyn DeviceInput,
    apps: &dyn AppResolver,
) -> PhoneClawResult<String> {
    let msg = match action {
        Action::Tap { x, y, .. } => {
            let (px, py) = point_to_physical(*x, *y, size);
            device.tap(px, py).await?;
            format!("Tapped ({px}, {py})")
        }
        Action::LongPress { x, y } => {
            let (px, py) = point_to_physical(*x, *y, size);
            device.long_press(px, py).await?;
            format!("Long-pressed ({px}, {py})")
        }
        Action::DoubleTap { x, y } => {
            let (px, py) = point_to_physical(*x, *y, size);
            device.double_tap(px, py).await?;
            format!("Double-tapped ({px}, {py})")
        }
        Action::Swipe { x1, y1, x2, y2 } => {
            let (ax, ay) = point_to_physical(*x1, *y1, size);
            let (bx, by) = point_to_physical(*x2, *y2, size);
            device.swipe(ax, ay, bx, by).await?;
            format!("Swiped ({ax}, {ay}) → ({bx}, {by})")
        }
        Action::Type { text } => {
            device.type_text(text).await?;
            format!("Typed: {text}")
        }
        Action::Back => {
            device.back().await?;
            "Back".to_string()
        }
        Action::Home => {
            device.home().await?;
            "Home".to_string()
        }
        Action::Launch { app } => {
            let package = apps.resolve(app);
            device.launch(&package).await?;
            format!("Launched {package}")
        }
        Action::Wait { duration_ms } => format!("Wait {duration_ms}ms"),
        Action::Finish { message } => format!("Finished: {message}"),
        Action::TakeOver { message } => {
            format!("Take over requested: {}", message.as_deref().unwrap_or(""))
        }
        Action::Unknown => {
            return Err(PhoneClawError::MalformedModelOutput(
                "model output did not parse into a known action".into(),
            ))
        }
    };

    tracing::info!(action = action.name(), result = %msg, "action dispatched");
    Ok(msg)
}
