use std::io::Cursor;

use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::errors::{PhoneClawError, PhoneClawResult};
use crate::perception::types::Frame;

/// Decodes an encoded screenshot (PNG, JPEG, ...) into a frame, e.g. the
/// output of `adb exec-out screencap -p`.
pub fn frame_from_encoded(bytes: &[u8]) -> PhoneClawResult<Frame> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = img.dimensions();
    Ok(Frame {
        pixels: img.into_raw(),
        width,
        height,
    })
}

/// PNG-encodes the frame, consuming its pixel buffer.
pub fn encode_png(frame: Frame) -> PhoneClawResult<Vec<u8>> {
    let Frame {
        pixels,
        width,
        height,
    } = frame;
    let len = pixels.len();
    let img = RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        PhoneClawError::CaptureUnavailable(format!(
            "pixel buffer of {len} bytes does not match {width}x{height} RGBA"
        ))
    })?;
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img).write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// `data:image/png;base64,...` URL for an `image_url` content part.
pub fn to_data_url(frame: Frame) -> PhoneClawResult<String> {
    let (width, height) = (frame.width, frame.height);
    let png = encode_png(frame)?;
    let b64 = base64::engine::general_purpose::STANDARD.encode(&png);
    tracing::debug!(width, height, png_bytes = png.len(), "screenshot encoded");
    Ok(format!("data:image/png;base64,{b64}"))
}
