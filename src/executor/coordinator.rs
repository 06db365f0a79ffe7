// Normalized 0–999 grid → device pixels.
use crate::perception::types::FrameSize;

/// `floor(normalized / 1000 * dimension)`, truncating toward zero.
pub fn to_absolute(normalized: u16, dimension: u32) -> u32 {
    (f64::from(normalized) / 1000.0 * f64::from(dimension)) as u32
}

/// Maps one point using the frame it was decided on.
pub fn point_to_physical(x: u16, y: u16, size: FrameSize) -> (u32, u32) {
    (to_absolute(x, size.width), to_absolute(y, size.height))
}
