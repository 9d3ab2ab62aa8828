// Strips pixel-density calls the preview runtime cannot honor

use super::scan::rewrite_calls;

pub const PIXEL_DENSITY: &str = "pixelDensity";

/// Remove every `pixelDensity(...)` call, whatever its arguments. The call
/// is replaced with nothing, so offsets after it shift.
pub fn transcode_pixel_density(source: &str) -> String {
    rewrite_calls(source, PIXEL_DENSITY, |_| String::new())
}
