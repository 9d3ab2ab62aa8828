// Rewrites native-fullscreen calls into explicitly sized ones

use super::args::renderer_argument;
use super::scan::{rewrite_calls, CallMatch};
use super::Dimensions;

pub const FULL_SCREEN: &str = "fullScreen";

/// Replace every `fullScreen(...)` call with `size(width, height)`, keeping
/// the renderer argument when one was given.
///
/// Display indices and `SPAN` are dropped because the surface size is fixed
/// by the caller. The rewrite is purely textual: a call inside a string
/// literal or comment is rewritten too.
pub fn transcode_full_screen(source: &str, dimensions: Dimensions) -> String {
    rewrite_calls(source, FULL_SCREEN, |call| sized_call(call, dimensions))
}

fn sized_call(call: &CallMatch<'_>, dimensions: Dimensions) -> String {
    let Dimensions { width, height } = dimensions;

    if call.is_zero_argument() {
        return format!("size({width}, {height})");
    }

    match renderer_argument(call.arguments) {
        Some(renderer) => format!("size({width}, {height}, {renderer})"),
        None => format!("size({width}, {height})"),
    }
}
