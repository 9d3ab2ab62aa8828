// Argument classification for environment-declaration calls

use super::lexer::{integer_literal, number_literal};
use super::scan::split_arguments;
use nom::combinator::all_consuming;

/// Renderer constant meaning "span every attached display". It reads like a
/// renderer name but selects a resolution, so it is dropped with the
/// display index rather than kept as the renderer.
pub const FULL_SPAN_TOKEN: &str = "SPAN";

/// Classification of a single comma-split argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Empty or whitespace-only.
    Blank,
    /// Numeric literal selecting a physical display.
    DisplayIndex,
    /// The `SPAN` constant.
    FullSpan,
    /// Anything else, taken to select a rendering backend.
    Renderer,
}

impl ArgumentKind {
    /// Only renderer tokens survive into the rewritten call.
    pub fn survives(self) -> bool {
        matches!(self, ArgumentKind::Renderer)
    }
}

/// Classify one raw argument. Never fails: text that does not parse as a
/// number is a renderer candidate. Java integer literals (`0x10`, `2L`) and
/// decimal literals (`0.5`, `1e3`) are both display indices.
pub fn classify(token: &str) -> ArgumentKind {
    let token = token.trim();
    if token.is_empty() {
        ArgumentKind::Blank
    } else if all_consuming(integer_literal)(token).is_ok()
        || all_consuming(number_literal)(token).is_ok()
    {
        ArgumentKind::DisplayIndex
    } else if token == FULL_SPAN_TOKEN {
        ArgumentKind::FullSpan
    } else {
        ArgumentKind::Renderer
    }
}

/// The renderer token of an argument list, trimmed. When several tokens
/// qualify the first one wins.
pub fn renderer_argument(arguments: &str) -> Option<&str> {
    split_arguments(arguments)
        .into_iter()
        .map(str::trim)
        .find(|token| classify(token).survives())
}
