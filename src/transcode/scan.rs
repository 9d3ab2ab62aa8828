// Call-site scanner: locates `callee(...)` occurrences in sketch source

use super::lexer::{argument_span, is_identifier_char, Nesting};
use nom::{bytes::complete::tag, character::complete::char, character::complete::space0, IResult};
use std::ops::Range;

/// One recognized call in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch<'a> {
    /// Byte range of the whole call, callee through closing paren.
    pub span: Range<usize>,
    pub callee: &'a str,
    /// Raw text between the outer parens, untrimmed.
    pub arguments: &'a str,
}

impl CallMatch<'_> {
    /// True for the bare `callee()` form (whitespace between the parens
    /// counts as empty).
    pub fn is_zero_argument(&self) -> bool {
        self.arguments.trim().is_empty()
    }
}

fn call_arguments<'s>(input: &'s str, callee: &str) -> IResult<&'s str, &'s str> {
    let (input, _) = tag(callee)(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = char('(')(input)?;
    argument_span(input)
}

fn preceded_by_identifier(source: &str, offset: usize) -> bool {
    source[..offset]
        .chars()
        .next_back()
        .is_some_and(is_identifier_char)
}

/// Find every complete `callee(...)` call in `source`, in order.
///
/// A match must start on an identifier boundary (`myfullScreen()` is not a
/// `fullScreen` call) and end at the paren that balances its own open
/// paren. Calls with no balancing paren before the statement or block ends
/// are skipped.
pub fn find_calls<'a>(source: &'a str, callee: &str) -> Vec<CallMatch<'a>> {
    let mut calls = Vec::new();
    if callee.is_empty() {
        return calls;
    }

    let mut cursor = 0;
    while let Some(offset) = source[cursor..].find(callee) {
        let start = cursor + offset;
        let name_end = start + callee.len();

        if preceded_by_identifier(source, start) {
            cursor = name_end;
            continue;
        }

        match call_arguments(&source[start..], callee) {
            Ok((rest, arguments)) => {
                let end = source.len() - rest.len();
                calls.push(CallMatch {
                    span: start..end,
                    callee: &source[start..name_end],
                    arguments,
                });
                cursor = end;
            }
            Err(_) => cursor = name_end,
        }
    }

    calls
}

/// Copy `source`, substituting each `callee(...)` call with the output of
/// `replace`. Text outside matched calls is preserved verbatim.
pub fn rewrite_calls<F>(source: &str, callee: &str, mut replace: F) -> String
where
    F: FnMut(&CallMatch<'_>) -> String,
{
    let mut output = String::with_capacity(source.len());
    let mut last = 0;

    for call in find_calls(source, callee) {
        output.push_str(&source[last..call.span.start]);
        output.push_str(&replace(&call));
        last = call.span.end;
    }

    output.push_str(&source[last..]);
    output
}

/// Split raw argument text on top-level commas. Commas nested inside
/// brackets or literals do not split. Tokens are returned untrimmed.
pub fn split_arguments(arguments: &str) -> Vec<&str> {
    if arguments.is_empty() {
        return Vec::new();
    }

    let mut tokens = Vec::new();
    let mut nesting = Nesting::default();
    let mut start = 0;

    for (idx, c) in arguments.char_indices() {
        if nesting.top_level(c) == Some(',') {
            tokens.push(&arguments[start..idx]);
            start = idx + 1;
        }
    }
    tokens.push(&arguments[start..]);
    tokens
}
