// Lexical helpers for the sketch transcoder

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{digit1, hex_digit1, one_of},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    number::complete::recognize_float,
    sequence::{pair, preceded, tuple},
    IResult,
};

/// Recognize a numeric literal: optional sign, digits, optional fraction
/// and exponent (`2`, `-1`, `0.5`, `1e3`).
pub fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize_float(input)
}

/// Recognize a Java integer literal: optional sign, decimal, `0x` hex or `0b`
/// binary digits with `_` separators, and an optional `L` suffix.
pub fn integer_literal(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            preceded(tag_no_case("0x"), hex_digits),
            preceded(tag_no_case("0b"), binary_digits),
            decimal_digits,
        )),
        opt(one_of("lL")),
    )))(input)
}

fn hex_digits(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        hex_digit1,
        take_while(|c: char| c.is_ascii_hexdigit() || c == '_'),
    ))(input)
}

fn binary_digits(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c == '0' || c == '1'),
        take_while(|c: char| c == '0' || c == '1' || c == '_'),
    ))(input)
}

fn decimal_digits(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        digit1,
        take_while(|c: char| c.is_ascii_digit() || c == '_'),
    ))(input)
}

/// Characters that may continue an identifier in the sketch dialect.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Tracks bracket depth and string/char literals while walking call
/// arguments one character at a time.
#[derive(Debug, Default)]
pub struct Nesting {
    depth: usize,
    quote: Option<char>,
    escaped: bool,
}

impl Nesting {
    /// Feed one character. Returns it back when it sits at the top level of
    /// the argument list, outside any literal or nested bracket pair.
    /// A top-level `{` or an unmatched closing bracket is returned as well.
    pub fn top_level(&mut self, c: char) -> Option<char> {
        if let Some(quote) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if c == '\\' {
                self.escaped = true;
            } else if c == quote || c == '\n' {
                // Literals never span lines; a stray apostrophe must not
                // swallow the rest of the file.
                self.quote = None;
            }
            return None;
        }

        match c {
            '"' | '\'' => {
                self.quote = Some(c);
                None
            }
            '{' if self.depth == 0 => Some(c),
            '(' | '[' | '{' => {
                self.depth += 1;
                None
            }
            ')' | ']' | '}' if self.depth == 0 => Some(c),
            ')' | ']' | '}' => {
                self.depth -= 1;
                None
            }
            _ if self.depth == 0 => Some(c),
            _ => None,
        }
    }
}

/// Consume a call's argument text up to (and including) the close paren
/// that balances the already-consumed open paren. Returns the text between
/// the parens.
///
/// A statement or block delimiter at the top level (`;`, `{`, `}` or a stray
/// `]`) means the open paren was never closed as a call, e.g. one inside a
/// comment, and the scan fails there.
pub fn argument_span(input: &str) -> IResult<&str, &str> {
    let mut nesting = Nesting::default();
    for (idx, c) in input.char_indices() {
        match nesting.top_level(c) {
            Some(')') => return Ok((&input[idx + 1..], &input[..idx])),
            Some(';' | '{' | '}' | ']') => {
                return Err(nom::Err::Error(Error::new(&input[idx..], ErrorKind::Char)))
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}
