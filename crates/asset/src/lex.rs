//! Shared line tokenization for the OBJ and MTL parsers.
//!
//! Both formats follow the same discipline: trim the line, skip blanks
//! and `#` comments, then dispatch on the first whitespace-separated
//! token. The remainder after the keyword is kept whole as well, because
//! material names and map/library paths may legitimately contain spaces.

use crate::ParseError;

/// Split a trimmed line into its keyword and the raw remainder.
pub(crate) fn split_keyword(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (line, ""),
    }
}

pub(crate) fn parse_float(token: &str, line: usize, strict: bool) -> Result<f32, ParseError> {
    match token.parse::<f32>() {
        Ok(value) => Ok(value),
        Err(_) if strict => Err(ParseError::MalformedNumber {
            line,
            token: token.to_string(),
        }),
        // Lossy by design: the NaN flows into the output buffers unchecked.
        Err(_) => Ok(f32::NAN),
    }
}

pub(crate) fn parse_floats(args: &[&str], line: usize, strict: bool) -> Result<Vec<f32>, ParseError> {
    args.iter()
        .map(|token| parse_float(token, line, strict))
        .collect()
}

/// First argument as a float; a missing argument counts as malformed.
pub(crate) fn first_float(args: &[&str], line: usize, strict: bool) -> Result<f32, ParseError> {
    parse_float(args.first().copied().unwrap_or(""), line, strict)
}

/// Signed integer, as used by face references and `illum`. The lenient
/// fallback is 0, which face-index resolution maps to the sentinel slot.
pub(crate) fn parse_int(token: &str, line: usize, strict: bool) -> Result<i64, ParseError> {
    match token.parse::<i64>() {
        Ok(value) => Ok(value),
        Err(_) if strict => Err(ParseError::MalformedNumber {
            line,
            token: token.to_string(),
        }),
        Err(_) => Ok(0),
    }
}

/// Pack parsed values into a fixed tuple. Short inputs pad with zero so
/// downstream buffers keep a uniform stride.
pub(crate) fn tuple3(values: &[f32]) -> [f32; 3] {
    let mut out = [0.0; 3];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
    out
}

pub(crate) fn tuple2(values: &[f32]) -> [f32; 2] {
    let mut out = [0.0; 2];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = *value;
    }
    out
}
