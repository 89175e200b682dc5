//! Scalar resolution and re-rendering.
//!
//! Plain scalars resolve through the YAML 1.2 core schema. Rendering goes
//! the other way: given replacement text and the style the original scalar
//! was written in, produce source text that parses back to the replacement
//! while keeping that style where it can.

use serde_json::Number;

use crate::tree::{Scalar, ScalarStyle};

/// Resolves an untagged plain scalar.
pub(crate) fn resolve_plain(text: &str) -> Scalar {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Scalar::Null,
        "true" | "True" | "TRUE" => return Scalar::Bool(true),
        "false" | "False" | "FALSE" => return Scalar::Bool(false),
        _ => {}
    }
    resolve_number(text).map_or_else(|| Scalar::String(text.to_owned()), Scalar::Number)
}

fn resolve_number(text: &str) -> Option<Number> {
    if let Some(octal) = text.strip_prefix("0o") {
        return i64::from_str_radix(octal, 8).ok().map(Number::from);
    }
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(Number::from);
    }
    if is_decimal_int(text) {
        return text
            .parse::<i64>()
            .ok()
            .map(Number::from)
            .or_else(|| text.parse::<u64>().ok().map(Number::from));
    }
    if is_decimal_float(text) {
        return text.parse::<f64>().ok().and_then(Number::from_f64);
    }
    None
}

fn strip_sign(text: &str) -> &str {
    text.strip_prefix(['-', '+']).unwrap_or(text)
}

fn is_decimal_int(text: &str) -> bool {
    let digits = strip_sign(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Matches `[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?`.
fn is_decimal_float(text: &str) -> bool {
    let body = strip_sign(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (body.get(..at).unwrap_or_default(), body.get(at + 1..)),
        None => (body, None),
    };
    let (whole, fraction) = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (mantissa, None),
    };
    let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = match fraction {
        Some(fraction) => {
            all_digits(whole) && all_digits(fraction) && !(whole.is_empty() && fraction.is_empty())
        }
        None => !whole.is_empty() && all_digits(whole),
    };
    let exponent_ok = exponent.is_none_or(|exp| {
        let digits = strip_sign(exp);
        !digits.is_empty() && all_digits(digits)
    });
    mantissa_ok && exponent_ok
}

/// Characters that may not start a plain scalar.
const INDICATORS: &[char] = &[
    '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
    '`',
];

/// Returns `true` if `text` can be written unquoted and read back unchanged.
fn is_plain_safe(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };
    !INDICATORS.contains(&first)
        && text.trim() == text
        && !text.contains(['\n', '\r', '\t'])
        && !text.contains(": ")
        && !text.contains(" #")
        && !text.ends_with(':')
        && resolve_plain(text) == Scalar::String(text.to_owned())
}

fn single_quoted(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn double_quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len().saturating_add(2));
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Renders `text` as a literal block scalar body, or `None` when the
/// literal form cannot represent it.
fn literal(text: &str, indent: &str) -> Option<String> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    let header = if body.len() == text.len() { "|-" } else { "|" };
    if body.is_empty()
        || body.ends_with('\n')
        || body.starts_with([' ', '\t'])
        || body.contains('\r')
        || body.lines().any(|line| line.ends_with([' ', '\t']))
    {
        return None;
    }
    let mut out = String::from(header);
    for line in body.split('\n') {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    Some(out)
}

/// Renders replacement text for a scalar written in `style`.
///
/// `indent` is the indentation used for block scalar content lines. Styles
/// that cannot represent the text fall back to double quotes.
pub(crate) fn render(text: &str, style: ScalarStyle, indent: &str) -> String {
    match style {
        ScalarStyle::Plain if is_plain_safe(text) => text.to_owned(),
        ScalarStyle::SingleQuoted if !text.contains(['\n', '\r']) => single_quoted(text),
        ScalarStyle::Literal | ScalarStyle::Folded => {
            literal(text, indent).unwrap_or_else(|| double_quoted(text))
        }
        ScalarStyle::Plain | ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
            double_quoted(text)
        }
    }
}
