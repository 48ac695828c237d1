//! Display formatting for resolved values
//!
//! Values are coerced the way a browser `parseFloat` would; anything that
//! does not coerce is shown unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for missing data
pub const PLACEHOLDER: &str = "--";

/// Longest numeric prefix accepted by `parseFloat`
static FLOAT_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:Infinity|(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
        .expect("valid float prefix regex")
});

/// How a widget renders numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    #[default]
    Raw,
    Currency,
    Percentage,
    Number,
}

impl std::str::FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "currency" => Ok(Self::Currency),
            "percentage" => Ok(Self::Percentage),
            "number" => Ok(Self::Number),
            other => Err(format!(
                "unknown format '{other}' (expected raw, currency, percentage or number)"
            )),
        }
    }
}

/// `parseFloat` over text: skip leading whitespace, take the longest numeric prefix
pub fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let prefix = FLOAT_PREFIX.find(trimmed)?.as_str();
    prefix.parse::<f64>().ok()
}

/// Numeric coercion of a JSON value; `None` stands for NaN
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_float(s),
        _ => None,
    }
}

/// Render a resolved value (or a miss) for display.
///
/// Missing, `null` and `"--"` render as `"--"`. Values that do not coerce to a
/// number are returned as-is, whatever the format.
pub fn format_value(value: Option<&Value>, format: DataFormat) -> String {
    let value = match value {
        None | Some(Value::Null) => return PLACEHOLDER.to_string(),
        Some(Value::String(s)) if s == PLACEHOLDER => return PLACEHOLDER.to_string(),
        Some(v) => v,
    };
    let Some(num) = coerce_number(value) else {
        return raw_text(value);
    };
    match format {
        DataFormat::Raw => raw_text(value),
        DataFormat::Currency => {
            let sign = if num.is_sign_negative() { "-" } else { "" };
            format!("{sign}${}", grouped(num.abs()))
        }
        DataFormat::Percentage => format!("{}%", signed_grouped(num)),
        DataFormat::Number => signed_grouped(num),
    }
}

/// Raw display text: strings unquoted, everything else as JSON
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn signed_grouped(num: f64) -> String {
    let sign = if num.is_sign_negative() { "-" } else { "" };
    format!("{sign}{}", grouped(num.abs()))
}

/// Two fraction digits with en-US thousands separators; `magnitude` is non-negative
fn grouped(magnitude: f64) -> String {
    if magnitude.is_infinite() {
        return "∞".to_string();
    }
    let (int_part, frac_part) = round_two_places(magnitude);

    let mut out = String::with_capacity(int_part.len() * 4 / 3 + 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(&frac_part);
    out
}

/// Round the shortest decimal form of `magnitude` to two places, ties away from zero
fn round_two_places(magnitude: f64) -> (String, String) {
    let shortest = magnitude.to_string();
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().chain(std::iter::repeat(b'0')).take(2))
        .map(|b| b - b'0')
        .collect();
    if frac_part.as_bytes().get(2).is_some_and(|&b| b >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, 1);
                break;
            }
            i -= 1;
            if digits[i] == 9 {
                digits[i] = 0;
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let text: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    let split = text.len() - 2;
    (text[..split].to_string(), text[split..].to_string())
}
