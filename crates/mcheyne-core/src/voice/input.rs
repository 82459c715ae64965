//! Lenient parsing of voice-supplied values.
//!
//! Voice platforms hand over slot values as strings, JSON clients as
//! numbers; month values may also arrive as names ("March").

use serde::Deserialize;

use crate::resolve::month_from_name;

/// A number that may arrive as a JSON number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    Number(i64),
    Text(String),
}

impl LooseValue {
    /// Positive integer value, if any. `0`, negatives and empty text are
    /// treated as absent.
    pub fn as_positive(&self) -> Option<u32> {
        match self {
            Self::Number(n) => u32::try_from(*n).ok().filter(|n| *n > 0),
            Self::Text(s) => parse_leading_number(s),
        }
    }

    /// Month number, accepting numbers or English month names.
    pub fn as_month(&self) -> Option<u32> {
        match self {
            Self::Text(s) => month_from_name(s).or_else(|| parse_leading_number(s)),
            Self::Number(_) => self.as_positive(),
        }
    }
}

/// Parse the leading digits of `s` ("15th" -> 15).
fn parse_leading_number(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|n: &u32| *n > 0)
}
