//! Work: the parameters a worker needs to do one unit of a Job.
//!
//! A [`Work`] is built once by the caller, handed to exactly one worker, and
//! never mutated. Values are dynamically typed (`serde_json::Value`); the typed
//! accessors coerce on a best-effort basis and fall back to the type's zero
//! value instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A unit of work: an immutable bag of named parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Work {
    params: Map<String, Value>,
}

impl Work {
    /// Wrap an existing parameter map.
    pub fn new(params: Map<String, Value>) -> Self {
        Self { params }
    }

    /// Work with no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder-style insert, for constructing work before submission.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The raw value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// String view of `key`. Absent or null is `""`; numbers and bools use
    /// their textual form; arrays and objects render as compact JSON.
    pub fn get_string(&self, key: &str) -> String {
        match self.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => match n.as_f64() {
                // Float `Display` drops a zero fraction: 2.0 -> "2".
                Some(f) if n.is_f64() => f.to_string(),
                _ => n.to_string(),
            },
            Some(other) => other.to_string(),
        }
    }

    /// Bool view of `key`. Numbers are true when nonzero; strings must spell
    /// a boolean (`1`, `t`, `true`, ...). Everything else is false.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => parse_bool(s),
            _ => false,
        }
    }

    /// Integer view of `key`. Floats truncate toward zero, bools are 1/0,
    /// strings are parsed as integer literals (`0x`/`0o`/`0b` prefixes, a
    /// leading `0` for octal, `_` digit separators). Anything unparseable is 0.
    pub fn get_int(&self, key: &str) -> i64 {
        match self.get(key) {
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    i
                } else if let Some(u) = n.as_u64() {
                    i64::try_from(u).unwrap_or(i64::MAX)
                } else {
                    // `as` saturates and maps NaN to 0.
                    n.as_f64().map_or(0, |f| f as i64)
                }
            }
            Some(Value::Bool(b)) => i64::from(*b),
            Some(Value::String(s)) => parse_int(s),
            _ => 0,
        }
    }
}

impl From<Map<String, Value>> for Work {
    fn from(params: Map<String, Value>) -> Self {
        Self::new(params)
    }
}

/// Objects become parameters; any other value yields empty work.
impl From<Value> for Work {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(params) => Self::new(params),
            _ => Self::empty(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Work {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(s, "1" | "t" | "T" | "true" | "TRUE" | "True")
}

fn parse_int(raw: &str) -> i64 {
    let s = trim_zero_decimal(raw.trim());
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if unsigned.starts_with(['+', '-']) {
        return 0;
    }

    let (radix, digits, prefixed) = if let Some(d) = strip_prefix_ci(unsigned, "0x") {
        (16, d, true)
    } else if let Some(d) = strip_prefix_ci(unsigned, "0o") {
        (8, d, true)
    } else if let Some(d) = strip_prefix_ci(unsigned, "0b") {
        (2, d, true)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..], true)
    } else {
        (10, unsigned, false)
    };

    let Some(digits) = strip_separators(digits, prefixed) else {
        return 0;
    };
    let Ok(value) = i64::from_str_radix(&digits, radix) else {
        return 0;
    };
    if negative {
        value.checked_neg().unwrap_or(0)
    } else {
        value
    }
}

/// Remove `_` separators. Each one must sit between two digits, or directly
/// after a base prefix.
fn strip_separators(digits: &str, prefixed: bool) -> Option<String> {
    if digits.is_empty() || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    if digits.starts_with('_') && !prefixed {
        return None;
    }
    Some(digits.replace('_', ""))
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// "42.000" -> "42". A bare trailing dot or a nonzero fraction is left alone.
fn trim_zero_decimal(s: &str) -> &str {
    match s.split_once('.') {
        Some((whole, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => whole,
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_handles_prefixes_and_signs() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int(" -17 "), -17);
        assert_eq!(parse_int("+8"), 8);
        assert_eq!(parse_int("0x1F"), 31);
        assert_eq!(parse_int("0o17"), 15);
        assert_eq!(parse_int("0b101"), 5);
        assert_eq!(parse_int("12.000"), 12);
        assert_eq!(parse_int("010"), 8);
        assert_eq!(parse_int("-010"), -8);
        assert_eq!(parse_int("0"), 0);
    }

    #[test]
    fn parse_int_accepts_digit_separators() {
        assert_eq!(parse_int("1_000"), 1000);
        assert_eq!(parse_int("0x_1F"), 31);
        assert_eq!(parse_int("0b1_01"), 5);
        assert_eq!(parse_int("_1"), 0);
        assert_eq!(parse_int("1_"), 0);
        assert_eq!(parse_int("1__0"), 0);
    }

    #[test]
    fn parse_int_rejects_garbage() {
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("World"), 0);
        assert_eq!(parse_int("--5"), 0);
        assert_eq!(parse_int("12.5"), 0);
        assert_eq!(parse_int("12."), 0);
        assert_eq!(parse_int("08"), 0);
        assert_eq!(parse_int("0x"), 0);
    }

    #[test]
    fn parse_bool_spellings() {
        for yes in ["1", "t", "T", "true", "TRUE", "True"] {
            assert!(parse_bool(yes), "{yes} should be true");
        }
        for no in ["0", "f", "false", "yes", "World", ""] {
            assert!(!parse_bool(no), "{no} should be false");
        }
    }
}
