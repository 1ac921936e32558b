use serde::{Deserialize, Serialize};
use std::fmt;

/// A computed cell value as reported by the host document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl CellValue {
    /// Numeric view of the value. Only numbers qualify; text is never coerced.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Spreadsheet truthiness: non-zero numbers, `TRUE`, and the text "TRUE".
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Null => false,
            CellValue::Bool(b) => *b,
            CellValue::Int(i) => *i != 0,
            CellValue::Float(f) => *f != 0.0,
            CellValue::String(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }

    /// Equality as used by SWITCH-style matching: numbers compare numerically,
    /// text compares case-insensitively.
    #[must_use]
    pub fn matches(&self, other: &CellValue) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (CellValue::String(a), CellValue::String(b)) => a.eq_ignore_ascii_case(b),
                _ => self == other,
            },
        }
    }

    /// Parse a string into a `CellValue` with type inference
    /// Tries: null -> bool -> int -> float -> string
    #[must_use]
    pub fn parse(s: &str) -> CellValue {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Null;
        }

        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Int(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }

        CellValue::String(s.to_string())
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, ""),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(fl) => write!(f, "{fl}"),
            CellValue::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Int(i64::from(i))
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_inference() {
        assert_eq!(CellValue::parse(""), CellValue::Null);
        assert_eq!(CellValue::parse("TRUE"), CellValue::Bool(true));
        assert_eq!(CellValue::parse("42"), CellValue::Int(42));
        assert_eq!(CellValue::parse("-2.5"), CellValue::Float(-2.5));
        assert_eq!(
            CellValue::parse("hello"),
            CellValue::String("hello".to_string())
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(CellValue::Bool(true).is_truthy());
        assert!(CellValue::Int(3).is_truthy());
        assert!(!CellValue::Float(0.0).is_truthy());
        assert!(CellValue::from("true").is_truthy());
        assert!(!CellValue::from("abc").is_truthy());
        assert!(!CellValue::Null.is_truthy());
    }

    #[test]
    fn test_matches_numeric_and_text() {
        assert!(CellValue::Int(2).matches(&CellValue::Float(2.0)));
        assert!(CellValue::from("North").matches(&CellValue::from("north")));
        assert!(!CellValue::from("2").matches(&CellValue::Int(2)));
    }

    #[test]
    fn test_untagged_json_shapes() {
        let values: Vec<CellValue> =
            serde_json::from_str(r#"[null, true, 10, 2.5, "x"]"#).expect("json");
        assert_eq!(
            values,
            vec![
                CellValue::Null,
                CellValue::Bool(true),
                CellValue::Int(10),
                CellValue::Float(2.5),
                CellValue::String("x".to_string()),
            ]
        );
    }
}
