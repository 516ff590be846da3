use chrono::NaiveDateTime;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use strum::VariantNames;

/// The value type tag of a dimension.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    VariantNames,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ValueKind {
    String,
    Number,
    Date,
    Boolean,
    Object,
}

impl ValueKind {
    /// Whether values of this kind form a discrete (categorical) domain
    /// by default. Continuous kinds can still be forced discrete per
    /// dimension.
    pub fn is_discrete_by_default(&self) -> bool {
        !matches!(self, ValueKind::Number | ValueKind::Date)
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValueParseError {
    #[error("Cannot read `{raw}` as a {kind} value")]
    Unparseable { raw: String, kind: ValueKind },
}

/// A typed scalar cell value.
///
/// `Null` is a first-class member: it is the value of the null atom of
/// every dimension and the result of tolerant parsing of malformed
/// input cells.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    Null,
    Str(String),
    Number(f64),
    Date(NaiveDateTime),
    Boolean(bool),
    Object(serde_json::Value),
}

impl Eq for DataValue {}

impl std::hash::Hash for DataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            DataValue::Null => 0u8.hash(state),
            DataValue::Str(s) => s.hash(state),
            DataValue::Number(n) => OrderedFloat(*n).hash(state),
            DataValue::Date(d) => d.hash(state),
            DataValue::Boolean(b) => b.hash(state),
            DataValue::Object(v) => v.to_string().hash(state),
        }
    }
}

impl DataValue {
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            DataValue::Null => None,
            DataValue::Str(_) => Some(ValueKind::String),
            DataValue::Number(_) => Some(ValueKind::Number),
            DataValue::Date(_) => Some(ValueKind::Date),
            DataValue::Boolean(_) => Some(ValueKind::Boolean),
            DataValue::Object(_) => Some(ValueKind::Object),
        }
    }

    /// The canonical string form used for interning and composite keys.
    /// The null value's key is the empty string.
    pub fn key(&self) -> String {
        match self {
            DataValue::Null => String::new(),
            DataValue::Str(s) => s.clone(),
            // f64 Display is the shortest round-trip form, so 2.0 and 2
            // intern to the same atom.
            DataValue::Number(n) => format!("{}", n),
            DataValue::Date(d) => d.format("%Y-%m-%dT%H:%M:%S").to_string(),
            DataValue::Boolean(b) => format!("{}", b),
            DataValue::Object(v) => v.to_string(),
        }
    }

    /// Numeric view of the value, used by aggregates and continuous
    /// scales. Dates map to their epoch milliseconds.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DataValue::Number(n) => Some(*n),
            DataValue::Date(d) => Some(d.and_utc().timestamp_millis() as f64),
            _ => None,
        }
    }

    /// Total order over values of one dimension: null sorts first,
    /// otherwise the natural order of the kind, falling back to the
    /// canonical key for mixed or unordered kinds.
    pub fn cmp_values(&self, other: &DataValue) -> Ordering {
        match (self, other) {
            (DataValue::Null, DataValue::Null) => Ordering::Equal,
            (DataValue::Null, _) => Ordering::Less,
            (_, DataValue::Null) => Ordering::Greater,
            (DataValue::Number(a), DataValue::Number(b)) => {
                OrderedFloat(*a).cmp(&OrderedFloat(*b))
            }
            (DataValue::Date(a), DataValue::Date(b)) => a.cmp(b),
            (DataValue::Str(a), DataValue::Str(b)) => a.cmp(b),
            (DataValue::Boolean(a), DataValue::Boolean(b)) => a.cmp(b),
            _ => self.key().cmp(&other.key()),
        }
    }

    /// Parses a raw JSON cell into a value of the target kind.
    ///
    /// This is the strict variant; tolerant callers map the error to
    /// `Null` themselves (see the dimension parse-error policy).
    pub fn parse_json(raw: &serde_json::Value, kind: ValueKind) -> Result<DataValue, ValueParseError> {
        use serde_json::Value as J;

        if raw.is_null() {
            return Ok(DataValue::Null);
        }
        let fail = || ValueParseError::Unparseable {
            raw: raw.to_string(),
            kind,
        };
        match kind {
            ValueKind::String => Ok(match raw {
                J::String(s) => DataValue::Str(s.clone()),
                other => DataValue::Str(other.to_string()),
            }),
            ValueKind::Number => match raw {
                J::Number(n) => n.as_f64().map(DataValue::Number).ok_or_else(fail),
                J::String(s) if s.trim().is_empty() => Ok(DataValue::Null),
                J::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(DataValue::Number)
                    .map_err(|_| fail()),
                _ => Err(fail()),
            },
            ValueKind::Date => match raw {
                J::String(s) => parse_date(s).map(DataValue::Date).ok_or_else(fail),
                J::Number(n) => {
                    let millis = n.as_f64().ok_or_else(fail)?;
                    chrono::DateTime::from_timestamp_millis(millis as i64)
                        .map(|d| DataValue::Date(d.naive_utc()))
                        .ok_or_else(fail)
                }
                _ => Err(fail()),
            },
            ValueKind::Boolean => match raw {
                J::Bool(b) => Ok(DataValue::Boolean(*b)),
                J::String(s) => match s.as_str() {
                    "true" => Ok(DataValue::Boolean(true)),
                    "false" => Ok(DataValue::Boolean(false)),
                    _ => Err(fail()),
                },
                _ => Err(fail()),
            },
            ValueKind::Object => Ok(DataValue::Object(raw.clone())),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_key_is_canonical() {
        assert_eq!(DataValue::Number(2.0).key(), "2");
        assert_eq!(DataValue::Number(2.5).key(), "2.5");
        assert_eq!(DataValue::Null.key(), "");
    }

    #[test]
    fn test_parse_number_from_string() {
        let v = DataValue::parse_json(&json!(" 3.5 "), ValueKind::Number).unwrap();
        assert_eq!(v, DataValue::Number(3.5));
        assert!(DataValue::parse_json(&json!("abc"), ValueKind::Number).is_err());
        assert_eq!(
            DataValue::parse_json(&json!(null), ValueKind::Number).unwrap(),
            DataValue::Null
        );
    }

    #[test]
    fn test_parse_date_formats() {
        let v = DataValue::parse_json(&json!("2011-06-05"), ValueKind::Date).unwrap();
        assert_eq!(v.key(), "2011-06-05T00:00:00");
        assert!(v.as_number().is_some());
    }

    #[test]
    fn test_null_sorts_first() {
        assert_eq!(
            DataValue::Null.cmp_values(&DataValue::Number(-1e9)),
            Ordering::Less
        );
        assert_eq!(
            DataValue::Number(2.0).cmp_values(&DataValue::Number(10.0)),
            Ordering::Less
        );
    }
}
