use crate::atom::Atom;
use crate::error::CccDataError;
use ccc_common::value::{DataValue, ValueKind};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// What `intern` does when a raw cell cannot be parsed as the
/// dimension's value kind. Legacy chart specs rely on silent coercion,
/// so that is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorPolicy {
    #[default]
    CoerceToNull,
    Fail,
}

type LabelFormatter = Arc<dyn Fn(&DataValue) -> String + Send + Sync>;

/// A named, typed axis of data values. Immutable once added to a
/// `ComplexType`.
#[derive(Clone)]
pub struct DimensionType {
    name: String,
    value_kind: ValueKind,
    is_discrete: bool,
    is_hidden: bool,
    on_parse_error: ParseErrorPolicy,
    formatter: Option<LabelFormatter>,
}

impl std::fmt::Debug for DimensionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DimensionType")
            .field("name", &self.name)
            .field("value_kind", &self.value_kind)
            .field("is_discrete", &self.is_discrete)
            .field("is_hidden", &self.is_hidden)
            .field("on_parse_error", &self.on_parse_error)
            .field("formatter", &self.formatter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl DimensionType {
    pub fn new(name: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            value_kind,
            is_discrete: value_kind.is_discrete_by_default(),
            is_hidden: false,
            on_parse_error: ParseErrorPolicy::default(),
            formatter: None,
        }
    }

    /// Overrides the discreteness derived from the value kind.
    pub fn with_discrete(mut self, is_discrete: bool) -> Self {
        self.is_discrete = is_discrete;
        self
    }

    pub fn with_hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    pub fn with_parse_error_policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.on_parse_error = policy;
        self
    }

    pub fn with_formatter(
        mut self,
        formatter: impl Fn(&DataValue) -> String + Send + Sync + 'static,
    ) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_kind(&self) -> ValueKind {
        self.value_kind
    }

    pub fn is_discrete(&self) -> bool {
        self.is_discrete
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    pub fn on_parse_error(&self) -> ParseErrorPolicy {
        self.on_parse_error
    }

    /// The dimension's comparer.
    pub fn compare(&self, a: &DataValue, b: &DataValue) -> Ordering {
        a.cmp_values(b)
    }

    fn format(&self, value: &DataValue) -> String {
        if value.is_null() {
            return String::new();
        }
        match &self.formatter {
            Some(f) => f(value),
            None => value.key(),
        }
    }
}

/// The dimension-group prefix of a dimension name: the name with any
/// trailing digits removed (`value2` belongs to group `value`).
pub fn dimension_group_prefix(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// A dimension instance owned by a `Data`: the type plus the atom
/// intern table.
#[derive(Debug)]
pub struct Dimension {
    dim_type: Arc<DimensionType>,
    // Keyed by canonical value key; entry "" is the null atom.
    atoms: IndexMap<String, Arc<Atom>>,
}

impl Dimension {
    pub fn new(dim_type: Arc<DimensionType>) -> Self {
        let null_atom = Arc::new(Atom::new(
            dim_type.name(),
            DataValue::Null,
            String::new(),
            serde_json::Value::Null,
        ));
        let mut atoms = IndexMap::new();
        atoms.insert(String::new(), null_atom);
        Self { dim_type, atoms }
    }

    pub fn dim_type(&self) -> &Arc<DimensionType> {
        &self.dim_type
    }

    pub fn name(&self) -> &str {
        self.dim_type.name()
    }

    pub fn null_atom(&self) -> &Arc<Atom> {
        // Inserted at construction.
        &self.atoms[""]
    }

    /// All atoms interned so far, in first-interned order, the null
    /// atom first.
    pub fn atoms(&self) -> impl Iterator<Item = &Arc<Atom>> {
        self.atoms.values()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Interns a raw JSON cell.
    ///
    /// Equal canonical keys always return the same `Arc<Atom>`. Parse
    /// failures follow the dimension's policy: coerce to the null atom
    /// (with a warning) or fail.
    pub fn intern(&mut self, raw: &serde_json::Value) -> Result<Arc<Atom>, CccDataError> {
        let value = match DataValue::parse_json(raw, self.dim_type.value_kind()) {
            Ok(v) => v,
            Err(source) => match self.dim_type.on_parse_error() {
                ParseErrorPolicy::CoerceToNull => {
                    log::warn!(
                        "dimension `{}`: coercing unreadable cell {} to null",
                        self.name(),
                        raw
                    );
                    DataValue::Null
                }
                ParseErrorPolicy::Fail => {
                    return Err(CccDataError::Parse {
                        dimension: self.name().to_string(),
                        source,
                    })
                }
            },
        };
        Ok(self.intern_parsed(value, raw.clone()))
    }

    /// Interns an already-typed value (used when synthesizing datums).
    pub fn intern_value(&mut self, value: DataValue) -> Arc<Atom> {
        let raw = match &value {
            DataValue::Null => serde_json::Value::Null,
            DataValue::Str(s) => serde_json::Value::String(s.clone()),
            DataValue::Number(n) => serde_json::json!(n),
            DataValue::Boolean(b) => serde_json::Value::Bool(*b),
            DataValue::Date(_) => serde_json::Value::String(value.key()),
            DataValue::Object(v) => v.clone(),
        };
        self.intern_parsed(value, raw)
    }

    fn intern_parsed(&mut self, value: DataValue, raw: serde_json::Value) -> Arc<Atom> {
        let key = value.key();
        if let Some(existing) = self.atoms.get(&key) {
            return existing.clone();
        }
        let label = self.dim_type.format(&value);
        let atom = Arc::new(Atom::new(self.name(), value, label, raw));
        self.atoms.insert(key, atom.clone());
        atom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn number_dim() -> Dimension {
        Dimension::new(Arc::new(DimensionType::new("value", ValueKind::Number)))
    }

    #[test]
    fn test_interning_is_idempotent() {
        let mut dim = number_dim();
        let a = dim.intern(&json!(2.0)).unwrap();
        let b = dim.intern(&json!(2)).unwrap();
        let c = dim.intern(&json!("2")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, &c));
        assert_eq!(dim.atom_count(), 2); // null atom + "2"
    }

    #[test]
    fn test_null_atom_is_unique() {
        let mut dim = number_dim();
        let a = dim.intern(&json!(null)).unwrap();
        let b = dim.intern(&json!(null)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(Arc::ptr_eq(&a, dim.null_atom()));
        assert_eq!(a.key(), "");
        assert_eq!(a.label(), "");
    }

    #[test]
    fn test_coerce_policy_maps_bad_cells_to_null() {
        let mut dim = number_dim();
        let a = dim.intern(&json!("not a number")).unwrap();
        assert!(Arc::ptr_eq(&a, dim.null_atom()));
    }

    #[test]
    fn test_fail_policy_raises() {
        let mut dim = Dimension::new(Arc::new(
            DimensionType::new("value", ValueKind::Number)
                .with_parse_error_policy(ParseErrorPolicy::Fail),
        ));
        assert!(dim.intern(&json!("not a number")).is_err());
    }

    #[test]
    fn test_group_prefix() {
        assert_eq!(dimension_group_prefix("value"), "value");
        assert_eq!(dimension_group_prefix("value23"), "value");
        assert_eq!(dimension_group_prefix("category2"), "category");
    }

    #[test]
    fn test_custom_formatter() {
        let mut dim = Dimension::new(Arc::new(
            DimensionType::new("value", ValueKind::Number)
                .with_formatter(|v| format!("{:.2}", v.as_number().unwrap_or(f64::NAN))),
        ));
        let a = dim.intern(&json!(1.5)).unwrap();
        assert_eq!(a.label(), "1.50");
    }
}
