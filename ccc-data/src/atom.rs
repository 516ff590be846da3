use ccc_common::value::DataValue;

/// An interned, immutable (dimension, value, label, raw) tuple.
///
/// Atoms are deduplicated per dimension: raw values that normalize to
/// the same canonical key map to the same `Arc<Atom>`, so grouping and
/// equality work by pointer identity. Exactly one null atom exists per
/// dimension, with an empty key and label.
#[derive(Debug)]
pub struct Atom {
    dimension: String,
    value: DataValue,
    label: String,
    raw: serde_json::Value,
    key: String,
}

impl Atom {
    pub(crate) fn new(
        dimension: impl Into<String>,
        value: DataValue,
        label: String,
        raw: serde_json::Value,
    ) -> Self {
        let key = value.key();
        Self {
            dimension: dimension.into(),
            value,
            label,
            raw,
            key,
        }
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    pub fn value(&self) -> &DataValue {
        &self.value
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    /// Canonical string form; the interning identity within a dimension.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Numeric view used by aggregates and continuous scales.
    pub fn number(&self) -> Option<f64> {
        self.value.as_number()
    }
}
