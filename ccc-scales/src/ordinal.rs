use crate::error::CccScaleError;
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A discrete scale mapping domain values to a fixed set of outputs.
///
/// When the range is shorter than the domain it cycles, which is the
/// palette behavior color axes want; unknown inputs get the default
/// value.
#[derive(Debug, Clone)]
pub struct OrdinalScale<D, R>
where
    D: Clone + Hash + Eq + Debug,
    R: Clone + Debug,
{
    mapping: IndexMap<D, R>,
    default_value: R,
}

impl<D, R> OrdinalScale<D, R>
where
    D: Clone + Hash + Eq + Debug,
    R: Clone + Debug,
{
    /// Builds the mapping by cycling the range over the domain.
    pub fn new(domain: &[D], range: &[R], default_value: R) -> Result<Self, CccScaleError> {
        if range.is_empty() {
            return Err(CccScaleError::EmptyRange);
        }
        let mapping = domain
            .iter()
            .cloned()
            .zip(range.iter().cycle().cloned())
            .collect::<IndexMap<_, _>>();
        Ok(Self {
            mapping,
            default_value,
        })
    }

    pub fn domain(&self) -> Vec<D> {
        self.mapping.keys().cloned().collect()
    }

    pub fn range(&self) -> Vec<R> {
        self.mapping.values().cloned().collect()
    }

    pub fn default_value(&self) -> &R {
        &self.default_value
    }

    pub fn scale(&self, value: &D) -> R {
        self.mapping
            .get(value)
            .unwrap_or(&self.default_value)
            .clone()
    }

    pub fn contains(&self, value: &D) -> bool {
        self.mapping.contains_key(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_mapping_with_default() {
        let scale = OrdinalScale::new(
            &["a", "b", "c"],
            &["red", "green", "blue"],
            "gray",
        )
        .unwrap();
        assert_eq!(scale.scale(&"b"), "green");
        assert_eq!(scale.scale(&"zzz"), "gray");
    }

    #[test]
    fn test_short_range_cycles() {
        let scale = OrdinalScale::new(&["a", "b", "c"], &["red", "green"], "gray").unwrap();
        assert_eq!(scale.scale(&"c"), "red");
    }

    #[test]
    fn test_empty_range_is_an_error() {
        let range: [&str; 0] = [];
        assert_eq!(
            OrdinalScale::new(&["a"], &range, "gray").unwrap_err(),
            CccScaleError::EmptyRange
        );
    }
}
