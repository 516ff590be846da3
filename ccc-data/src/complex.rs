use crate::atom::Atom;
use crate::dimension::{dimension_group_prefix, DimensionType};
use crate::error::CccDataError;
use crate::interpolate::NullInterpolationMode;
use indexmap::IndexMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The schema of a datum collection: an ordered mapping of dimension
/// name to dimension type. Declaration order is meaningful — it drives
/// composite keys and free-column auto-binding.
#[derive(Debug, Default, Clone)]
pub struct ComplexType {
    dimensions: IndexMap<String, Arc<DimensionType>>,
}

impl ComplexType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, dim_type: DimensionType) -> Result<&Arc<DimensionType>, CccDataError> {
        let name = dim_type.name().to_string();
        if self.dimensions.contains_key(&name) {
            return Err(CccDataError::DuplicateDimension(name));
        }
        self.dimensions.insert(name.clone(), Arc::new(dim_type));
        Ok(&self.dimensions[&name])
    }

    /// Replaces an existing dimension type in place, keeping its
    /// declaration position. Used for spec-level dimension overrides
    /// applied before any datum is loaded.
    pub fn replace(&mut self, dim_type: DimensionType) -> Result<(), CccDataError> {
        let name = dim_type.name().to_string();
        match self.dimensions.get_mut(&name) {
            Some(slot) => {
                *slot = Arc::new(dim_type);
                Ok(())
            }
            None => Err(CccDataError::UnknownDimension(name)),
        }
    }

    pub fn dimension(&self, name: &str) -> Option<&Arc<DimensionType>> {
        self.dimensions.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.dimensions.contains_key(name)
    }

    pub fn dimension_names(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(|s| s.as_str())
    }

    pub fn dimension_types(&self) -> impl Iterator<Item = &Arc<DimensionType>> {
        self.dimensions.values()
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Dimensions belonging to a dimension group, in declaration order
    /// (`value` → [`value`, `value2`, ...]).
    pub fn group_dimensions(&self, prefix: &str) -> Vec<&Arc<DimensionType>> {
        self.dimensions
            .iter()
            .filter(|(name, _)| dimension_group_prefix(name) == prefix)
            .map(|(_, t)| t)
            .collect()
    }

    /// The next free dimension name within a group: `value`, then
    /// `value2`, `value3`, ...
    pub fn next_group_name(&self, prefix: &str) -> String {
        if !self.has(prefix) {
            return prefix.to_string();
        }
        let mut i = 2;
        loop {
            let candidate = format!("{}{}", prefix, i);
            if !self.has(&candidate) {
                return candidate;
            }
            i += 1;
        }
    }
}

/// One row of translated input: an ordered set of atoms keyed by
/// dimension name, plus the selection/visibility/null flags.
///
/// The selected/visible flags are mutated only through the owning
/// `Data`, which bumps its version stamp so cached aggregates know to
/// recompute.
#[derive(Debug)]
pub struct Datum {
    atoms: IndexMap<String, Arc<Atom>>,
    key: String,
    is_null: bool,
    interpolation: Option<NullInterpolationMode>,
    selected: AtomicBool,
    visible: AtomicBool,
}

/// Separator joining atom keys into composite datum/group keys.
pub const KEY_SEPARATOR: &str = "~";

impl Datum {
    pub(crate) fn new(atoms: Vec<Arc<Atom>>, measure_dims: &[String]) -> Self {
        Self::build(atoms, measure_dims, None)
    }

    pub(crate) fn new_interpolated(
        atoms: Vec<Arc<Atom>>,
        measure_dims: &[String],
        mode: NullInterpolationMode,
    ) -> Self {
        Self::build(atoms, measure_dims, Some(mode))
    }

    fn build(
        atoms: Vec<Arc<Atom>>,
        measure_dims: &[String],
        interpolation: Option<NullInterpolationMode>,
    ) -> Self {
        let atoms: IndexMap<String, Arc<Atom>> = atoms
            .into_iter()
            .map(|a| (a.dimension().to_string(), a))
            .collect();
        let key = atoms
            .values()
            .map(|a| a.key())
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);
        // A datum is null when every measure atom is null. Datums with
        // no measure dimensions are never null.
        let is_null = !measure_dims.is_empty()
            && measure_dims
                .iter()
                .all(|d| atoms.get(d).map(|a| a.is_null()).unwrap_or(true));
        Self {
            atoms,
            key,
            is_null,
            interpolation,
            selected: AtomicBool::new(false),
            visible: AtomicBool::new(true),
        }
    }

    pub fn atom(&self, dimension: &str) -> Option<&Arc<Atom>> {
        self.atoms.get(dimension)
    }

    pub fn atoms(&self) -> impl Iterator<Item = &Arc<Atom>> {
        self.atoms.values()
    }

    /// Composite key: the join of the atom keys in dimension order.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_null(&self) -> bool {
        self.is_null
    }

    pub fn is_interpolated(&self) -> bool {
        self.interpolation.is_some()
    }

    pub fn interpolation(&self) -> Option<NullInterpolationMode> {
        self.interpolation
    }

    pub fn is_selected(&self) -> bool {
        self.selected.load(Ordering::Relaxed)
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub(crate) fn set_selected_flag(&self, selected: bool) {
        self.selected.store(selected, Ordering::Relaxed);
    }

    pub(crate) fn set_visible_flag(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Dimension;
    use ccc_common::value::ValueKind;
    use serde_json::json;

    fn atoms_for(cells: &[(&str, ValueKind, serde_json::Value)]) -> Vec<Arc<Atom>> {
        cells
            .iter()
            .map(|(name, kind, raw)| {
                let mut dim = Dimension::new(Arc::new(DimensionType::new(*name, *kind)));
                dim.intern(raw).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_datum_key_joins_atom_keys() {
        let atoms = atoms_for(&[
            ("series", ValueKind::String, json!("A")),
            ("category", ValueKind::String, json!("Jan")),
            ("value", ValueKind::Number, json!(10)),
        ]);
        let datum = Datum::new(atoms, &["value".to_string()]);
        assert_eq!(datum.key(), "A~Jan~10");
        assert!(!datum.is_null());
    }

    #[test]
    fn test_datum_null_when_all_measures_null() {
        let atoms = atoms_for(&[
            ("series", ValueKind::String, json!("A")),
            ("value", ValueKind::Number, json!(null)),
        ]);
        let datum = Datum::new(atoms, &["value".to_string()]);
        assert!(datum.is_null());
    }

    #[test]
    fn test_next_group_name() {
        let mut ctype = ComplexType::new();
        assert_eq!(ctype.next_group_name("value"), "value");
        ctype
            .add(DimensionType::new("value", ValueKind::Number))
            .unwrap();
        assert_eq!(ctype.next_group_name("value"), "value2");
        ctype
            .add(DimensionType::new("value2", ValueKind::Number))
            .unwrap();
        assert_eq!(ctype.next_group_name("value"), "value3");
        assert_eq!(ctype.group_dimensions("value").len(), 2);
    }

    #[test]
    fn test_duplicate_dimension_rejected() {
        let mut ctype = ComplexType::new();
        ctype
            .add(DimensionType::new("series", ValueKind::String))
            .unwrap();
        assert!(matches!(
            ctype.add(DimensionType::new("series", ValueKind::String)),
            Err(CccDataError::DuplicateDimension(_))
        ));
    }
}
