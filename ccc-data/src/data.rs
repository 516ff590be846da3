use crate::atom::Atom;
use crate::complex::{ComplexType, Datum};
use crate::dimension::Dimension;
use crate::error::CccDataError;
use crate::interpolate::NullInterpolationMode;
use ccc_common::value::DataValue;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Datum predicate applied at collection time. Filtering never prunes
/// group nodes, so toggling visibility does not force a re-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DatumFilter {
    pub visible_only: bool,
    pub selected_only: bool,
    pub non_null_only: bool,
}

impl DatumFilter {
    pub fn visible() -> Self {
        Self {
            visible_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, datum: &Datum) -> bool {
        (!self.visible_only || datum.is_visible())
            && (!self.selected_only || datum.is_selected())
            && (!self.non_null_only || !datum.is_null())
    }
}

/// Options of a `group_by` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupingArgs {
    pub filter: DatumFilter,
}

/// The owner of a flat datum collection: dimensions with their intern
/// tables, the datum store, and the version stamp that invalidates
/// grouped views and cached aggregates.
///
/// Structural changes (adding or removing datums) and flag toggles
/// (selected/visible) bump the version; caches stamped with an older
/// version recompute lazily on next read.
#[derive(Debug)]
pub struct Data {
    complex_type: ComplexType,
    dimensions: IndexMap<String, Dimension>,
    datums: Vec<Arc<Datum>>,
    measure_dims: Vec<String>,
    version: Arc<AtomicU64>,
}

impl Data {
    /// Creates an empty owner. Measure dimensions (the ones whose
    /// nullness decides a datum's `is_null`) default to the continuous
    /// numeric dimensions of the type.
    pub fn new(complex_type: ComplexType) -> Self {
        let dimensions: IndexMap<String, Dimension> = complex_type
            .dimension_types()
            .map(|t| (t.name().to_string(), Dimension::new(t.clone())))
            .collect();
        let measure_dims = complex_type
            .dimension_types()
            .filter(|t| !t.is_discrete() && t.value_kind() == ccc_common::value::ValueKind::Number)
            .map(|t| t.name().to_string())
            .collect();
        Self {
            complex_type,
            dimensions,
            datums: Vec::new(),
            measure_dims,
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Overrides which dimensions count as measures for the null-datum
    /// predicate.
    pub fn with_measure_dimensions(mut self, dims: Vec<String>) -> Self {
        self.measure_dims = dims;
        self
    }

    pub fn complex_type(&self) -> &ComplexType {
        &self.complex_type
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.get(name)
    }

    pub fn measure_dimensions(&self) -> &[String] {
        &self.measure_dims
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    fn bump_version(&self) {
        self.version.fetch_add(1, Ordering::Relaxed);
    }

    pub fn datums(&self) -> &[Arc<Datum>] {
        &self.datums
    }

    pub fn datums_where(&self, filter: &DatumFilter) -> Vec<Arc<Datum>> {
        self.datums
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect()
    }

    pub fn count_where(&self, filter: &DatumFilter) -> usize {
        self.datums.iter().filter(|d| filter.matches(d)).count()
    }

    pub fn intern(
        &mut self,
        dimension: &str,
        raw: &serde_json::Value,
    ) -> Result<Arc<Atom>, CccDataError> {
        self.dimensions
            .get_mut(dimension)
            .ok_or_else(|| CccDataError::UnknownDimension(dimension.to_string()))?
            .intern(raw)
    }

    pub fn intern_value(
        &mut self,
        dimension: &str,
        value: DataValue,
    ) -> Result<Arc<Atom>, CccDataError> {
        Ok(self
            .dimensions
            .get_mut(dimension)
            .ok_or_else(|| CccDataError::UnknownDimension(dimension.to_string()))?
            .intern_value(value))
    }

    pub fn null_atom(&self, dimension: &str) -> Result<&Arc<Atom>, CccDataError> {
        Ok(self
            .dimensions
            .get(dimension)
            .ok_or_else(|| CccDataError::UnknownDimension(dimension.to_string()))?
            .null_atom())
    }

    /// Interns one translated row and appends the resulting datum.
    /// Dimensions absent from the row get the null atom.
    pub fn add_row<'a>(
        &mut self,
        cells: impl IntoIterator<Item = (&'a str, &'a serde_json::Value)>,
    ) -> Result<Arc<Datum>, CccDataError> {
        let mut by_dim: HashMap<&str, &serde_json::Value> = HashMap::new();
        for (dim, raw) in cells {
            if !self.complex_type.has(dim) {
                return Err(CccDataError::UnknownDimension(dim.to_string()));
            }
            by_dim.insert(dim, raw);
        }
        let names: Vec<String> = self
            .complex_type
            .dimension_names()
            .map(|s| s.to_string())
            .collect();
        let mut atoms = Vec::with_capacity(names.len());
        for name in &names {
            let dim = self.dimensions.get_mut(name).expect("dimension exists");
            let atom = match by_dim.get(name.as_str()) {
                Some(raw) => dim.intern(raw)?,
                None => dim.null_atom().clone(),
            };
            atoms.push(atom);
        }
        let datum = Arc::new(Datum::new(atoms, &self.measure_dims));
        self.datums.push(datum.clone());
        self.bump_version();
        Ok(datum)
    }

    /// Builds a datum for an interpolated cell without adding it.
    pub(crate) fn make_interpolated_datum(
        &self,
        atoms: Vec<Arc<Atom>>,
        mode: NullInterpolationMode,
    ) -> Arc<Datum> {
        Arc::new(Datum::new_interpolated(atoms, &self.measure_dims, mode))
    }

    /// Appends a batch of datums, bumping the version once. Operators
    /// that synthesize datums commit through this, never one at a time.
    pub fn add_datums(&mut self, datums: Vec<Arc<Datum>>) {
        if datums.is_empty() {
            return;
        }
        self.datums.extend(datums);
        self.bump_version();
    }

    /// Removes datums not matching the predicate; returns how many
    /// were removed.
    pub fn retain_datums(&mut self, keep: impl Fn(&Datum) -> bool) -> usize {
        let before = self.datums.len();
        self.datums.retain(|d| keep(d));
        let removed = before - self.datums.len();
        if removed > 0 {
            self.bump_version();
        }
        removed
    }

    /// Owner-mediated flag toggle; returns whether the flag changed.
    pub fn set_selected(&self, datum: &Arc<Datum>, selected: bool) -> bool {
        if datum.is_selected() == selected {
            return false;
        }
        datum.set_selected_flag(selected);
        self.bump_version();
        true
    }

    pub fn set_visible(&self, datum: &Arc<Datum>, visible: bool) -> bool {
        if datum.is_visible() == visible {
            return false;
        }
        datum.set_visible_flag(visible);
        self.bump_version();
        true
    }

    /// Groups the (filtered) datums by the given dimensions, one tree
    /// level per dimension. Children appear in first-occurrence order
    /// of their key among the parent's datums; this order is
    /// load-bearing for series/category rendering and is never sorted.
    pub fn group_by(
        &self,
        dims: &[&str],
        args: &GroupingArgs,
    ) -> Result<DataGroup, CccDataError> {
        for dim in dims {
            if !self.complex_type.has(dim) {
                return Err(CccDataError::UnknownDimension(dim.to_string()));
            }
        }
        let dims: Vec<String> = dims.iter().map(|s| s.to_string()).collect();
        let datums = self.datums_where(&args.filter);
        let built_version = self.version();
        Ok(build_node(
            NodeSeed {
                key: String::new(),
                label: String::new(),
                atoms: Vec::new(),
                depth: 0,
            },
            datums,
            &dims,
            self,
            &self.version,
            built_version,
        ))
    }
}

struct NodeSeed {
    key: String,
    label: String,
    atoms: Vec<Arc<Atom>>,
    depth: usize,
}

fn build_node(
    seed: NodeSeed,
    datums: Vec<Arc<Datum>>,
    dims: &[String],
    owner: &Data,
    version: &Arc<AtomicU64>,
    built_version: u64,
) -> DataGroup {
    let mut children = IndexMap::new();
    if seed.depth < dims.len() {
        let dim = &dims[seed.depth];
        let null_atom = owner
            .dimension(dim)
            .expect("dimension validated by group_by")
            .null_atom();
        // First-occurrence grouping: the IndexMap entry order is the
        // datum iteration order.
        let mut buckets: IndexMap<String, (Arc<Atom>, Vec<Arc<Datum>>)> = IndexMap::new();
        for datum in &datums {
            let atom = datum.atom(dim).unwrap_or(null_atom).clone();
            buckets
                .entry(atom.key().to_string())
                .or_insert_with(|| (atom, Vec::new()))
                .1
                .push(datum.clone());
        }
        for (key, (atom, child_datums)) in buckets {
            let child = build_node(
                NodeSeed {
                    key: key.clone(),
                    label: atom.label().to_string(),
                    atoms: vec![atom],
                    depth: seed.depth + 1,
                },
                child_datums,
                dims,
                owner,
                version,
                built_version,
            );
            children.insert(key, child);
        }
    }
    DataGroup {
        inner: Arc::new(GroupNode {
            key: seed.key,
            label: seed.label,
            atoms: seed.atoms,
            depth: seed.depth,
            datums,
            children,
            version: version.clone(),
            built_version,
            cache: Mutex::new(HashMap::new()),
        }),
    }
}

/// Aggregate function over a dimension's numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggKind {
    Sum,
    Min,
    Max,
    Avg,
    /// Count of datums with a non-null value for the dimension.
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum AggKey {
    Dim(String, AggKind, DatumFilter),
    SelectedCount,
    VisibleCount,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    version: u64,
    value: Option<f64>,
}

#[derive(Debug)]
struct GroupNode {
    key: String,
    label: String,
    atoms: Vec<Arc<Atom>>,
    depth: usize,
    datums: Vec<Arc<Datum>>,
    children: IndexMap<String, DataGroup>,
    version: Arc<AtomicU64>,
    built_version: u64,
    cache: Mutex<HashMap<AggKey, CacheEntry>>,
}

/// A node of a grouped tree built by `Data::group_by`.
///
/// The tree is an immutable snapshot of the owner's datum list;
/// `is_stale` reports whether the owner changed structurally since the
/// build. Datum flags are shared, so selection/visibility reads stay
/// live without regrouping, and the cached aggregates revalidate
/// against the owner version on every read.
#[derive(Debug, Clone)]
pub struct DataGroup {
    inner: Arc<GroupNode>,
}

impl DataGroup {
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// The grouping atoms of this node (one per grouped dimension at
    /// this level; empty at the root).
    pub fn atoms(&self) -> &[Arc<Atom>] {
        &self.inner.atoms
    }

    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn datums(&self) -> &[Arc<Datum>] {
        &self.inner.datums
    }

    pub fn datums_where(&self, filter: &DatumFilter) -> Vec<Arc<Datum>> {
        self.inner
            .datums
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect()
    }

    pub fn children(&self) -> impl Iterator<Item = &DataGroup> {
        self.inner.children.values()
    }

    pub fn child(&self, key: &str) -> Option<&DataGroup> {
        self.inner.children.get(key)
    }

    pub fn child_count(&self) -> usize {
        self.inner.children.len()
    }

    pub fn child_keys(&self) -> impl Iterator<Item = &str> {
        self.inner.children.keys().map(|s| s.as_str())
    }

    /// Leaf nodes in tree order (the node itself when it has no
    /// children).
    pub fn leaves(&self) -> Vec<&DataGroup> {
        if self.inner.children.is_empty() {
            vec![self]
        } else {
            self.inner
                .children
                .values()
                .flat_map(|c| c.leaves())
                .collect()
        }
    }

    /// Whether the owning `Data` changed structurally after this tree
    /// was built.
    pub fn is_stale(&self) -> bool {
        self.inner.version.load(Ordering::Relaxed) != self.inner.built_version
    }

    pub fn count(&self) -> usize {
        self.inner.datums.len()
    }

    pub fn selected_count(&self) -> usize {
        self.cached(AggKey::SelectedCount).unwrap_or(0.0) as usize
    }

    pub fn visible_count(&self) -> usize {
        self.cached(AggKey::VisibleCount).unwrap_or(0.0) as usize
    }

    pub fn sum(&self, dimension: &str) -> Option<f64> {
        self.aggregate(dimension, AggKind::Sum, DatumFilter::default())
    }

    pub fn min(&self, dimension: &str) -> Option<f64> {
        self.aggregate(dimension, AggKind::Min, DatumFilter::default())
    }

    pub fn max(&self, dimension: &str) -> Option<f64> {
        self.aggregate(dimension, AggKind::Max, DatumFilter::default())
    }

    pub fn avg(&self, dimension: &str) -> Option<f64> {
        self.aggregate(dimension, AggKind::Avg, DatumFilter::default())
    }

    /// Lazily-computed, version-stamped aggregate over a dimension's
    /// numeric values. Non-numeric dimensions yield `None` rather than
    /// an error; charts probe during layout.
    pub fn aggregate(
        &self,
        dimension: &str,
        kind: AggKind,
        filter: DatumFilter,
    ) -> Option<f64> {
        self.cached(AggKey::Dim(dimension.to_string(), kind, filter))
    }

    /// Numeric (min, max) extent of a dimension under a filter.
    pub fn extent(&self, dimension: &str, filter: DatumFilter) -> Option<(f64, f64)> {
        let min = self.aggregate(dimension, AggKind::Min, filter)?;
        let max = self.aggregate(dimension, AggKind::Max, filter)?;
        Some((min, max))
    }

    fn cached(&self, key: AggKey) -> Option<f64> {
        let current = self.inner.version.load(Ordering::Relaxed);
        let mut cache = self.inner.cache.lock().expect("aggregate cache poisoned");
        if let Some(entry) = cache.get(&key) {
            if entry.version == current {
                return entry.value;
            }
        }
        let value = self.compute(&key);
        cache.insert(key, CacheEntry {
            version: current,
            value,
        });
        value
    }

    fn compute(&self, key: &AggKey) -> Option<f64> {
        match key {
            AggKey::SelectedCount => Some(
                self.inner.datums.iter().filter(|d| d.is_selected()).count() as f64,
            ),
            AggKey::VisibleCount => Some(
                self.inner.datums.iter().filter(|d| d.is_visible()).count() as f64,
            ),
            AggKey::Dim(dim, kind, filter) => {
                let mut count = 0usize;
                let mut sum = 0.0f64;
                let mut min = f64::INFINITY;
                let mut max = f64::NEG_INFINITY;
                for datum in &self.inner.datums {
                    if !filter.matches(datum) {
                        continue;
                    }
                    let Some(n) = datum.atom(dim).and_then(|a| a.number()) else {
                        continue;
                    };
                    count += 1;
                    sum += n;
                    min = min.min(n);
                    max = max.max(n);
                }
                if count == 0 {
                    return None;
                }
                Some(match kind {
                    AggKind::Sum => sum,
                    AggKind::Min => min,
                    AggKind::Max => max,
                    AggKind::Avg => sum / count as f64,
                    AggKind::Count => count as f64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::DimensionType;
    use ccc_common::value::ValueKind;
    use serde_json::json;

    fn sample_data() -> Data {
        let mut ctype = ComplexType::new();
        ctype
            .add(DimensionType::new("series", ValueKind::String))
            .unwrap();
        ctype
            .add(DimensionType::new("category", ValueKind::String))
            .unwrap();
        ctype
            .add(DimensionType::new("value", ValueKind::Number))
            .unwrap();
        let mut data = Data::new(ctype);
        for (s, c, v) in [
            ("B", "Jan", json!(10)),
            ("A", "Jan", json!(20)),
            ("B", "Feb", json!(30)),
            ("C", "Feb", json!(40)),
        ] {
            data.add_row([("series", &json!(s)), ("category", &json!(c)), ("value", &v)])
                .unwrap();
        }
        data
    }

    #[test]
    fn test_group_order_is_first_occurrence() {
        let data = sample_data();
        let grouped = data
            .group_by(&["series"], &GroupingArgs::default())
            .unwrap();
        let keys: Vec<&str> = grouped.child_keys().collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_nested_grouping() {
        let data = sample_data();
        let grouped = data
            .group_by(&["series", "category"], &GroupingArgs::default())
            .unwrap();
        let b = grouped.child("B").unwrap();
        let cats: Vec<&str> = b.child_keys().collect();
        assert_eq!(cats, vec!["Jan", "Feb"]);
        assert_eq!(b.count(), 2);
        assert_eq!(grouped.leaves().len(), 4);
    }

    #[test]
    fn test_unknown_group_dimension_fails_fast() {
        let data = sample_data();
        assert_eq!(
            data.group_by(&["nope"], &GroupingArgs::default())
                .unwrap_err(),
            CccDataError::UnknownDimension("nope".to_string())
        );
    }

    #[test]
    fn test_aggregates() {
        let data = sample_data();
        let grouped = data
            .group_by(&["series"], &GroupingArgs::default())
            .unwrap();
        let b = grouped.child("B").unwrap();
        assert_eq!(b.sum("value"), Some(40.0));
        assert_eq!(b.min("value"), Some(10.0));
        assert_eq!(b.max("value"), Some(30.0));
        assert_eq!(b.avg("value"), Some(20.0));
        // Aggregating a non-numeric dimension probes to None.
        assert_eq!(b.sum("series"), None);
        assert_eq!(grouped.sum("value"), Some(100.0));
    }

    #[test]
    fn test_selection_invalidates_aggregates_without_regroup() {
        let data = sample_data();
        let grouped = data
            .group_by(&["series"], &GroupingArgs::default())
            .unwrap();
        let b = grouped.child("B").unwrap().clone();
        assert_eq!(b.selected_count(), 0);

        let datum = data.datums()[0].clone();
        assert!(data.set_selected(&datum, true));
        assert_eq!(b.selected_count(), 1);

        // Toggling back also invalidates.
        assert!(data.set_selected(&datum, false));
        assert_eq!(b.selected_count(), 0);
        // Setting to the current value is a no-op.
        assert!(!data.set_selected(&datum, false));
    }

    #[test]
    fn test_visibility_filter_at_collection_time() {
        let data = sample_data();
        let grouped = data
            .group_by(&["series"], &GroupingArgs::default())
            .unwrap();
        let b = grouped.child("B").unwrap().clone();
        data.set_visible(&data.datums()[0].clone(), false);
        // Node structure unchanged; filtered collection reflects it.
        assert_eq!(b.count(), 2);
        assert_eq!(b.datums_where(&DatumFilter::visible()).len(), 1);
        assert_eq!(b.visible_count(), 1);
    }

    #[test]
    fn test_batched_add_marks_groups_stale() {
        let mut data = sample_data();
        let grouped = data
            .group_by(&["series"], &GroupingArgs::default())
            .unwrap();
        assert!(!grouped.is_stale());
        let atoms = vec![
            data.dimension("series").unwrap().atoms().last().unwrap().clone(),
            data.dimension("category").unwrap().atoms().last().unwrap().clone(),
            data.dimension("value").unwrap().atoms().last().unwrap().clone(),
        ];
        let datum = Arc::new(Datum::new(atoms, &["value".to_string()]));
        data.add_datums(vec![datum]);
        assert!(grouped.is_stale());
    }

    #[test]
    fn test_retain_datums() {
        let mut data = sample_data();
        let removed = data.retain_datums(|d| {
            d.atom("series").map(|a| a.key() != "B").unwrap_or(true)
        });
        assert_eq!(removed, 2);
        assert_eq!(data.datums().len(), 2);
    }
}
