use crate::atom::Atom;
use crate::complex::KEY_SEPARATOR;
use crate::data::Data;
use crate::error::CccDataError;
use ccc_common::value::{DataValue, ValueKind};
use indexmap::IndexMap;
use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How null measure cells of a cartesian series are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullInterpolationMode {
    #[default]
    None,
    Linear,
    Zero,
}

#[derive(Debug, Clone)]
pub struct InterpolationConfig {
    pub series_dims: Vec<String>,
    pub category_dims: Vec<String>,
    pub value_dim: String,
    pub mode: NullInterpolationMode,
    /// Policy for boundary nulls with no neighbor on one side: `true`
    /// replicates the nearest known value outward, `false` leaves them
    /// null.
    pub stretch_ends: bool,
}

impl InterpolationConfig {
    pub fn new(
        series_dims: Vec<String>,
        category_dims: Vec<String>,
        value_dim: impl Into<String>,
        mode: NullInterpolationMode,
    ) -> Self {
        Self {
            series_dims,
            category_dims,
            value_dim: value_dim.into(),
            mode,
            stretch_ends: true,
        }
    }

    pub fn with_stretch_ends(mut self, stretch_ends: bool) -> Self {
        self.stretch_ends = stretch_ends;
        self
    }
}

/// Per (series, category) cell state.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CellState {
    Unvisited,
    Null,
    Filled(f64),
}

struct Category {
    atoms: Vec<Arc<Atom>>,
    x: f64,
}

struct Series {
    atoms: Vec<Arc<Atom>>,
    cells: Vec<CellState>,
}

struct Planned {
    series_atoms: Vec<Arc<Atom>>,
    category_atoms: Vec<Arc<Atom>>,
    value: f64,
}

/// Synthesizes datums for null or missing (series × category) cells so
/// every series spans the full category domain. The new datums are
/// committed to the owner in a single batch, so aggregate caches are
/// invalidated once, not per datum.
///
/// Returns the number of datums added.
pub fn interpolate(data: &mut Data, cfg: &InterpolationConfig) -> Result<usize, CccDataError> {
    if cfg.mode == NullInterpolationMode::None {
        return Ok(0);
    }
    for dim in cfg
        .series_dims
        .iter()
        .chain(cfg.category_dims.iter())
        .chain(std::iter::once(&cfg.value_dim))
    {
        if !data.complex_type().has(dim) {
            return Err(CccDataError::UnknownDimension(dim.clone()));
        }
    }
    let value_type = data
        .complex_type()
        .dimension(&cfg.value_dim)
        .expect("checked above");
    if value_type.value_kind() != ValueKind::Number {
        return Err(CccDataError::NonNumericValueDimension(cfg.value_dim.clone()));
    }

    let planned = plan(data, cfg);
    let count = planned.len();
    commit(data, cfg, planned)?;
    Ok(count)
}

fn composite_key(atoms: &[Arc<Atom>]) -> String {
    atoms.iter().map(|a| a.key()).join(KEY_SEPARATOR)
}

fn plan(data: &Data, cfg: &InterpolationConfig) -> Vec<Planned> {
    // Category domain, in first-occurrence order; null categories do
    // not take part in the domain.
    let mut categories: IndexMap<String, Vec<Arc<Atom>>> = IndexMap::new();
    let mut cell_values: HashMap<(String, String), Option<f64>> = HashMap::new();
    let mut series: IndexMap<String, Vec<Arc<Atom>>> = IndexMap::new();

    for datum in data.datums() {
        let cat_atoms: Vec<Arc<Atom>> = cfg
            .category_dims
            .iter()
            .filter_map(|d| datum.atom(d).cloned())
            .collect();
        if cat_atoms.iter().all(|a| a.is_null()) {
            continue;
        }
        let cat_key = composite_key(&cat_atoms);
        categories.entry(cat_key.clone()).or_insert(cat_atoms);

        let ser_atoms: Vec<Arc<Atom>> = cfg
            .series_dims
            .iter()
            .filter_map(|d| datum.atom(d).cloned())
            .collect();
        let ser_key = composite_key(&ser_atoms);
        series.entry(ser_key.clone()).or_insert(ser_atoms);

        let value = datum.atom(&cfg.value_dim).and_then(|a| a.number());
        let cell = cell_values.entry((ser_key, cat_key)).or_insert(None);
        // First non-null value of the cell wins.
        if cell.is_none() {
            *cell = value;
        }
    }

    // Walk categories in domain order: numeric order for a single
    // continuous category dimension (timeseries), occurrence order
    // otherwise.
    let continuous_category = cfg.category_dims.len() == 1
        && data
            .complex_type()
            .dimension(&cfg.category_dims[0])
            .map(|t| !t.is_discrete())
            .unwrap_or(false);
    let ordered: Vec<(String, Vec<Arc<Atom>>)> = if continuous_category {
        categories
            .into_iter()
            .sorted_by_key(|(_, atoms)| {
                OrderedFloat(atoms[0].number().unwrap_or(f64::NAN))
            })
            .collect()
    } else {
        categories.into_iter().collect()
    };
    let categories: Vec<Category> = ordered
        .into_iter()
        .enumerate()
        .map(|(i, (_, atoms))| {
            let x = if continuous_category {
                atoms[0].number().unwrap_or(i as f64)
            } else {
                i as f64
            };
            Category { atoms, x }
        })
        .collect();
    let cat_keys: Vec<String> = categories.iter().map(|c| composite_key(&c.atoms)).collect();

    let mut planned = Vec::new();
    for (ser_key, ser_atoms) in series {
        let mut s = Series {
            atoms: ser_atoms,
            cells: vec![CellState::Unvisited; categories.len()],
        };
        for (i, cat_key) in cat_keys.iter().enumerate() {
            s.cells[i] = match cell_values
                .get(&(ser_key.clone(), cat_key.clone()))
                .copied()
                .flatten()
            {
                Some(v) => CellState::Filled(v),
                None => CellState::Null,
            };
        }
        match cfg.mode {
            NullInterpolationMode::Linear => {
                plan_linear(&s, &categories, cfg.stretch_ends, &mut planned)
            }
            NullInterpolationMode::Zero => plan_zero(&s, &categories, &mut planned),
            NullInterpolationMode::None => unreachable!("handled by interpolate"),
        }
    }
    planned
}

/// Next filled cell of the series at or after `from`.
fn next_filled(cells: &[CellState], from: usize) -> Option<(usize, f64)> {
    cells[from..].iter().enumerate().find_map(|(i, c)| match c {
        CellState::Filled(v) => Some((from + i, *v)),
        _ => None,
    })
}

fn plan_linear(
    series: &Series,
    categories: &[Category],
    stretch_ends: bool,
    planned: &mut Vec<Planned>,
) {
    // prev tracks the last *source* value; synthesized cells never
    // become interpolation anchors.
    let mut prev: Option<(f64, f64)> = None;
    for (i, cell) in series.cells.iter().enumerate() {
        match cell {
            CellState::Filled(v) => {
                prev = Some((categories[i].x, *v));
            }
            CellState::Null | CellState::Unvisited => {
                let next = next_filled(&series.cells, i + 1)
                    .map(|(j, v)| (categories[j].x, v));
                let value = match (prev, next) {
                    (Some((x0, v0)), Some((x1, v1))) => {
                        let x = categories[i].x;
                        if (x1 - x0).abs() < f64::EPSILON {
                            Some(v0)
                        } else {
                            Some(v0 + (v1 - v0) * (x - x0) / (x1 - x0))
                        }
                    }
                    (None, Some((_, v1))) if stretch_ends => Some(v1),
                    (Some((_, v0)), None) if stretch_ends => Some(v0),
                    _ => None,
                };
                if let Some(value) = value {
                    planned.push(Planned {
                        series_atoms: series.atoms.clone(),
                        category_atoms: categories[i].atoms.clone(),
                        value,
                    });
                }
            }
        }
    }
}

fn plan_zero(series: &Series, categories: &[Category], planned: &mut Vec<Planned>) {
    for (i, cell) in series.cells.iter().enumerate() {
        if !matches!(cell, CellState::Filled(_)) {
            planned.push(Planned {
                series_atoms: series.atoms.clone(),
                category_atoms: categories[i].atoms.clone(),
                value: 0.0,
            });
        }
    }
}

fn commit(
    data: &mut Data,
    cfg: &InterpolationConfig,
    planned: Vec<Planned>,
) -> Result<(), CccDataError> {
    let dim_names: Vec<String> = data
        .complex_type()
        .dimension_names()
        .map(|s| s.to_string())
        .collect();
    let mut batch = Vec::with_capacity(planned.len());
    for p in planned {
        let value_atom = data.intern_value(&cfg.value_dim, DataValue::Number(p.value))?;
        let mut atoms = Vec::with_capacity(dim_names.len());
        for name in &dim_names {
            let atom = p
                .series_atoms
                .iter()
                .chain(p.category_atoms.iter())
                .find(|a| a.dimension() == name)
                .cloned()
                .unwrap_or_else(|| {
                    if name == &cfg.value_dim {
                        value_atom.clone()
                    } else {
                        data.null_atom(name).expect("dimension exists").clone()
                    }
                });
            atoms.push(atom);
        }
        batch.push(data.make_interpolated_datum(atoms, cfg.mode));
    }
    data.add_datums(batch);
    Ok(())
}
