use crate::plot::PlotKind;
use ccc_common::value::ValueKind;
use ccc_data::NullInterpolationMode;
use ccc_scales::ContinuousDomainOptions;
use serde::Deserialize;
use std::collections::HashMap;

/// The declarative chart specification.
///
/// Unrecognized fields land in `extra` and are ignored rather than
/// rejected, so specs written against other dialect versions keep
/// working; the `options` map carries the legacy (v1) option names the
/// role resolver still honors.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChartSpec {
    pub plot: PlotKind,
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub title: Option<String>,
    /// None: legend shown when a color domain exists.
    pub legend: Option<bool>,

    /// Explicit role → dimension-name-list bindings
    /// (`{"series": "region"}` or `{"value": "sales, profit"}`).
    pub visual_roles: HashMap<String, String>,
    /// Positional column → dimension bindings, in column order; empty
    /// entries skip the column.
    pub readers: Vec<String>,
    /// Per-dimension overrides applied before loading.
    pub dimensions: HashMap<String, DimensionSpec>,

    pub crosstab_mode: bool,
    pub data_categories_count: usize,

    pub null_interpolation_mode: NullInterpolationMode,
    pub stretch_ends: bool,
    pub allow_no_data: bool,

    pub base_axis: AxisSpec,
    pub ortho_axis: AxisSpec,

    /// Legacy v1 option dialect (e.g. `seriesDimensions`).
    pub options: HashMap<String, serde_json::Value>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for ChartSpec {
    fn default() -> Self {
        Self {
            plot: PlotKind::default(),
            width: 400.0,
            height: 300.0,
            margin: 0.0,
            title: None,
            legend: None,
            visual_roles: HashMap::new(),
            readers: Vec::new(),
            dimensions: HashMap::new(),
            crosstab_mode: false,
            data_categories_count: 1,
            null_interpolation_mode: NullInterpolationMode::None,
            stretch_ends: true,
            allow_no_data: false,
            base_axis: AxisSpec::default(),
            ortho_axis: AxisSpec::default(),
            options: HashMap::new(),
            extra: HashMap::new(),
        }
    }
}

impl ChartSpec {
    pub fn new(plot: PlotKind) -> Self {
        Self {
            plot,
            ..Self::default()
        }
    }

    /// Parses a spec from JSON; unspecified fields keep the chart
    /// defaults.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionSpec {
    pub value_type: Option<ValueKind>,
    pub is_discrete: Option<bool>,
    pub is_hidden: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisSpec {
    #[serde(flatten)]
    pub domain: ContinuousDomainOptions,
    /// Forces the docked size instead of measuring content.
    pub size: Option<f32>,
    pub font_size: Option<f32>,
    pub desired_tick_count: Option<usize>,
}
