use crate::axis::{Axis, AxisType};
use crate::context::BuildContext;
use crate::error::CccChartError;
use crate::layout::{DockLayout, DockPanel, LayoutInfo, Sides, Size};
use crate::panel::{BaseAxisPanel, LegendPanel, NumericAxisPanel, PlotPanel, TitlePanel};
use crate::role::{resolve_roles, VisualRole, AUTO_DIMENSION_LABEL};
use crate::spec::ChartSpec;
use ccc_common::text::FontSpec;
use ccc_data::{
    interpolate, CrosstabTranslator, Data, DataGroup, DatumFilter, DimensionType, GroupingArgs,
    InterpolationConfig, MeasureSlot, NullInterpolationMode, RelationalTranslator, TableSource,
    TranslationRequest,
};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

/// Default categorical palette (the protovis category10 colors).
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const TITLE_FONT_SIZE: f32 = 14.0;

/// Everything a renderer needs after a successful build: the loaded
/// data, the resolved roles, the grouped view, the axes with their
/// scales, and the committed layout.
#[derive(Debug)]
pub struct ChartBuild {
    pub data: Data,
    pub roles: IndexMap<String, VisualRole>,
    pub grouped: DataGroup,
    pub base_axis: Option<Axis>,
    pub ortho_axis: Option<Axis>,
    pub color_axis: Option<Axis>,
    pub angle_axis: Option<Axis>,
    pub layout: LayoutInfo,
    pub legend_visible: bool,
}

/// A declarative chart: spec in, `ChartBuild` out.
///
/// `build` is not reentrant; a second call while one is in progress
/// (through shared references) fails with `ReentrantBuild` instead of
/// producing a half-consistent result.
pub struct Chart {
    spec: ChartSpec,
    ctx: BuildContext,
    building: AtomicBool,
}

impl Chart {
    pub fn new(spec: ChartSpec) -> Self {
        Self {
            spec,
            ctx: BuildContext::default(),
            building: AtomicBool::new(false),
        }
    }

    pub fn with_context(mut self, ctx: BuildContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    /// Runs the full pipeline: translate, resolve roles, load,
    /// interpolate, group, bind axes, lay out, resolve scales. Errors
    /// carry the stage they were raised in.
    pub fn build(&self, source: &TableSource) -> Result<ChartBuild, CccChartError> {
        if self
            .building
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(CccChartError::ReentrantBuild);
        }
        let result = self.build_inner(source);
        self.building.store(false, Ordering::Release);
        result
    }

    fn build_inner(&self, source: &TableSource) -> Result<ChartBuild, CccChartError> {
        let spec = &self.spec;

        // Translate: crosstab input pivots to relational first.
        let translator = if spec.crosstab_mode {
            CrosstabTranslator::new(source.clone(), spec.data_categories_count)
                .into_relational()
                .map_err(|e| CccChartError::from(e).in_stage("translate"))?
        } else {
            RelationalTranslator::new(source.clone())
        };

        let mut request = self.translation_request();
        if spec.crosstab_mode {
            // The pivot puts the series values into a known column.
            request
                .explicit
                .entry(spec.data_categories_count)
                .or_insert_with(|| "series".to_string());
        }
        let mut ctype = ccc_data::ComplexType::new();
        let bindings = translator
            .configure_type(&request, &mut ctype)
            .map_err(|e| CccChartError::from(e).in_stage("translate"))?;

        // Per-dimension spec overrides, applied before roles validate
        // discreteness.
        for (name, dim_spec) in &spec.dimensions {
            let Some(existing) = ctype.dimension(name) else {
                log::warn!("dimension override `{name}` names no translated dimension");
                continue;
            };
            let kind = dim_spec.value_type.unwrap_or(existing.value_kind());
            let mut dim_type = DimensionType::new(name.clone(), kind).with_discrete(
                dim_spec
                    .is_discrete
                    .unwrap_or(kind.is_discrete_by_default()),
            );
            if let Some(hidden) = dim_spec.is_hidden {
                dim_type = dim_type.with_hidden(hidden);
            }
            ctype
                .replace(dim_type)
                .map_err(|e| CccChartError::from(e).in_stage("translate"))?;
        }

        // Roles. May auto-create dimensions (e.g. a category for
        // single-series data); those get a constant atom on every row.
        let before: HashSet<String> = ctype.dimension_names().map(str::to_string).collect();
        let roles = resolve_roles(spec, &mut ctype).map_err(|e| e.in_stage("roles"))?;
        let auto_dims: Vec<String> = ctype
            .dimension_names()
            .filter(|n| !before.contains(*n))
            .map(str::to_string)
            .collect();

        // Load.
        let mut data = Data::new(ctype);
        if auto_dims.is_empty() {
            translator
                .load(&bindings, &mut data)
                .map_err(|e| CccChartError::from(e).in_stage("load"))?;
        } else {
            let null = serde_json::Value::Null;
            let all = serde_json::Value::String(AUTO_DIMENSION_LABEL.to_string());
            for row in &translator.source().resultset {
                let cells = bindings
                    .iter()
                    .map(|b| (b.dimension.as_str(), row.get(b.col_index).unwrap_or(&null)))
                    .chain(auto_dims.iter().map(|d| (d.as_str(), &all)));
                data.add_row(cells)
                    .map_err(|e| CccChartError::from(e).in_stage("load"))?;
            }
        }

        // Interpolate missing series cells.
        if spec.null_interpolation_mode != NullInterpolationMode::None
            && spec.plot.supports_interpolation()
        {
            if let Some(cfg) = self.interpolation_config(&roles) {
                let added = interpolate(&mut data, &cfg)
                    .map_err(|e| CccChartError::from(e).in_stage("interpolate"))?;
                log::debug!("interpolation added {added} datums");
            }
        }

        // Group.
        let filter = DatumFilter::visible();
        if data.count_where(&filter) == 0 && !spec.allow_no_data {
            return Err(CccChartError::NoData.in_stage("grouping"));
        }
        let group_dims = self.grouping_dimensions(&roles);
        let group_refs: Vec<&str> = group_dims.iter().map(String::as_str).collect();
        let grouped = data
            .group_by(&group_refs, &GroupingArgs { filter })
            .map_err(|e| CccChartError::from(e).in_stage("grouping"))?;

        // Axes.
        let mut base_axis = None;
        let mut ortho_axis = None;
        let mut angle_axis = None;
        if spec.plot.is_cartesian() {
            if let Some(role) = spec.plot.base_role() {
                let mut axis = Axis::new(AxisType::Base, role);
                axis.bind(&roles[role], &data, &filter);
                base_axis = Some(axis);
            }
            if let Some(role) = spec.plot.ortho_role() {
                let mut axis = Axis::new(AxisType::Ortho, role);
                axis.bind(&roles[role], &data, &filter);
                ortho_axis = Some(axis);
            }
        } else {
            angle_axis = Some(Axis::new(AxisType::Angle, "value"));
        }
        let mut color_axis = {
            let mut axis = Axis::new(AxisType::Color, "color");
            axis.bind(&roles["color"], &data, &filter);
            axis
        };
        let legend_visible = spec
            .legend
            .unwrap_or_else(|| color_axis.domain_keys.len() > 1);
        if self.ctx.warn_enabled() && spec.legend == Some(true) && color_axis.domain_keys.is_empty()
        {
            log::warn!("legend requested but the color domain is empty");
        }

        // Layout. The ortho domain is resolved before layout so the
        // numeric axis panel can measure its tick labels; the range
        // comes from the content rect afterwards.
        let layout = self
            .run_layout(&base_axis, &ortho_axis, &color_axis, legend_visible)
            .map_err(|e| e.in_stage("layout"))?;

        // Scales over the content rect.
        let content = layout.content_rect;
        if let Some(axis) = base_axis.as_mut() {
            let range = (0.0, content.width as f64);
            if axis.is_discrete {
                // An empty domain (allow_no_data) gets no scale.
                if !axis.domain_keys.is_empty() {
                    axis.resolve_discrete(range)
                        .map_err(|e| e.in_stage("scales"))?;
                }
            } else {
                axis.resolve_continuous(
                    &spec.base_axis.domain,
                    range,
                    spec.base_axis.desired_tick_count,
                )
                .map_err(|e| e.in_stage("scales"))?;
            }
        }
        if let Some(axis) = ortho_axis.as_mut() {
            axis.resolve_continuous(
                &spec.ortho_axis.domain,
                (content.height as f64, 0.0),
                spec.ortho_axis.desired_tick_count,
            )
            .map_err(|e| e.in_stage("scales"))?;
        }
        if let Some(axis) = angle_axis.as_mut() {
            let value_dim = roles["value"].dimension().unwrap_or_default().to_string();
            let total: f64 = data
                .datums_where(&filter)
                .iter()
                .filter_map(|d| d.atom(&value_dim).and_then(|a| a.number()))
                .filter(|v| *v > 0.0)
                .sum();
            axis.resolve_angle(total);
        }
        let palette: Vec<String> = DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect();
        color_axis
            .resolve_color(&palette)
            .map_err(|e| e.in_stage("scales"))?;

        Ok(ChartBuild {
            data,
            roles,
            grouped,
            base_axis,
            ortho_axis,
            color_axis: Some(color_axis),
            angle_axis,
            layout,
            legend_visible,
        })
    }

    /// Measure slots for every measure role without an explicit
    /// binding, in role-declaration order.
    fn translation_request(&self) -> TranslationRequest {
        let spec = &self.spec;
        let measure_slots = spec
            .plot
            .visual_roles()
            .iter()
            .filter(|r| r.is_measure && r.source_role.is_none())
            .filter(|r| {
                !spec.visual_roles.contains_key(r.name)
                    && !spec.options.contains_key(&format!("{}Dimensions", r.name))
            })
            .map(|r| MeasureSlot {
                role: r.name.to_string(),
                dimension_group: r.default_dimension_group.unwrap_or(r.name).to_string(),
            })
            .collect();

        let explicit = spec
            .readers
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .map(|(col, name)| (col, name.clone()))
            .collect();

        TranslationRequest {
            measure_slots,
            discrete_group: spec.plot.discrete_target_group().to_string(),
            explicit,
        }
    }

    fn interpolation_config(
        &self,
        roles: &IndexMap<String, VisualRole>,
    ) -> Option<InterpolationConfig> {
        let value_dim = roles.get("value")?.dimension()?.to_string();
        let category_dims = roles
            .get("category")
            .map(|r| r.dimensions.clone())
            .unwrap_or_default();
        if category_dims.is_empty() {
            return None;
        }
        let series_dims = roles
            .get("series")
            .map(|r| r.dimensions.clone())
            .unwrap_or_default();
        Some(
            InterpolationConfig::new(
                series_dims,
                category_dims,
                value_dim,
                self.spec.null_interpolation_mode,
            )
            .with_stretch_ends(self.spec.stretch_ends),
        )
    }

    /// Series dimensions outermost, then the base categories; pie
    /// charts group by category only.
    fn grouping_dimensions(&self, roles: &IndexMap<String, VisualRole>) -> Vec<String> {
        let mut dims = Vec::new();
        if self.spec.plot.is_cartesian() {
            if let Some(series) = roles.get("series") {
                dims.extend(series.dimensions.iter().cloned());
            }
        }
        if let Some(category) = roles.get("category") {
            dims.extend(category.dimensions.iter().cloned());
        }
        if dims.is_empty() {
            // Scatter has no discrete grouping roles beyond series.
            if let Some(series) = roles.get("series") {
                dims.extend(series.dimensions.iter().cloned());
            }
        }
        dims
    }

    fn run_layout(
        &self,
        base_axis: &Option<Axis>,
        ortho_axis: &Option<Axis>,
        color_axis: &Axis,
        legend_visible: bool,
    ) -> Result<LayoutInfo, CccChartError> {
        let spec = &self.spec;
        let client = Size::new(
            (spec.width - 2.0 * spec.margin).max(0.0),
            (spec.height - 2.0 * spec.margin).max(0.0),
        );
        let axis_font = |size: Option<f32>| FontSpec {
            size: size.unwrap_or(FontSpec::default().size),
            ..FontSpec::default()
        };

        let title_panel = spec
            .title
            .as_deref()
            .map(|t| TitlePanel::new(t, FontSpec::new("sans-serif", TITLE_FONT_SIZE)));

        let legend_panel = if legend_visible {
            Some(LegendPanel::new(
                &color_axis.domain_labels,
                FontSpec::default(),
            ))
        } else {
            None
        };

        let ortho_panel = match ortho_axis {
            Some(axis) => {
                let domain = spec
                    .ortho_axis
                    .domain
                    .resolve(axis.extent)
                    .map_err(CccChartError::from)?;
                Some(NumericAxisPanel::new(
                    domain,
                    spec.ortho_axis.desired_tick_count,
                    axis_font(spec.ortho_axis.font_size),
                    spec.ortho_axis.size,
                ))
            }
            None => None,
        };

        let base_panel = match base_axis {
            Some(axis) if axis.is_discrete => Some(BaseAxisPanel::discrete(
                axis.domain_labels.clone(),
                axis_font(spec.base_axis.font_size),
                spec.base_axis.size,
            )),
            Some(axis) => {
                let domain = spec
                    .base_axis
                    .domain
                    .resolve(axis.extent)
                    .map_err(CccChartError::from)?;
                let labels = ccc_scales::array::ticks(
                    domain.0,
                    domain.1,
                    spec.base_axis.desired_tick_count.unwrap_or(10) as f64,
                )
                .into_iter()
                .map(crate::axis::format_tick)
                .collect();
                Some(BaseAxisPanel::continuous(
                    labels,
                    axis_font(spec.base_axis.font_size),
                    spec.base_axis.size,
                ))
            }
            None => None,
        };

        let plot_panel = PlotPanel;
        let mut panels: Vec<&dyn DockPanel> = Vec::new();
        if let Some(p) = &title_panel {
            panels.push(p);
        }
        if let Some(p) = &legend_panel {
            panels.push(p);
        }
        if let Some(p) = &ortho_panel {
            panels.push(p);
        }
        if let Some(p) = &base_panel {
            panels.push(p);
        }
        panels.push(&plot_panel);

        let mut layout = DockLayout.layout(client, &panels, self.ctx.measurer());
        if spec.margin > 0.0 {
            // Report rects in client coordinates, margin included.
            let offset = Sides::uniform(spec.margin);
            layout.content_rect.x += offset.left;
            layout.content_rect.y += offset.top;
            for placement in &mut layout.panels {
                placement.rect.x += offset.left;
                placement.rect.y += offset.top;
            }
        }
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::PlotKind;
    use ccc_data::{ColumnMetadata, ColumnType};
    use serde_json::json;

    fn relational_source() -> TableSource {
        TableSource {
            resultset: vec![
                vec![json!("Jan"), json!("US"), json!(10)],
                vec![json!("Feb"), json!("US"), json!(20)],
                vec![json!("Jan"), json!("EU"), json!(30)],
            ],
            metadata: vec![
                ColumnMetadata {
                    col_index: 0,
                    col_type: ColumnType::String,
                    col_name: "month".to_string(),
                },
                ColumnMetadata {
                    col_index: 1,
                    col_type: ColumnType::String,
                    col_name: "region".to_string(),
                },
                ColumnMetadata {
                    col_index: 2,
                    col_type: ColumnType::Numeric,
                    col_name: "sales".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_bar_build_end_to_end() {
        let chart = Chart::new(ChartSpec::new(PlotKind::Bar));
        let build = chart.build(&relational_source()).unwrap();

        assert_eq!(build.data.datums().len(), 3);
        // First discrete column → category, second → category2.
        assert_eq!(
            build.roles["category"].dimensions,
            vec!["category", "category2"]
        );
        assert_eq!(build.roles["value"].dimensions, vec!["value"]);
        assert!(build.base_axis.is_some());
        assert!(build.layout.content_rect.width > 0.0);
    }

    #[test]
    fn test_no_data_vs_allow_no_data() {
        let empty = TableSource {
            resultset: vec![],
            metadata: relational_source().metadata,
        };
        let chart = Chart::new(ChartSpec::new(PlotKind::Bar));
        let err = chart.build(&empty).unwrap_err();
        assert!(err.is_no_data());

        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.allow_no_data = true;
        let chart = Chart::new(spec);
        let build = chart.build(&empty).unwrap();
        assert_eq!(build.grouped.count(), 0);
        assert!(build.layout.content_rect.width > 0.0);
    }
}
