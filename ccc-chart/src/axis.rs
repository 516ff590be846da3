use crate::error::CccChartError;
use crate::role::VisualRole;
use ccc_data::{Data, DatumFilter, KEY_SEPARATOR};
use ccc_scales::{
    BandScale, BandScaleConfig, ContinuousDomainOptions, LinearScale, LinearScaleConfig,
    NormalizedScale, OrdinalScale,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AxisType {
    Base,
    Ortho,
    Color,
    /// Not materialized by the build pipeline; renderers mapping a
    /// bound `size` role build a size axis through the same machinery.
    Size,
    Angle,
}

/// A scale resolved for one axis. The variant is decided by the axis
/// type and the discreteness of the bound role.
#[derive(Debug, Clone)]
pub enum ResolvedScale {
    Continuous(LinearScale),
    Discrete(BandScale),
    Color(OrdinalScale<String, String>),
    Normalized(NormalizedScale),
}

/// An axis binds one visual role's dimensions and later resolves a
/// scale over them. Binding and scale resolution are separate steps:
/// the layout needs the domain (to measure labels) before the range
/// (which the layout itself produces) is known.
#[derive(Debug, Clone)]
pub struct Axis {
    pub axis_type: AxisType,
    pub role: String,
    pub dimensions: Vec<String>,
    pub is_discrete: bool,
    /// Discrete domain, composite keys in first-occurrence order.
    pub domain_keys: Vec<String>,
    /// Display labels, parallel to `domain_keys`.
    pub domain_labels: Vec<String>,
    /// Continuous data extent; None when no numeric data was seen.
    pub extent: Option<(f64, f64)>,
    scale: Option<ResolvedScale>,
}

impl Axis {
    pub fn new(axis_type: AxisType, role: impl Into<String>) -> Self {
        Self {
            axis_type,
            role: role.into(),
            dimensions: Vec::new(),
            is_discrete: false,
            domain_keys: Vec::new(),
            domain_labels: Vec::new(),
            extent: None,
            scale: None,
        }
    }

    /// Binds the role's dimensions and collects the domain from the
    /// data's visible datums. Any previously resolved scale is dropped;
    /// a stale scale over a new domain is worse than no scale.
    pub fn bind(&mut self, role: &VisualRole, data: &Data, filter: &DatumFilter) {
        self.dimensions = role.dimensions.clone();
        self.scale = None;
        self.domain_keys.clear();
        self.domain_labels.clear();
        self.extent = None;

        self.is_discrete = self
            .dimensions
            .first()
            .and_then(|d| data.complex_type().dimension(d))
            .map(|t| t.is_discrete())
            .unwrap_or(false);

        if self.is_discrete {
            self.collect_discrete_domain(data, filter);
        } else {
            self.extent = continuous_extent(data, &self.dimensions, filter);
        }
    }

    fn collect_discrete_domain(&mut self, data: &Data, filter: &DatumFilter) {
        let mut seen = indexmap::IndexMap::new();
        for datum in data.datums() {
            if !filter.matches(datum) {
                continue;
            }
            let mut key_parts = Vec::with_capacity(self.dimensions.len());
            let mut label_parts = Vec::with_capacity(self.dimensions.len());
            for dim in &self.dimensions {
                if let Some(atom) = datum.atom(dim) {
                    key_parts.push(atom.key().to_string());
                    label_parts.push(atom.label().to_string());
                }
            }
            let key = key_parts.join(KEY_SEPARATOR);
            seen.entry(key).or_insert_with(|| label_parts.join(KEY_SEPARATOR));
        }
        for (key, label) in seen {
            self.domain_keys.push(key);
            self.domain_labels.push(label);
        }
    }

    /// Continuous scale over the resolved domain, niced to the tick
    /// count when asked.
    pub fn resolve_continuous(
        &mut self,
        options: &ContinuousDomainOptions,
        range: (f64, f64),
        nice: Option<usize>,
    ) -> Result<(), CccChartError> {
        let domain = options.resolve(self.extent)?;
        self.scale = Some(ResolvedScale::Continuous(LinearScale::new(
            &LinearScaleConfig {
                domain,
                range,
                nice,
                ..Default::default()
            },
        )));
        Ok(())
    }

    /// Band scale over the discrete domain.
    pub fn resolve_discrete(&mut self, range: (f64, f64)) -> Result<(), CccChartError> {
        let scale = BandScale::try_new(
            self.domain_keys.clone(),
            &BandScaleConfig {
                range,
                ..Default::default()
            },
        )?;
        self.scale = Some(ResolvedScale::Discrete(scale));
        Ok(())
    }

    /// Palette scale over the discrete domain; the palette cycles when
    /// shorter than the domain.
    pub fn resolve_color(&mut self, palette: &[String]) -> Result<(), CccChartError> {
        let scale = OrdinalScale::new(&self.domain_keys, palette, "#cccccc".to_string())?;
        self.scale = Some(ResolvedScale::Color(scale));
        Ok(())
    }

    /// Angle scale over a value total (pie charts).
    pub fn resolve_angle(&mut self, total: f64) {
        self.scale = Some(ResolvedScale::Normalized(NormalizedScale::angle(total)));
    }

    pub fn scale(&self) -> Option<&ResolvedScale> {
        self.scale.as_ref()
    }

    pub fn linear(&self) -> Option<&LinearScale> {
        match &self.scale {
            Some(ResolvedScale::Continuous(s)) => Some(s),
            _ => None,
        }
    }

    pub fn band(&self) -> Option<&BandScale> {
        match &self.scale {
            Some(ResolvedScale::Discrete(s)) => Some(s),
            _ => None,
        }
    }

    pub fn ordinal(&self) -> Option<&OrdinalScale<String, String>> {
        match &self.scale {
            Some(ResolvedScale::Color(s)) => Some(s),
            _ => None,
        }
    }

    pub fn normalized(&self) -> Option<&NormalizedScale> {
        match &self.scale {
            Some(ResolvedScale::Normalized(s)) => Some(s),
            _ => None,
        }
    }

    /// Labels the axis panel has to fit: discrete domain labels, or
    /// formatted tick values once a continuous scale is resolved.
    pub fn display_labels(&self, desired_tick_count: Option<usize>) -> Vec<String> {
        if self.is_discrete {
            return self.domain_labels.clone();
        }
        match self.linear() {
            Some(scale) => scale
                .ticks(desired_tick_count)
                .into_iter()
                .map(format_tick)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Numeric extent across one or more dimensions, honoring the datum
/// filter; nulls and non-numeric atoms do not contribute.
pub fn continuous_extent(
    data: &Data,
    dimensions: &[String],
    filter: &DatumFilter,
) -> Option<(f64, f64)> {
    let mut extent: Option<(f64, f64)> = None;
    for datum in data.datums() {
        if !filter.matches(datum) {
            continue;
        }
        for dim in dimensions {
            let Some(v) = datum.atom(dim).and_then(|a| a.number()) else {
                continue;
            };
            extent = Some(match extent {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            });
        }
    }
    extent
}

/// Shortest round-trip decimal for tick labels (2.0 prints as "2").
pub fn format_tick(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::PlotKind;
    use crate::role::resolve_roles;
    use crate::spec::ChartSpec;
    use ccc_common::value::ValueKind;
    use ccc_data::{ComplexType, DimensionType};
    use float_cmp::assert_approx_eq;
    use serde_json::json;

    fn sample_data() -> Data {
        let mut ct = ComplexType::new();
        ct.add(DimensionType::new("category", ValueKind::String).with_discrete(true))
            .unwrap();
        ct.add(DimensionType::new("series", ValueKind::String).with_discrete(true))
            .unwrap();
        ct.add(DimensionType::new("value", ValueKind::Number)).unwrap();
        let mut data = Data::new(ct);
        for (c, s, v) in [
            ("B", "east", 10.0),
            ("A", "east", 25.0),
            ("B", "west", -5.0),
            ("C", "west", 40.0),
        ] {
            data.add_row([
                ("category", &json!(c)),
                ("series", &json!(s)),
                ("value", &json!(v)),
            ])
            .unwrap();
        }
        data
    }

    #[test]
    fn test_discrete_domain_keeps_first_occurrence_order() {
        let spec = ChartSpec::new(PlotKind::Bar);
        let data = sample_data();
        let mut ct = data.complex_type().clone();
        let roles = resolve_roles(&spec, &mut ct).unwrap();

        let mut axis = Axis::new(AxisType::Base, "category");
        axis.bind(&roles["category"], &data, &DatumFilter::visible());
        assert_eq!(axis.domain_keys, vec!["B", "A", "C"]);
        assert!(axis.is_discrete);
    }

    #[test]
    fn test_continuous_extent_and_scale() {
        let spec = ChartSpec::new(PlotKind::Bar);
        let data = sample_data();
        let mut ct = data.complex_type().clone();
        let roles = resolve_roles(&spec, &mut ct).unwrap();

        let mut axis = Axis::new(AxisType::Ortho, "value");
        axis.bind(&roles["value"], &data, &DatumFilter::visible());
        assert_eq!(axis.extent, Some((-5.0, 40.0)));

        axis.resolve_continuous(&ContinuousDomainOptions::default(), (300.0, 0.0), None)
            .unwrap();
        let scale = axis.linear().unwrap();
        assert_approx_eq!(f64, scale.scale(-5.0), 300.0);
        assert_approx_eq!(f64, scale.scale(40.0), 0.0);
    }

    #[test]
    fn test_rebinding_resets_the_scale() {
        let spec = ChartSpec::new(PlotKind::Bar);
        let data = sample_data();
        let mut ct = data.complex_type().clone();
        let roles = resolve_roles(&spec, &mut ct).unwrap();

        let mut axis = Axis::new(AxisType::Ortho, "value");
        axis.bind(&roles["value"], &data, &DatumFilter::visible());
        axis.resolve_continuous(&ContinuousDomainOptions::default(), (0.0, 100.0), None)
            .unwrap();
        assert!(axis.scale().is_some());

        axis.bind(&roles["value"], &data, &DatumFilter::visible());
        assert!(axis.scale().is_none());
    }

    #[test]
    fn test_color_axis_cycles_palette() {
        let spec = ChartSpec::new(PlotKind::Bar);
        let data = sample_data();
        let mut ct = data.complex_type().clone();
        let roles = resolve_roles(&spec, &mut ct).unwrap();

        let mut axis = Axis::new(AxisType::Color, "color");
        axis.bind(&roles["color"], &data, &DatumFilter::visible());
        assert_eq!(axis.domain_keys, vec!["east", "west"]);
        axis.resolve_color(&["#111111".to_string()]).unwrap();
        let scale = axis.ordinal().unwrap();
        assert_eq!(scale.scale(&"west".to_string()), "#111111");
        assert_eq!(scale.scale(&"unknown".to_string()), "#cccccc");
    }

    #[test]
    fn test_tick_formatting() {
        assert_eq!(format_tick(2.0), "2");
        assert_eq!(format_tick(2.5), "2.5");
        assert_eq!(format_tick(-10.0), "-10");
    }
}
