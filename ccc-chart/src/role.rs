use crate::error::CccChartError;
use crate::spec::ChartSpec;
use ccc_common::value::ValueKind;
use ccc_data::{dimension_group_prefix, ComplexType, DimensionType};
use indexmap::IndexMap;

/// Declarative description of a visual role: what the plot needs,
/// not where it comes from. Binding is the resolver's job.
#[derive(Debug, Clone)]
pub struct VisualRoleSpec {
    pub name: &'static str,
    pub is_measure: bool,
    pub is_required: bool,
    pub require_single_dimension: bool,
    /// Some(true)/Some(false) constrains the bound dimensions'
    /// discreteness; None accepts either.
    pub require_is_discrete: Option<bool>,
    pub default_dimension_group: Option<&'static str>,
    /// When required and nothing binds, synthesize a dimension instead
    /// of failing (used for the category role of single-series data).
    pub auto_create_dimension: bool,
    /// Alias role: after resolution, mirrors another role's bindings.
    pub source_role: Option<&'static str>,
}

impl VisualRoleSpec {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            is_measure: false,
            is_required: false,
            require_single_dimension: false,
            require_is_discrete: None,
            default_dimension_group: None,
            auto_create_dimension: false,
            source_role: None,
        }
    }

    pub fn measure(mut self) -> Self {
        self.is_measure = true;
        self.require_is_discrete = Some(false);
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    pub fn single_dimension(mut self) -> Self {
        self.require_single_dimension = true;
        self
    }

    pub fn discrete(mut self, is_discrete: bool) -> Self {
        self.require_is_discrete = Some(is_discrete);
        self
    }

    pub fn with_default_group(mut self, group: &'static str) -> Self {
        self.default_dimension_group = Some(group);
        self
    }

    pub fn auto_create(mut self) -> Self {
        self.auto_create_dimension = true;
        self
    }

    pub fn sourced_from(mut self, role: &'static str) -> Self {
        self.source_role = Some(role);
        self
    }
}

/// A resolved role: the spec plus the dimension names bound to it,
/// in binding order.
#[derive(Debug, Clone)]
pub struct VisualRole {
    pub spec: VisualRoleSpec,
    pub dimensions: Vec<String>,
}

impl VisualRole {
    pub fn is_bound(&self) -> bool {
        !self.dimensions.is_empty()
    }

    /// The only dimension of a single-dimension role.
    pub fn dimension(&self) -> Option<&str> {
        self.dimensions.first().map(|s| s.as_str())
    }
}

/// Synthetic dimension interned with a single constant atom when a
/// required role auto-creates.
pub const AUTO_DIMENSION_LABEL: &str = "All";

/// Binds every role of the plot's catalog to dimensions of
/// `complex_type`, trying sources in fixed precedence order:
///
/// 1. explicit `visualRoles` entries in the chart spec,
/// 2. the legacy `{role}Dimensions` option,
/// 3. the role's default dimension group,
/// 4. auto-created dimension (required roles that opt in).
///
/// Alias roles (`source_role`) mirror their source after all direct
/// bindings resolve. Constraint violations fail with `RoleConstraint`;
/// a required role left unbound fails with `RoleUnbound`.
pub fn resolve_roles(
    spec: &ChartSpec,
    complex_type: &mut ComplexType,
) -> Result<IndexMap<String, VisualRole>, CccChartError> {
    let catalog = spec.plot.visual_roles();
    let mut roles: IndexMap<String, VisualRole> = IndexMap::new();

    // Explicit bindings are claimed up front so that default-group
    // binding of an earlier role cannot grab a dimension the user gave
    // to a later one.
    let mut claimed: std::collections::HashSet<String> = std::collections::HashSet::new();
    for role_spec in &catalog {
        if role_spec.source_role.is_some() {
            continue;
        }
        let dims = match explicit_binding(spec, role_spec.name) {
            Some(dims) => Some(dims),
            None => legacy_option_binding(spec, role_spec.name)?,
        };
        if let Some(dims) = dims {
            claimed.extend(dims);
        }
    }

    for role_spec in &catalog {
        if role_spec.source_role.is_some() {
            roles.insert(
                role_spec.name.to_string(),
                VisualRole {
                    spec: role_spec.clone(),
                    dimensions: Vec::new(),
                },
            );
            continue;
        }

        let mut dimensions = match explicit_binding(spec, role_spec.name) {
            Some(dims) => dims,
            None => legacy_option_binding(spec, role_spec.name)?.unwrap_or_default(),
        };

        if dimensions.is_empty() {
            if let Some(group) = role_spec.default_dimension_group {
                dimensions = complex_type
                    .group_dimensions(group)
                    .iter()
                    .map(|t| t.name().to_string())
                    .filter(|n| !claimed.contains(n))
                    .collect();
                claimed.extend(dimensions.iter().cloned());
            }
        }

        if dimensions.is_empty() && role_spec.is_required && role_spec.auto_create_dimension {
            let name = complex_type.next_group_name(
                role_spec.default_dimension_group.unwrap_or(role_spec.name),
            );
            let dim_type = DimensionType::new(&name, ValueKind::String).with_discrete(true);
            complex_type.add(dim_type)?;
            log::debug!("role `{}`: auto-created dimension `{}`", role_spec.name, name);
            claimed.insert(name.clone());
            dimensions = vec![name];
        }

        validate_binding(role_spec, &dimensions, complex_type)?;

        roles.insert(
            role_spec.name.to_string(),
            VisualRole {
                spec: role_spec.clone(),
                dimensions,
            },
        );
    }

    // Alias roles mirror their source once it is settled.
    for role_spec in &catalog {
        if let Some(source) = role_spec.source_role {
            let source_dims = roles
                .get(source)
                .map(|r| r.dimensions.clone())
                .unwrap_or_default();
            if let Some(role) = roles.get_mut(role_spec.name) {
                role.dimensions = source_dims;
            }
        }
    }

    Ok(roles)
}

/// Explicit `visualRoles` spec entry: a comma-separated dimension list.
fn explicit_binding(spec: &ChartSpec, role: &str) -> Option<Vec<String>> {
    spec.visual_roles.get(role).map(|s| split_dimension_list(s))
}

/// Legacy v1 dialect: `{role}Dimensions` in the options map, either a
/// string or an array of strings. Any other JSON type is a
/// configuration error.
fn legacy_option_binding(
    spec: &ChartSpec,
    role: &str,
) -> Result<Option<Vec<String>>, CccChartError> {
    let option = format!("{role}Dimensions");
    let Some(value) = spec.options.get(&option) else {
        return Ok(None);
    };
    match value {
        serde_json::Value::String(s) => Ok(Some(split_dimension_list(s))),
        serde_json::Value::Array(items) => Ok(Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )),
        other => Err(CccChartError::InvalidOption {
            option,
            reason: format!(
                "expected a string or an array of strings, got {}",
                json_type_name(other)
            ),
        }),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn split_dimension_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

fn validate_binding(
    role_spec: &VisualRoleSpec,
    dimensions: &[String],
    complex_type: &ComplexType,
) -> Result<(), CccChartError> {
    if dimensions.is_empty() {
        if role_spec.is_required {
            return Err(CccChartError::RoleUnbound(role_spec.name.to_string()));
        }
        return Ok(());
    }

    if role_spec.require_single_dimension && dimensions.len() > 1 {
        return Err(CccChartError::RoleConstraint {
            role: role_spec.name.to_string(),
            reason: format!("accepts a single dimension, got {}", dimensions.len()),
        });
    }

    // Multi-dimension bindings must stay within one dimension group.
    if dimensions.len() > 1 {
        let prefix = dimension_group_prefix(&dimensions[0]).to_string();
        if let Some(stray) = dimensions
            .iter()
            .find(|d| dimension_group_prefix(d) != prefix)
        {
            return Err(CccChartError::RoleConstraint {
                role: role_spec.name.to_string(),
                reason: format!(
                    "dimensions must share one group, `{stray}` is outside group `{prefix}`"
                ),
            });
        }
    }

    for name in dimensions {
        let dim_type = complex_type.dimension(name).ok_or_else(|| {
            CccChartError::RoleConstraint {
                role: role_spec.name.to_string(),
                reason: format!("unknown dimension `{name}`"),
            }
        })?;
        if let Some(required) = role_spec.require_is_discrete {
            if dim_type.is_discrete() != required {
                let expected = if required { "discrete" } else { "continuous" };
                return Err(CccChartError::RoleConstraint {
                    role: role_spec.name.to_string(),
                    reason: format!("dimension `{name}` must be {expected}"),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::PlotKind;
    use serde_json::json;

    fn sales_type() -> ComplexType {
        let mut ct = ComplexType::new();
        ct.add(DimensionType::new("category", ValueKind::String).with_discrete(true))
            .unwrap();
        ct.add(DimensionType::new("series", ValueKind::String).with_discrete(true))
            .unwrap();
        ct.add(DimensionType::new("value", ValueKind::Number)).unwrap();
        ct
    }

    #[test]
    fn test_default_group_binding() {
        let spec = ChartSpec::new(PlotKind::Bar);
        let mut ct = sales_type();
        let roles = resolve_roles(&spec, &mut ct).unwrap();
        assert_eq!(roles["value"].dimensions, vec!["value"]);
        assert_eq!(roles["category"].dimensions, vec!["category"]);
        assert_eq!(roles["series"].dimensions, vec!["series"]);
        // Color mirrors series.
        assert_eq!(roles["color"].dimensions, vec!["series"]);
    }

    #[test]
    fn test_explicit_binding_overrides_default() {
        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.visual_roles
            .insert("series".to_string(), "category".to_string());
        let mut ct = sales_type();
        let roles = resolve_roles(&spec, &mut ct).unwrap();
        assert_eq!(roles["series"].dimensions, vec!["category"]);
        assert_eq!(roles["color"].dimensions, vec!["category"]);
    }

    #[test]
    fn test_explicit_binding_excludes_dimension_from_default_groups() {
        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.visual_roles
            .insert("series".to_string(), "category2".to_string());
        let mut ct = sales_type();
        ct.add(DimensionType::new("category2", ValueKind::String).with_discrete(true))
            .unwrap();
        let roles = resolve_roles(&spec, &mut ct).unwrap();
        // category2 is spoken for; the category role's default group
        // only picks up what is left.
        assert_eq!(roles["category"].dimensions, vec!["category"]);
        assert_eq!(roles["series"].dimensions, vec!["category2"]);
    }

    #[test]
    fn test_legacy_option_binding() {
        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.options
            .insert("seriesDimensions".to_string(), json!("category"));
        let mut ct = sales_type();
        let roles = resolve_roles(&spec, &mut ct).unwrap();
        assert_eq!(roles["series"].dimensions, vec!["category"]);
    }

    #[test]
    fn test_malformed_legacy_option_is_invalid() {
        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.options.insert("seriesDimensions".to_string(), json!(42));
        let mut ct = sales_type();
        let err = resolve_roles(&spec, &mut ct).unwrap_err();
        assert!(
            matches!(err, CccChartError::InvalidOption { ref option, .. } if option == "seriesDimensions")
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn test_explicit_beats_legacy_option() {
        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.visual_roles
            .insert("series".to_string(), "series".to_string());
        spec.options
            .insert("seriesDimensions".to_string(), json!("category"));
        let mut ct = sales_type();
        let roles = resolve_roles(&spec, &mut ct).unwrap();
        assert_eq!(roles["series"].dimensions, vec!["series"]);
    }

    #[test]
    fn test_required_role_unbound_fails() {
        let spec = ChartSpec::new(PlotKind::Bar);
        let mut ct = ComplexType::new();
        ct.add(DimensionType::new("category", ValueKind::String).with_discrete(true))
            .unwrap();
        let err = resolve_roles(&spec, &mut ct).unwrap_err();
        assert!(matches!(err, CccChartError::RoleUnbound(ref r) if r == "value"));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_category_auto_creates_when_missing() {
        let spec = ChartSpec::new(PlotKind::Bar);
        let mut ct = ComplexType::new();
        ct.add(DimensionType::new("value", ValueKind::Number)).unwrap();
        let roles = resolve_roles(&spec, &mut ct).unwrap();
        assert_eq!(roles["category"].dimensions, vec!["category"]);
        assert!(ct.has("category"));
        assert!(ct.dimension("category").unwrap().is_discrete());
    }

    #[test]
    fn test_measure_role_rejects_discrete_dimension() {
        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.visual_roles
            .insert("value".to_string(), "category".to_string());
        let mut ct = sales_type();
        let err = resolve_roles(&spec, &mut ct).unwrap_err();
        assert!(matches!(err, CccChartError::RoleConstraint { ref role, .. } if role == "value"));
    }

    #[test]
    fn test_single_dimension_constraint() {
        let mut spec = ChartSpec::new(PlotKind::Scatter);
        spec.visual_roles
            .insert("x".to_string(), "value, value2".to_string());
        let mut ct = ComplexType::new();
        ct.add(DimensionType::new("value", ValueKind::Number)).unwrap();
        ct.add(DimensionType::new("value2", ValueKind::Number)).unwrap();
        ct.add(DimensionType::new("series", ValueKind::String).with_discrete(true))
            .unwrap();
        let err = resolve_roles(&spec, &mut ct).unwrap_err();
        assert!(matches!(err, CccChartError::RoleConstraint { ref role, .. } if role == "x"));
    }

    #[test]
    fn test_multi_dimension_binding_must_share_group() {
        let mut spec = ChartSpec::new(PlotKind::Bar);
        spec.visual_roles
            .insert("value".to_string(), "value, other".to_string());
        let mut ct = sales_type();
        ct.add(DimensionType::new("other", ValueKind::Number)).unwrap();
        let err = resolve_roles(&spec, &mut ct).unwrap_err();
        assert!(matches!(err, CccChartError::RoleConstraint { .. }));
    }
}
