use crate::role::VisualRoleSpec;
use serde::{Deserialize, Serialize};

/// The chart families this engine lays out. Each kind is a data-level
/// catalog of visual roles plus a couple of axis flags; there is no
/// per-kind subclassing, the build pipeline composes behavior from
/// these descriptors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlotKind {
    #[default]
    Bar,
    Line,
    Area,
    Scatter,
    Pie,
}

impl PlotKind {
    pub fn is_cartesian(&self) -> bool {
        !matches!(self, PlotKind::Pie)
    }

    pub fn uses_angle_axis(&self) -> bool {
        matches!(self, PlotKind::Pie)
    }

    /// Whether null cells of a series can be interpolated (continuous
    /// cartesian marks only).
    pub fn supports_interpolation(&self) -> bool {
        matches!(self, PlotKind::Line | PlotKind::Area | PlotKind::Bar)
    }

    /// The dimension group that receives leftover free discrete
    /// columns during translation.
    pub fn discrete_target_group(&self) -> &'static str {
        match self {
            PlotKind::Scatter => "series",
            _ => "category",
        }
    }

    /// Role feeding the base (horizontal) axis.
    pub fn base_role(&self) -> Option<&'static str> {
        match self {
            PlotKind::Pie => None,
            PlotKind::Scatter => Some("x"),
            _ => Some("category"),
        }
    }

    /// Role feeding the ortho (vertical) axis.
    pub fn ortho_role(&self) -> Option<&'static str> {
        match self {
            PlotKind::Pie => None,
            PlotKind::Scatter => Some("y"),
            _ => Some("value"),
        }
    }

    /// Role whose discrete values feed the color axis and legend.
    pub fn color_source_role(&self) -> &'static str {
        match self {
            PlotKind::Pie => "category",
            _ => "series",
        }
    }

    /// The role catalog, in declaration order. Order matters: unbound
    /// measure roles consume free continuous columns in exactly this
    /// order.
    pub fn visual_roles(&self) -> Vec<VisualRoleSpec> {
        match self {
            PlotKind::Bar => vec![
                VisualRoleSpec::new("value")
                    .measure()
                    .required()
                    .with_default_group("value"),
                VisualRoleSpec::new("category")
                    .required()
                    .discrete(true)
                    .with_default_group("category")
                    .auto_create(),
                VisualRoleSpec::new("series").discrete(true).with_default_group("series"),
                VisualRoleSpec::new("color").sourced_from("series"),
            ],
            PlotKind::Line | PlotKind::Area => vec![
                VisualRoleSpec::new("value")
                    .measure()
                    .required()
                    .with_default_group("value"),
                VisualRoleSpec::new("category")
                    .required()
                    .with_default_group("category")
                    .auto_create(),
                VisualRoleSpec::new("series").discrete(true).with_default_group("series"),
                VisualRoleSpec::new("color").sourced_from("series"),
            ],
            PlotKind::Scatter => vec![
                VisualRoleSpec::new("x")
                    .measure()
                    .required()
                    .single_dimension()
                    .with_default_group("value"),
                VisualRoleSpec::new("y")
                    .measure()
                    .required()
                    .single_dimension()
                    .with_default_group("value"),
                VisualRoleSpec::new("size").measure().with_default_group("value"),
                VisualRoleSpec::new("series").discrete(true).with_default_group("series"),
                VisualRoleSpec::new("color").sourced_from("series"),
            ],
            PlotKind::Pie => vec![
                VisualRoleSpec::new("value")
                    .measure()
                    .required()
                    .single_dimension()
                    .with_default_group("value"),
                VisualRoleSpec::new("category")
                    .required()
                    .discrete(true)
                    .with_default_group("category")
                    .auto_create(),
                VisualRoleSpec::new("color").sourced_from("category"),
            ],
        }
    }
}
