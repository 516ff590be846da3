//! Declarative chart assembly: visual role resolution, axis and scale
//! binding, and the iterative docking layout, driven by a JSON chart
//! spec over the `ccc-data` grouping engine.

pub mod axis;
pub mod chart;
pub mod context;
pub mod error;
pub mod layout;
pub mod panel;
pub mod plot;
pub mod role;
pub mod spec;

pub use axis::{Axis, AxisType, ResolvedScale};
pub use chart::{Chart, ChartBuild, DEFAULT_PALETTE};
pub use context::BuildContext;
pub use error::CccChartError;
pub use layout::{Dock, DockLayout, DockPanel, LayoutInfo, Rect, Sides, Size};
pub use plot::PlotKind;
pub use role::{resolve_roles, VisualRole, VisualRoleSpec};
pub use spec::{AxisSpec, ChartSpec, DimensionSpec};
