use crate::layout::{Dock, DockPanel, MeasureContext, Rect, Sides, Size};
use ccc_common::text::FontSpec;

pub const TICK_SIZE: f32 = 5.0;
pub const LABEL_GAP: f32 = 3.0;
pub const TITLE_GAP: f32 = 5.0;
pub const LEGEND_SWATCH: f32 = 12.0;
pub const LEGEND_GAP: f32 = 4.0;

/// Bottom-docked base axis. Thickness is tick + label height; overflow
/// is how far the first/last labels stick out past the content rect's
/// left/right edges.
///
/// Discrete axes center labels on band midpoints; continuous axes put
/// end ticks on the content edges, so half of each end label always
/// overflows.
pub struct BaseAxisPanel {
    labels: Vec<String>,
    edge_aligned: bool,
    font: FontSpec,
    fixed_size: Option<f32>,
}

impl BaseAxisPanel {
    pub fn discrete(labels: Vec<String>, font: FontSpec, fixed_size: Option<f32>) -> Self {
        Self {
            labels,
            edge_aligned: false,
            font,
            fixed_size,
        }
    }

    pub fn continuous(labels: Vec<String>, font: FontSpec, fixed_size: Option<f32>) -> Self {
        Self {
            labels,
            edge_aligned: true,
            font,
            fixed_size,
        }
    }
}

impl DockPanel for BaseAxisPanel {
    fn dock(&self) -> Dock {
        Dock::Bottom
    }

    fn measure(&self, _available: Size, ctx: &MeasureContext) -> f32 {
        if let Some(size) = self.fixed_size {
            return size;
        }
        if self.labels.is_empty() {
            return 0.0;
        }
        let height = ctx.measurer.measure_text("Mg", &self.font).height;
        TICK_SIZE + LABEL_GAP + height
    }

    fn overflow(&self, content: &Rect, ctx: &MeasureContext) -> Sides {
        let n = self.labels.len();
        if n == 0 || content.width <= 0.0 {
            return Sides::default();
        }
        // Distance from the content edge to the end label's center:
        // zero for edge-aligned ticks, half a band step otherwise.
        let inset = if self.edge_aligned {
            0.0
        } else {
            content.width / n as f32 / 2.0
        };
        let first = ctx.measurer.measure_text(&self.labels[0], &self.font).width;
        let last = ctx
            .measurer
            .measure_text(&self.labels[n - 1], &self.font)
            .width;
        Sides {
            left: (first / 2.0 - inset).max(0.0),
            right: (last / 2.0 - inset).max(0.0),
            ..Default::default()
        }
    }
}

/// Left-docked continuous axis. The tick values only depend on the
/// resolved domain, so they can be generated before a range exists.
pub struct NumericAxisPanel {
    domain: (f64, f64),
    desired_tick_count: Option<usize>,
    font: FontSpec,
    fixed_size: Option<f32>,
}

impl NumericAxisPanel {
    pub fn new(
        domain: (f64, f64),
        desired_tick_count: Option<usize>,
        font: FontSpec,
        fixed_size: Option<f32>,
    ) -> Self {
        Self {
            domain,
            desired_tick_count,
            font,
            fixed_size,
        }
    }

    fn tick_labels(&self) -> Vec<String> {
        let count = self.desired_tick_count.unwrap_or(10) as f64;
        ccc_scales::array::ticks(self.domain.0, self.domain.1, count)
            .into_iter()
            .map(crate::axis::format_tick)
            .collect()
    }
}

impl DockPanel for NumericAxisPanel {
    fn dock(&self) -> Dock {
        Dock::Left
    }

    fn measure(&self, _available: Size, ctx: &MeasureContext) -> f32 {
        if let Some(size) = self.fixed_size {
            return size;
        }
        let widest = self
            .tick_labels()
            .iter()
            .map(|l| ctx.measurer.measure_text(l, &self.font).width)
            .fold(0.0f32, f32::max);
        if widest == 0.0 {
            return 0.0;
        }
        widest + LABEL_GAP + TICK_SIZE
    }

    fn overflow(&self, _content: &Rect, ctx: &MeasureContext) -> Sides {
        if self.tick_labels().is_empty() {
            return Sides::default();
        }
        // End tick labels are vertically centered on the content edge.
        let half = ctx.measurer.measure_text("0", &self.font).height / 2.0;
        Sides {
            top: half,
            bottom: half,
            ..Default::default()
        }
    }
}

/// Top-docked chart title.
pub struct TitlePanel<'a> {
    text: &'a str,
    font: FontSpec,
}

impl<'a> TitlePanel<'a> {
    pub fn new(text: &'a str, font: FontSpec) -> Self {
        Self { text, font }
    }
}

impl DockPanel for TitlePanel<'_> {
    fn dock(&self) -> Dock {
        Dock::Top
    }

    fn measure(&self, _available: Size, ctx: &MeasureContext) -> f32 {
        if self.text.is_empty() {
            return 0.0;
        }
        ctx.measurer.measure_text(self.text, &self.font).height + TITLE_GAP
    }
}

/// Right-docked legend: one swatch + label per color-domain entry.
pub struct LegendPanel<'a> {
    labels: &'a [String],
    font: FontSpec,
}

impl<'a> LegendPanel<'a> {
    pub fn new(labels: &'a [String], font: FontSpec) -> Self {
        Self { labels, font }
    }
}

impl DockPanel for LegendPanel<'_> {
    fn dock(&self) -> Dock {
        Dock::Right
    }

    fn measure(&self, _available: Size, ctx: &MeasureContext) -> f32 {
        let widest = self
            .labels
            .iter()
            .map(|l| ctx.measurer.measure_text(l, &self.font).width)
            .fold(0.0f32, f32::max);
        if widest == 0.0 {
            return 0.0;
        }
        LEGEND_SWATCH + LEGEND_GAP + widest + LEGEND_GAP
    }
}

/// The plot area itself; fills whatever the docked panels leave.
pub struct PlotPanel;

impl DockPanel for PlotPanel {
    fn dock(&self) -> Dock {
        Dock::Fill
    }

    fn measure(&self, _available: Size, _ctx: &MeasureContext) -> f32 {
        0.0
    }
}
