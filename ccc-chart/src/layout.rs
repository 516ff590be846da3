use ccc_common::text::TextMeasurer;

/// Safety cap on layout re-measurement. When panels keep reporting new
/// overflow past this many passes the last computed layout is kept.
pub const MAX_LAYOUT_ITERATIONS: usize = 3;

const OVERFLOW_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Sides {
    pub fn uniform(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn is_negligible(&self) -> bool {
        self.top < OVERFLOW_EPSILON
            && self.right < OVERFLOW_EPSILON
            && self.bottom < OVERFLOW_EPSILON
            && self.left < OVERFLOW_EPSILON
    }

    /// Component-wise `self - other`, clamped at zero.
    pub fn saturating_sub(&self, other: &Sides) -> Sides {
        Sides {
            top: (self.top - other.top).max(0.0),
            right: (self.right - other.right).max(0.0),
            bottom: (self.bottom - other.bottom).max(0.0),
            left: (self.left - other.left).max(0.0),
        }
    }

    pub fn add(&self, other: &Sides) -> Sides {
        Sides {
            top: self.top + other.top,
            right: self.right + other.right,
            bottom: self.bottom + other.bottom,
            left: self.left + other.left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Shrinks the rect inward on each side; never inverts.
    pub fn inset(&self, sides: &Sides) -> Rect {
        let width = (self.width - sides.left - sides.right).max(0.0);
        let height = (self.height - sides.top - sides.bottom).max(0.0);
        Rect::new(self.x + sides.left, self.y + sides.top, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dock {
    Top,
    Bottom,
    Left,
    Right,
    Fill,
}

/// Collaborators a panel can use while measuring: the shared text
/// measurer and the paddings the layout has accumulated so far.
pub struct MeasureContext<'a> {
    pub measurer: &'a dyn TextMeasurer,
    pub paddings: &'a Sides,
}

/// One dockable chart element (axis, title, legend, plot area).
///
/// Measurement is split in two: `measure` yields the docked thickness
/// given the space still available, and `overflow` reports how far the
/// panel's content spills past the content rect once it is known.
/// Overflow feeds back into the next pass as content paddings.
pub trait DockPanel {
    fn dock(&self) -> Dock;

    /// Thickness along the docking axis (height for Top/Bottom, width
    /// for Left/Right). Fill panels are not asked.
    fn measure(&self, available: Size, ctx: &MeasureContext) -> f32;

    fn overflow(&self, _content: &Rect, _ctx: &MeasureContext) -> Sides {
        Sides::default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PanelPlacement {
    pub dock: Dock,
    pub rect: Rect,
}

/// The committed result of a layout run. `panels` is parallel to the
/// panel slice given to `DockLayout::layout`.
#[derive(Debug, Clone)]
pub struct LayoutInfo {
    pub client_size: Size,
    pub content_rect: Rect,
    pub paddings: Sides,
    pub panels: Vec<PanelPlacement>,
    /// Number of measurement passes taken.
    pub iterations: usize,
}

/// Iterative docking layout.
///
/// Each pass measures docked panels against the remaining space, carves
/// their rects from the client rect in panel order, and insets the
/// remainder by the accumulated paddings to get the content rect.
/// Panels then report overflow against that content rect; the residual
/// (overflow not already absorbed by paddings) grows the paddings and
/// triggers another pass. The loop stops when the residual is
/// negligible or after `MAX_LAYOUT_ITERATIONS`, keeping the last
/// computed layout either way.
#[derive(Debug, Clone, Default)]
pub struct DockLayout;

impl DockLayout {
    pub fn layout(
        &self,
        client_size: Size,
        panels: &[&dyn DockPanel],
        measurer: &dyn TextMeasurer,
    ) -> LayoutInfo {
        let mut paddings = Sides::default();
        let mut iterations = 0;

        loop {
            iterations += 1;
            let ctx = MeasureContext {
                measurer,
                paddings: &paddings,
            };

            let mut remaining = Rect::from_size(client_size);
            let mut placements = Vec::with_capacity(panels.len());
            let mut fill_indices = Vec::new();

            for (i, panel) in panels.iter().enumerate() {
                let dock = panel.dock();
                if dock == Dock::Fill {
                    placements.push(PanelPlacement {
                        dock,
                        rect: Rect::default(),
                    });
                    fill_indices.push(i);
                    continue;
                }
                let thickness = panel.measure(remaining.size(), &ctx).max(0.0);
                let rect = carve(&mut remaining, dock, thickness);
                placements.push(PanelPlacement { dock, rect });
            }

            let content_rect = remaining.inset(&paddings);
            for i in fill_indices {
                placements[i].rect = content_rect;
            }

            let mut overflow = Sides::default();
            for panel in panels {
                let o = panel.overflow(&content_rect, &ctx);
                overflow.top = overflow.top.max(o.top);
                overflow.right = overflow.right.max(o.right);
                overflow.bottom = overflow.bottom.max(o.bottom);
                overflow.left = overflow.left.max(o.left);
            }
            let residual = overflow.saturating_sub(&paddings);

            if residual.is_negligible() || iterations >= MAX_LAYOUT_ITERATIONS {
                if !residual.is_negligible() {
                    log::warn!(
                        "layout did not converge after {iterations} passes; keeping last layout"
                    );
                }
                return LayoutInfo {
                    client_size,
                    content_rect,
                    paddings,
                    panels: placements,
                    iterations,
                };
            }
            paddings = paddings.add(&residual);
        }
    }
}

fn carve(remaining: &mut Rect, dock: Dock, thickness: f32) -> Rect {
    let t = thickness.min(match dock {
        Dock::Top | Dock::Bottom => remaining.height,
        Dock::Left | Dock::Right => remaining.width,
        Dock::Fill => 0.0,
    });
    match dock {
        Dock::Top => {
            let rect = Rect::new(remaining.x, remaining.y, remaining.width, t);
            remaining.y += t;
            remaining.height -= t;
            rect
        }
        Dock::Bottom => {
            let rect = Rect::new(
                remaining.x,
                remaining.y + remaining.height - t,
                remaining.width,
                t,
            );
            remaining.height -= t;
            rect
        }
        Dock::Left => {
            let rect = Rect::new(remaining.x, remaining.y, t, remaining.height);
            remaining.x += t;
            remaining.width -= t;
            rect
        }
        Dock::Right => {
            let rect = Rect::new(
                remaining.x + remaining.width - t,
                remaining.y,
                t,
                remaining.height,
            );
            remaining.width -= t;
            rect
        }
        Dock::Fill => Rect::default(),
    }
}
