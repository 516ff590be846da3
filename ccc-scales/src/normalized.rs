use crate::linear::LinearScale;

/// A scale whose range span is fixed regardless of the data extent:
/// angle axes map to [0, 2π], 100%-stacked ortho axes to [0, 1].
///
/// Domain values are normalized against a total before mapping, so the
/// scale is rebuilt whenever the total changes.
#[derive(Debug, Clone)]
pub struct NormalizedScale {
    total: f64,
    inner: LinearScale,
}

impl NormalizedScale {
    /// `span` is the fixed range, e.g. `(0.0, std::f64::consts::TAU)`
    /// for an angle axis.
    pub fn new(total: f64, span: (f64, f64)) -> Self {
        Self {
            total,
            inner: LinearScale::default()
                .with_domain((0.0, 1.0))
                .with_range(span)
                .with_clamp(true),
        }
    }

    pub fn angle(total: f64) -> Self {
        Self::new(total, (0.0, std::f64::consts::TAU))
    }

    pub fn percent(total: f64) -> Self {
        Self::new(total, (0.0, 1.0))
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn span(&self) -> (f64, f64) {
        self.inner.range()
    }

    /// Maps an absolute value to its share of the span.
    pub fn scale(&self, value: f64) -> f64 {
        if self.total == 0.0 || self.total.is_nan() {
            return self.inner.scale(0.0);
        }
        self.inner.scale(value / self.total)
    }
}
