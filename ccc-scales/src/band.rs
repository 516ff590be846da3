use crate::error::CccScaleError;
use indexmap::IndexMap;

#[derive(Clone, Debug)]
pub struct BandScaleConfig {
    pub range: (f64, f64),
    pub padding_inner: f64,
    pub padding_outer: f64,
    pub align: f64,
    pub round: bool,
}

impl Default for BandScaleConfig {
    fn default() -> Self {
        Self {
            range: (0.0, 1.0),
            padding_inner: 0.0,
            padding_outer: 0.0,
            align: 0.5,
            round: false,
        }
    }
}

/// Divides a continuous range into uniform bands over an ordered
/// discrete domain.
///
/// The domain keeps the order it was given — for grouped chart data
/// that is first-occurrence order, which the renderer relies on.
/// A point scale is a band scale with inner padding 1 (zero-width
/// bands).
#[derive(Debug, Clone)]
pub struct BandScale {
    positions: IndexMap<String, f64>,
    range: (f64, f64),
    padding_inner: f64,
    padding_outer: f64,
    align: f64,
    round: bool,
    bandwidth: f64,
    step: f64,
}

impl BandScale {
    pub fn try_new(
        domain: Vec<String>,
        config: &BandScaleConfig,
    ) -> Result<Self, CccScaleError> {
        if domain.is_empty() {
            return Err(CccScaleError::EmptyDomain);
        }
        let mut this = Self {
            positions: domain.into_iter().map(|k| (k, f64::NAN)).collect(),
            range: config.range,
            padding_inner: config.padding_inner.clamp(0.0, 1.0),
            padding_outer: config.padding_outer.max(0.0),
            align: config.align.clamp(0.0, 1.0),
            round: config.round,
            bandwidth: 0.0,
            step: 0.0,
        };
        this.rescale();
        Ok(this)
    }

    /// A scale placing each domain value at a point (no band width).
    pub fn try_new_point(
        domain: Vec<String>,
        range: (f64, f64),
        padding_outer: f64,
    ) -> Result<Self, CccScaleError> {
        Self::try_new(
            domain,
            &BandScaleConfig {
                range,
                padding_inner: 1.0,
                padding_outer,
                ..Default::default()
            },
        )
    }

    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range = range;
        self.rescale();
        self
    }

    fn rescale(&mut self) {
        let n = self.positions.len();
        let reverse = self.range.1 < self.range.0;
        let (start, stop) = if reverse {
            (self.range.1, self.range.0)
        } else {
            (self.range.0, self.range.1)
        };

        let space = bandspace(n, self.padding_inner, self.padding_outer);
        let mut step = (stop - start) / space.max(1.0);
        if self.round {
            step = step.floor();
        }
        let mut offset =
            start + (stop - start - step * (n as f64 - self.padding_inner)) * self.align;
        if self.round {
            offset = offset.round();
        }

        self.step = step;
        self.bandwidth = step * (1.0 - self.padding_inner);
        for (i, pos) in self.positions.values_mut().enumerate() {
            let j = if reverse { n - 1 - i } else { i };
            *pos = offset + step * j as f64;
        }
    }

    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(|s| s.as_str())
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position of the band's leading edge; NaN for keys outside the
    /// domain.
    pub fn scale(&self, key: &str) -> f64 {
        self.positions.get(key).copied().unwrap_or(f64::NAN)
    }

    /// Position of the band's center.
    pub fn scale_center(&self, key: &str) -> f64 {
        self.scale(key) + self.bandwidth / 2.0
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Number of steps the range must cover for `count` bands with the
/// given paddings.
fn bandspace(count: usize, padding_inner: f64, padding_outer: f64) -> f64 {
    count as f64 - padding_inner.clamp(0.0, 1.0) + padding_outer.max(0.0) * 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn domain() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    #[test]
    fn test_band_positions_no_padding() {
        let scale = BandScale::try_new(domain(), &BandScaleConfig::default()).unwrap();
        assert_approx_eq!(f64, scale.scale("a"), 0.0);
        assert_approx_eq!(f64, scale.scale("b"), 1.0 / 3.0);
        assert_approx_eq!(f64, scale.scale("c"), 2.0 / 3.0);
        assert_approx_eq!(f64, scale.bandwidth(), 1.0 / 3.0);
        assert!(scale.scale("zzz").is_nan());
    }

    #[test]
    fn test_band_order_is_domain_order() {
        let scale = BandScale::try_new(
            vec!["B".to_string(), "A".to_string(), "C".to_string()],
            &BandScaleConfig {
                range: (0.0, 300.0),
                ..Default::default()
            },
        )
        .unwrap();
        // Not sorted: B keeps the first slot.
        assert_approx_eq!(f64, scale.scale("B"), 0.0);
        assert_approx_eq!(f64, scale.scale("A"), 100.0);
        assert_approx_eq!(f64, scale.scale("C"), 200.0);
    }

    #[test]
    fn test_point_scale_has_zero_bandwidth() {
        let scale = BandScale::try_new_point(domain(), (0.0, 100.0), 0.0).unwrap();
        assert_approx_eq!(f64, scale.bandwidth(), 0.0);
        assert_approx_eq!(f64, scale.scale("a"), 0.0);
        assert_approx_eq!(f64, scale.scale("c"), 100.0);
    }

    #[test]
    fn test_reversed_range() {
        let scale = BandScale::try_new(
            domain(),
            &BandScaleConfig {
                range: (300.0, 0.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_approx_eq!(f64, scale.scale("a"), 200.0);
        assert_approx_eq!(f64, scale.scale("c"), 0.0);
    }

    #[test]
    fn test_empty_domain_is_an_error() {
        assert_eq!(
            BandScale::try_new(vec![], &BandScaleConfig::default()).unwrap_err(),
            CccScaleError::EmptyDomain
        );
    }

    #[test]
    fn test_inner_padding() {
        let scale = BandScale::try_new(
            domain(),
            &BandScaleConfig {
                range: (0.0, 120.0),
                padding_inner: 0.2,
                ..Default::default()
            },
        )
        .unwrap();
        // space = 3 - 0.2 = 2.8 steps
        let step = 120.0 / 2.8;
        assert_approx_eq!(f64, scale.step(), step);
        assert_approx_eq!(f64, scale.bandwidth(), step * 0.8);
    }
}
