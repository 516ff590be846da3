use crate::array;

#[derive(Clone, Debug)]
pub struct LinearScaleConfig {
    pub domain: (f64, f64),
    pub range: (f64, f64),
    pub clamp: bool,
    pub round: bool,
    pub nice: Option<usize>,
}

impl Default for LinearScaleConfig {
    fn default() -> Self {
        Self {
            domain: (0.0, 1.0),
            range: (0.0, 1.0),
            clamp: false,
            round: false,
            nice: None,
        }
    }
}

/// A linear scale mapping a numeric domain to a numeric range, with
/// optional clamping, rounding, domain niceing and tick generation.
#[derive(Clone, Debug)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
    clamp: bool,
    round: bool,
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new(&LinearScaleConfig::default())
    }
}

impl LinearScale {
    pub fn new(config: &LinearScaleConfig) -> Self {
        let mut this = Self {
            domain_start: config.domain.0,
            domain_end: config.domain.1,
            range_start: config.range.0,
            range_end: config.range.1,
            clamp: config.clamp,
            round: config.round,
        };
        if let Some(nice) = config.nice {
            this = this.nice(Some(nice));
        }
        this
    }

    pub fn with_domain(mut self, domain: (f64, f64)) -> Self {
        self.domain_start = domain.0;
        self.domain_end = domain.1;
        self
    }

    pub fn with_range(mut self, range: (f64, f64)) -> Self {
        self.range_start = range.0;
        self.range_end = range.1;
        self
    }

    pub fn with_clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    /// Extends the domain to nice round numbers for tick selection.
    pub fn nice(mut self, count: Option<usize>) -> Self {
        if self.domain_start == self.domain_end
            || self.domain_start.is_nan()
            || self.domain_end.is_nan()
        {
            return self;
        }

        let reversed = self.domain_start > self.domain_end;
        let (mut start, mut stop) = if reversed {
            (self.domain_end, self.domain_start)
        } else {
            (self.domain_start, self.domain_end)
        };

        let count = count.unwrap_or(10);
        let mut prestep = 0.0;
        for _ in 0..10 {
            let step = array::tick_increment(start, stop, count as f64);
            if step == prestep {
                break;
            } else if step > 0.0 {
                start = (start / step).floor() * step;
                stop = (stop / step).ceil() * step;
            } else if step < 0.0 {
                start = (start * step).ceil() / step;
                stop = (stop * step).floor() / step;
            } else {
                break;
            }
            prestep = step;
        }

        if reversed {
            self.domain_start = stop;
            self.domain_end = start;
        } else {
            self.domain_start = start;
            self.domain_end = stop;
        }
        self
    }

    /// Maps a domain value to the range. Degenerate domains collapse to
    /// the range start.
    pub fn scale(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return self.range_start;
        }
        let factor = (self.range_end - self.range_start) / (self.domain_end - self.domain_start);
        let mut out = self.range_start + factor * (value - self.domain_start);
        if self.clamp {
            let (lo, hi) = if self.range_start <= self.range_end {
                (self.range_start, self.range_end)
            } else {
                (self.range_end, self.range_start)
            };
            out = out.clamp(lo, hi);
        }
        if self.round {
            out = out.round();
        }
        out
    }

    /// Maps a range position back to the domain.
    pub fn invert(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return self.domain_start;
        }
        let value = if self.clamp {
            let (lo, hi) = if self.range_start <= self.range_end {
                (self.range_start, self.range_end)
            } else {
                (self.range_end, self.range_start)
            };
            value.clamp(lo, hi)
        } else {
            value
        };
        let factor = (self.domain_end - self.domain_start) / (self.range_end - self.range_start);
        self.domain_start + factor * (value - self.range_start)
    }

    pub fn ticks(&self, count: Option<usize>) -> Vec<f64> {
        array::ticks(
            self.domain_start,
            self.domain_end,
            count.unwrap_or(10) as f64,
        )
    }

    fn is_degenerate(&self) -> bool {
        self.domain_start == self.domain_end
            || self.range_start == self.range_end
            || self.domain_start.is_nan()
            || self.domain_end.is_nan()
            || self.range_start.is_nan()
            || self.range_end.is_nan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_basic_mapping() {
        let scale = LinearScale::new(&LinearScaleConfig {
            domain: (0.0, 100.0),
            range: (0.0, 200.0),
            ..Default::default()
        });
        assert_approx_eq!(f64, scale.scale(50.0), 100.0);
        assert_approx_eq!(f64, scale.invert(100.0), 50.0);
        // No clamping by default.
        assert_approx_eq!(f64, scale.scale(150.0), 300.0);
    }

    #[test]
    fn test_clamp() {
        let scale = LinearScale::default()
            .with_domain((0.0, 10.0))
            .with_range((0.0, 100.0))
            .with_clamp(true);
        assert_approx_eq!(f64, scale.scale(20.0), 100.0);
        assert_approx_eq!(f64, scale.scale(-5.0), 0.0);
    }

    #[test]
    fn test_inverted_range() {
        // Ortho axes map increasing values to decreasing y.
        let scale = LinearScale::default()
            .with_domain((0.0, 10.0))
            .with_range((100.0, 0.0));
        assert_approx_eq!(f64, scale.scale(0.0), 100.0);
        assert_approx_eq!(f64, scale.scale(10.0), 0.0);
    }

    #[test]
    fn test_nice_extends_domain() {
        let scale = LinearScale::default()
            .with_domain((0.13, 9.87))
            .nice(Some(10));
        let (d0, d1) = scale.domain();
        assert_approx_eq!(f64, d0, 0.0);
        assert_approx_eq!(f64, d1, 10.0);
    }

    #[test]
    fn test_degenerate_domain() {
        let scale = LinearScale::default()
            .with_domain((5.0, 5.0))
            .with_range((0.0, 100.0));
        assert_approx_eq!(f64, scale.scale(5.0), 0.0);
    }
}
