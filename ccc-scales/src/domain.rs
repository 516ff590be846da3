use crate::error::CccScaleError;
use serde::Deserialize;

/// Continuous-axis domain options, layered over the data extent.
///
/// Precedence, highest first: `fixed_min`/`fixed_max` hard-clamp their
/// end; `origin_is_zero` pins the unfixed min end at 0 (the max end for
/// all-negative extents), clipping the negative part of a sign-crossing
/// extent; `use_abs` folds negative values before the extent is taken
/// (applied by the caller when collecting the extent, mirrored here for
/// fixed ends).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContinuousDomainOptions {
    pub fixed_min: Option<f64>,
    pub fixed_max: Option<f64>,
    pub origin_is_zero: bool,
    pub use_abs: bool,
}

impl ContinuousDomainOptions {
    /// Resolves the final (min, max) domain from a data extent.
    ///
    /// A `None` extent (no numeric data) resolves as if the extent were
    /// `(0, 0)`; degenerate domains are widened to a unit span around
    /// the point so downstream scales stay invertible.
    pub fn resolve(&self, extent: Option<(f64, f64)>) -> Result<(f64, f64), CccScaleError> {
        let (mut min, mut max) = extent.unwrap_or((0.0, 0.0));

        if self.use_abs {
            let (a, b) = (min.abs(), max.abs());
            min = a.min(b);
            max = a.max(b);
            // Folding a sign-crossing extent reaches down to zero.
            if extent.map(|(lo, hi)| lo < 0.0 && hi > 0.0).unwrap_or(false) {
                min = 0.0;
            }
        }

        if self.origin_is_zero {
            if max < 0.0 {
                max = 0.0;
            } else {
                min = 0.0;
            }
        }

        // Fixed ends override everything above.
        if let Some(fixed) = self.fixed_min {
            min = if self.use_abs { fixed.abs() } else { fixed };
        }
        if let Some(fixed) = self.fixed_max {
            max = if self.use_abs { fixed.abs() } else { fixed };
        }

        if min > max {
            return Err(CccScaleError::InvertedFixedDomain { min, max });
        }
        if min == max {
            // Unit span around the point, biased to keep zero at an end.
            if min == 0.0 {
                max = 1.0;
            } else if min > 0.0 {
                min = 0.0;
            } else {
                max = 0.0;
            }
        }
        Ok((min, max))
    }
}
