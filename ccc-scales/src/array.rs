//! d3-style tick arithmetic over f64 extents.

/// Evenly spaced, human-friendly tick values covering [start, stop].
pub fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if count <= 0.0 || count.is_nan() {
        return vec![];
    }
    if start == stop {
        return vec![start];
    }

    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count)
    } else {
        tick_spec(start, stop, count)
    };
    if i2 < i1 {
        return vec![];
    }

    let n = (i2 - i1 + 1.0) as usize;
    let mut out = Vec::with_capacity(n);
    if reverse {
        for i in 0..n {
            let j = i2 - i as f64;
            out.push(if inc < 0.0 { j / -inc } else { j * inc });
        }
    } else {
        for i in 0..n {
            let j = i1 + i as f64;
            out.push(if inc < 0.0 { j / -inc } else { j * inc });
        }
    }
    out
}

fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    const E10: f64 = 7.0710678118654755; // sqrt(50)
    const E5: f64 = 3.1622776601683795; // sqrt(10)
    const E2: f64 = 1.4142135623730951; // sqrt(2)

    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let denom = 10f64.powf(-power) / factor;
        i1 = (start * denom).round();
        i2 = (stop * denom).round();
        if i1 / denom < start {
            i1 += 1.0;
        }
        if i2 / denom > stop {
            i2 -= 1.0;
        }
        inc = -denom;
    } else {
        inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round();
        i2 = (stop / inc).round();
        if i1 * inc < start {
            i1 += 1.0;
        }
        if i2 * inc > stop {
            i2 -= 1.0;
        }
    }

    if i2 < i1 && 0.5 <= count && count < 2.0 {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

/// The step between ticks a call to `ticks` with the same arguments
/// would produce; NEG_INFINITY for a degenerate extent.
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    if !(count > 0.0) {
        return f64::NAN;
    }
    if start == stop {
        return f64::NEG_INFINITY;
    }
    let step = (stop - start) / count;
    if step == 0.0 {
        return f64::NAN;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= 7.0710678118654755 {
        10.0
    } else if error >= 3.1622776601683795 {
        5.0
    } else if error >= 1.4142135623730951 {
        2.0
    } else {
        1.0
    };
    10f64.powf(power) * factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_ticks_unit_interval() {
        let t = ticks(0.0, 1.0, 10.0);
        assert_eq!(t.len(), 11);
        assert_approx_eq!(f64, t[0], 0.0);
        assert_approx_eq!(f64, t[1], 0.1);
        assert_approx_eq!(f64, t[10], 1.0);
    }

    #[test]
    fn test_ticks_round_steps() {
        let t = ticks(0.0, 100.0, 5.0);
        assert_eq!(t, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn test_ticks_reversed() {
        let t = ticks(100.0, 0.0, 5.0);
        assert_eq!(t[0], 100.0);
        assert_eq!(*t.last().unwrap(), 0.0);
    }

    #[test]
    fn test_degenerate() {
        assert_eq!(ticks(3.0, 3.0, 10.0), vec![3.0]);
        assert!(ticks(0.0, 1.0, 0.0).is_empty());
        assert_eq!(tick_increment(1.0, 1.0, 10.0), f64::NEG_INFINITY);
    }
}
