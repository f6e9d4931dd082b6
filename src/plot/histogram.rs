// ---------------------------------------------------------------------------
// Histogram – equal-width bin counts
// ---------------------------------------------------------------------------

/// Bin edges (`counts.len() + 1` of them) and per-bin counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Count finite `values` into `bins` equal-width bins spanning their
    /// range. The last bin includes its right edge. A constant column is
    /// centred in a range of width one; no values gives the range [0, 1].
    pub fn compute(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

        let (mut lo, mut hi) = finite
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        if finite.is_empty() {
            (lo, hi) = (0.0, 1.0);
        } else if lo == hi {
            (lo, hi) = (lo - 0.5, hi + 0.5);
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

        let mut counts = vec![0u64; bins];
        for v in finite {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        Histogram { edges, counts }
    }

    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

// ---------------------------------------------------------------------------
// Axis ticks
// ---------------------------------------------------------------------------

/// Round tick positions (steps of 1, 2, 2.5 or 5 × 10ⁿ) inside `[lo, hi]`,
/// aiming for about `target` ticks. Returns the positions and the step.
pub fn nice_ticks(lo: f64, hi: f64, target: usize) -> (Vec<f64>, f64) {
    let span = hi - lo;
    if !(span.is_finite() && span > 0.0) {
        return (vec![lo], 1.0);
    }
    let raw = span / target.max(1) as f64;
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let step = [1.0, 2.0, 2.5, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|&s| s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (lo / step - 1e-9).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    let ticks = (first..=last).map(|k| k as f64 * step).collect();
    (ticks, step)
}

/// Tick label with just enough decimals for `step`; scientific notation for
/// very large or very small magnitudes.
pub fn tick_label(value: f64, step: f64) -> String {
    let magnitude = value.abs().max(step.abs());
    if magnitude >= 1e6 || (magnitude < 1e-4 && value != 0.0) {
        return format!("{value:.2e}");
    }
    // fewest decimals that represent the step exactly
    let decimals = (0..=6)
        .find(|&d| {
            let scaled = step.abs() * 10f64.powi(d);
            (scaled - scaled.round()).abs() < 1e-6 * scaled.max(1.0)
        })
        .unwrap_or(6) as usize;
    let text = format!("{value:.decimals$}");
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        text.trim_start_matches('-').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_finite_value_once() {
        let values = [1.0, 2.0, f64::NAN, 4.0, 5.0, f64::INFINITY];
        let h = Histogram::compute(&values, 10);
        assert_eq!(h.edges.len(), 11);
        assert_eq!(h.range(), (1.0, 5.0));
        assert_eq!(h.total(), 4);
        assert_eq!(h.counts[0], 1);
        assert_eq!(h.counts[9], 1, "max lands in the closed last bin");
    }

    #[test]
    fn constant_and_empty_columns() {
        let h = Histogram::compute(&[3.0, 3.0], 10);
        assert_eq!(h.range(), (2.5, 3.5));
        assert_eq!(h.total(), 2);
        assert_eq!(h.max_count(), 2);

        let h = Histogram::compute(&[f64::NAN], 4);
        assert_eq!(h.range(), (0.0, 1.0));
        assert_eq!(h.total(), 0);
        assert_eq!(h.max_count(), 0);
    }

    #[test]
    fn ticks_are_round_numbers_inside_range() {
        let (ticks, step) = nice_ticks(0.3, 9.7, 5);
        assert_eq!(step, 2.0);
        assert_eq!(ticks, [2.0, 4.0, 6.0, 8.0]);

        let (ticks, step) = nice_ticks(0.0, 1.0, 4);
        assert!((step - 0.25).abs() < 1e-12);
        assert_eq!(ticks.len(), 5);
    }

    #[test]
    fn labels() {
        assert_eq!(tick_label(4.0, 2.0), "4");
        assert_eq!(tick_label(0.25, 0.25), "0.25");
        assert_eq!(tick_label(0.5, 0.1), "0.5");
        assert_eq!(tick_label(-0.0, 0.5), "0.0");
        assert_eq!(tick_label(2.0e7, 5.0e6), "2.00e7");
    }
}
