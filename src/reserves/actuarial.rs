//! Continuance, reverse accumulation and interpolation helpers

/// How two boundary values are blended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    /// Weighted geometric blend; linear when either endpoint is not positive
    LogLinear,
}

impl Interpolation {
    pub fn blend(&self, bd: f64, ed: f64, wt_bd: f64, wt_ed: f64) -> f64 {
        match self {
            // A weighted mean stays between its endpoints; exp/ln rounding can step an ulp outside
            Interpolation::LogLinear if bd > 0.0 && ed > 0.0 => {
                (wt_bd * bd.ln() + wt_ed * ed.ln()).exp().clamp(bd.min(ed), bd.max(ed))
            }
            _ => wt_bd * bd + wt_ed * ed,
        }
    }

    pub fn midpoint(&self, bd: f64, ed: f64) -> f64 {
        self.blend(bd, ed, 0.5, 0.5)
    }
}

/// Probability of remaining in status at the beginning, middle and end of each period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Continuance {
    pub bd: Vec<f64>,
    pub md: Vec<f64>,
    pub ed: Vec<f64>,
}

impl Continuance {
    /// Cumulative survivorship through per-period decrement rates
    pub fn from_decrements(decrements: &[f64], midpoint: Interpolation) -> Self {
        let mut bd = Vec::with_capacity(decrements.len());
        let mut md = Vec::with_capacity(decrements.len());
        let mut ed = Vec::with_capacity(decrements.len());
        let mut lives = 1.0;
        for rate in decrements {
            let begin = lives;
            lives *= 1.0 - rate.clamp(0.0, 1.0);
            bd.push(begin);
            ed.push(lives);
            md.push(midpoint.midpoint(begin, lives));
        }
        Self { bd, md, ed }
    }
}

/// Sum of each value and every value after it
pub fn reverse_cumsum(values: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    let mut running = 0.0;
    for (i, v) in values.iter().enumerate().rev() {
        running += v;
        out[i] = running;
    }
    out
}

/// Each row takes the next row's value; the last row takes `fill`
pub fn shift_next(values: &[f64], fill: f64) -> Vec<f64> {
    values.iter().skip(1).copied().chain(std::iter::once(fill)).take(values.len()).collect()
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
