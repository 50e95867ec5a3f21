//! Discount factors for reserve calculations
//!
//! Disabled claims compound monthly at the annual valuation rate over 12; active
//! policies compound annually. Factors are measured from the first projected period.

/// Compound-interest discount curve at a single valuation rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountCurve {
    /// Annual valuation interest rate
    pub valuation_rate: f64,

    /// Compounding periods per year (12 for disabled claims, 1 for active policies)
    pub periods_per_year: u32,
}

/// Discount factors at the beginning, middle and end of each period
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscountFactors {
    pub bd: Vec<f64>,
    pub md: Vec<f64>,
    pub ed: Vec<f64>,
}

impl DiscountCurve {
    pub fn monthly(valuation_rate: f64) -> Self {
        Self { valuation_rate, periods_per_year: 12 }
    }

    pub fn annual(valuation_rate: f64) -> Self {
        Self { valuation_rate, periods_per_year: 1 }
    }

    /// One-period discount factor
    pub fn period_discount_factor(&self) -> f64 {
        1.0 / (1.0 + self.valuation_rate / self.periods_per_year as f64)
    }

    /// Discount factor to a (possibly fractional) number of periods
    pub fn discount_to_period(&self, periods: f64) -> f64 {
        self.period_discount_factor().powf(periods)
    }

    /// Factors for `n` consecutive periods starting at period 0
    pub fn factors(&self, n: usize) -> DiscountFactors {
        let mut factors = DiscountFactors::default();
        for k in 0..n {
            let t = k as f64;
            factors.bd.push(self.discount_to_period(t));
            factors.md.push(self.discount_to_period(t + 0.5));
            factors.ed.push(self.discount_to_period(t + 1.0));
        }
        factors
    }
}
