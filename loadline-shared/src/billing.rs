/// Driver pay formulas and financial report rows
///
/// Every driver carries a pay formula (stored as JSONB on the drivers table)
/// that determines what a delivered load pays them. All money is integer
/// cents; the single rounding point is the percent-of-revenue formula, which
/// rounds half-up to the cent.
///
/// # Formulas
///
/// - **per_mile**: `rate_cents_per_mile * distance_miles`
/// - **percent_of_revenue**: `percent` of the load's `rate_cents`
/// - **hourly**: `rate_cents_per_hour * transit_hours`
///
/// # Example
///
/// ```
/// use loadline_shared::billing::PayFormula;
///
/// let formula = PayFormula::PercentOfRevenue { percent: 25.0 };
/// // 25% of a $2,000.00 load
/// assert_eq!(formula.pay_cents(200_000, Some(500.0), None), 50_000);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a driver is paid for a delivered load
///
/// Serialized with an internal `type` tag so the JSONB column stays
/// self-describing, e.g. `{"type": "per_mile", "rate_cents_per_mile": 65}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PayFormula {
    /// Flat rate per loaded mile
    PerMile {
        /// Pay per statute mile, in cents
        rate_cents_per_mile: i64,
    },

    /// Percentage of the load's linehaul revenue
    PercentOfRevenue {
        /// Percentage, 0.0 to 100.0
        percent: f64,
    },

    /// Hourly rate over recorded transit time
    Hourly {
        /// Pay per hour, in cents
        rate_cents_per_hour: i64,
    },
}

impl PayFormula {
    /// Computes pay in cents for one load
    ///
    /// `rate_cents` is the load's revenue, `distance_miles` its loaded miles,
    /// `transit_hours` the recorded transit time. Formulas missing their
    /// input (per-mile with no distance, hourly with no hours) pay zero
    /// rather than guessing.
    pub fn pay_cents(
        &self,
        rate_cents: i64,
        distance_miles: Option<f64>,
        transit_hours: Option<f64>,
    ) -> i64 {
        match self {
            PayFormula::PerMile {
                rate_cents_per_mile,
            } => match distance_miles {
                Some(miles) if miles > 0.0 => (*rate_cents_per_mile as f64 * miles).round() as i64,
                _ => 0,
            },
            PayFormula::PercentOfRevenue { percent } => {
                if rate_cents <= 0 {
                    return 0;
                }
                (rate_cents as f64 * percent / 100.0).round() as i64
            }
            PayFormula::Hourly {
                rate_cents_per_hour,
            } => match transit_hours {
                Some(hours) if hours > 0.0 => (*rate_cents_per_hour as f64 * hours).round() as i64,
                _ => 0,
            },
        }
    }

    /// Short label for report rows
    pub fn kind(&self) -> &'static str {
        match self {
            PayFormula::PerMile { .. } => "per_mile",
            PayFormula::PercentOfRevenue { .. } => "percent_of_revenue",
            PayFormula::Hourly { .. } => "hourly",
        }
    }
}

impl Default for PayFormula {
    fn default() -> Self {
        PayFormula::PerMile {
            rate_cents_per_mile: 0,
        }
    }
}

/// One delivered load on a driver pay statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverPayLine {
    /// Load ID
    pub load_id: Uuid,

    /// Load reference number
    pub reference: String,

    /// Delivery timestamp
    pub delivered_at: DateTime<Utc>,

    /// Load revenue in cents
    pub rate_cents: i64,

    /// Loaded miles, when recorded
    pub distance_miles: Option<f64>,

    /// Pay for this load in cents
    pub pay_cents: i64,
}

/// Per-tenant revenue totals over a date range
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueSummary {
    /// Loads delivered in range
    pub delivered_count: i64,

    /// Loads invoiced in range
    pub invoiced_count: i64,

    /// Loads cancelled in range
    pub cancelled_count: i64,

    /// Total linehaul revenue in cents (delivered + invoiced)
    pub revenue_cents: i64,

    /// Total loaded miles across counted loads
    pub total_miles: f64,

    /// Total driver pay in cents across counted loads
    pub driver_pay_cents: i64,
}

impl RevenueSummary {
    /// Revenue per mile in cents, zero when no miles were recorded
    pub fn rate_per_mile_cents(&self) -> i64 {
        if self.total_miles <= 0.0 {
            return 0;
        }
        (self.revenue_cents as f64 / self.total_miles).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_mile_pay() {
        let formula = PayFormula::PerMile {
            rate_cents_per_mile: 65,
        };
        assert_eq!(formula.pay_cents(200_000, Some(500.0), None), 32_500);
    }

    #[test]
    fn test_per_mile_without_distance_pays_zero() {
        let formula = PayFormula::PerMile {
            rate_cents_per_mile: 65,
        };
        assert_eq!(formula.pay_cents(200_000, None, None), 0);
        assert_eq!(formula.pay_cents(200_000, Some(0.0), None), 0);
    }

    #[test]
    fn test_percent_pay_rounds_to_cent() {
        let formula = PayFormula::PercentOfRevenue { percent: 24.5 };
        // 24.5% of $1,234.57 = $302.47 (30246.965 rounds up)
        assert_eq!(formula.pay_cents(123_457, None, None), 30_247);
    }

    #[test]
    fn test_percent_of_zero_revenue_pays_zero() {
        let formula = PayFormula::PercentOfRevenue { percent: 25.0 };
        assert_eq!(formula.pay_cents(0, Some(500.0), None), 0);
    }

    #[test]
    fn test_hourly_pay() {
        let formula = PayFormula::Hourly {
            rate_cents_per_hour: 2_800,
        };
        assert_eq!(formula.pay_cents(0, None, Some(7.5)), 21_000);
        assert_eq!(formula.pay_cents(0, None, None), 0);
    }

    #[test]
    fn test_formula_json_round_trip() {
        let formula = PayFormula::PerMile {
            rate_cents_per_mile: 72,
        };
        let json = serde_json::to_value(formula).unwrap();
        assert_eq!(json["type"], "per_mile");

        let back: PayFormula = serde_json::from_value(json).unwrap();
        assert_eq!(back, formula);
    }

    #[test]
    fn test_summary_rate_per_mile() {
        let summary = RevenueSummary {
            revenue_cents: 500_000,
            total_miles: 2_000.0,
            ..Default::default()
        };
        assert_eq!(summary.rate_per_mile_cents(), 250);

        let empty = RevenueSummary::default();
        assert_eq!(empty.rate_per_mile_cents(), 0);
    }
}
