use serde::{Deserialize, Serialize};

use crate::models::{Scenario, ScenarioInput};

use super::round2;
use super::runway::{Baseline, Runway};

/// Runway changes smaller than this are reported as "no change".
const NEGLIGIBLE_MONTHS: f64 = 0.05;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDeltas {
    #[serde(default)]
    pub expense_change: f64,
    #[serde(default)]
    pub revenue_change: f64,
    #[serde(default)]
    pub cash_injection: f64,
}

impl From<&Scenario> for ScenarioDeltas {
    fn from(s: &Scenario) -> Self {
        Self {
            expense_change: s.expense_change,
            revenue_change: s.revenue_change,
            cash_injection: s.cash_injection,
        }
    }
}

impl From<&ScenarioInput> for ScenarioDeltas {
    fn from(s: &ScenarioInput) -> Self {
        Self {
            expense_change: s.expense_change,
            revenue_change: s.revenue_change,
            cash_injection: s.cash_injection,
        }
    }
}

impl ScenarioDeltas {
    pub fn apply(&self, baseline: &Baseline) -> Baseline {
        Baseline {
            cash: baseline.cash + self.cash_injection,
            revenue: baseline.revenue + self.revenue_change,
            expenses: baseline.expenses + self.expense_change,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioImpact {
    pub baseline_burn: f64,
    pub projected_burn: f64,
    pub projected_cash: f64,
    /// `None` means sustainable.
    pub baseline_runway_months: Option<f64>,
    pub projected_runway_months: Option<f64>,
    pub runway_delta: String,
}

/// Re-run the runway computation with the deltas applied.
pub fn simulate(baseline: &Baseline, deltas: &ScenarioDeltas) -> ScenarioImpact {
    let projected = deltas.apply(baseline);
    let before = baseline.runway();
    let after = projected.runway();
    ScenarioImpact {
        baseline_burn: round2(baseline.burn()),
        projected_burn: round2(projected.burn()),
        projected_cash: round2(projected.cash),
        baseline_runway_months: before.months().map(round2),
        projected_runway_months: after.months().map(round2),
        runway_delta: format_runway_delta(before, after),
    }
}

/// Signed, human-readable runway change, e.g. `"+1.3 months"`.
pub fn format_runway_delta(before: Runway, after: Runway) -> String {
    match (before, after) {
        (Runway::Months(b), Runway::Months(a)) => {
            let delta = a - b;
            if delta.abs() < NEGLIGIBLE_MONTHS {
                "no change".to_string()
            } else {
                format!("{delta:+.1} months")
            }
        }
        (Runway::Months(_), Runway::Sustainable) => "now sustainable".to_string(),
        (Runway::Sustainable, Runway::Months(_)) => "no longer sustainable".to_string(),
        (Runway::Sustainable, Runway::Sustainable) => "no change".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> Baseline {
        Baseline { cash: 142_000.0, revenue: 22_000.0, expenses: 50_000.0 }
    }

    #[test]
    fn added_expense_shortens_runway() {
        let impact = simulate(
            &example(),
            &ScenarioDeltas { expense_change: 25_000.0, ..Default::default() },
        );
        let before = impact.baseline_runway_months.unwrap();
        let after = impact.projected_runway_months.unwrap();
        assert!(after < before);
        assert_eq!(impact.projected_burn, 53_000.0);
        assert!(impact.runway_delta.starts_with('-'), "{}", impact.runway_delta);
        assert_eq!(impact.runway_delta, "-2.4 months");
    }

    #[test]
    fn cash_injection_extends_runway() {
        let impact = simulate(
            &example(),
            &ScenarioDeltas { cash_injection: 56_000.0, ..Default::default() },
        );
        assert_eq!(impact.runway_delta, "+2.0 months");
        assert_eq!(impact.projected_cash, 198_000.0);
    }

    #[test]
    fn revenue_can_make_company_sustainable() {
        let impact = simulate(
            &example(),
            &ScenarioDeltas { revenue_change: 30_000.0, ..Default::default() },
        );
        assert_eq!(impact.projected_runway_months, None);
        assert_eq!(impact.runway_delta, "now sustainable");
    }

    #[test]
    fn profitable_company_can_lose_sustainability() {
        let profitable = Baseline { cash: 10_000.0, revenue: 5_000.0, expenses: 4_000.0 };
        let impact = simulate(
            &profitable,
            &ScenarioDeltas { expense_change: 2_000.0, ..Default::default() },
        );
        assert_eq!(impact.runway_delta, "no longer sustainable");
        assert_eq!(impact.projected_runway_months, Some(10.0));
    }

    #[test]
    fn zero_deltas_are_no_change() {
        let impact = simulate(&example(), &ScenarioDeltas::default());
        assert_eq!(impact.runway_delta, "no change");
    }
}
