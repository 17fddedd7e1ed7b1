use serde::{Deserialize, Serialize};

use crate::models::{FinancialRecord, FinancialRecordInput, UserSettings};

use super::round2;

/// Smallest burn treated as "burning"; keeps the division finite.
pub const MIN_BURN: f64 = 1e-6;

/// Longest cash projection the dashboard may request.
pub const MAX_PROJECTION_MONTHS: u32 = 60;

/// Cash, monthly revenue and monthly expenses a runway is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Baseline {
    pub cash: f64,
    pub revenue: f64,
    pub expenses: f64,
}

impl Baseline {
    pub fn from_record(record: &FinancialRecord) -> Self {
        Self {
            cash: record.cash_balance,
            revenue: record.total_revenue(),
            expenses: record.total_expenses(),
        }
    }

    pub fn from_input(input: &FinancialRecordInput) -> Self {
        Self {
            cash: input.cash_balance,
            revenue: input.total_revenue(),
            expenses: input.total_expenses(),
        }
    }

    /// Expenses minus revenue; negative means profitable.
    pub fn burn(&self) -> f64 {
        self.expenses - self.revenue
    }

    pub fn runway(&self) -> Runway {
        runway_months(self.cash, self.burn())
    }
}

pub fn burn_rate(record: &FinancialRecord) -> f64 {
    Baseline::from_record(record).burn()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Runway {
    Months(f64),
    /// Revenue covers expenses; cash never runs out at the current rate.
    Sustainable,
}

impl Runway {
    pub fn months(&self) -> Option<f64> {
        match self {
            Runway::Months(m) => Some(*m),
            Runway::Sustainable => None,
        }
    }

    pub fn is_sustainable(&self) -> bool {
        matches!(self, Runway::Sustainable)
    }
}

/// Months until cash reaches zero at `burn` per month.
pub fn runway_months(cash: f64, burn: f64) -> Runway {
    if burn <= 0.0 {
        return Runway::Sustainable;
    }
    Runway::Months(cash.max(0.0) / burn.max(MIN_BURN))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunwayStatus {
    Critical,
    Warning,
    Healthy,
    Sustainable,
}

impl RunwayStatus {
    pub fn classify(runway: Runway, warning_months: u32, critical_months: u32) -> Self {
        match runway {
            Runway::Sustainable => Self::Sustainable,
            Runway::Months(m) if m < f64::from(critical_months) => Self::Critical,
            Runway::Months(m) if m < f64::from(warning_months) => Self::Warning,
            Runway::Months(_) => Self::Healthy,
        }
    }

    pub fn for_settings(runway: Runway, settings: &UserSettings) -> Self {
        Self::classify(
            runway,
            settings.runway_warning_threshold,
            settings.runway_critical_threshold,
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Healthy => "healthy",
            Self::Sustainable => "sustainable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub month: String,
    pub cash_balance: f64,
}

/// Month-by-month cash curve starting after `start_month`, floored at zero.
pub fn project_cash(baseline: &Baseline, start_month: &str, months: u32) -> Vec<ProjectionPoint> {
    let months = months.clamp(1, MAX_PROJECTION_MONTHS);
    let burn = baseline.burn();
    let mut cash = baseline.cash;
    (1..=months)
        .map(|offset| {
            cash = (cash - burn).max(0.0);
            ProjectionPoint {
                month: add_months(start_month, offset),
                cash_balance: round2(cash),
            }
        })
        .collect()
}

/// `YYYY-MM` shifted forward by `offset` months. Unparseable input is
/// returned unchanged.
pub fn add_months(month: &str, offset: u32) -> String {
    let Some((year, mon)) = month.split_once('-') else {
        return month.to_string();
    };
    let (Ok(year), Ok(mon)) = (year.parse::<i32>(), mon.parse::<u32>()) else {
        return month.to_string();
    };
    if !(1..=12).contains(&mon) {
        return month.to_string();
    }
    let total = year * 12 + (mon as i32 - 1) + offset as i32;
    format!("{:04}-{:02}", total.div_euclid(12), total.rem_euclid(12) + 1)
}

/// Headline metrics for the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub has_data: bool,
    pub latest_month: Option<String>,
    pub current_cash: f64,
    pub monthly_revenue: f64,
    pub monthly_expenses: f64,
    pub burn_rate: f64,
    /// `None` when sustainable or when there is no data.
    pub runway_months: Option<f64>,
    pub runway_status: Option<RunwayStatus>,
    /// Month-over-month change in total revenue, in percent.
    pub revenue_growth_pct: Option<f64>,
    pub history: Vec<FinancialRecord>,
}

/// Build dashboard metrics from the user's records (oldest first).
pub fn dashboard_metrics(records: Vec<FinancialRecord>, settings: &UserSettings) -> DashboardMetrics {
    let Some(latest) = records.last() else {
        return DashboardMetrics {
            has_data: false,
            latest_month: None,
            current_cash: 0.0,
            monthly_revenue: 0.0,
            monthly_expenses: 0.0,
            burn_rate: 0.0,
            runway_months: None,
            runway_status: None,
            revenue_growth_pct: None,
            history: records,
        };
    };

    let baseline = Baseline::from_record(latest);
    let runway = baseline.runway();
    let revenue_growth_pct = records
        .len()
        .checked_sub(2)
        .map(|i| &records[i])
        .and_then(|prev| growth_pct(prev.total_revenue(), latest.total_revenue()));

    DashboardMetrics {
        has_data: true,
        latest_month: Some(latest.month.clone()),
        current_cash: round2(baseline.cash),
        monthly_revenue: round2(baseline.revenue),
        monthly_expenses: round2(baseline.expenses),
        burn_rate: round2(baseline.burn()),
        runway_months: runway.months().map(round2),
        runway_status: Some(RunwayStatus::for_settings(runway, settings)),
        revenue_growth_pct,
        history: records,
    }
}

fn growth_pct(previous: f64, current: f64) -> Option<f64> {
    if previous <= 0.0 {
        return None;
    }
    Some(round2((current - previous) / previous * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use uuid::Uuid;

    fn record(month: &str, revenue: f64, expenses: f64, cash: f64) -> FinancialRecord {
        let input = FinancialRecordInput::from_totals(month, revenue, expenses, cash);
        FinancialRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            month: input.month.clone(),
            revenue_recurring: input.revenue_recurring,
            revenue_one_time: input.revenue_one_time,
            expenses_salaries: input.expenses_salaries,
            expenses_marketing: input.expenses_marketing,
            expenses_infrastructure: input.expenses_infrastructure,
            expenses_other: input.expenses_other,
            cash_balance: input.cash_balance,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn example_runway_is_about_five_months() {
        let r = record("2024-03", 22_000.0, 50_000.0, 142_000.0);
        assert_eq!(burn_rate(&r), 28_000.0);
        let months = Baseline::from_record(&r).runway().months().unwrap();
        assert!((months - 5.07).abs() < 0.01, "got {months}");
    }

    #[test]
    fn profitable_company_is_sustainable() {
        assert_eq!(runway_months(10_000.0, -500.0), Runway::Sustainable);
        assert_eq!(runway_months(10_000.0, 0.0), Runway::Sustainable);
    }

    #[test]
    fn negative_cash_gives_zero_runway() {
        assert_eq!(runway_months(-5_000.0, 1_000.0), Runway::Months(0.0));
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(RunwayStatus::classify(Runway::Months(2.9), 6, 3), RunwayStatus::Critical);
        assert_eq!(RunwayStatus::classify(Runway::Months(3.0), 6, 3), RunwayStatus::Warning);
        assert_eq!(RunwayStatus::classify(Runway::Months(6.0), 6, 3), RunwayStatus::Healthy);
        assert_eq!(RunwayStatus::classify(Runway::Sustainable, 6, 3), RunwayStatus::Sustainable);
    }

    #[test]
    fn projection_burns_down_and_floors() {
        let baseline = Baseline { cash: 50_000.0, revenue: 0.0, expenses: 20_000.0 };
        let curve = project_cash(&baseline, "2024-11", 4);
        let cash: Vec<_> = curve.iter().map(|p| p.cash_balance).collect();
        assert_eq!(cash, vec![30_000.0, 10_000.0, 0.0, 0.0]);
        assert_eq!(curve[0].month, "2024-12");
        assert_eq!(curve[1].month, "2025-01");
    }

    #[test]
    fn projection_months_are_clamped() {
        let baseline = Baseline::default();
        assert_eq!(project_cash(&baseline, "2024-01", 0).len(), 1);
        assert_eq!(project_cash(&baseline, "2024-01", 500).len(), 60);
    }

    #[test]
    fn add_months_handles_garbage() {
        assert_eq!(add_months("2023-12", 1), "2024-01");
        assert_eq!(add_months("2024-01", 24), "2026-01");
        assert_eq!(add_months("soon", 1), "soon");
        assert_eq!(add_months("2024-13", 1), "2024-13");
    }

    #[test]
    fn dashboard_reports_growth_and_status() {
        let settings = UserSettings::default();
        let metrics = dashboard_metrics(
            vec![
                record("2024-02", 20_000.0, 50_000.0, 170_000.0),
                record("2024-03", 22_000.0, 50_000.0, 142_000.0),
            ],
            &settings,
        );
        assert!(metrics.has_data);
        assert_eq!(metrics.latest_month.as_deref(), Some("2024-03"));
        assert_eq!(metrics.burn_rate, 28_000.0);
        assert_eq!(metrics.runway_months, Some(5.07));
        assert_eq!(metrics.runway_status, Some(RunwayStatus::Warning));
        assert_eq!(metrics.revenue_growth_pct, Some(10.0));
        assert_eq!(metrics.history.len(), 2);
    }

    #[test]
    fn empty_dashboard() {
        let metrics = dashboard_metrics(Vec::new(), &UserSettings::default());
        assert!(!metrics.has_data);
        assert!(metrics.runway_status.is_none());
        assert!(metrics.history.is_empty());
    }
}
