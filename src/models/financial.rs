use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One monthly snapshot of a startup's books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `YYYY-MM`
    pub month: String,
    pub revenue_recurring: f64,
    pub revenue_one_time: f64,
    pub expenses_salaries: f64,
    pub expenses_marketing: f64,
    pub expenses_infrastructure: f64,
    pub expenses_other: f64,
    pub cash_balance: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl FinancialRecord {
    pub fn total_revenue(&self) -> f64 {
        self.revenue_recurring + self.revenue_one_time
    }

    pub fn total_expenses(&self) -> f64 {
        self.expenses_salaries
            + self.expenses_marketing
            + self.expenses_infrastructure
            + self.expenses_other
    }
}

/// Writable fields of a financial record, as submitted by forms and importers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecordInput {
    pub month: String,
    #[serde(default)]
    pub revenue_recurring: f64,
    #[serde(default)]
    pub revenue_one_time: f64,
    #[serde(default)]
    pub expenses_salaries: f64,
    #[serde(default)]
    pub expenses_marketing: f64,
    #[serde(default)]
    pub expenses_infrastructure: f64,
    #[serde(default)]
    pub expenses_other: f64,
    #[serde(default)]
    pub cash_balance: f64,
}

/// Share of a lump-sum expense figure assigned to each bucket
/// (salaries, marketing, infrastructure, other).
pub const EXPENSE_SPLIT: [f64; 4] = [0.6, 0.2, 0.1, 0.1];

impl FinancialRecordInput {
    /// Build an input from single revenue/expense totals, splitting expenses
    /// across buckets with [`EXPENSE_SPLIT`].
    pub fn from_totals(month: &str, revenue: f64, expenses: f64, cash: f64) -> Self {
        Self {
            month: month.to_string(),
            revenue_recurring: revenue,
            revenue_one_time: 0.0,
            expenses_salaries: expenses * EXPENSE_SPLIT[0],
            expenses_marketing: expenses * EXPENSE_SPLIT[1],
            expenses_infrastructure: expenses * EXPENSE_SPLIT[2],
            expenses_other: expenses * EXPENSE_SPLIT[3],
            cash_balance: cash,
        }
    }

    pub fn total_revenue(&self) -> f64 {
        self.revenue_recurring + self.revenue_one_time
    }

    pub fn total_expenses(&self) -> f64 {
        self.expenses_salaries
            + self.expenses_marketing
            + self.expenses_infrastructure
            + self.expenses_other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_buckets() {
        let input = FinancialRecordInput {
            month: "2024-03".into(),
            revenue_recurring: 20_000.0,
            revenue_one_time: 2_000.0,
            expenses_salaries: 30_000.0,
            expenses_marketing: 10_000.0,
            expenses_infrastructure: 5_000.0,
            expenses_other: 5_000.0,
            cash_balance: 142_000.0,
        };
        assert_eq!(input.total_revenue(), 22_000.0);
        assert_eq!(input.total_expenses(), 50_000.0);
    }

    #[test]
    fn from_totals_splits_expenses() {
        let input = FinancialRecordInput::from_totals("2024-01", 1_000.0, 10_000.0, 5_000.0);
        assert!((input.expenses_salaries - 6_000.0).abs() < 1e-9);
        assert!((input.expenses_marketing - 2_000.0).abs() < 1e-9);
        assert!((input.total_expenses() - 10_000.0).abs() < 1e-9);
        assert_eq!(input.revenue_one_time, 0.0);
    }
}
