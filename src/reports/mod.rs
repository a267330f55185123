//! Financial report periods, query building and response normalization.

use crate::client::ApiClient;
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reporting window selected in the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "period")]
pub enum ReportPeriod {
    Today,
    /// Last seven days up to today
    Week,
    /// Month to date
    Month,
    /// Year to date
    Year,
    Custom {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
}

impl Default for ReportPeriod {
    fn default() -> Self {
        Self::Month
    }
}

/// Inclusive date bounds; an open start means "from the beginning".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: NaiveDate,
}

impl ReportPeriod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Custom { .. } => "custom",
        }
    }

    pub fn date_range(&self, today: NaiveDate) -> DateRange {
        let start = match self {
            Self::Today => Some(today),
            Self::Week => Some(today - Duration::days(7)),
            Self::Month => today.with_day(1),
            Self::Year => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Self::Custom { from, to } => {
                return DateRange {
                    start: *from,
                    end: to.unwrap_or(today),
                }
            }
        };
        DateRange { start, end: today }
    }

    /// Query parameters for `GET /financial/reports`.
    pub fn to_query_pairs(&self, today: NaiveDate) -> Vec<(String, String)> {
        let range = self.date_range(today);
        let mut pairs = vec![("period".to_string(), self.name().to_string())];
        if let Some(start) = range.start {
            pairs.push(("date_from".to_string(), start.format(DATE_FORMAT).to_string()));
        }
        pairs.push(("date_to".to_string(), range.end.format(DATE_FORMAT).to_string()));
        pairs
    }
}

/// Headline figures of a financial report. Amounts are in FCFA.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinancialSummary {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_profit: Decimal,
    /// Percentage of revenue kept as profit
    pub profit_margin: Decimal,
    pub completed_deliveries: u64,
    pub revenue_from_deliveries: Decimal,
    pub average_revenue_per_delivery: Decimal,
    pub average_expense_per_transaction: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    pub summary: FinancialSummary,
    pub driver_stats: Vec<Value>,
    pub expense_breakdown: Vec<Value>,
    pub revenue_trend: Vec<Value>,
}

impl FinancialReport {
    /// All-zero report shown when the backend cannot be reached.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes either response shape the backend has used: the current
    /// one with a `summary` object, or the older flat one with raw totals.
    pub fn from_response(response: &Value) -> Self {
        match response.get("summary").filter(|s| s.is_object()) {
            Some(summary) => Self {
                summary: summary_from_object(summary),
                driver_stats: array_field(response, "driverStats"),
                expense_breakdown: array_field(response, "expenseBreakdown"),
                revenue_trend: array_field(response, "revenueTrend"),
            },
            None => Self {
                summary: summary_from_totals(response),
                driver_stats: array_field(response, "drivers"),
                expense_breakdown: array_field(response, "expensesByType"),
                revenue_trend: Vec::new(),
            },
        }
    }
}

/// Reads a `summary` object field by field; a null or non-numeric field
/// reads as zero without discarding its siblings.
fn summary_from_object(summary: &Value) -> FinancialSummary {
    FinancialSummary {
        total_revenue: decimal_field(summary, "totalRevenue"),
        total_expenses: decimal_field(summary, "totalExpenses"),
        net_profit: decimal_field(summary, "netProfit"),
        profit_margin: decimal_field(summary, "profitMargin"),
        completed_deliveries: count_field(summary, "completedDeliveries"),
        revenue_from_deliveries: decimal_field(summary, "revenueFromDeliveries"),
        average_revenue_per_delivery: decimal_field(summary, "averageRevenuePerDelivery"),
        average_expense_per_transaction: decimal_field(summary, "averageExpensePerTransaction"),
    }
}

fn summary_from_totals(response: &Value) -> FinancialSummary {
    let total_revenue = decimal_field(response, "totalRevenue");
    let total_expenses = decimal_field(response, "totalExpenses");
    let completed_deliveries = count_field(response, "completedDeliveries");
    let expense_transactions = count_field(response, "totalExpenseTransactions");
    let net_profit = total_revenue - total_expenses;

    FinancialSummary {
        total_revenue,
        total_expenses,
        net_profit,
        profit_margin: ratio(net_profit * Decimal::ONE_HUNDRED, total_revenue),
        completed_deliveries,
        revenue_from_deliveries: total_revenue,
        average_revenue_per_delivery: ratio(total_revenue, Decimal::from(completed_deliveries)),
        average_expense_per_transaction: ratio(total_expenses, Decimal::from(expense_transactions)),
    }
}

/// `numerator / denominator` to two decimals, zero when the denominator is zero.
fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator
        .checked_div(denominator)
        .map(|value| value.round_dp(2))
        .unwrap_or(Decimal::ZERO)
}

fn decimal_field(value: &Value, key: &str) -> Decimal {
    value
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or(Decimal::ZERO)
}

fn count_field(value: &Value, key: &str) -> u64 {
    value
        .get(key)
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0)
}

fn array_field(value: &Value, key: &str) -> Vec<Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Fetches financial reports through the authenticated API client.
#[derive(Clone)]
pub struct ReportsClient {
    api: ApiClient,
}

impl ReportsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Report for `period` as of `today`. Failures are logged and yield
    /// [`FinancialReport::empty`] so the dashboard can always render.
    pub async fn fetch(&self, period: ReportPeriod, today: NaiveDate) -> FinancialReport {
        let query = period.to_query_pairs(today);
        match self
            .api
            .get_json::<Value>("/financial/reports", &query)
            .await
        {
            Ok(response) => FinancialReport::from_response(&response),
            Err(err) => {
                error!(error = %err, period = period.name(), "error fetching financial report");
                FinancialReport::empty()
            }
        }
    }
}
