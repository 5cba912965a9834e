//! Dashboard aggregates

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::loan::LoanDetails;

/// Read-only snapshot shown on the dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardStats {
    pub generated_at: DateTime<Utc>,
    /// Borrowed loans past their due date
    pub overdue_count: i64,
    /// Titles with at least one copy on the shelf
    pub available_books: i64,
    /// Active (borrowed) loans
    pub issued_books: i64,
    pub total_books: i64,
    pub issued_percentage: f64,
    pub overdue_percentage: f64,
    pub recent_loans: Vec<LoanDetails>,
    /// Borrowed loans whose due date falls on today's local date
    pub due_today: Vec<LoanDetails>,
}

/// `part / total * 100` rounded to one decimal, 0 when there is nothing to divide by
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}
