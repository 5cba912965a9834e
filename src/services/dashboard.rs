//! Dashboard statistics service

use chrono::{DateTime, Utc};

use crate::{
    error::AppResult,
    models::{
        dashboard::{percentage, DashboardStats},
        loan::LoanPolicy,
    },
    repository::Repository,
};

/// Rows shown in each dashboard list
const LIST_LIMIT: i64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    repository: Repository,
    policy: LoanPolicy,
}

impl DashboardService {
    pub fn new(repository: Repository, policy: LoanPolicy) -> Self {
        Self { repository, policy }
    }

    /// Snapshot of the library as of `now`
    pub async fn summary(&self, now: DateTime<Utc>) -> AppResult<DashboardStats> {
        let total_books = self.repository.books.count_total().await?;
        let available_books = self.repository.books.count_available().await?;
        let issued_books = self.repository.loans.count_active().await?;
        let overdue_count = self.repository.loans.count_overdue(now).await?;

        let recent_loans = self.repository.loans.list_active(Some(LIST_LIMIT)).await?;

        let (start, end) = self.policy.day_bounds(now);
        let due_today = self
            .repository
            .loans
            .list_due_between(start, end, LIST_LIMIT)
            .await?;

        Ok(DashboardStats {
            generated_at: now,
            overdue_count,
            available_books,
            issued_books,
            total_books,
            issued_percentage: percentage(issued_books, total_books),
            overdue_percentage: percentage(overdue_count, total_books),
            recent_loans,
            due_today,
        })
    }
}
