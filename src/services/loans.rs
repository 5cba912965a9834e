//! Loan management service

use chrono::{DateTime, Utc};

use crate::{
    config::LibraryConfig,
    error::AppResult,
    models::loan::{CreateLoan, LoanDetails, LoanPolicy, LoanStatus, OverdueLoan},
    repository::Repository,
};

impl From<&LibraryConfig> for LoanPolicy {
    fn from(config: &LibraryConfig) -> Self {
        Self {
            fine_rate_per_day: config.fine_rate_per_day,
            default_loan_days: config.default_loan_days,
            utc_offset: config.utc_offset(),
        }
    }
}

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    policy: LoanPolicy,
}

impl LoansService {
    pub fn new(repository: Repository, policy: LoanPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    /// Lend a copy of a book to a member
    pub async fn lend(&self, request: CreateLoan) -> AppResult<LoanDetails> {
        let now = Utc::now();
        let due_date = self.policy.resolve_due_date(request.due_date, now)?;

        let loan = self
            .repository
            .loans
            .lend(request.book_id, request.member_id, due_date)
            .await?;

        let details = self.repository.loans.get_details(loan.id).await?;
        tracing::info!(
            "Loan created: id={} book={} member={} due={}",
            details.id,
            details.book.id,
            details.member.id,
            details.due_date
        );
        Ok(details)
    }

    /// Return a borrowed copy
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        let loan = self.repository.loans.return_loan(loan_id).await?;
        let details = self.repository.loans.get_details(loan.id).await?;
        tracing::info!("Loan returned: id={} book={}", details.id, details.book.id);
        Ok(details)
    }

    pub async fn get_loan(&self, loan_id: i32) -> AppResult<LoanDetails> {
        self.repository.loans.get_details(loan_id).await
    }

    /// Loans currently out
    pub async fn list_active(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_active(None).await
    }

    pub async fn list_returned(&self) -> AppResult<Vec<LoanDetails>> {
        self.repository.loans.list_returned().await
    }

    /// Loans in the given state. `overdue` lists borrowed loans past their due date.
    pub async fn list_by_status(&self, status: LoanStatus) -> AppResult<Vec<LoanDetails>> {
        match status {
            LoanStatus::Borrowed => self.list_active().await,
            LoanStatus::Returned => self.list_returned().await,
            LoanStatus::Overdue => self.repository.loans.list_overdue(Utc::now()).await,
        }
    }

    /// Overdue loans with days overdue and fine, computed at read time
    pub async fn list_overdue(&self, as_of: DateTime<Utc>) -> AppResult<Vec<OverdueLoan>> {
        let loans = self.repository.loans.list_overdue(as_of).await?;

        Ok(loans
            .into_iter()
            .map(|loan| {
                let (days_overdue, fine) = self.policy.assess(loan.due_date, as_of);
                OverdueLoan {
                    loan,
                    days_overdue,
                    fine,
                }
            })
            .collect())
    }
}
