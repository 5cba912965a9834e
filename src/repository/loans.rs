//! Loans repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanDetails, LoanDetailsRow, LoanStatus},
};

/// Loan columns joined with the book and member they reference
const DETAILS_SELECT: &str = r#"
    SELECT l.id, l.book_id, l.member_id, l.borrowed_date, l.due_date,
           l.returned_date, l.status,
           b.title AS book_title, b.author AS book_author, b.isbn AS book_isbn,
           m.name AS member_name, m.email AS member_email
    FROM book_loans l
    JOIN books b ON b.id = l.book_id
    JOIN members m ON m.id = l.member_id
"#;

fn with_overdue_flag(rows: Vec<LoanDetailsRow>) -> Vec<LoanDetails> {
    let now = Utc::now();
    rows.into_iter().map(|row| row.into_details(now)).collect()
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM book_loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get loan with book and member details
    pub async fn get_details(&self, id: i32) -> AppResult<LoanDetails> {
        let sql = format!("{} WHERE l.id = $1", DETAILS_SELECT);
        let row = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))?;
        Ok(row.into_details(Utc::now()))
    }

    /// Lend a copy: insert the loan and take one copy off the shelf in a
    /// single transaction. The member row is share-locked before the book
    /// row so a concurrent member delete waits for the loan or is waited on.
    pub async fn lend(
        &self,
        book_id: i32,
        member_id: i32,
        due_date: DateTime<Utc>,
    ) -> AppResult<Loan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let member_active: bool =
            sqlx::query_scalar("SELECT is_active FROM members WHERE id = $1 FOR SHARE")
                .bind(member_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", member_id)))?;

        if !member_active {
            return Err(AppError::Validation(
                "Selected member is not active.".to_string(),
            ));
        }

        let available: i32 = sqlx::query_scalar(
            "SELECT available_quantity FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        if available <= 0 {
            return Err(AppError::Validation(
                "Selected book is not available.".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO book_loans (book_id, member_id, borrowed_date, due_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(member_id)
        .bind(now)
        .bind(due_date)
        .bind(LoanStatus::Borrowed)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE books
            SET available_quantity = available_quantity - 1, updated_at = $2
            WHERE id = $1 AND available_quantity > 0
            "#,
        )
        .bind(book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Mark a loan returned and put the copy back on the shelf
    pub async fn return_loan(&self, loan_id: i32) -> AppResult<Loan> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>("SELECT * FROM book_loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.status == LoanStatus::Returned {
            return Err(AppError::Validation("Loan already returned".to_string()));
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE book_loans
            SET status = $2, returned_date = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(LoanStatus::Returned)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE books
            SET available_quantity = available_quantity + 1, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(loan.book_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Borrowed loans, most recent first
    pub async fn list_active(&self, limit: Option<i64>) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.status = $1 ORDER BY l.borrowed_date DESC, l.id DESC LIMIT $2",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .bind(LoanStatus::Borrowed)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(with_overdue_flag(rows))
    }

    /// Returned loans, most recently returned first
    pub async fn list_returned(&self) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.status = $1 ORDER BY l.returned_date DESC, l.id DESC",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .bind(LoanStatus::Returned)
            .fetch_all(&self.pool)
            .await?;
        Ok(with_overdue_flag(rows))
    }

    /// Borrowed loans due before `as_of`, oldest due date first
    pub async fn list_overdue(&self, as_of: DateTime<Utc>) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.status = $1 AND l.due_date < $2 ORDER BY l.due_date ASC, l.id ASC",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .bind(LoanStatus::Borrowed)
            .bind(as_of)
            .fetch_all(&self.pool)
            .await?;
        Ok(with_overdue_flag(rows))
    }

    /// Borrowed loans due within `[start, end)`
    pub async fn list_due_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            r#"{}
            WHERE l.status = $1 AND l.due_date >= $2 AND l.due_date < $3
            ORDER BY l.due_date ASC, l.id ASC
            LIMIT $4"#,
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .bind(LoanStatus::Borrowed)
            .bind(start)
            .bind(end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(with_overdue_flag(rows))
    }

    /// All loans of a member, most recent first
    pub async fn list_for_member(&self, member_id: i32) -> AppResult<Vec<LoanDetails>> {
        let sql = format!(
            "{} WHERE l.member_id = $1 ORDER BY l.borrowed_date DESC, l.id DESC",
            DETAILS_SELECT
        );
        let rows = sqlx::query_as::<_, LoanDetailsRow>(&sql)
            .bind(member_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(with_overdue_flag(rows))
    }

    /// Count active loans
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_loans WHERE status = 'borrowed'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count overdue loans
    pub async fn count_overdue(&self, as_of: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_loans WHERE status = 'borrowed' AND due_date < $1",
        )
        .bind(as_of)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
