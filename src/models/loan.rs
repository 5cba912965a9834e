//! Book loan model, overdue rules and fines

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use std::fmt;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

/// Loan lifecycle status. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Borrowed,
    Returned,
    Overdue,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "borrowed",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Borrowed => "Borrowed",
            LoanStatus::Returned => "Returned",
            LoanStatus::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "borrowed" => Ok(LoanStatus::Borrowed),
            "returned" => Ok(LoanStatus::Returned),
            "overdue" => Ok(LoanStatus::Overdue),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

// Stored as TEXT
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i32,
    pub book_id: i32,
    pub member_id: i32,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    /// A returned loan is never overdue; otherwise overdue once `now` passes the due date
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        is_overdue(self.status, self.due_date, now)
    }
}

pub fn is_overdue(status: LoanStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status != LoanStatus::Returned && now > due_date
}

/// Book fields shown alongside a loan
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanBook {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
}

/// Member fields shown alongside a loan
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanMember {
    pub id: i32,
    pub name: String,
    pub email: String,
}

/// Internal row structure for loan queries joined with books and members
#[derive(Debug, Clone, FromRow)]
pub struct LoanDetailsRow {
    id: i32,
    book_id: i32,
    member_id: i32,
    borrowed_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    returned_date: Option<DateTime<Utc>>,
    status: LoanStatus,
    book_title: String,
    book_author: String,
    book_isbn: String,
    member_name: String,
    member_email: String,
}

impl LoanDetailsRow {
    pub fn into_details(self, now: DateTime<Utc>) -> LoanDetails {
        LoanDetails {
            id: self.id,
            book: LoanBook {
                id: self.book_id,
                title: self.book_title,
                author: self.book_author,
                isbn: self.book_isbn,
            },
            member: LoanMember {
                id: self.member_id,
                name: self.member_name,
                email: self.member_email,
            },
            borrowed_date: self.borrowed_date,
            due_date: self.due_date,
            returned_date: self.returned_date,
            status: self.status,
            is_overdue: is_overdue(self.status, self.due_date, now),
        }
    }
}

/// Loan with book and member for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub book: LoanBook,
    pub member: LoanMember,
    pub borrowed_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub is_overdue: bool,
}

impl fmt::Display for LoanDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.book.title, self.member.name)
    }
}

/// An overdue loan with its read-time fine
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueLoan {
    pub loan: LoanDetails,
    /// Whole library-local calendar days past the due date
    pub days_overdue: i64,
    #[schema(value_type = String)]
    pub fine: Decimal,
}

/// Lend request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_id: i32,
    pub member_id: i32,
    /// Last day of the loan; the loan ends at 23:59:59 library time
    pub due_date: Option<NaiveDate>,
}

/// Loan list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LoanQuery {
    /// `borrowed` (default) or `returned`
    pub status: Option<LoanStatus>,
}

/// Fine and due-date rules, evaluated on the library-local calendar
#[derive(Debug, Clone)]
pub struct LoanPolicy {
    pub fine_rate_per_day: Decimal,
    pub default_loan_days: i64,
    pub utc_offset: FixedOffset,
}

impl LoanPolicy {
    pub fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }

    /// Due date for a new loan: the chosen day at 23:59:59 local time, or
    /// `default_loan_days` from now
    pub fn resolve_due_date(
        &self,
        requested: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> AppResult<DateTime<Utc>> {
        let Some(day) = requested else {
            return Ok(now + Duration::days(self.default_loan_days));
        };

        if day < self.local_date(now) {
            return Err(AppError::Validation(
                "Due date cannot be in the past".to_string(),
            ));
        }

        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)
            .ok_or_else(|| AppError::Internal("Invalid end-of-day time".to_string()))?;

        self.utc_offset
            .from_local_datetime(&day.and_time(end_of_day))
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| AppError::Validation(format!("Invalid due date: {}", day)))
    }

    /// Days overdue and fine as of `as_of`. Zero for loans that are not yet
    /// past their due day.
    pub fn assess(&self, due_date: DateTime<Utc>, as_of: DateTime<Utc>) -> (i64, Decimal) {
        let days = (self.local_date(as_of) - self.local_date(due_date))
            .num_days()
            .max(0);
        (days, self.fine_rate_per_day * Decimal::from(days))
    }

    /// Start and end (exclusive) of the local calendar day containing `now`, in UTC
    pub fn day_bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let midnight = self.local_date(now).and_time(NaiveTime::MIN);
        let start = self
            .utc_offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now);
        (start, start + Duration::days(1))
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            fine_rate_per_day: Decimal::from(50),
            default_loan_days: 14,
            utc_offset: Utc.fix(),
        }
    }
}
