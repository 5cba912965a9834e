//! Data models for Libris

pub mod account;
pub mod book;
pub mod dashboard;
pub mod loan;
pub mod member;

// Re-export commonly used types
pub use account::{Account, AccountRole, UserClaims};
pub use book::{Book, BookInput, BookSummary};
pub use dashboard::DashboardStats;
pub use loan::{Loan, LoanDetails, LoanPolicy, LoanStatus, OverdueLoan};
pub use member::Member;
