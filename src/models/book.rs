//! Book (catalog) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publication_year: i32,
    /// Copies owned by the library
    pub quantity: i32,
    /// Copies currently on the shelf
    pub available_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.available_quantity > 0
    }

    /// Copies currently lent out
    pub fn on_loan(&self) -> i32 {
        self.quantity - self.available_quantity
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

/// Book fields submitted on create and edit
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInput {
    #[validate(length(min = 1, max = 200, message = "Title is required (200 characters max)"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author is required (200 characters max)"))]
    pub author: String,
    #[validate(length(min = 10, max = 13, message = "ISBN must be 10 to 13 characters"))]
    pub isbn: String,
    #[validate(range(min = 0, max = 9999, message = "Publication year is out of range"))]
    pub publication_year: i32,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
}

impl BookInput {
    /// Trim surrounding whitespace the way form fields usually arrive
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.author = self.author.trim().to_string();
        self.isbn = self.isbn.trim().replace('-', "");
        self
    }
}

/// Row returned by the public book API
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub available_quantity: i32,
}

/// Book list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Case-insensitive search in title, author and ISBN
    pub q: Option<String>,
}

/// Outcome of reconciling a requested quantity with the copies on loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct QuantityAdjustment {
    pub quantity: i32,
    pub available_quantity: i32,
    pub active_loans: i64,
    /// The requested quantity was below the active loan count and was raised
    pub clamped: bool,
}

impl QuantityAdjustment {
    pub fn warning(&self) -> Option<String> {
        self.clamped.then(|| {
            format!(
                "Quantity set below active loans ({}). Adjusted to match.",
                self.active_loans
            )
        })
    }
}

/// Never let the quantity drop under the copies that are out; whatever is
/// left over is on the shelf.
pub fn reconcile_quantity(requested: i32, active_loans: i64) -> QuantityAdjustment {
    let active = i32::try_from(active_loans).unwrap_or(i32::MAX);
    let clamped = requested < active;
    let quantity = if clamped { active } else { requested };

    QuantityAdjustment {
        quantity,
        available_quantity: (quantity - active).max(0),
        active_loans,
        clamped,
    }
}
