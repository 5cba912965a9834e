//! Library member model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Member model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Set once when the member is registered
    pub membership_date: DateTime<Utc>,
    pub is_active: bool,
}

/// Create member request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateMember {
    #[validate(length(min = 1, max = 200, message = "Name is required (200 characters max)"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, max = 15, message = "Phone must be 1 to 15 characters"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
}

/// Update member request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateMember {
    #[validate(length(min = 1, max = 200, message = "Name is required (200 characters max)"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 15, message = "Phone must be 1 to 15 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

/// Member list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MemberQuery {
    /// Case-insensitive search in name, email and phone
    pub q: Option<String>,
}

/// What a member deletion removed
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberDeletion {
    pub name: String,
    /// Loans removed along with the member
    pub loans_removed: i64,
    /// Copies that were still out and went back on the shelf
    pub copies_restored: i64,
}
