//! Page handlers

pub mod about;
pub mod accounts;
pub mod books;
pub mod dashboard;
pub mod members;

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::error::AppError;

use super::flash::{self, FlashLevel};

/// Redirect after a form post, carrying a flash message
pub(crate) fn redirect_with(
    jar: CookieJar,
    level: FlashLevel,
    message: impl Into<String>,
    to: &str,
) -> Response {
    (flash::push(jar, level, message), Redirect::to(to)).into_response()
}

/// Send a failed form post back to its form with the error as a flash
pub(crate) fn form_error(jar: CookieJar, err: &AppError, to: &str) -> Response {
    tracing::debug!("Form submission to {} failed: {}", to, err);
    redirect_with(jar, FlashLevel::Error, err.public_message(), to)
}

pub(crate) const FORM_INVALID: &str = "Please correct the errors below.";
