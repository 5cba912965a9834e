//! Server-rendered staff interface

pub mod error;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod routes;

use std::borrow::Borrow;

use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, FixedOffset, Utc};

use crate::{models::account::UserClaims, AppState};

use self::flash::Flash;

/// Data every page template needs for the layout
#[derive(Debug, Clone)]
pub struct PageContext {
    pub username: Option<String>,
    pub is_librarian: bool,
    pub flashes: Vec<Flash>,
    pub currency: String,
    pub utc_offset: FixedOffset,
}

impl PageContext {
    pub fn new(state: &AppState, claims: Option<&UserClaims>, flashes: Vec<Flash>) -> Self {
        Self {
            username: claims.map(|c| c.username().to_string()),
            is_librarian: claims.map(UserClaims::is_librarian).unwrap_or(false),
            flashes,
            currency: state.config.library.currency.clone(),
            utc_offset: state.config.library.utc_offset(),
        }
    }

    /// Timestamp on the library-local clock
    pub fn datetime(&self, at: impl Borrow<DateTime<Utc>>) -> String {
        let at: &DateTime<Utc> = at.borrow();
        at.with_timezone(&self.utc_offset)
            .format("%b %d, %Y %H:%M")
            .to_string()
    }

    /// Optional timestamp, dash when absent
    pub fn maybe_datetime(&self, at: impl Borrow<Option<DateTime<Utc>>>) -> String {
        let at: &Option<DateTime<Utc>> = at.borrow();
        at.as_ref()
            .map(|at| self.datetime(at))
            .unwrap_or_else(|| "-".to_string())
    }

    /// Calendar day on the library-local clock
    pub fn date(&self, at: impl Borrow<DateTime<Utc>>) -> String {
        let at: &DateTime<Utc> = at.borrow();
        at.with_timezone(&self.utc_offset)
            .format("%b %d, %Y")
            .to_string()
    }

    /// Context for a page render, draining pending flash messages
    pub fn take(state: &AppState, claims: Option<&UserClaims>, jar: CookieJar) -> (CookieJar, Self) {
        let (jar, flashes) = flash::take(jar);
        (jar, Self::new(state, claims, flashes))
    }
}
