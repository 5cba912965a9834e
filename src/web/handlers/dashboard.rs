//! Dashboard page

use askama::Template;
use axum::{extract::State, Extension};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::{
    models::{account::UserClaims, dashboard::DashboardStats},
    web::{error::WebResult, PageContext},
    AppState,
};

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    page: PageContext,
    stats: DashboardStats,
}

/// `GET /`
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
) -> WebResult<(CookieJar, DashboardTemplate)> {
    let stats = state.services.dashboard.summary(Utc::now()).await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, DashboardTemplate { page, stats }))
}
