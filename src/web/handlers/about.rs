//! Public about page

use askama::Template;
use axum::{extract::State, Extension};
use axum_extra::extract::cookie::CookieJar;

use crate::{models::account::UserClaims, web::PageContext, AppState};

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    page: PageContext,
    version: &'static str,
}

/// `GET /about/` and `GET /about_us/`
pub async fn about_us(
    State(state): State<AppState>,
    claims: Option<Extension<UserClaims>>,
    jar: CookieJar,
) -> (CookieJar, AboutTemplate) {
    let claims = claims.map(|Extension(c)| c);
    let (jar, page) = PageContext::take(&state, claims.as_ref(), jar);
    (
        jar,
        AboutTemplate {
            page,
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}
