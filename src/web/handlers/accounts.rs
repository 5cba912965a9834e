//! Session login and logout

use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    models::account::UserClaims,
    web::{
        flash::FlashLevel,
        forms::{LoginForm, NextQuery},
        middleware::{login_redirect, safe_next, LOGIN_URL},
        PageContext,
    },
    AppState,
};

use super::redirect_with;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    page: PageContext,
    next: String,
}

/// `GET /accounts/login/`
pub async fn login_form(
    State(state): State<AppState>,
    claims: Option<Extension<UserClaims>>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref()).to_string();

    if claims.is_some() {
        return Redirect::to(&next).into_response();
    }

    let (jar, page) = PageContext::take(&state, None, jar);
    (jar, LoginTemplate { page, next }).into_response()
}

/// `POST /accounts/login/`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return redirect_with(jar, FlashLevel::Error, "Enter a username and password.", LOGIN_URL);
    };

    let next = safe_next(form.next.as_deref()).to_string();

    match state
        .services
        .auth
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok((token, _account)) => {
            let auth = &state.config.auth;
            let cookie = Cookie::build((auth.session_cookie.clone(), token))
                .path("/")
                .http_only(true)
                .secure(auth.secure_cookies)
                .same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to(&next)).into_response()
        }
        Err(e) => {
            let message = e.public_message();
            redirect_with(jar, FlashLevel::Error, message, &login_redirect(&next))
        }
    }
}

/// `POST /accounts/logout/`
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(state.config.auth.session_cookie.clone()).path("/"));
    redirect_with(jar, FlashLevel::Info, "You have been logged out.", LOGIN_URL)
}
