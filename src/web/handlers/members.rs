//! Member pages

use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::Response,
    Extension, Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    models::{
        account::UserClaims,
        loan::LoanDetails,
        member::{Member, MemberQuery},
    },
    web::{error::WebResult, flash::FlashLevel, forms::MemberForm, PageContext},
    AppState,
};

use super::{form_error, redirect_with, FORM_INVALID};

#[derive(Template)]
#[template(path = "members/member_list.html")]
pub struct MemberListTemplate {
    page: PageContext,
    members: Vec<Member>,
    query: String,
}

#[derive(Template)]
#[template(path = "members/edit_member.html")]
pub struct EditMemberTemplate {
    page: PageContext,
    member: Member,
    loans: Vec<LoanDetails>,
}

/// `GET /members/`
pub async fn member_list(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
    Query(query): Query<MemberQuery>,
) -> WebResult<(CookieJar, MemberListTemplate)> {
    let members = state.services.members.list_members(&query).await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((
        jar,
        MemberListTemplate {
            page,
            members,
            query: query.q.unwrap_or_default(),
        },
    ))
}

/// `POST /members/add/`
pub async fn add_member(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<MemberForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return redirect_with(jar, FlashLevel::Error, FORM_INVALID, "/members/");
    };

    match state.services.members.create_member(form.into()).await {
        Ok(member) => redirect_with(
            jar,
            FlashLevel::Success,
            format!("Member \"{}\" added successfully!", member.name),
            "/members/",
        ),
        Err(e) => form_error(jar, &e, "/members/"),
    }
}

/// `GET /members/{id}/edit/`
pub async fn edit_member_form(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> WebResult<(CookieJar, EditMemberTemplate)> {
    let member = state.services.members.get_member(id).await?;
    let loans = state.services.members.member_loans(id).await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, EditMemberTemplate { page, member, loans }))
}

/// `POST /members/{id}/edit/`
pub async fn edit_member(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i32>,
    form: Result<Form<MemberForm>, FormRejection>,
) -> Response {
    let back = format!("/members/{}/edit/", id);
    let Ok(Form(form)) = form else {
        return redirect_with(jar, FlashLevel::Error, FORM_INVALID, &back);
    };

    match state.services.members.update_member(id, form.into()).await {
        Ok(member) => redirect_with(
            jar,
            FlashLevel::Success,
            format!("Member \"{}\" updated successfully!", member.name),
            "/members/",
        ),
        Err(e) => form_error(jar, &e, &back),
    }
}

/// `POST /members/{id}/delete/`
pub async fn delete_member(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Response {
    match state.services.members.delete_member(id).await {
        Ok(deletion) => {
            let mut message = format!("Member \"{}\" deleted successfully!", deletion.name);
            if deletion.copies_restored > 0 {
                message.push_str(&format!(
                    " {} borrowed cop{} returned to the shelf.",
                    deletion.copies_restored,
                    if deletion.copies_restored == 1 { "y" } else { "ies" }
                ));
            }
            redirect_with(jar, FlashLevel::Success, message, "/members/")
        }
        Err(e) => form_error(jar, &e, "/members/"),
    }
}
