//! Catalog and circulation pages

use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Path, Query, State},
    response::{Redirect, Response},
    Extension, Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, NaiveDate, Utc};

use crate::{
    error::AppResult,
    models::{
        account::UserClaims,
        book::{Book, BookInput, BookQuery, BookSummary},
        loan::{LoanDetails, OverdueLoan},
        member::Member,
    },
    web::{
        error::WebResult,
        flash::FlashLevel,
        forms::LendForm,
        PageContext,
    },
    AppState,
};

use super::{form_error, redirect_with, FORM_INVALID};

#[derive(Template)]
#[template(path = "books/book_list.html")]
pub struct BookListTemplate {
    page: PageContext,
    books: Vec<Book>,
    query: String,
}

#[derive(Template)]
#[template(path = "books/book_detail.html")]
pub struct BookDetailTemplate {
    page: PageContext,
    book: Book,
}

#[derive(Template)]
#[template(path = "books/add_book.html")]
pub struct AddBookTemplate {
    page: PageContext,
}

#[derive(Template)]
#[template(path = "books/edit_book.html")]
pub struct EditBookTemplate {
    page: PageContext,
    book: Book,
}

#[derive(Template)]
#[template(path = "books/lend_book.html")]
pub struct LendBookTemplate {
    page: PageContext,
    members: Vec<Member>,
    available_books: Vec<Book>,
    /// Earliest selectable due date (today)
    min_due_date: NaiveDate,
    /// Pre-filled due date (today plus the default loan length)
    default_due_date: NaiveDate,
}

#[derive(Template)]
#[template(path = "books/lent_books.html")]
pub struct LentBooksTemplate {
    page: PageContext,
    lent_books: Vec<LoanDetails>,
}

#[derive(Template)]
#[template(path = "books/return_book.html")]
pub struct ReturnBookTemplate {
    page: PageContext,
    returned_loans: Vec<LoanDetails>,
}

#[derive(Template)]
#[template(path = "books/overdue_books.html")]
pub struct OverdueBooksTemplate {
    page: PageContext,
    overdue_books: Vec<OverdueLoan>,
}

/// `GET /books/`
pub async fn book_list(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
    Query(query): Query<BookQuery>,
) -> WebResult<(CookieJar, BookListTemplate)> {
    let books = state.services.catalog.list_books(&query).await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((
        jar,
        BookListTemplate {
            page,
            books,
            query: query.q.unwrap_or_default(),
        },
    ))
}

/// `GET /books/{id}/`
pub async fn book_detail(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> WebResult<(CookieJar, BookDetailTemplate)> {
    let book = state.services.catalog.get_book(id).await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, BookDetailTemplate { page, book }))
}

/// `GET /books/add/`
pub async fn add_book_form(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
) -> WebResult<(CookieJar, AddBookTemplate)> {
    claims.require_librarian()?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, AddBookTemplate { page }))
}

/// `POST /books/add/`
pub async fn add_book(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
    form: Result<Form<BookInput>, FormRejection>,
) -> WebResult<Response> {
    claims.require_librarian()?;

    let Ok(Form(input)) = form else {
        return Ok(redirect_with(jar, FlashLevel::Error, FORM_INVALID, "/books/add/"));
    };

    match state.services.catalog.create_book(input).await {
        Ok(book) => Ok(redirect_with(
            jar,
            FlashLevel::Success,
            format!("Book \"{}\" added successfully!", book.title),
            "/books/",
        )),
        Err(e) => Ok(form_error(jar, &e, "/books/add/")),
    }
}

/// `GET /books/{id}/edit/`
pub async fn edit_book_form(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> WebResult<(CookieJar, EditBookTemplate)> {
    claims.require_librarian()?;
    let book = state.services.catalog.get_book(id).await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, EditBookTemplate { page, book }))
}

/// `POST /books/{id}/edit/`
pub async fn edit_book(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
    Path(id): Path<i32>,
    form: Result<Form<BookInput>, FormRejection>,
) -> WebResult<Response> {
    claims.require_librarian()?;

    let back = format!("/books/{}/edit/", id);
    let Ok(Form(input)) = form else {
        return Ok(redirect_with(jar, FlashLevel::Error, FORM_INVALID, &back));
    };

    match state.services.catalog.update_book(id, input).await {
        Ok((book, adjustment)) => {
            let jar = match adjustment.warning() {
                Some(warning) => crate::web::flash::push(jar, FlashLevel::Warning, warning),
                None => jar,
            };
            Ok(redirect_with(
                jar,
                FlashLevel::Success,
                format!("Book \"{}\" updated successfully!", book.title),
                "/books/",
            ))
        }
        Err(e) => Ok(form_error(jar, &e, &back)),
    }
}

/// `GET /books/lend/`
pub async fn lend_book_form(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
) -> WebResult<(CookieJar, LendBookTemplate)> {
    let members = state.services.members.list_active().await?;
    let available_books = state.services.catalog.list_available().await?;

    let policy = state.services.loans.policy();
    let now = Utc::now();
    let min_due_date = policy.local_date(now);
    let default_due_date = policy.local_date(now + Duration::days(policy.default_loan_days));

    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((
        jar,
        LendBookTemplate {
            page,
            members,
            available_books,
            min_due_date,
            default_due_date,
        },
    ))
}

/// `POST /books/lend/`
pub async fn lend_book(
    State(state): State<AppState>,
    jar: CookieJar,
    form: Result<Form<LendForm>, FormRejection>,
) -> Response {
    let Ok(Form(form)) = form else {
        return redirect_with(jar, FlashLevel::Error, "Select a member and a book.", "/books/lend/");
    };

    match state.services.loans.lend(form.into()).await {
        Ok(loan) => redirect_with(
            jar,
            FlashLevel::Success,
            format!("\"{}\" lent to {}.", loan.book.title, loan.member.name),
            "/books/lent/",
        ),
        Err(e) => form_error(jar, &e, "/books/lend/"),
    }
}

/// `GET /books/lent/`
pub async fn lent_books(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
) -> WebResult<(CookieJar, LentBooksTemplate)> {
    let lent_books = state.services.loans.list_active().await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, LentBooksTemplate { page, lent_books }))
}

/// `GET /books/return/`
pub async fn return_book(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
) -> WebResult<(CookieJar, ReturnBookTemplate)> {
    let returned_loans = state.services.loans.list_returned().await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, ReturnBookTemplate { page, returned_loans }))
}

/// `GET /books/overdue/`
pub async fn overdue_books(
    State(state): State<AppState>,
    Extension(claims): Extension<UserClaims>,
    jar: CookieJar,
) -> WebResult<(CookieJar, OverdueBooksTemplate)> {
    let overdue_books = state.services.loans.list_overdue(Utc::now()).await?;
    let (jar, page) = PageContext::take(&state, Some(&claims), jar);
    Ok((jar, OverdueBooksTemplate { page, overdue_books }))
}

/// `POST /books/process-return/{loan_id}/`
pub async fn process_return(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(loan_id): Path<i32>,
) -> Response {
    match state.services.loans.return_loan(loan_id).await {
        Ok(loan) => redirect_with(
            jar,
            FlashLevel::Success,
            format!("Book \"{}\" returned successfully!", loan.book.title),
            "/books/return/",
        ),
        Err(e) => form_error(jar, &e, "/books/return/"),
    }
}

/// `GET /books/process-return/{loan_id}/` does nothing but go back to the returns page
pub async fn process_return_get() -> Redirect {
    Redirect::to("/books/return/")
}

/// `GET /api/books/`
pub async fn book_api(State(state): State<AppState>) -> AppResult<Json<Vec<BookSummary>>> {
    let books = state.services.catalog.summaries().await?;
    Ok(Json(books))
}
