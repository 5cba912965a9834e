//! HTML route table

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

use super::handlers::{about, accounts, books, dashboard, members};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        // Books
        .route("/books/", get(books::book_list))
        .route("/books/add/", get(books::add_book_form).post(books::add_book))
        .route("/books/lend/", get(books::lend_book_form).post(books::lend_book))
        .route("/books/lent/", get(books::lent_books))
        .route("/books/return/", get(books::return_book))
        .route("/books/overdue/", get(books::overdue_books))
        .route(
            "/books/process-return/:loan_id/",
            get(books::process_return_get).post(books::process_return),
        )
        .route("/books/:id/", get(books::book_detail))
        .route("/books/:id/edit/", get(books::edit_book_form).post(books::edit_book))
        .route("/api/books/", get(books::book_api))
        // About
        .route("/about/", get(about::about_us))
        .route("/about_us/", get(about::about_us))
        // Members
        .route("/members/", get(members::member_list))
        .route("/members/add/", post(members::add_member))
        .route("/members/:id/edit/", get(members::edit_member_form).post(members::edit_member))
        .route("/members/:id/delete/", post(members::delete_member))
        // Accounts
        .route("/accounts/login/", get(accounts::login_form).post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
}
