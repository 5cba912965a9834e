//! Catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookInput, BookQuery, BookSummary, QuantityAdjustment},
    repository::Repository,
};

const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List books, optionally filtered by a search term
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        self.repository.books.list(query).await
    }

    /// Books that can be lent right now
    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list_available().await
    }

    /// Compact rows for the public book API
    pub async fn summaries(&self) -> AppResult<Vec<BookSummary>> {
        self.repository.books.list_summaries().await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new catalog entry with every copy on the shelf
    pub async fn create_book(&self, input: BookInput) -> AppResult<Book> {
        let input = input.normalized();
        input.validate()?;

        if self.repository.books.isbn_exists(&input.isbn, None).await? {
            return Err(AppError::Validation(DUPLICATE_ISBN.to_string()));
        }

        let book = self.repository.books.create(&input).await?;
        tracing::info!("Catalog create: book id={} isbn={} quantity={}", book.id, book.isbn, book.quantity);
        Ok(book)
    }

    /// Update a catalog entry. The quantity is raised to the number of copies
    /// on loan when set lower; the returned adjustment says so.
    pub async fn update_book(&self, id: i32, input: BookInput) -> AppResult<(Book, QuantityAdjustment)> {
        let input = input.normalized();
        input.validate()?;
        self.repository.books.get_by_id(id).await?;

        if self.repository.books.isbn_exists(&input.isbn, Some(id)).await? {
            return Err(AppError::Validation(DUPLICATE_ISBN.to_string()));
        }

        let (book, adjustment) = self.repository.books.update(id, &input).await?;

        if adjustment.clamped {
            tracing::warn!(
                "Catalog update: book id={} quantity {} below {} active loans, set to {}",
                id,
                input.quantity,
                adjustment.active_loans,
                adjustment.quantity
            );
        }

        Ok((book, adjustment))
    }
}
