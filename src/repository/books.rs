//! Books repository for database operations

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{unique_violation, AppError, AppResult},
    models::book::{reconcile_quantity, Book, BookInput, BookQuery, BookSummary, QuantityAdjustment},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books ordered by title, optionally filtered by a search term
    pub async fn list(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let books = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                sqlx::query_as::<_, Book>(
                    r#"
                    SELECT * FROM books
                    WHERE title ILIKE $1 OR author ILIKE $1 OR isbn ILIKE $1
                    ORDER BY title, id
                    "#,
                )
                .bind(format!("%{}%", q))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(books)
    }

    /// Books with at least one copy on the shelf
    pub async fn list_available(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE available_quantity > 0 ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Rows for the public book API
    pub async fn list_summaries(&self) -> AppResult<Vec<BookSummary>> {
        let books = sqlx::query_as::<_, BookSummary>(
            "SELECT id, title, author, isbn, available_quantity FROM books ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Check if an ISBN is already catalogued (optionally ignoring one book)
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a book with every copy available
    pub async fn create(&self, data: &BookInput) -> AppResult<Book> {
        let now = Utc::now();

        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, publication_year, quantity, available_quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.isbn)
        .bind(data.publication_year)
        .bind(data.quantity)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "A book with this ISBN already exists"))
    }

    /// Update a book. The row is locked while active loans are counted so a
    /// concurrent lend or return cannot slip between the count and the write.
    pub async fn update(&self, id: i32, data: &BookInput) -> AppResult<(Book, QuantityAdjustment)> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        let active_loans: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_loans WHERE book_id = $1 AND status = 'borrowed'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let adjustment = reconcile_quantity(data.quantity, active_loans);

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author = $2, isbn = $3, publication_year = $4,
                quantity = $5, available_quantity = $6, updated_at = $7
            WHERE id = $8
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.author)
        .bind(&data.isbn)
        .bind(data.publication_year)
        .bind(adjustment.quantity)
        .bind(adjustment.available_quantity)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, "A book with this ISBN already exists"))?;

        tx.commit().await?;

        Ok((book, adjustment))
    }

    /// Count catalogued titles
    pub async fn count_total(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count titles with at least one copy on the shelf
    pub async fn count_available(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE available_quantity > 0")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
