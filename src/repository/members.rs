//! Members repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{unique_violation, AppError, AppResult},
    models::member::{CreateMember, Member, MemberDeletion, MemberQuery, UpdateMember},
};

const DUPLICATE_EMAIL: &str = "A member with this email already exists";

#[derive(Clone)]
pub struct MembersRepository {
    pool: Pool<Postgres>,
}

impl MembersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List members ordered by name, optionally filtered by a search term
    pub async fn list(&self, query: &MemberQuery) -> AppResult<Vec<Member>> {
        let members = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                sqlx::query_as::<_, Member>(
                    r#"
                    SELECT * FROM members
                    WHERE name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1
                    ORDER BY name, id
                    "#,
                )
                .bind(format!("%{}%", q))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Member>("SELECT * FROM members ORDER BY name, id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(members)
    }

    /// Members allowed to borrow
    pub async fn list_active(&self) -> AppResult<Vec<Member>> {
        let members = sqlx::query_as::<_, Member>(
            "SELECT * FROM members WHERE is_active = TRUE ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    /// Get member by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Member> {
        sqlx::query_as::<_, Member>("SELECT * FROM members WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Check if email already exists (optionally ignoring one member)
    pub async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM members
                WHERE LOWER(email) = LOWER($1) AND ($2::int IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create member; membership date is set by the database
    pub async fn create(&self, data: &CreateMember) -> AppResult<Member> {
        sqlx::query_as::<_, Member>(
            r#"
            INSERT INTO members (name, email, phone, address, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))
    }

    /// Update the provided member fields
    pub async fn update(&self, id: i32, data: &UpdateMember) -> AppResult<Member> {
        let mut sets: Vec<String> = Vec::new();
        let mut idx = 1;

        macro_rules! add_field {
            ($field:expr, $name:expr) => {
                if $field.is_some() {
                    sets.push(format!("{} = ${}", $name, idx));
                    idx += 1;
                }
            };
        }

        add_field!(data.name, "name");
        add_field!(data.email, "email");
        add_field!(data.phone, "phone");
        add_field!(data.address, "address");
        add_field!(data.is_active, "is_active");

        if sets.is_empty() {
            return self.get_by_id(id).await;
        }

        let query = format!(
            "UPDATE members SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Member>(&query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(ref val) = $field {
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(data.name);
        bind_field!(data.email);
        bind_field!(data.phone);
        bind_field!(data.address);
        bind_field!(data.is_active);

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unique_violation(e, DUPLICATE_EMAIL))?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))
    }

    /// Delete a member and, through the foreign key cascade, their loans.
    /// Copies the member still had out are put back on the shelf first.
    ///
    /// Locks are taken member, then loans, then books, the same order lend
    /// and return follow, so a concurrent return either completes before the
    /// borrowed loans are read or finds its loan already gone.
    pub async fn delete(&self, id: i32) -> AppResult<MemberDeletion> {
        let mut tx = self.pool.begin().await?;

        let name: String = sqlx::query_scalar("SELECT name FROM members WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member with id {} not found", id)))?;

        let outstanding: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT book_id FROM book_loans
            WHERE member_id = $1 AND status = 'borrowed'
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let loans_removed: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM book_loans WHERE member_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if !outstanding.is_empty() {
            sqlx::query("SELECT id FROM books WHERE id = ANY($1) ORDER BY id FOR UPDATE")
                .bind(outstanding.as_slice())
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                UPDATE books b
                SET available_quantity = b.available_quantity + o.n, updated_at = NOW()
                FROM (
                    SELECT book_id, COUNT(*)::int AS n
                    FROM UNNEST($1::int[]) AS t(book_id)
                    GROUP BY book_id
                ) o
                WHERE b.id = o.book_id
                "#,
            )
            .bind(outstanding.as_slice())
            .execute(&mut *tx)
            .await?;
        }
        let copies_restored = outstanding.len() as i64;

        sqlx::query("DELETE FROM members WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(MemberDeletion {
            name,
            loans_removed,
            copies_restored,
        })
    }
}
