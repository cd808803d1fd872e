use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Seminar {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub author_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
    pub term: i32,
}

/// Listing row joined with the author's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SeminarListItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
    pub term: i32,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Attendee {
    pub user_id: i64,
    pub name: String,
}

impl Seminar {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<SeminarListItem>> {
        let rows = sqlx::query_as::<_, SeminarListItem>(
            r#"
            SELECT s.id, s.name, s.description, u.name AS author, s.apply_till, s.term
            FROM seminars s
            JOIN users u ON s.author_id = u.id
            ORDER BY s.apply_till
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        description: &str,
        author_id: i64,
        apply_till: OffsetDateTime,
        term: i32,
    ) -> anyhow::Result<Seminar> {
        let row = sqlx::query_as::<_, Seminar>(
            r#"
            INSERT INTO seminars (name, description, author_id, apply_till, term)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, author_id, apply_till, term
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(author_id)
        .bind(apply_till)
        .bind(term)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(
        db: &PgPool,
        id: i64,
        name: &str,
        description: &str,
        apply_till: OffsetDateTime,
        term: i32,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE seminars SET name = $1, description = $2, apply_till = $3, term = $4
            WHERE id = $5
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(apply_till)
        .bind(term)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove the row and its applications in one transaction.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<u64> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM seminar_applications WHERE seminar_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM seminars WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    pub async fn exists(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT count(*) FROM seminars WHERE id = $1")
            .bind(id)
            .fetch_one(db)
            .await?;
        Ok(count > 0)
    }

    pub async fn has_applied(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM seminar_applications WHERE user_id = $1 AND seminar_id = $2",
        )
        .bind(user_id)
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(count > 0)
    }

    pub async fn apply(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<u64> {
        let result =
            sqlx::query("INSERT INTO seminar_applications (user_id, seminar_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(id)
                .execute(db)
                .await?;
        Ok(result.rows_affected())
    }

    pub async fn attendees(db: &PgPool, id: i64) -> anyhow::Result<Vec<Attendee>> {
        let rows = sqlx::query_as::<_, Attendee>(
            r#"
            SELECT u.id AS user_id, u.name
            FROM seminar_applications a
            JOIN users u ON a.user_id = u.id
            WHERE a.seminar_id = $1
            ORDER BY u.name
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
