use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Competition {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub author_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
}

/// Listing row joined with the author's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CompetitionListItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub author: String,
    #[serde(with = "time::serde::rfc3339")]
    pub apply_till: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Applicant {
    pub user_id: i64,
    pub name: String,
}

impl Competition {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<CompetitionListItem>> {
        let rows = sqlx::query_as::<_, CompetitionListItem>(
            r#"
            SELECT c.id, c.name, c.description, u.name AS author, c.apply_till
            FROM competitions c
            JOIN users u ON c.author_id = u.id
            ORDER BY c.apply_till
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
    ) -> anyhow::Result<Competition> {
        let row = sqlx::query_as::<_, Competition>(
            r#"
            INSERT INTO competitions (name, description, author_id, apply_till)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, author_id, apply_till
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(author_id)
        .bind(apply_till)
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
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE competitions SET name = $1, description = $2, apply_till = $3 WHERE id = $4",
        )
        .bind(name)
        .bind(description)
        .bind(apply_till)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove the row and its applications in one transaction.
    pub async fn delete(db: &PgPool, id: i64) -> anyhow::Result<u64> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM competition_applications WHERE competition_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM competitions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    pub async fn exists(db: &PgPool, id: i64) -> anyhow::Result<bool> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT count(*) FROM competitions WHERE id = $1")
                .bind(id)
                .fetch_one(db)
                .await?;
        Ok(count > 0)
    }

    pub async fn has_applied(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM competition_applications WHERE user_id = $1 AND competition_id = $2",
        )
        .bind(user_id)
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(count > 0)
    }

    pub async fn apply(db: &PgPool, user_id: i64, id: i64) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "INSERT INTO competition_applications (user_id, competition_id) VALUES ($1, $2)",
        )
        .bind(user_id)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn applicants(db: &PgPool, id: i64) -> anyhow::Result<Vec<Applicant>> {
        let rows = sqlx::query_as::<_, Applicant>(
            r#"
            SELECT u.id AS user_id, u.name
            FROM competition_applications a
            JOIN users u ON a.user_id = u.id
            WHERE a.competition_id = $1
            ORDER BY u.name
            "#,
        )
        .bind(id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }
}
