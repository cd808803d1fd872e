use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info};

use crate::{
    auth::{dto::UpdateProfileRequest, password::hash_password, repo::User},
    error::ApiError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileOutcome {
    /// Nothing differed from the stored row; no statement was executed.
    Unchanged,
    Updated,
}

/// The set of columns that actually changed, in a fixed order.
///
/// Column names are static strings; requested values are only ever bound as
/// parameters, never spliced into SQL text.
#[derive(Debug)]
pub struct ProfileChanges {
    pairs: Vec<(&'static str, String)>,
}

impl ProfileChanges {
    /// Compare the stored row against the requested values.
    ///
    /// Email and name enter the set iff present and different by exact string
    /// comparison. A password enters iff present and non-empty, hashed before
    /// it joins the pair list (plaintext is never compared against the old
    /// hash).
    pub fn diff(current: &User, requested: &UpdateProfileRequest) -> anyhow::Result<Self> {
        let mut pairs = Vec::new();
        if let Some(email) = requested.email.as_deref() {
            if email != current.email {
                pairs.push(("email", email.to_string()));
            }
        }
        if let Some(name) = requested.name.as_deref() {
            if name != current.name {
                pairs.push(("name", name.to_string()));
            }
        }
        if let Some(password) = requested.password.as_deref() {
            if !password.is_empty() {
                pairs.push(("password_hash", hash_password(password)?));
            }
        }
        Ok(Self { pairs })
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The new email, when an email change is part of the set. The caller
    /// re-checks uniqueness against other users before applying.
    pub fn new_email(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(column, _)| *column == "email")
            .map(|(_, value)| value.as_str())
    }

    fn statement<'a>(&'a self, current_email: &'a str) -> QueryBuilder<'a, Postgres> {
        let mut qb = QueryBuilder::new("UPDATE users SET ");
        let mut sets = qb.separated(", ");
        for (column, value) in &self.pairs {
            sets.push(*column);
            sets.push_unseparated(" = ");
            sets.push_bind_unseparated(value.as_str());
        }
        qb.push(" WHERE email = ");
        qb.push_bind(current_email);
        qb
    }

    /// Execute one atomic statement covering exactly the changed columns for
    /// the row matching `current_email`. Exactly one affected row is success;
    /// any other count is a persistence inconsistency, surfaced once and not
    /// retried.
    pub async fn apply(
        self,
        db: &PgPool,
        current_email: &str,
    ) -> Result<ProfileOutcome, ApiError> {
        if self.pairs.is_empty() {
            return Ok(ProfileOutcome::Unchanged);
        }
        let mut qb = self.statement(current_email);
        let result = qb
            .build()
            .execute(db)
            .await
            .map_err(anyhow::Error::from)?;
        match result.rows_affected() {
            1 => {
                info!(email = current_email, columns = self.pairs.len(), "profile updated");
                Ok(ProfileOutcome::Updated)
            }
            n => {
                error!(email = current_email, rows = n, "profile update affected unexpected row count");
                Err(ApiError::Persistence)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{claims::Role, password::verify_password};
    use time::OffsetDateTime;

    fn stored_user() -> User {
        User {
            id: 1,
            email: "a@x.com".into(),
            name: "A".into(),
            password_hash: "$argon2id$stored".into(),
            role: Role::User,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn request(
        email: Option<&str>,
        name: Option<&str>,
        password: Option<&str>,
    ) -> UpdateProfileRequest {
        UpdateProfileRequest {
            email: email.map(str::to_string),
            name: name.map(str::to_string),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn name_change_alone_yields_one_pair() {
        let changes = ProfileChanges::diff(
            &stored_user(),
            &request(Some("a@x.com"), Some("B"), None),
        )
        .expect("diff");
        assert_eq!(changes.pairs, vec![("name", "B".to_string())]);
    }

    #[test]
    fn identical_request_yields_empty_set() {
        let changes = ProfileChanges::diff(
            &stored_user(),
            &request(Some("a@x.com"), Some("A"), None),
        )
        .expect("diff");
        assert!(changes.is_empty());
    }

    #[test]
    fn absent_request_yields_empty_set() {
        let changes =
            ProfileChanges::diff(&stored_user(), &request(None, None, None)).expect("diff");
        assert!(changes.is_empty());
    }

    #[test]
    fn empty_password_never_enters_the_set() {
        let changes = ProfileChanges::diff(&stored_user(), &request(None, None, Some("")))
            .expect("diff");
        assert!(changes.is_empty());
    }

    #[test]
    fn password_enters_hashed() {
        let changes = ProfileChanges::diff(&stored_user(), &request(None, None, Some("s3cret")))
            .expect("diff");
        let (column, value) = &changes.pairs[0];
        assert_eq!(*column, "password_hash");
        assert_ne!(value, "s3cret");
        assert!(verify_password("s3cret", value).expect("hash is parsable"));
    }

    #[test]
    fn email_change_is_exposed_for_uniqueness_check() {
        let changes = ProfileChanges::diff(
            &stored_user(),
            &request(Some("b@x.com"), None, None),
        )
        .expect("diff");
        assert_eq!(changes.new_email(), Some("b@x.com"));
    }

    #[test]
    fn statement_covers_exactly_the_changed_columns() {
        let changes = ProfileChanges::diff(
            &stored_user(),
            &request(Some("b@x.com"), Some("B"), None),
        )
        .expect("diff");
        let qb = changes.statement("a@x.com");
        assert_eq!(
            qb.into_sql(),
            "UPDATE users SET email = $1, name = $2 WHERE email = $3"
        );
    }

    #[test]
    fn statement_for_single_change_has_single_set() {
        let changes =
            ProfileChanges::diff(&stored_user(), &request(None, Some("B"), None)).expect("diff");
        let qb = changes.statement("a@x.com");
        assert_eq!(
            qb.into_sql(),
            "UPDATE users SET name = $1 WHERE email = $2"
        );
    }
}
