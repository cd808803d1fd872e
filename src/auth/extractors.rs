use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use crate::{auth::claims::Identity, error::ApiError};

/// Requires a signed-in user. Rejects with `Unauthenticated` before the
/// handler body runs.
#[derive(Debug)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated)
    }
}

/// Requires an admin. The identity check runs first, so an anonymous request
/// reports `Unauthenticated` rather than `Forbidden`.
#[derive(Debug)]
pub struct AdminUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            warn!(user_id = identity.id, "admin route refused");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use axum::http::Request;

    fn parts_with(identity: Option<Identity>) -> Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(identity) = identity {
            parts.extensions.insert(identity);
        }
        parts
    }

    fn identity(role: Role) -> Identity {
        Identity {
            id: 7,
            email: "a@x.com".into(),
            name: "A".into(),
            role,
        }
    }

    #[tokio::test]
    async fn current_user_passes_with_identity() {
        let mut parts = parts_with(Some(identity(Role::User)));
        let CurrentUser(got) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .expect("identity present");
        assert_eq!(got.id, 7);
    }

    #[tokio::test]
    async fn current_user_rejects_anonymous() {
        let mut parts = parts_with(None);
        let err = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn admin_rejects_anonymous_as_unauthenticated() {
        let mut parts = parts_with(None);
        let err = AdminUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        // Never Forbidden for a request with no identity at all.
        assert!(matches!(err, ApiError::Unauthenticated));
    }

    #[tokio::test]
    async fn admin_rejects_plain_user_as_forbidden() {
        let mut parts = parts_with(Some(identity(Role::User)));
        let err = AdminUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[tokio::test]
    async fn admin_passes_with_admin_identity() {
        let mut parts = parts_with(Some(identity(Role::Admin)));
        let AdminUser(got) = AdminUser::from_request_parts(&mut parts, &())
            .await
            .expect("admin identity present");
        assert!(got.is_admin());
    }
}
