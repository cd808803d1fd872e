use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::{ApiError, ApiResult},
    state::AppState,
};

use super::{
    dto::{CreateCompetitionRequest, UpdateCompetitionRequest},
    repo::{Applicant, Competition, CompetitionListItem},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/competitions", get(list).post(create))
        .route("/competitions/:id", put(update).delete(remove))
        .route("/competitions/:id/apply", post(apply))
        .route("/competitions/:id/applicants", get(applicants))
}

pub(crate) fn validate_listing(name: &str, description: &str) -> ApiResult<()> {
    let name_len = name.chars().count();
    if !(3..=50).contains(&name_len) {
        return Err(ApiError::Validation("name must be 3-50 characters".into()));
    }
    let desc_len = description.chars().count();
    if !(3..=1000).contains(&desc_len) {
        return Err(ApiError::Validation(
            "description must be 3-1000 characters".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> ApiResult<Json<Vec<CompetitionListItem>>> {
    let items = Competition::list(&state.db).await?;
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(payload): Json<CreateCompetitionRequest>,
) -> ApiResult<(StatusCode, Json<Competition>)> {
    validate_listing(&payload.name, &payload.description)?;
    let row = Competition::create(
        &state.db,
        &payload.name,
        &payload.description,
        identity.id,
        payload.apply_till,
    )
    .await?;
    info!(competition_id = row.id, author_id = identity.id, "competition created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateCompetitionRequest>,
) -> ApiResult<StatusCode> {
    validate_listing(&payload.name, &payload.description)?;
    let affected = Competition::update(
        &state.db,
        id,
        &payload.name,
        &payload.description,
        payload.apply_till,
    )
    .await?;
    match affected {
        1 => Ok(StatusCode::NO_CONTENT),
        0 => Err(ApiError::NotFound),
        n => {
            warn!(competition_id = id, rows = n, "update affected unexpected row count");
            Err(ApiError::Persistence)
        }
    }
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let affected = Competition::delete(&state.db, id).await?;
    match affected {
        1 => {
            info!(competition_id = id, "competition deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        0 => Err(ApiError::NotFound),
        n => {
            warn!(competition_id = id, rows = n, "delete affected unexpected row count");
            Err(ApiError::Persistence)
        }
    }
}

#[instrument(skip(state))]
pub async fn apply(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Competition::exists(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }
    if Competition::has_applied(&state.db, identity.id, id).await? {
        return Err(ApiError::AlreadyApplied);
    }
    let affected = Competition::apply(&state.db, identity.id, id).await?;
    if affected != 1 {
        return Err(ApiError::Persistence);
    }
    info!(competition_id = id, user_id = identity.id, "application recorded");
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state))]
pub async fn applicants(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Applicant>>> {
    if !Competition::exists(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }
    let rows = Competition::applicants(&state.db, id).await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_bounds() {
        assert!(validate_listing("abc", "a description").is_ok());
        assert!(validate_listing("ab", "a description").is_err());
        assert!(validate_listing("abc", "ab").is_err());
        assert!(validate_listing("abc", &"x".repeat(1001)).is_err());
    }
}
