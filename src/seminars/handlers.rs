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
    dto::{CreateSeminarRequest, UpdateSeminarRequest},
    repo::{Attendee, Seminar, SeminarListItem},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/seminars", get(list).post(create))
        .route("/seminars/:id", put(update).delete(remove))
        .route("/seminars/:id/apply", post(apply))
        .route("/seminars/:id/attendees", get(attendees))
}

pub(crate) fn validate_seminar(name: &str, description: &str, term: i32) -> ApiResult<()> {
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
    if !(1..=60).contains(&term) {
        return Err(ApiError::Validation("term must be 1-60".into()));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> ApiResult<Json<Vec<SeminarListItem>>> {
    let items = Seminar::list(&state.db).await?;
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(identity): AdminUser,
    Json(payload): Json<CreateSeminarRequest>,
) -> ApiResult<(StatusCode, Json<Seminar>)> {
    validate_seminar(&payload.name, &payload.description, payload.term)?;
    let row = Seminar::create(
        &state.db,
        &payload.name,
        &payload.description,
        identity.id,
        payload.apply_till,
        payload.term,
    )
    .await?;
    info!(seminar_id = row.id, author_id = identity.id, "seminar created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSeminarRequest>,
) -> ApiResult<StatusCode> {
    validate_seminar(&payload.name, &payload.description, payload.term)?;
    let affected = Seminar::update(
        &state.db,
        id,
        &payload.name,
        &payload.description,
        payload.apply_till,
        payload.term,
    )
    .await?;
    match affected {
        1 => Ok(StatusCode::NO_CONTENT),
        0 => Err(ApiError::NotFound),
        n => {
            warn!(seminar_id = id, rows = n, "update affected unexpected row count");
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
    let affected = Seminar::delete(&state.db, id).await?;
    match affected {
        1 => {
            info!(seminar_id = id, "seminar deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        0 => Err(ApiError::NotFound),
        n => {
            warn!(seminar_id = id, rows = n, "delete affected unexpected row count");
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
    if !Seminar::exists(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }
    if Seminar::has_applied(&state.db, identity.id, id).await? {
        warn!(seminar_id = id, user_id = identity.id, "duplicate application");
        return Err(ApiError::AlreadyApplied);
    }
    let affected = Seminar::apply(&state.db, identity.id, id).await?;
    if affected != 1 {
        return Err(ApiError::Persistence);
    }
    info!(seminar_id = id, user_id = identity.id, "application recorded");
    Ok(StatusCode::CREATED)
}

#[instrument(skip(state))]
pub async fn attendees(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Attendee>>> {
    if !Seminar::exists(&state.db, id).await? {
        return Err(ApiError::NotFound);
    }
    let rows = Seminar::attendees(&state.db, id).await?;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seminar_bounds() {
        assert!(validate_seminar("abc", "a description", 1).is_ok());
        assert!(validate_seminar("abc", "a description", 0).is_err());
        assert!(validate_seminar("abc", "a description", 61).is_err());
        assert!(validate_seminar("ab", "a description", 5).is_err());
    }
}
