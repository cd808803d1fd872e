use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ProfileResponse, PublicUser, SigninRequest, SignupRequest,
            UpdateProfileRequest,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        profile::{ProfileChanges, ProfileOutcome},
        repo::User,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/signout", post(signout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.len() <= 50 && EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_name(name: &str) -> ApiResult<()> {
    let len = name.chars().count();
    if !(3..=50).contains(&len) {
        return Err(ApiError::Validation("name must be 3-50 characters".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> ApiResult<()> {
    if !(3..=50).contains(&password.len()) {
        return Err(ApiError::Validation(
            "password must be 3-50 characters".into(),
        ));
    }
    Ok(())
}

fn session_cookie(name: &str, token: String) -> Cookie<'static> {
    Cookie::build((name.to_string(), token))
        .path("/")
        .http_only(true)
        .build()
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    payload.email = normalize_email(&payload.email);

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }
    validate_name(&payload.name)?;
    validate_password(&payload.password)?;
    if let Some(check) = &payload.password_check {
        if check != &payload.password {
            return Err(ApiError::Validation("passwords do not match".into()));
        }
    }

    if User::email_taken(&state.db, &payload.email).await? {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::EmailInUse);
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.email, &payload.name, &hash).await?;

    info!(user_id = user.id, email = %user.email, "user signed up");
    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

#[instrument(skip(state, jar, payload))]
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<SigninRequest>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    payload.email = normalize_email(&payload.email);

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "signin unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = user.id, "signin invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.issue(&user)?;
    let jar = jar.add(session_cookie(keys.cookie_name(), token.clone()));

    info!(user_id = user.id, email = %user.email, "user signed in");
    Ok((
        jar,
        Json(AuthResponse {
            token,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn signout(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, StatusCode)> {
    let keys = JwtKeys::from_ref(&state);
    let removal = Cookie::build((keys.cookie_name().to_string(), ""))
        .path("/")
        .build();
    info!(user_id = identity.id, "user signed out");
    Ok((jar.remove(removal), StatusCode::NO_CONTENT))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_email(&state.db, &identity.email)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, jar, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    jar: CookieJar,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> ApiResult<(CookieJar, Json<ProfileResponse>)> {
    if let Some(email) = payload.email.as_deref() {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(ApiError::Validation("invalid email".into()));
        }
        payload.email = Some(email);
    }
    if let Some(name) = payload.name.as_deref() {
        validate_name(name)?;
    }
    if let Some(password) = payload.password.as_deref() {
        // An empty password means "keep the current one".
        if !password.is_empty() {
            validate_password(password)?;
        }
    }

    let current = User::find_by_email(&state.db, &identity.email)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    let changes = ProfileChanges::diff(&current, &payload)?;
    if let Some(new_email) = changes.new_email() {
        if User::email_taken_by_other(&state.db, new_email, current.id).await? {
            warn!(user_id = current.id, "profile email already in use");
            return Err(ApiError::EmailInUse);
        }
    }

    let lookup_email = changes
        .new_email()
        .map(str::to_string)
        .unwrap_or_else(|| current.email.clone());
    let outcome = changes.apply(&state.db, &current.email).await?;

    let user = User::find_by_email(&state.db, &lookup_email)
        .await?
        .ok_or(ApiError::Persistence)?;

    // Re-issue the session so the claims keep tracking the row.
    let jar = if outcome == ProfileOutcome::Updated {
        let keys = JwtKeys::from_ref(&state);
        let token = keys.issue(&user)?;
        jar.add(session_cookie(keys.cookie_name(), token))
    } else {
        jar
    };

    Ok((
        jar,
        Json(ProfileResponse {
            outcome,
            user: PublicUser::from(user),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_accepts_plain_addresses() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn email_validation_enforces_length_cap() {
        let long = format!("{}@example.com", "a".repeat(60));
        assert!(!is_valid_email(&long));
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }

    #[test]
    fn name_bounds() {
        assert!(validate_name("ab").is_err());
        assert!(validate_name("abc").is_ok());
        assert!(validate_name(&"x".repeat(51)).is_err());
    }

    #[test]
    fn password_bounds() {
        assert!(validate_password("ab").is_err());
        assert!(validate_password("abc").is_ok());
        assert!(validate_password(&"x".repeat(51)).is_err());
    }
}
