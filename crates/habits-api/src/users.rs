use axum::{Extension, Json, extract::State, response::IntoResponse};
use tracing::error;

use habits_types::api::{Claims, ProfileResponse, UpdateProfileRequest};

use crate::auth::AppState;
use crate::errors::ApiError;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.clone();
    let uid = claims.sub.to_string();

    let user = tokio::task::spawn_blocking(move || db.get_user_by_id(&uid))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("DB get_user_by_id error: {}", e);
            ApiError::Internal
        })?
        .ok_or(ApiError::NotFound)?
        .into_user()
        .map_err(|e| {
            error!("{:#}", e);
            ApiError::Internal
        })?;

    Ok(Json(ProfileResponse::from(user)))
}

/// PATCH /users/me: set or clear the Telegram chat id reminders go to.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tg_chat_id = req
        .tg_chat_id
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if let Some(chat) = &tg_chat_id {
        // Telegram chat ids are integers (negative for groups)
        if chat.strip_prefix('-').unwrap_or(chat).parse::<u64>().is_err() {
            return Err(ApiError::Invalid(format!("invalid tg_chat_id '{}'", chat)));
        }
    }

    let db = state.db.clone();
    let uid = claims.sub.to_string();

    let user = tokio::task::spawn_blocking(move || {
        if !db.set_tg_chat_id(&uid, tg_chat_id.as_deref())? {
            return Ok(None);
        }
        db.get_user_by_id(&uid)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })?
    .map_err(|e| {
        error!("DB set_tg_chat_id error: {}", e);
        ApiError::Internal
    })?
    .ok_or(ApiError::NotFound)?
    .into_user()
    .map_err(|e| {
        error!("{:#}", e);
        ApiError::Internal
    })?;

    Ok(Json(ProfileResponse::from(user)))
}
