use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, SubsecRound, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use habits_db::Database;
use habits_db::models::HabitRow;
use habits_types::api::{Claims, CreateHabitRequest, HabitResponse, Page, UpdateHabitRequest};
use habits_types::models::Habit;

use crate::auth::AppState;
use crate::errors::ApiError;
use crate::validation::{parse_duration, validate_habit};

const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    5
}

impl PageQuery {
    fn limit(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    fn page(&self) -> u32 {
        self.page.max(1)
    }

    fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

/// Run a blocking DB closure off the async runtime.
async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.db.clone();
    tokio::task::spawn_blocking(move || f(db.as_ref()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(|e| {
            error!("DB error: {:#}", e);
            ApiError::Internal
        })
}

fn into_responses(rows: Vec<HabitRow>) -> Vec<HabitResponse> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            row.into_habit()
                .map_err(|e| warn!("Skipping corrupt habit '{}': {:#}", id, e))
                .ok()
        })
        .map(HabitResponse::from)
        .collect()
}

/// Load a habit, hiding habits of other users behind 404.
async fn load_owned(state: &AppState, habit_id: Uuid, owner: Uuid) -> Result<Habit, ApiError> {
    let hid = habit_id.to_string();
    let row = with_db(state, move |db| db.get_habit(&hid))
        .await?
        .ok_or(ApiError::NotFound)?;

    let habit = row.into_habit().map_err(|e| {
        error!("{:#}", e);
        ApiError::Internal
    })?;

    if habit.user_id != owner {
        return Err(ApiError::NotFound);
    }
    Ok(habit)
}

/// Stored times have whole-second precision.
fn stored_time(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0)
}

pub async fn list_habits(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let (limit, offset) = (query.limit(), query.offset());

    let (rows, count) = with_db(&state, move |db| {
        Ok((db.list_user_habits(&uid, limit, offset)?, db.count_user_habits(&uid)?))
    })
    .await?;

    Ok(Json(Page {
        count,
        page: query.page(),
        page_size: limit,
        results: into_responses(rows),
    }))
}

/// GET /habits/public: public habits of every user.
pub async fn list_public_habits(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (limit, offset) = (query.limit(), query.offset());

    let (rows, count) = with_db(&state, move |db| {
        Ok((db.list_public_habits(limit, offset)?, db.count_public_habits()?))
    })
    .await?;

    Ok(Json(Page {
        count,
        page: query.page(),
        page_size: limit,
        results: into_responses(rows),
    }))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateHabitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let duration_secs = parse_duration(&req.duration).map_err(ApiError::Invalid)?;

    let habit = Habit {
        id: Uuid::new_v4(),
        user_id: claims.sub,
        place: req.place,
        time: stored_time(req.time),
        action: req.action,
        is_pleasant: req.is_pleasant,
        frequency_number: req.frequency_number,
        frequency_unit: req.frequency_unit,
        reward: req.reward.filter(|r| !r.trim().is_empty()),
        duration_secs,
        is_public: req.is_public,
        created_at: stored_time(Utc::now()),
    };
    validate_habit(&habit).map_err(ApiError::Invalid)?;

    let row = habit.clone();
    with_db(&state, move |db| db.insert_habit(&row)).await?;

    info!("Habit {} created for user {}", habit.id, habit.user_id);
    Ok((StatusCode::CREATED, Json(HabitResponse::from(habit))))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let habit = load_owned(&state, habit_id, claims.sub).await?;
    Ok(Json(HabitResponse::from(habit)))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateHabitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut habit = load_owned(&state, habit_id, claims.sub).await?;

    if let Some(place) = req.place {
        habit.place = place;
    }
    if let Some(time) = req.time {
        habit.time = stored_time(time);
    }
    if let Some(action) = req.action {
        habit.action = action;
    }
    if let Some(is_pleasant) = req.is_pleasant {
        habit.is_pleasant = is_pleasant;
        // Becoming pleasant drops the reward unless a new one is sent
        if is_pleasant && req.reward.is_none() {
            habit.reward = None;
        }
    }
    if let Some(frequency_number) = req.frequency_number {
        habit.frequency_number = frequency_number;
    }
    if let Some(frequency_unit) = req.frequency_unit {
        habit.frequency_unit = frequency_unit;
    }
    if let Some(reward) = req.reward {
        habit.reward = Some(reward).filter(|r| !r.trim().is_empty());
    }
    if let Some(duration) = &req.duration {
        habit.duration_secs = parse_duration(duration).map_err(ApiError::Invalid)?;
    }
    if let Some(is_public) = req.is_public {
        habit.is_public = is_public;
    }

    validate_habit(&habit).map_err(ApiError::Invalid)?;

    let row = habit.clone();
    let updated = with_db(&state, move |db| db.update_habit(&row)).await?;
    if !updated {
        // Deleted between load and update
        return Err(ApiError::NotFound);
    }

    Ok(Json(HabitResponse::from(habit)))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(habit_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let hid = habit_id.to_string();
    let uid = claims.sub.to_string();

    let deleted = with_db(&state, move |db| db.delete_habit(&hid, &uid)).await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }

    info!("Habit {} deleted", habit_id);
    Ok(StatusCode::NO_CONTENT)
}
