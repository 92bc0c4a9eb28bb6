use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hotel_booking::RoomDeletion;
use hotel_core::models::{Room, RoomDraft, RoomStatus, RoomType};
use hotel_core::RoomFilter;
use hotel_shared::Page;
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct AdminRoomParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub room_type: Option<String>,
}

impl AdminRoomParams {
    fn filter(&self) -> Result<RoomFilter, AppError> {
        let status = parse_opt::<RoomStatus>("status", &self.status)?;
        let room_type = parse_opt::<RoomType>("room_type", &self.room_type)?;
        Ok(RoomFilter::new()
            .maybe(status, RoomFilter::status)
            .maybe(room_type, RoomFilter::room_type))
    }
}

pub(crate) fn parse_opt<T>(field: &'static str, value: &Option<String>) -> Result<Option<T>, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| AppError::invalid(field, e.to_string())))
        .transpose()
}

/// GET /admin/rooms
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<AdminRoomParams>,
) -> Result<Json<Page<Room>>, AppError> {
    let filter = params.filter()?;
    let page = state.page_request(params.page, params.per_page);
    Ok(Json(state.catalog.page(&filter, page).await?))
}

/// GET /admin/rooms/{id}
pub async fn get_room(State(state): State<AppState>, Path(room_id): Path<Uuid>) -> Result<Json<Room>, AppError> {
    Ok(Json(state.catalog.get(room_id).await?))
}

/// POST /admin/rooms
pub async fn create_room(
    State(state): State<AppState>,
    Json(draft): Json<RoomDraft>,
) -> Result<(StatusCode, Json<Room>), AppError> {
    let room = state.catalog.create(draft).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// PUT /admin/rooms/{id}
pub async fn update_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Json(draft): Json<RoomDraft>,
) -> Result<Json<Room>, AppError> {
    Ok(Json(state.catalog.update(room_id, draft).await?))
}

/// DELETE /rooms/{id}
/// Refused while the room holds a confirmed or checked-in stay.
pub async fn delete_room(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomDeletion>, AppError> {
    Ok(Json(state.guard.delete_room(room_id).await?))
}
