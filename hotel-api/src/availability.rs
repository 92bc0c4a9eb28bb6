use axum::{
    extract::{Path, Query, State},
    Json,
};
use hotel_booking::{Availability, AvailabilityQuery};
use hotel_core::models::{Room, RoomType};
use hotel_core::{DateRange, RoomFilter};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::AppError, state::AppState};

// ============================================================================
// Request Types
// ============================================================================

/// Raw query string. Kept as text so malformed values become a message in
/// the response rather than an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityParams {
    pub checkin: Option<String>,
    pub checkout: Option<String>,
    pub room_type: Option<String>,
    pub room_id: Option<String>,
    pub guests: Option<String>,
}

impl AvailabilityParams {
    fn to_query(&self) -> Result<AvailabilityQuery, String> {
        let room_id = non_blank(&self.room_id)
            .map(|id| Uuid::parse_str(id).map_err(|_| format!("Invalid room_id: {}", id)))
            .transpose()?;
        let guests = non_blank(&self.guests)
            .map(|g| g.parse::<i32>().map_err(|_| format!("Invalid guests: {}", g)))
            .transpose()?;
        AvailabilityQuery::parse(
            self.checkin.as_deref(),
            self.checkout.as_deref(),
            self.room_type.as_deref(),
            room_id,
            guests,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RoomListParams {
    pub room_type: Option<String>,
    pub min_capacity: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct StayParams {
    pub checkin: Option<String>,
    pub checkout: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /availability
pub async fn check_availability(
    State(state): State<AppState>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<Availability>, AppError> {
    let availability = state.availability.check(params.to_query()).await?;
    if let Some(message) = &availability.message {
        tracing::debug!("Availability answered with message: {}", message);
    }
    Ok(Json(availability))
}

/// GET /rooms
/// Rooms open for booking, in room-number order.
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<RoomListParams>,
) -> Result<Json<Vec<Room>>, AppError> {
    let room_type = non_blank(&params.room_type)
        .map(|t| t.parse::<RoomType>())
        .transpose()
        .map_err(|e| AppError::invalid("room_type", e.to_string()))?;

    let filter = RoomFilter::bookable()
        .maybe(room_type, RoomFilter::room_type)
        .maybe(params.min_capacity, RoomFilter::min_capacity);

    Ok(Json(state.catalog.list(&filter).await?))
}

/// GET /rooms/{id}
pub async fn get_room(State(state): State<AppState>, Path(room_id): Path<Uuid>) -> Result<Json<Room>, AppError> {
    Ok(Json(state.catalog.get(room_id).await?))
}

/// GET /rooms/{id}/alternatives
/// Other rooms of the same type that are free for the stay.
pub async fn alternatives(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Query(params): Query<StayParams>,
) -> Result<Json<Availability>, AppError> {
    let checkin = non_blank(&params.checkin).ok_or_else(|| AppError::invalid("checkin", "checkin is required"))?;
    let checkout = non_blank(&params.checkout).ok_or_else(|| AppError::invalid("checkout", "checkout is required"))?;
    let stay = DateRange::parse(checkin, checkout).map_err(|e| AppError::invalid("checkout", e.to_string()))?;

    let room = state.catalog.get(room_id).await?;
    let rooms = state.availability.alternatives(&room, stay).await?;
    Ok(Json(Availability::found(rooms)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_with_bad_guest_count() {
        let params = AvailabilityParams { guests: Some("two".into()), ..Default::default() };
        assert_eq!(params.to_query().unwrap_err(), "Invalid guests: two");
    }

    #[test]
    fn test_blank_params_mean_no_filter() {
        let params = AvailabilityParams {
            checkin: Some("".into()),
            checkout: Some(" ".into()),
            room_type: Some("".into()),
            ..Default::default()
        };
        assert_eq!(params.to_query().unwrap(), AvailabilityQuery::default());
    }
}
