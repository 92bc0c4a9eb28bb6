use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hotel_booking::{BookedReservation, ReservationRequest};
use hotel_core::dates::parse_date;
use hotel_core::models::{Reservation, ReservationStatus};
use hotel_core::{DateRange, ReservationFilter};
use hotel_shared::Page;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::rooms::parse_opt;
use crate::{error::AppError, state::AppState};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub reservation: BookedReservation,
}

#[derive(Debug, Deserialize)]
pub struct AdminReservationRequest {
    #[serde(flatten)]
    pub reservation: ReservationRequest,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

/// `status` takes a comma-separated list. `from`/`to` select stays
/// overlapping that range; `checkin_from`/`checkin_to` bound the arrival day.
#[derive(Debug, Default, Deserialize)]
pub struct ReservationListParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub status: Option<String>,
    pub room_id: Option<String>,
    pub guest: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub checkin_from: Option<String>,
    pub checkin_to: Option<String>,
}

impl ReservationListParams {
    fn filter(&self) -> Result<ReservationFilter, AppError> {
        let statuses = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(list) => Some(
                list.split(',')
                    .map(|s| s.parse::<ReservationStatus>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| AppError::invalid("status", e.to_string()))?,
            ),
            None => None,
        };
        let room_id = parse_opt::<Uuid>("room_id", &self.room_id)?;
        let overlapping = match (non_blank(&self.from), non_blank(&self.to)) {
            (Some(from), Some(to)) => {
                Some(DateRange::parse(from, to).map_err(|e| AppError::invalid("to", e.to_string()))?)
            }
            (None, None) => None,
            _ => return Err(AppError::invalid("to", "from and to must be given together")),
        };
        let checkin_from = non_blank(&self.checkin_from)
            .map(|d| parse_date("checkin_from", d))
            .transpose()
            .map_err(|e| AppError::invalid("checkin_from", e.to_string()))?;
        let checkin_to = non_blank(&self.checkin_to)
            .map(|d| parse_date("checkin_to", d))
            .transpose()
            .map_err(|e| AppError::invalid("checkin_to", e.to_string()))?;

        Ok(ReservationFilter::new()
            .maybe(statuses, ReservationFilter::status_in)
            .maybe(room_id, ReservationFilter::room)
            .maybe(self.guest.clone(), |f, needle| f.guest(needle))
            .maybe(overlapping, ReservationFilter::overlapping)
            .maybe(checkin_from, ReservationFilter::checkin_on_or_after)
            .maybe(checkin_to, ReservationFilter::checkin_before))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Statuses a reservation may be created in from the back-office.
const ADMIN_CREATE_STATUSES: [ReservationStatus; 3] =
    [ReservationStatus::Pending, ReservationStatus::Confirmed, ReservationStatus::CheckedIn];

// ============================================================================
// Handlers
// ============================================================================

/// POST /reservations
/// Public booking; always created as confirmed.
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(req): Json<ReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), AppError> {
    let reservation = state.writer.create(&req, ReservationStatus::Confirmed).await?;
    Ok((StatusCode::CREATED, Json(ReservationResponse { reservation })))
}

/// POST /admin/reservations
pub async fn create_admin_reservation(
    State(state): State<AppState>,
    Json(req): Json<AdminReservationRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), AppError> {
    let status = parse_opt::<ReservationStatus>("status", &req.status)?.unwrap_or(ReservationStatus::Confirmed);
    if !ADMIN_CREATE_STATUSES.contains(&status) {
        return Err(AppError::invalid("status", format!("Reservations cannot be created as {}", status)));
    }
    let reservation = state.writer.create(&req.reservation, status).await?;
    Ok((StatusCode::CREATED, Json(ReservationResponse { reservation })))
}

/// GET /admin/reservations
pub async fn list_reservations(
    State(state): State<AppState>,
    Query(params): Query<ReservationListParams>,
) -> Result<Json<Page<Reservation>>, AppError> {
    let filter = params.filter()?;
    let page = state.page_request(params.page, params.per_page);
    Ok(Json(state.repos.reservations.page_reservations(&filter, page).await?))
}

/// GET /admin/reservations/{id}
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    Ok(Json(state.manager.get(id).await?))
}

/// PATCH /admin/reservations/{id}/status
pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<Reservation>, AppError> {
    let to = req
        .status
        .parse::<ReservationStatus>()
        .map_err(|e| AppError::invalid("status", e.to_string()))?;
    Ok(Json(state.manager.change_status(id, to).await?))
}

/// DELETE /reservations/{id}
pub async fn delete_reservation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.guard.delete_reservation(id).await?;
    Ok(Json(json!({ "deleted": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_list_and_window() {
        let params = ReservationListParams {
            status: Some("confirmed,checked_in".into()),
            from: Some("2024-06-01".into()),
            to: Some("2024-06-30".into()),
            guest: Some("ana".into()),
            ..Default::default()
        };
        let filter = params.filter().unwrap();
        assert_eq!(filter.predicates().len(), 3);
    }

    #[test]
    fn test_unknown_status_is_a_field_error() {
        let params = ReservationListParams { status: Some("booked".into()), ..Default::default() };
        assert!(matches!(params.filter(), Err(AppError::ValidationError { field: Some("status"), .. })));
    }

    #[test]
    fn test_half_open_window_rejected() {
        let params = ReservationListParams { from: Some("2024-06-01".into()), ..Default::default() };
        assert!(params.filter().is_err());
    }

    #[test]
    fn test_admin_body_flattens_reservation_fields() {
        let req: AdminReservationRequest =
            serde_json::from_str(r#"{"guest_name":"Ana","total":5000,"status":"pending"}"#).unwrap();
        assert_eq!(req.reservation.guest_name.as_deref(), Some("Ana"));
        assert_eq!(req.reservation.total, Some(5000));
        assert_eq!(req.status.as_deref(), Some("pending"));
    }
}
