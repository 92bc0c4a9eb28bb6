use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use hotel_booking::{BookingError, ConflictReport};
use hotel_core::models::{Reservation, ReservationStatus, Room};
use hotel_core::StoreError;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError { field: Option<&'static str>, message: String },
    NotFoundError(String),
    ConflictError(String),
    RoomOccupied(Box<ConflictReport>),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationError { field: Some(field), message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::ValidationError { field: None, message: message.into() }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::AuthenticationError(msg)
            | AppError::AuthorizationError(msg)
            | AppError::NotFoundError(msg)
            | AppError::ConflictError(msg)
            | AppError::InternalServerError(msg) => f.write_str(msg),
            AppError::ValidationError { field: Some(field), message } => write!(f, "{}: {}", field, message),
            AppError::ValidationError { field: None, message } => f.write_str(message),
            AppError::RoomOccupied(report) => write!(f, "Room {} is already booked", report.room_id),
            AppError::Anyhow(err) => write!(f, "{:#}", err),
        }
    }
}

impl std::error::Error for AppError {}

/// What a guest is told about the stays that block a room. Guest details
/// stay out of the public response.
#[derive(Debug, Serialize)]
struct BlockingStay {
    id: Uuid,
    checkin: NaiveDate,
    checkout: NaiveDate,
    status: ReservationStatus,
}

impl From<&Reservation> for BlockingStay {
    fn from(r: &Reservation) -> Self {
        Self { id: r.id, checkin: r.checkin, checkout: r.checkout, status: r.status }
    }
}

#[derive(Debug, Serialize)]
struct ConflictBody {
    room_id: Uuid,
    reservations: Vec<BlockingStay>,
}

fn occupied_response(report: ConflictReport) -> Response {
    let alternatives: &[Room] = &report.alternatives;
    let message = if alternatives.is_empty() {
        "The room is already booked for the selected dates".to_string()
    } else {
        format!(
            "The room is already booked for the selected dates; {} alternative room(s) are available",
            alternatives.len()
        )
    };
    let body = json!({
        "error": "ROOM_OCCUPIED",
        "message": message,
        "conflict": ConflictBody {
            room_id: report.room_id,
            reservations: report.conflicts.iter().map(BlockingStay::from).collect(),
        },
        "alternatives": alternatives,
    });
    (StatusCode::CONFLICT, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError { field: Some(field), message } => {
                let body = Json(json!({ "error": message, "field": field }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::ValidationError { field: None, message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::RoomOccupied(report) => return occupied_response(*report),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation { field, message } => Self::invalid(field, message),
            BookingError::Conflict(report) => Self::RoomOccupied(report),
            BookingError::NotFound(what) => Self::NotFoundError(format!("Not found: {}", what)),
            e @ BookingError::InvalidTransition { .. } => Self::bad_request(e.to_string()),
            BookingError::Rejected(msg) => Self::bad_request(msg),
            e @ BookingError::Duplicate(_) => Self::ConflictError(e.to_string()),
            BookingError::Store(e) => Self::Anyhow(anyhow::Error::new(e)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        BookingError::from(err).into()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
