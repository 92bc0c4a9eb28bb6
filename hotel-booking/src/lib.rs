pub mod availability;
pub mod guards;
pub mod lifecycle;
pub mod rooms;
pub mod stats;
pub mod validation;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

pub use availability::{Availability, AvailabilityChecker, AvailabilityQuery};
pub use guards::{DeletionGuard, RoomDeletion};
pub use lifecycle::ReservationManager;
pub use rooms::RoomCatalog;
pub use stats::{DashboardStats, StatsService};
pub use validation::ReservationRequest;
pub use writer::{BookedReservation, ReservationWriter};

use hotel_core::models::{Reservation, ReservationStatus, Room};
use hotel_core::repository::{ReservationRepository, RoomRepository};
use hotel_core::{CoreError, StoreError};
use std::sync::Arc;
use uuid::Uuid;

/// The two stores every booking operation works against.
#[derive(Clone)]
pub struct Repositories {
    pub rooms: Arc<dyn RoomRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
}

impl Repositories {
    pub fn new(rooms: Arc<dyn RoomRepository>, reservations: Arc<dyn ReservationRepository>) -> Self {
        Self { rooms, reservations }
    }
}

/// A refused booking, with what is in the way and what could be offered instead.
#[derive(Debug, Clone)]
pub struct ConflictReport {
    pub room_id: Uuid,
    pub conflicts: Vec<Reservation>,
    pub alternatives: Vec<Room>,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Room {} is already booked for the requested dates", .0.room_id)]
    Conflict(Box<ConflictReport>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: ReservationStatus,
        to: ReservationStatus,
    },

    /// A precondition of a destructive operation does not hold.
    #[error("{0}")]
    Rejected(String),

    #[error("Duplicate value: {0}")]
    Duplicate(String),

    #[error(transparent)]
    Store(StoreError),
}

impl BookingError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation { field, message: message.into() }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Overlap { room_id, conflicts } => Self::Conflict(Box::new(ConflictReport {
                room_id,
                conflicts,
                alternatives: Vec::new(),
            })),
            StoreError::NotFound(what) => Self::NotFound(what),
            StoreError::Duplicate(what) => Self::Duplicate(what),
            StoreError::Refused(why) => Self::Rejected(why),
            e @ StoreError::StaleStatus { .. } => Self::Rejected(e.to_string()),
            other => Self::Store(other),
        }
    }
}

/// Core errors that reach this layer come from stored data, not from input.
impl From<CoreError> for BookingError {
    fn from(err: CoreError) -> Self {
        Self::Store(err.into())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
