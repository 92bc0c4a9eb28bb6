pub mod dates;
pub mod filter;
pub mod models;
pub mod repository;

pub use dates::DateRange;
pub use filter::{ReservationFilter, RoomFilter};
pub use models::{
    AdminUser, DocumentType, NewReservation, Reservation, ReservationStatus, Room, RoomDraft,
    RoomStatus, RoomType,
};

use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Failures reported by a repository implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused to activate a reservation whose stay overlaps an
    /// active one for the same room.
    #[error("Room {room_id} already has an active reservation for the requested dates")]
    Overlap {
        room_id: Uuid,
        conflicts: Vec<Reservation>,
    },
    #[error("Duplicate value for {0}")]
    Duplicate(String),
    /// A delete was refused because of the record's current state.
    #[error("{0}")]
    Refused(String),
    /// A conditional status change found the reservation in another status.
    #[error("Reservation {id} is {actual}, expected {expected}")]
    StaleStatus {
        id: Uuid,
        expected: ReservationStatus,
        actual: ReservationStatus,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Backend(err.into())
    }
}

impl From<CoreError> for StoreError {
    fn from(err: CoreError) -> Self {
        Self::backend(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
