use async_trait::async_trait;
use hotel_shared::{Page, PageRequest};
use uuid::Uuid;

use crate::filter::{ReservationFilter, RoomFilter};
use crate::models::{AdminUser, NewReservation, Reservation, ReservationStatus, Room};
use crate::StoreResult;

/// Repository trait for room data access
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Fails with `StoreError::Duplicate` when the room number is taken.
    async fn create_room(&self, room: &Room) -> StoreResult<()>;

    async fn get_room(&self, id: Uuid) -> StoreResult<Option<Room>>;

    /// Rooms matching every predicate, ordered by room number.
    async fn list_rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>>;

    /// Fails with `StoreError::NotFound` when the room does not exist.
    async fn update_room(&self, room: &Room) -> StoreResult<()>;

    /// Removes the room unless it still has an active reservation, in which
    /// case it fails with `StoreError::Refused`. The check and the delete
    /// are atomic with respect to `create_reservation` and `update_status`.
    ///
    /// Returns `None` for an unknown room, otherwise the number of
    /// checked-out reservations that keep their data with the room
    /// reference cleared.
    async fn delete_room(&self, id: Uuid) -> StoreResult<Option<usize>>;
}

/// Repository trait for reservation data access
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Persists the reservation. When its status is active, the store must
    /// refuse it with `StoreError::Overlap` if another active reservation
    /// for the same room overlaps the stay, atomically with the insert.
    async fn create_reservation(&self, reservation: NewReservation) -> StoreResult<Reservation>;

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>>;

    /// All matches, most recently created first.
    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;

    async fn page_reservations(
        &self,
        filter: &ReservationFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Reservation>>;

    /// Moves the reservation from `from` to `to`, failing with
    /// `StoreError::StaleStatus` when it is no longer in `from`. Moving into
    /// an active status carries the same overlap guarantee as
    /// `create_reservation`.
    async fn update_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    ) -> StoreResult<Reservation>;

    /// Returns whether a row was removed. Checked-out reservations are
    /// refused with `StoreError::Refused`, checked at the moment of the delete.
    async fn delete_reservation(&self, id: Uuid) -> StoreResult<bool>;
}

/// Repository trait for back-office accounts
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>>;

    async fn create_admin(&self, admin: &AdminUser) -> StoreResult<()>;

    async fn count_admins(&self) -> StoreResult<u64>;
}
