use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{BookingError, BookingResult, Repositories};

/// Outcome of a room deletion.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoomDeletion {
    pub deleted: Uuid,
    /// Checked-out stays that referenced the room and now keep no room link.
    pub historical_reservations: usize,
}

/// Refuses deletions that would lose a live booking or a finished stay.
#[derive(Clone)]
pub struct DeletionGuard {
    repos: Repositories,
}

impl DeletionGuard {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Deletes the room unless it holds a confirmed or checked-in stay. The
    /// store checks under the same lock bookings take, so a racing booking
    /// either lands first and blocks the delete or finds the room gone.
    pub async fn delete_room(&self, room_id: Uuid) -> BookingResult<RoomDeletion> {
        let historical = self
            .repos
            .rooms
            .delete_room(room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {}", room_id)))?;

        info!("Room {} deleted ({} historical reservations kept)", room_id, historical);
        Ok(RoomDeletion {
            deleted: room_id,
            historical_reservations: historical,
        })
    }

    /// Deletes any reservation that has not been checked out.
    pub async fn delete_reservation(&self, id: Uuid) -> BookingResult<()> {
        if !self.repos.reservations.delete_reservation(id).await? {
            return Err(BookingError::NotFound(format!("reservation {}", id)));
        }
        info!("Reservation {} deleted", id);
        Ok(())
    }
}
