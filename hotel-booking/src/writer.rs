use hotel_core::models::{Reservation, ReservationStatus, Room, RoomStatus};
use hotel_shared::Masked;
use serde::Serialize;
use tracing::{info, warn};

use crate::availability::AvailabilityChecker;
use crate::validation::ReservationRequest;
use crate::{BookingError, BookingResult, Repositories};

/// A stored reservation joined with the room it holds.
#[derive(Debug, Clone, Serialize)]
pub struct BookedReservation {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub room: Room,
}

#[derive(Clone)]
pub struct ReservationWriter {
    repos: Repositories,
    availability: AvailabilityChecker,
}

impl ReservationWriter {
    pub fn new(repos: Repositories) -> Self {
        let availability = AvailabilityChecker::new(repos.clone());
        Self { repos, availability }
    }

    /// Validates and stores a reservation. Nothing is written unless every
    /// rule holds; the overlap rule is enforced again by the store itself so
    /// two racing writers cannot both win.
    pub async fn create(&self, request: &ReservationRequest, status: ReservationStatus) -> BookingResult<BookedReservation> {
        // 1. Field rules
        let valid = request.validate()?;
        let stay = valid.stay;

        // 2. Room
        let room = self
            .repos
            .rooms
            .get_room(valid.room_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {}", valid.room_id)))?;
        if room.status == RoomStatus::Maintenance {
            return Err(BookingError::validation("room_id", format!("Room {} is under maintenance", room.room_number)));
        }

        // 3. Overlap pre-check, answered with alternatives
        if status.is_active() {
            let conflicts = self.availability.conflicts(room.id, stay).await?;
            if !conflicts.is_empty() {
                info!(
                    "Room {} already booked {}..{} ({} conflicts)",
                    room.room_number,
                    stay.checkin(),
                    stay.checkout(),
                    conflicts.len()
                );
                return Err(self.availability.conflict(room.id, stay, conflicts).await);
            }
        }

        // 4. Insert under store-level enforcement
        let total = match valid.total_cents {
            Some(total) => total,
            None => room
                .quote(&stay)
                .ok_or_else(|| BookingError::validation("checkout", "Stay is too long to price"))?,
        };
        let guest_email = Masked(valid.guest_email.clone());
        let new = valid.into_new(total, status);

        match self.repos.reservations.create_reservation(new).await {
            Ok(reservation) => {
                info!(
                    "Reservation {} {} for room {} {}..{} guest={}",
                    reservation.id,
                    reservation.status,
                    room.room_number,
                    reservation.checkin,
                    reservation.checkout,
                    guest_email
                );
                Ok(BookedReservation { reservation, room })
            }
            Err(hotel_core::StoreError::Overlap { room_id, conflicts }) => {
                warn!("Store refused overlapping reservation for room {}", room.room_number);
                Err(self.availability.conflict(room_id, stay, conflicts).await)
            }
            Err(e) => Err(e.into()),
        }
    }
}
