use hotel_core::models::{Reservation, ReservationStatus};
use hotel_core::{DateRange, StoreError};
use tracing::info;
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::{BookingError, BookingResult, Repositories};

/// Whether a reservation in `from` may be moved to `to`.
///
/// pending → confirmed | cancelled
/// confirmed → checked-in | cancelled
/// checked-in → checked-out
/// checked-out and cancelled are final.
pub fn can_transition(from: ReservationStatus, to: ReservationStatus) -> bool {
    use ReservationStatus::*;
    matches!(
        (from, to),
        (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, CheckedIn) | (Confirmed, Cancelled) | (CheckedIn, CheckedOut)
    )
}

/// Statuses reachable from `from`, for clients that render the choices.
pub fn next_statuses(from: ReservationStatus) -> Vec<ReservationStatus> {
    ReservationStatus::ALL.into_iter().filter(|to| can_transition(from, *to)).collect()
}

/// Moves reservations through their lifecycle.
#[derive(Clone)]
pub struct ReservationManager {
    repos: Repositories,
    availability: AvailabilityChecker,
}

impl ReservationManager {
    pub fn new(repos: Repositories) -> Self {
        let availability = AvailabilityChecker::new(repos.clone());
        Self { repos, availability }
    }

    pub async fn get(&self, id: Uuid) -> BookingResult<Reservation> {
        self.repos
            .reservations
            .get_reservation(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("reservation {}", id)))
    }

    /// Applies a transition. Moving a pending stay into an active status is
    /// subject to the same no-overlap rule as a new booking.
    pub async fn change_status(&self, id: Uuid, to: ReservationStatus) -> BookingResult<Reservation> {
        let current = self.get(id).await?;
        if !can_transition(current.status, to) {
            return Err(BookingError::InvalidTransition { from: current.status, to });
        }

        match self.repos.reservations.update_status(id, current.status, to).await {
            Ok(updated) => {
                info!("Reservation {} moved {} -> {}", id, current.status, to);
                Ok(updated)
            }
            Err(StoreError::Overlap { room_id, conflicts }) => {
                let stay = DateRange::new(current.checkin, current.checkout)?;
                Err(self.availability.conflict(room_id, stay, conflicts).await)
            }
            // Another change landed between the read and the write
            Err(StoreError::StaleStatus { actual, .. }) => Err(BookingError::InvalidTransition { from: actual, to }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_room, add_stay, store};
    use hotel_core::models::{RoomStatus, RoomType};
    use ReservationStatus::*;

    #[test]
    fn test_transition_table() {
        assert_eq!(next_statuses(Pending), vec![Confirmed, Cancelled]);
        assert_eq!(next_statuses(Confirmed), vec![CheckedIn, Cancelled]);
        assert_eq!(next_statuses(CheckedIn), vec![CheckedOut]);
        assert!(next_statuses(CheckedOut).is_empty());
        assert!(next_statuses(Cancelled).is_empty());
        assert!(!can_transition(Confirmed, Confirmed));
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (store, repos) = store();
        let room = add_room(&store, "101", RoomType::Double, RoomStatus::Available).await;
        let stay = add_stay(&store, &room, "2024-06-01", "2024-06-03", Pending).await;
        let manager = ReservationManager::new(repos);

        for to in [Confirmed, CheckedIn, CheckedOut] {
            let updated = manager.change_status(stay.id, to).await.unwrap();
            assert_eq!(updated.status, to);
        }

        let err = manager.change_status(stay.id, Cancelled).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { from: CheckedOut, to: Cancelled }));
    }

    #[tokio::test]
    async fn test_invalid_transition_leaves_status() {
        let (store, repos) = store();
        let room = add_room(&store, "101", RoomType::Double, RoomStatus::Available).await;
        let stay = add_stay(&store, &room, "2024-06-01", "2024-06-03", Pending).await;
        let manager = ReservationManager::new(repos);

        assert!(manager.change_status(stay.id, CheckedOut).await.is_err());
        assert_eq!(manager.get(stay.id).await.unwrap().status, Pending);
    }

    #[tokio::test]
    async fn test_confirming_overlapping_pending_conflicts() {
        let (store, repos) = store();
        let room = add_room(&store, "101", RoomType::Double, RoomStatus::Available).await;
        add_room(&store, "102", RoomType::Double, RoomStatus::Available).await;
        add_stay(&store, &room, "2024-06-01", "2024-06-05", Confirmed).await;
        let pending = add_stay(&store, &room, "2024-06-04", "2024-06-06", Pending).await;
        let manager = ReservationManager::new(repos);

        match manager.change_status(pending.id, Confirmed).await {
            Err(BookingError::Conflict(report)) => {
                assert_eq!(report.conflicts.len(), 1);
                assert_eq!(report.alternatives.len(), 1);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(manager.get(pending.id).await.unwrap().status, Pending);

        // Cancelling is always allowed.
        assert_eq!(manager.change_status(pending.id, Cancelled).await.unwrap().status, Cancelled);
    }

    #[tokio::test]
    async fn test_unknown_reservation() {
        let (_store, repos) = store();
        let err = ReservationManager::new(repos).change_status(Uuid::new_v4(), Confirmed).await.unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_competing_transitions_apply_one() {
        for _ in 0..25 {
            let (store, repos) = store();
            let room = add_room(&store, "101", RoomType::Double, RoomStatus::Available).await;
            let stay = add_stay(&store, &room, "2024-06-01", "2024-06-03", Confirmed).await;
            let manager = ReservationManager::new(repos);

            let (cancelled, checked_in) =
                tokio::join!(manager.change_status(stay.id, Cancelled), manager.change_status(stay.id, CheckedIn));

            let final_status = manager.get(stay.id).await.unwrap().status;
            match (cancelled, checked_in) {
                (Ok(_), Err(BookingError::InvalidTransition { .. })) => assert_eq!(final_status, Cancelled),
                (Err(BookingError::InvalidTransition { .. }), Ok(_)) => assert_eq!(final_status, CheckedIn),
                other => panic!("expected exactly one transition, got {:?}", other),
            }
        }
    }
}
