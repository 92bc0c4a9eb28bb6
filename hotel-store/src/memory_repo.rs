use async_trait::async_trait;
use hotel_core::filter::{ReservationFilter, RoomFilter};
use hotel_core::models::{sort_by_room_number, AdminUser, NewReservation, Reservation, ReservationStatus, Room};
use hotel_core::repository::{AdminRepository, ReservationRepository, RoomRepository};
use hotel_core::{StoreError, StoreResult};
use hotel_shared::{Page, PageRequest};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Process-local store used by tests and by `database.backend = "memory"`.
///
/// Locks are always taken rooms-before-reservations. Overlap enforcement
/// happens under the reservations write lock, so check and insert are one
/// step just like the row lock + exclusion constraint in PostgreSQL.
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<Uuid, Room>>,
    reservations: RwLock<HashMap<Uuid, Reservation>>,
    admins: RwLock<HashMap<String, AdminUser>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a reservation as-is, bypassing every check. Used to seed
    /// history (checked-out stays, rooms since deleted) in tests.
    pub async fn seed_reservation(&self, reservation: Reservation) {
        self.reservations.write().await.insert(reservation.id, reservation);
    }

    fn conflicts(
        reservations: &HashMap<Uuid, Reservation>,
        room_id: Uuid,
        candidate: &Reservation,
    ) -> Vec<Reservation> {
        reservations
            .values()
            .filter(|r| r.id != candidate.id)
            .filter(|r| r.room_id == Some(room_id) && r.is_active())
            .filter(|r| r.checkin < candidate.checkout && candidate.checkin < r.checkout)
            .cloned()
            .collect()
    }

    fn newest_first(mut items: Vec<Reservation>) -> Vec<Reservation> {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        items
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn create_room(&self, room: &Room) -> StoreResult<()> {
        let mut rooms = self.rooms.write().await;
        if rooms.values().any(|r| r.room_number == room.room_number) {
            return Err(StoreError::Duplicate(format!("room_number {}", room.room_number)));
        }
        rooms.insert(room.id, room.clone());
        Ok(())
    }

    async fn get_room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }

    async fn list_rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>> {
        let mut rooms: Vec<Room> = self
            .rooms
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        sort_by_room_number(&mut rooms);
        Ok(rooms)
    }

    async fn update_room(&self, room: &Room) -> StoreResult<()> {
        let mut rooms = self.rooms.write().await;
        if rooms.values().any(|r| r.id != room.id && r.room_number == room.room_number) {
            return Err(StoreError::Duplicate(format!("room_number {}", room.room_number)));
        }
        match rooms.get_mut(&room.id) {
            Some(existing) => {
                *existing = room.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("room {}", room.id))),
        }
    }

    async fn delete_room(&self, id: Uuid) -> StoreResult<Option<usize>> {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get(&id) else {
            return Ok(None);
        };

        let mut reservations = self.reservations.write().await;
        let active = reservations.values().filter(|r| r.room_id == Some(id) && r.is_active()).count();
        if active > 0 {
            return Err(StoreError::Refused(format!(
                "Room {} has {} active reservation(s) and cannot be deleted",
                room.room_number, active
            )));
        }

        rooms.remove(&id);
        let mut historical = 0;
        for r in reservations.values_mut().filter(|r| r.room_id == Some(id)) {
            if r.status == ReservationStatus::CheckedOut {
                historical += 1;
            }
            r.room_id = None;
        }
        debug!(room_id = %id, historical, "room removed from memory store");
        Ok(Some(historical))
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn create_reservation(&self, reservation: NewReservation) -> StoreResult<Reservation> {
        let rooms = self.rooms.read().await;
        let room_id = reservation.room_id;
        if !rooms.contains_key(&room_id) {
            return Err(StoreError::NotFound(format!("room {}", room_id)));
        }

        let mut reservations = self.reservations.write().await;
        let created = reservation.into_reservation(Uuid::new_v4());
        if created.is_active() {
            let conflicts = Self::conflicts(&reservations, room_id, &created);
            if !conflicts.is_empty() {
                return Err(StoreError::Overlap { room_id, conflicts });
            }
        }
        reservations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_reservation(&self, id: Uuid) -> StoreResult<Option<Reservation>> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn list_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        let matched = self
            .reservations
            .read()
            .await
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(Self::newest_first(matched))
    }

    async fn page_reservations(
        &self,
        filter: &ReservationFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Reservation>> {
        let all = self.list_reservations(filter).await?;
        Ok(Page::slice(all, page))
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: ReservationStatus,
        status: ReservationStatus,
    ) -> StoreResult<Reservation> {
        let mut reservations = self.reservations.write().await;
        let mut updated = reservations
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("reservation {}", id)))?;
        if updated.status != from {
            return Err(StoreError::StaleStatus { id, expected: from, actual: updated.status });
        }

        updated.status = status;
        if let (true, Some(room_id)) = (status.is_active(), updated.room_id) {
            let conflicts = Self::conflicts(&reservations, room_id, &updated);
            if !conflicts.is_empty() {
                return Err(StoreError::Overlap { room_id, conflicts });
            }
        }
        reservations.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_reservation(&self, id: Uuid) -> StoreResult<bool> {
        let mut reservations = self.reservations.write().await;
        match reservations.get(&id) {
            None => Ok(false),
            Some(r) if r.status == ReservationStatus::CheckedOut => Err(StoreError::Refused(
                "Checked-out reservations are kept as history and cannot be deleted".to_string(),
            )),
            Some(_) => Ok(reservations.remove(&id).is_some()),
        }
    }
}

#[async_trait]
impl AdminRepository for MemoryStore {
    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        Ok(self.admins.read().await.get(&email.to_lowercase()).cloned())
    }

    async fn create_admin(&self, admin: &AdminUser) -> StoreResult<()> {
        let mut admins = self.admins.write().await;
        let key = admin.email.to_lowercase();
        if admins.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("admin {}", admin.email)));
        }
        admins.insert(key, admin.clone());
        Ok(())
    }

    async fn count_admins(&self) -> StoreResult<u64> {
        Ok(self.admins.read().await.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_core::models::{DocumentType, RoomDraft, RoomStatus, RoomType};
    use hotel_core::DateRange;
    use std::sync::Arc;

    fn room(number: &str) -> Room {
        Room::from_draft(
            Uuid::new_v4(),
            RoomDraft {
                room_number: number.into(),
                room_type: RoomType::Double,
                capacity: 2,
                price_cents: 9_000,
                description: String::new(),
                amenities: vec![],
                status: RoomStatus::Available,
            },
        )
    }

    fn booking(room_id: Uuid, checkin: &str, checkout: &str, status: ReservationStatus) -> NewReservation {
        NewReservation {
            room_id,
            guest_name: "Lucía Pérez".into(),
            guest_email: "lucia@example.com".into(),
            guest_phone: None,
            document_number: "30111222".into(),
            document_type: DocumentType::NationalId,
            nationality: Some("AR".into()),
            stay: DateRange::parse(checkin, checkout).unwrap(),
            total_cents: 36_000,
            status,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_rejects_overlapping_active_insert() {
        let store = MemoryStore::new();
        let r = room("101");
        store.create_room(&r).await.unwrap();

        store.create_reservation(booking(r.id, "2024-06-01", "2024-06-05", ReservationStatus::Confirmed)).await.unwrap();
        let err = store
            .create_reservation(booking(r.id, "2024-06-04", "2024-06-06", ReservationStatus::Confirmed))
            .await
            .unwrap_err();

        match err {
            StoreError::Overlap { room_id, conflicts } => {
                assert_eq!(room_id, r.id);
                assert_eq!(conflicts.len(), 1);
            }
            other => panic!("expected overlap, got {:?}", other),
        }
        assert_eq!(store.list_reservations(&ReservationFilter::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_pending_reservations_do_not_hold_the_room() {
        let store = MemoryStore::new();
        let r = room("101");
        store.create_room(&r).await.unwrap();

        store.create_reservation(booking(r.id, "2024-06-01", "2024-06-05", ReservationStatus::Pending)).await.unwrap();
        store.create_reservation(booking(r.id, "2024-06-01", "2024-06-05", ReservationStatus::Confirmed)).await.unwrap();
    }

    #[tokio::test]
    async fn test_activating_a_pending_overlap_is_refused() {
        let store = MemoryStore::new();
        let r = room("101");
        store.create_room(&r).await.unwrap();

        let pending = store
            .create_reservation(booking(r.id, "2024-06-01", "2024-06-05", ReservationStatus::Pending))
            .await
            .unwrap();
        store.create_reservation(booking(r.id, "2024-06-02", "2024-06-03", ReservationStatus::Confirmed)).await.unwrap();

        let err = store
            .update_status(pending.id, ReservationStatus::Pending, ReservationStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Overlap { .. }));
        let unchanged = store.get_reservation(pending.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ReservationStatus::Pending);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_admit_exactly_one() {
        let store = Arc::new(MemoryStore::new());
        let r = room("101");
        store.create_room(&r).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let room_id = r.id;
            handles.push(tokio::spawn(async move {
                store
                    .create_reservation(booking(room_id, "2024-06-01", "2024-06-05", ReservationStatus::Confirmed))
                    .await
                    .is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn test_delete_room_detaches_history() {
        let store = MemoryStore::new();
        let r = room("101");
        store.create_room(&r).await.unwrap();
        let past = store
            .create_reservation(booking(r.id, "2024-01-01", "2024-01-03", ReservationStatus::CheckedOut))
            .await
            .unwrap();

        assert_eq!(store.delete_room(r.id).await.unwrap(), Some(1));
        assert_eq!(store.delete_room(r.id).await.unwrap(), None);
        let kept = store.get_reservation(past.id).await.unwrap().unwrap();
        assert_eq!(kept.room_id, None);
    }

    #[tokio::test]
    async fn test_delete_room_refused_while_a_stay_is_active() {
        let store = MemoryStore::new();
        let r = room("101");
        store.create_room(&r).await.unwrap();
        let live = store
            .create_reservation(booking(r.id, "2024-06-01", "2024-06-05", ReservationStatus::CheckedIn))
            .await
            .unwrap();

        let err = store.delete_room(r.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Refused(_)));
        assert!(store.get_room(r.id).await.unwrap().is_some());
        assert_eq!(store.get_reservation(live.id).await.unwrap().unwrap().room_id, Some(r.id));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_delete_room_racing_a_booking_never_orphans_it() {
        for _ in 0..25 {
            let store = Arc::new(MemoryStore::new());
            let r = room("101");
            let room_id = r.id;
            store.create_room(&r).await.unwrap();

            let deleting = {
                let store = store.clone();
                tokio::spawn(async move { store.delete_room(room_id).await })
            };
            let booking_task = {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create_reservation(booking(room_id, "2024-06-01", "2024-06-05", ReservationStatus::Confirmed))
                        .await
                })
            };
            let deleted = deleting.await.unwrap();
            let booked = booking_task.await.unwrap();

            match (deleted, booked) {
                (Ok(Some(0)), Err(StoreError::NotFound(_))) => {}
                (Err(StoreError::Refused(_)), Ok(reservation)) => assert_eq!(reservation.room_id, Some(room_id)),
                other => panic!("delete and booking both took effect: {:?}", other),
            }
            let orphaned = store
                .list_reservations(&ReservationFilter::new())
                .await
                .unwrap()
                .into_iter()
                .filter(|res| res.is_active() && res.room_id.is_none())
                .count();
            assert_eq!(orphaned, 0);
        }
    }

    #[tokio::test]
    async fn test_status_change_requires_the_expected_status() {
        let store = MemoryStore::new();
        let r = room("101");
        store.create_room(&r).await.unwrap();
        let stay = store
            .create_reservation(booking(r.id, "2024-06-01", "2024-06-05", ReservationStatus::Confirmed))
            .await
            .unwrap();

        store
            .update_status(stay.id, ReservationStatus::Confirmed, ReservationStatus::Cancelled)
            .await
            .unwrap();
        let err = store
            .update_status(stay.id, ReservationStatus::Confirmed, ReservationStatus::CheckedIn)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::StaleStatus { actual: ReservationStatus::Cancelled, .. }
        ));
        let current = store.get_reservation(stay.id).await.unwrap().unwrap();
        assert_eq!(current.status, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_checked_out_reservation_delete_refused() {
        let store = MemoryStore::new();
        let r = room("101");
        store.create_room(&r).await.unwrap();
        let past = store
            .create_reservation(booking(r.id, "2024-01-01", "2024-01-03", ReservationStatus::CheckedOut))
            .await
            .unwrap();

        assert!(matches!(store.delete_reservation(past.id).await, Err(StoreError::Refused(_))));
        assert!(store.get_reservation(past.id).await.unwrap().is_some());
        assert!(!store.delete_reservation(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_room_number() {
        let store = MemoryStore::new();
        store.create_room(&room("101")).await.unwrap();
        let err = store.create_room(&room("101")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_rooms_listed_in_numeric_order() {
        let store = MemoryStore::new();
        for n in ["10", "9", "101"] {
            store.create_room(&room(n)).await.unwrap();
        }
        let numbers: Vec<String> = store
            .list_rooms(&RoomFilter::new())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.room_number)
            .collect();
        assert_eq!(numbers, vec!["9", "10", "101"]);
    }
}
