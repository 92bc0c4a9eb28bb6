use chrono::{NaiveDate, Utc};
use hotel_core::models::{DocumentType, Reservation, ReservationStatus, Room, RoomDraft, RoomStatus, RoomType};
use hotel_core::repository::RoomRepository;
use hotel_store::MemoryStore;
use std::sync::Arc;
use uuid::Uuid;

use crate::Repositories;

pub(crate) fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub(crate) fn store() -> (Arc<MemoryStore>, Repositories) {
    let store = Arc::new(MemoryStore::new());
    let repos = Repositories::new(store.clone(), store.clone());
    (store, repos)
}

pub(crate) async fn add_room(store: &MemoryStore, number: &str, room_type: RoomType, status: RoomStatus) -> Room {
    let room = Room::from_draft(
        Uuid::new_v4(),
        RoomDraft {
            room_number: number.into(),
            room_type,
            capacity: 2,
            price_cents: 10_000,
            description: format!("Room {}", number),
            amenities: vec!["wifi".into()],
            status,
        },
    );
    store.create_room(&room).await.unwrap();
    room
}

pub(crate) async fn add_stay(
    store: &MemoryStore,
    room: &Room,
    checkin: &str,
    checkout: &str,
    status: ReservationStatus,
) -> Reservation {
    let reservation = Reservation {
        id: Uuid::new_v4(),
        room_id: Some(room.id),
        guest_name: "María Gómez".into(),
        guest_email: "maria@example.com".into(),
        guest_phone: Some("+54 11 5555 0000".into()),
        document_number: "28999111".into(),
        document_type: DocumentType::NationalId,
        nationality: Some("AR".into()),
        checkin: day(checkin),
        checkout: day(checkout),
        total_cents: room.price_cents * (day(checkout) - day(checkin)).num_days(),
        status,
        notes: None,
        created_at: Utc::now(),
    };
    store.seed_reservation(reservation.clone()).await;
    reservation
}
