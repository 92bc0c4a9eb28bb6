use hotel_core::filter::RoomFilter;
use hotel_core::models::{Room, RoomDraft};
use hotel_core::CoreError;
use hotel_shared::{Page, PageRequest};
use tracing::info;
use uuid::Uuid;

use crate::{BookingError, BookingResult, Repositories};

const DRAFT_FIELDS: [&str; 3] = ["room_number", "capacity", "price_cents"];

fn invalid_draft(err: CoreError) -> BookingError {
    let message = match err {
        CoreError::ValidationError(message) => message,
        other => other.to_string(),
    };
    let field = DRAFT_FIELDS.into_iter().find(|f| message.starts_with(f)).unwrap_or("room");
    BookingError::validation(field, message)
}

/// Back-office room management.
#[derive(Clone)]
pub struct RoomCatalog {
    repos: Repositories,
}

impl RoomCatalog {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn get(&self, id: Uuid) -> BookingResult<Room> {
        self.repos
            .rooms
            .get_room(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("room {}", id)))
    }

    pub async fn list(&self, filter: &RoomFilter) -> BookingResult<Vec<Room>> {
        Ok(self.repos.rooms.list_rooms(filter).await?)
    }

    pub async fn page(&self, filter: &RoomFilter, page: PageRequest) -> BookingResult<Page<Room>> {
        let rooms = self.list(filter).await?;
        Ok(Page::slice(rooms, page))
    }

    pub async fn create(&self, draft: RoomDraft) -> BookingResult<Room> {
        let draft = draft.normalized().map_err(invalid_draft)?;
        let room = Room::from_draft(Uuid::new_v4(), draft);
        self.repos.rooms.create_room(&room).await?;
        info!("Room {} added ({})", room.room_number, room.room_type);
        Ok(room)
    }

    pub async fn update(&self, id: Uuid, draft: RoomDraft) -> BookingResult<Room> {
        let draft = draft.normalized().map_err(invalid_draft)?;
        let mut room = self.get(id).await?;
        room.apply(draft);
        self.repos.rooms.update_room(&room).await?;
        info!("Room {} updated, status {}", room.room_number, room.status);
        Ok(room)
    }
}
