use hotel_core::filter::{ReservationFilter, RoomFilter};
use hotel_core::models::{sort_by_room_number, Reservation, Room, RoomType};
use hotel_core::{DateRange, StoreResult};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::{BookingError, ConflictReport, Repositories};

/// Criteria for an availability search. `stay = None` lists every bookable
/// room without looking at reservations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityQuery {
    pub stay: Option<DateRange>,
    pub room_id: Option<Uuid>,
    pub room_type: Option<RoomType>,
    pub min_capacity: Option<i32>,
}

impl AvailabilityQuery {
    pub fn for_stay(stay: DateRange) -> Self {
        Self { stay: Some(stay), ..Self::default() }
    }

    /// Builds a query from raw request parameters. Any malformed input is
    /// reported as a message for the caller; nothing here fails hard.
    pub fn parse(
        checkin: Option<&str>,
        checkout: Option<&str>,
        room_type: Option<&str>,
        room_id: Option<Uuid>,
        guests: Option<i32>,
    ) -> Result<Self, String> {
        let checkin = checkin.map(str::trim).filter(|s| !s.is_empty());
        let checkout = checkout.map(str::trim).filter(|s| !s.is_empty());

        let stay = match (checkin, checkout) {
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                return Err("Both checkin and checkout are required to check availability".to_string())
            }
            (Some(a), Some(b)) => Some(DateRange::parse(a, b).map_err(|e| e.to_string())?),
        };

        let room_type = room_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<RoomType>().map_err(|e| e.to_string()))
            .transpose()?;

        if let Some(guests) = guests {
            if guests <= 0 {
                return Err("guests must be a positive number".to_string());
            }
        }

        Ok(Self {
            stay,
            room_id,
            room_type,
            min_capacity: guests,
        })
    }

    fn room_filter(&self) -> RoomFilter {
        RoomFilter::bookable()
            .maybe(self.room_id, RoomFilter::id)
            .maybe(self.room_type, RoomFilter::room_type)
            .maybe(self.min_capacity, RoomFilter::min_capacity)
    }
}

/// Result of an availability search as served to guests.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub rooms: Vec<Room>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Availability {
    pub fn found(rooms: Vec<Room>) -> Self {
        let message = if rooms.is_empty() {
            Some("No rooms available for the selected criteria".to_string())
        } else {
            None
        };
        Self { total: rooms.len(), rooms, message }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            rooms: Vec::new(),
            total: 0,
            message: Some(message.into()),
        }
    }
}

/// Drops every room that has an entry in `blocking`, then orders the rest
/// by room number. `blocking` must already be restricted to active
/// reservations overlapping the stay.
pub fn exclude_occupied(rooms: Vec<Room>, blocking: &[Reservation]) -> Vec<Room> {
    let occupied: HashSet<Uuid> = blocking.iter().filter_map(|r| r.room_id).collect();
    let mut free: Vec<Room> = rooms.into_iter().filter(|room| !occupied.contains(&room.id)).collect();
    sort_by_room_number(&mut free);
    free
}

#[derive(Clone)]
pub struct AvailabilityChecker {
    repos: Repositories,
}

impl AvailabilityChecker {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Rooms that are bookable and free for the whole stay.
    pub async fn available_rooms(&self, query: &AvailabilityQuery) -> StoreResult<Vec<Room>> {
        // 1. Bookable rooms
        let rooms = self.repos.rooms.list_rooms(&query.room_filter()).await?;

        let Some(stay) = query.stay else {
            let mut rooms = rooms;
            sort_by_room_number(&mut rooms);
            return Ok(rooms);
        };

        // 2. Active reservations overlapping the stay
        let blocking_filter = ReservationFilter::blocking(stay).maybe(query.room_id, ReservationFilter::room);
        let blocking = self.repos.reservations.list_reservations(&blocking_filter).await?;

        // 3-4. Exclude and order
        let free = exclude_occupied(rooms, &blocking);
        debug!(
            "Availability {}..{}: {} free, {} blocking reservations",
            stay.checkin(),
            stay.checkout(),
            free.len(),
            blocking.len()
        );
        Ok(free)
    }

    /// Availability as answered to the public site: invalid input becomes an
    /// empty result carrying the reason.
    pub async fn check(&self, query: Result<AvailabilityQuery, String>) -> StoreResult<Availability> {
        match query {
            Ok(query) => Ok(Availability::found(self.available_rooms(&query).await?)),
            Err(message) => Ok(Availability::invalid(message)),
        }
    }

    /// Active reservations on `room_id` that overlap `stay`.
    pub async fn conflicts(&self, room_id: Uuid, stay: DateRange) -> StoreResult<Vec<Reservation>> {
        let filter = ReservationFilter::blocking(stay).room(room_id);
        self.repos.reservations.list_reservations(&filter).await
    }

    /// Other rooms of the same type that are free for `stay`. Never fails
    /// for lack of options: an empty list means there is nothing to offer.
    pub async fn alternatives(&self, room: &Room, stay: DateRange) -> StoreResult<Vec<Room>> {
        let query = AvailabilityQuery {
            stay: Some(stay),
            room_type: Some(room.room_type),
            ..AvailabilityQuery::default()
        };
        let rooms = self.available_rooms(&query).await?;
        Ok(rooms.into_iter().filter(|r| r.id != room.id).collect())
    }

    /// Turns a refused stay into the error served to the guest, with what
    /// can be offered instead. A room that vanished meanwhile has no
    /// alternatives to offer.
    pub async fn conflict(&self, room_id: Uuid, stay: DateRange, conflicts: Vec<Reservation>) -> BookingError {
        let alternatives = match self.repos.rooms.get_room(room_id).await {
            Ok(Some(room)) => match self.alternatives(&room, stay).await {
                Ok(rooms) => rooms,
                Err(e) => return e.into(),
            },
            Ok(None) => Vec::new(),
            Err(e) => return e.into(),
        };
        BookingError::Conflict(Box::new(ConflictReport { room_id, conflicts, alternatives }))
    }
}
