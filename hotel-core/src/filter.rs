//! Typed query predicates.
//!
//! Listing endpoints accept any combination of optional criteria. Each
//! criterion becomes one predicate value; a filter is their conjunction.
//! Stores translate predicates into their own query language (bound SQL
//! parameters for PostgreSQL) and can always fall back to [`matches`].
//!
//! [`matches`]: ReservationFilter::matches

use chrono::NaiveDate;
use uuid::Uuid;

use crate::dates::DateRange;
use crate::models::{Reservation, ReservationStatus, Room, RoomStatus, RoomType};

#[derive(Debug, Clone, PartialEq)]
pub enum RoomPredicate {
    Id(Uuid),
    ExcludeId(Uuid),
    Status(RoomStatus),
    Type(RoomType),
    MinCapacity(i32),
}

impl RoomPredicate {
    pub fn matches(&self, room: &Room) -> bool {
        match self {
            RoomPredicate::Id(id) => room.id == *id,
            RoomPredicate::ExcludeId(id) => room.id != *id,
            RoomPredicate::Status(status) => room.status == *status,
            RoomPredicate::Type(room_type) => room.room_type == *room_type,
            RoomPredicate::MinCapacity(min) => room.capacity >= *min,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomFilter {
    predicates: Vec<RoomPredicate>,
}

impl RoomFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rooms staff have not taken off the market.
    pub fn bookable() -> Self {
        Self::new().status(RoomStatus::Available)
    }

    pub fn id(self, id: Uuid) -> Self {
        self.with(RoomPredicate::Id(id))
    }

    pub fn excluding(self, id: Uuid) -> Self {
        self.with(RoomPredicate::ExcludeId(id))
    }

    pub fn status(self, status: RoomStatus) -> Self {
        self.with(RoomPredicate::Status(status))
    }

    pub fn room_type(self, room_type: RoomType) -> Self {
        self.with(RoomPredicate::Type(room_type))
    }

    pub fn min_capacity(self, guests: i32) -> Self {
        self.with(RoomPredicate::MinCapacity(guests))
    }

    /// Applies `f` only when the optional criterion was supplied.
    pub fn maybe<T>(self, value: Option<T>, f: impl FnOnce(Self, T) -> Self) -> Self {
        match value {
            Some(v) => f(self, v),
            None => self,
        }
    }

    pub fn predicates(&self) -> &[RoomPredicate] {
        &self.predicates
    }

    pub fn matches(&self, room: &Room) -> bool {
        self.predicates.iter().all(|p| p.matches(room))
    }

    fn with(mut self, predicate: RoomPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReservationPredicate {
    Id(Uuid),
    ExcludeId(Uuid),
    Room(Uuid),
    StatusIn(Vec<ReservationStatus>),
    /// Half-open overlap with the given stay.
    Overlaps(DateRange),
    CheckinOnOrAfter(NaiveDate),
    CheckinBefore(NaiveDate),
    /// Case-insensitive substring of the guest name or email.
    Guest(String),
}

impl ReservationPredicate {
    pub fn matches(&self, reservation: &Reservation) -> bool {
        match self {
            ReservationPredicate::Id(id) => reservation.id == *id,
            ReservationPredicate::ExcludeId(id) => reservation.id != *id,
            ReservationPredicate::Room(room_id) => reservation.room_id == Some(*room_id),
            ReservationPredicate::StatusIn(statuses) => statuses.contains(&reservation.status),
            ReservationPredicate::Overlaps(stay) => reservation.overlaps(stay),
            ReservationPredicate::CheckinOnOrAfter(day) => reservation.checkin >= *day,
            ReservationPredicate::CheckinBefore(day) => reservation.checkin < *day,
            ReservationPredicate::Guest(needle) => {
                let needle = needle.to_lowercase();
                reservation.guest_name.to_lowercase().contains(&needle)
                    || reservation.guest_email.to_lowercase().contains(&needle)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReservationFilter {
    predicates: Vec<ReservationPredicate>,
}

impl ReservationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active reservations whose stay overlaps `stay`: the set that makes a
    /// room unavailable.
    pub fn blocking(stay: DateRange) -> Self {
        Self::new()
            .status_in(ReservationStatus::ACTIVE.to_vec())
            .overlapping(stay)
    }

    pub fn id(self, id: Uuid) -> Self {
        self.with(ReservationPredicate::Id(id))
    }

    pub fn excluding(self, id: Uuid) -> Self {
        self.with(ReservationPredicate::ExcludeId(id))
    }

    pub fn room(self, room_id: Uuid) -> Self {
        self.with(ReservationPredicate::Room(room_id))
    }

    pub fn status(self, status: ReservationStatus) -> Self {
        self.status_in(vec![status])
    }

    pub fn status_in(self, statuses: Vec<ReservationStatus>) -> Self {
        self.with(ReservationPredicate::StatusIn(statuses))
    }

    pub fn overlapping(self, stay: DateRange) -> Self {
        self.with(ReservationPredicate::Overlaps(stay))
    }

    pub fn checkin_on_or_after(self, day: NaiveDate) -> Self {
        self.with(ReservationPredicate::CheckinOnOrAfter(day))
    }

    pub fn checkin_before(self, day: NaiveDate) -> Self {
        self.with(ReservationPredicate::CheckinBefore(day))
    }

    pub fn guest(self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        if needle.trim().is_empty() {
            return self;
        }
        self.with(ReservationPredicate::Guest(needle.trim().to_string()))
    }

    pub fn maybe<T>(self, value: Option<T>, f: impl FnOnce(Self, T) -> Self) -> Self {
        match value {
            Some(v) => f(self, v),
            None => self,
        }
    }

    pub fn predicates(&self) -> &[ReservationPredicate] {
        &self.predicates
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        self.predicates.iter().all(|p| p.matches(reservation))
    }

    fn with(mut self, predicate: ReservationPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;
    use chrono::Utc;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn reservation(room_id: Uuid, checkin: &str, checkout: &str, status: ReservationStatus) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            room_id: Some(room_id),
            guest_name: "Ana Torres".into(),
            guest_email: "ana@example.com".into(),
            guest_phone: None,
            document_number: "12345678".into(),
            document_type: DocumentType::NationalId,
            nationality: None,
            checkin: day(checkin),
            checkout: day(checkout),
            total_cents: 10_000,
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_blocking_ignores_cancelled_and_pending() {
        let room = Uuid::new_v4();
        let stay = DateRange::parse("2024-06-02", "2024-06-03").unwrap();
        let filter = ReservationFilter::blocking(stay);

        assert!(filter.matches(&reservation(room, "2024-06-01", "2024-06-05", ReservationStatus::Confirmed)));
        assert!(filter.matches(&reservation(room, "2024-06-01", "2024-06-05", ReservationStatus::CheckedIn)));
        assert!(!filter.matches(&reservation(room, "2024-06-01", "2024-06-05", ReservationStatus::Pending)));
        assert!(!filter.matches(&reservation(room, "2024-06-01", "2024-06-05", ReservationStatus::Cancelled)));
        assert!(!filter.matches(&reservation(room, "2024-06-01", "2024-06-05", ReservationStatus::CheckedOut)));
    }

    #[test]
    fn test_conjunction_of_optional_criteria() {
        let room = Uuid::new_v4();
        let r = reservation(room, "2024-06-01", "2024-06-05", ReservationStatus::Confirmed);

        let filter = ReservationFilter::new()
            .maybe(Some(room), |f, id| f.room(id))
            .maybe(None::<ReservationStatus>, |f, s| f.status(s))
            .guest("TORRES");
        assert!(filter.matches(&r));

        let other_room = ReservationFilter::new().room(Uuid::new_v4()).guest("torres");
        assert!(!other_room.matches(&r));
    }

    #[test]
    fn test_blank_guest_needle_adds_nothing() {
        assert!(ReservationFilter::new().guest("   ").predicates().is_empty());
    }
}
