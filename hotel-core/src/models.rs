use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::dates::{intervals_overlap, DateRange};
use crate::{CoreError, CoreResult};

// ============================================================================
// Rooms
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RoomType {
    Simple,
    Double,
    Triple,
    Quad,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [RoomType::Simple, RoomType::Double, RoomType::Triple, RoomType::Quad];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Simple => "Simple",
            RoomType::Double => "Double",
            RoomType::Triple => "Triple",
            RoomType::Quad => "Quad",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownVariant { kind: "room type", value: s.to_string() })
    }
}

/// Staff-controlled room flag, independent of reservation-derived occupancy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    pub const ALL: [RoomStatus; 3] = [RoomStatus::Available, RoomStatus::Occupied, RoomStatus::Maintenance];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomStatus::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownVariant { kind: "room status", value: s.to_string() })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: Uuid,
    pub room_number: String,
    pub room_type: RoomType,
    pub capacity: i32,
    /// Nightly price in minor units.
    pub price_cents: i64,
    pub description: String,
    pub amenities: Vec<String>,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    pub fn from_draft(id: Uuid, draft: RoomDraft) -> Self {
        let now = Utc::now();
        Self {
            id,
            room_number: draft.room_number,
            room_type: draft.room_type,
            capacity: draft.capacity,
            price_cents: draft.price_cents,
            description: draft.description,
            amenities: draft.amenities,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the editable fields, keeping identity and creation time.
    pub fn apply(&mut self, draft: RoomDraft) {
        self.room_number = draft.room_number;
        self.room_type = draft.room_type;
        self.capacity = draft.capacity;
        self.price_cents = draft.price_cents;
        self.description = draft.description;
        self.amenities = draft.amenities;
        self.status = draft.status;
        self.updated_at = Utc::now();
    }

    pub fn is_bookable(&self) -> bool {
        self.status == RoomStatus::Available
    }

    /// Price of a stay in this room, in minor units. `None` when the
    /// amount does not fit in an `i64`.
    pub fn quote(&self, stay: &DateRange) -> Option<i64> {
        self.price_cents.checked_mul(stay.nights())
    }
}

/// Editable room fields, as submitted by the back-office.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomDraft {
    pub room_number: String,
    pub room_type: RoomType,
    pub capacity: i32,
    pub price_cents: i64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default = "default_room_status")]
    pub status: RoomStatus,
}

fn default_room_status() -> RoomStatus {
    RoomStatus::Available
}

impl RoomDraft {
    /// Trims text fields, drops blank amenity tags and checks the numeric bounds.
    pub fn normalized(mut self) -> CoreResult<Self> {
        self.room_number = self.room_number.trim().to_string();
        self.description = self.description.trim().to_string();
        self.amenities = self
            .amenities
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        if self.room_number.is_empty() {
            return Err(CoreError::ValidationError("room_number is required".into()));
        }
        if self.capacity <= 0 {
            return Err(CoreError::ValidationError("capacity must be a positive integer".into()));
        }
        if self.price_cents <= 0 {
            return Err(CoreError::ValidationError("price_cents must be positive".into()));
        }
        Ok(self)
    }
}

/// Numeric-aware ordering for room numbers: "9" before "10"; numbers before
/// anything non-numeric, which falls back to lexical order.
pub fn compare_room_numbers(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn sort_by_room_number(rooms: &mut [Room]) {
    rooms.sort_by(|a, b| compare_room_numbers(&a.room_number, &b.room_number));
}

// ============================================================================
// Reservations
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 5] = [
        ReservationStatus::Pending,
        ReservationStatus::Confirmed,
        ReservationStatus::CheckedIn,
        ReservationStatus::CheckedOut,
        ReservationStatus::Cancelled,
    ];

    /// Statuses that hold the room and take part in the no-overlap invariant.
    pub const ACTIVE: [ReservationStatus; 2] = [ReservationStatus::Confirmed, ReservationStatus::CheckedIn];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked-in",
            ReservationStatus::CheckedOut => "checked-out",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");
        ReservationStatus::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| CoreError::UnknownVariant { kind: "reservation status", value: s.to_string() })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DocumentType {
    #[serde(rename = "DNI", alias = "dni", alias = "national-id")]
    NationalId,
    #[serde(rename = "PASSPORT", alias = "passport", alias = "Passport")]
    Passport,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::NationalId => "DNI",
            DocumentType::Passport => "PASSPORT",
        }
    }

    /// National ids are 7 or 8 digits; passports at least 6 alphanumerics.
    pub fn accepts(&self, number: &str) -> bool {
        match self {
            DocumentType::NationalId => {
                (7..=8).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit())
            }
            DocumentType::Passport => {
                number.len() >= 6 && number.chars().all(|c| c.is_ascii_alphanumeric())
            }
        }
    }

    pub fn format_hint(&self) -> &'static str {
        match self {
            DocumentType::NationalId => "DNI must be 7 or 8 digits",
            DocumentType::Passport => "passport number must be at least 6 alphanumeric characters",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dni" | "national-id" | "national_id" => Ok(DocumentType::NationalId),
            "passport" | "pasaporte" => Ok(DocumentType::Passport),
            _ => Err(CoreError::UnknownVariant { kind: "document type", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    /// `None` once the room has been deleted; only historical stays survive that.
    pub room_id: Option<Uuid>,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub document_number: String,
    pub document_type: DocumentType,
    pub nationality: Option<String>,
    pub checkin: NaiveDate,
    /// Exclusive.
    pub checkout: NaiveDate,
    pub total_cents: i64,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn overlaps(&self, stay: &DateRange) -> bool {
        intervals_overlap(self.checkin, self.checkout, stay.checkin(), stay.checkout())
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.checkin <= day && day < self.checkout
    }

    /// True when this reservation would block `stay` in `room_id`.
    pub fn blocks(&self, room_id: Uuid, stay: &DateRange) -> bool {
        self.room_id == Some(room_id) && self.is_active() && self.overlaps(stay)
    }
}

/// A validated reservation ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub room_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub document_number: String,
    pub document_type: DocumentType,
    pub nationality: Option<String>,
    pub stay: DateRange,
    pub total_cents: i64,
    pub status: ReservationStatus,
    pub notes: Option<String>,
}

impl NewReservation {
    pub fn into_reservation(self, id: Uuid) -> Reservation {
        Reservation {
            id,
            room_id: Some(self.room_id),
            guest_name: self.guest_name,
            guest_email: self.guest_email,
            guest_phone: self.guest_phone,
            document_number: self.document_number,
            document_type: self.document_type,
            nationality: self.nationality,
            checkin: self.stay.checkin(),
            checkout: self.stay.checkout(),
            total_cents: self.total_cents,
            status: self.status,
            notes: self.notes,
            created_at: Utc::now(),
        }
    }
}

// ============================================================================
// Back-office users
// ============================================================================

#[derive(Clone)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string; never the password itself.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for AdminUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminUser")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_number_ordering_is_numeric() {
        let mut numbers = vec!["10", "9", "101", "A1", "2"];
        numbers.sort_by(|a, b| compare_room_numbers(a, b));
        assert_eq!(numbers, vec!["2", "9", "10", "101", "A1"]);
    }

    #[test]
    fn test_national_id_format() {
        assert!(!DocumentType::NationalId.accepts("123"));
        assert!(DocumentType::NationalId.accepts("1234567"));
        assert!(DocumentType::NationalId.accepts("12345678"));
        assert!(!DocumentType::NationalId.accepts("123456789"));
        assert!(!DocumentType::NationalId.accepts("1234567a"));
    }

    #[test]
    fn test_passport_format() {
        assert!(DocumentType::Passport.accepts("AB1234"));
        assert!(!DocumentType::Passport.accepts("AB123"));
        assert!(!DocumentType::Passport.accepts("AB-1234"));
    }

    #[test]
    fn test_status_parsing_accepts_underscores() {
        assert_eq!("checked_in".parse::<ReservationStatus>().unwrap(), ReservationStatus::CheckedIn);
        assert_eq!("CONFIRMED".parse::<ReservationStatus>().unwrap(), ReservationStatus::Confirmed);
        assert!("archived".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn test_status_serde_uses_kebab_case() {
        let json = serde_json::to_string(&ReservationStatus::CheckedOut).unwrap();
        assert_eq!(json, "\"checked-out\"");
        let doc: DocumentType = serde_json::from_str("\"dni\"").unwrap();
        assert_eq!(doc, DocumentType::NationalId);
    }

    #[test]
    fn test_room_draft_validation() {
        let draft = RoomDraft {
            room_number: "  101 ".into(),
            room_type: RoomType::Double,
            capacity: 2,
            price_cents: 8_000,
            description: String::new(),
            amenities: vec!["wifi".into(), " ".into()],
            status: RoomStatus::Available,
        };
        let normalized = draft.clone().normalized().unwrap();
        assert_eq!(normalized.room_number, "101");
        assert_eq!(normalized.amenities, vec!["wifi".to_string()]);

        let bad = RoomDraft { capacity: 0, ..draft };
        assert!(bad.normalized().is_err());
    }

    #[test]
    fn test_quote_refuses_overflowing_totals() {
        let mut room = Room::from_draft(
            Uuid::new_v4(),
            RoomDraft {
                room_number: "101".into(),
                room_type: RoomType::Double,
                capacity: 2,
                price_cents: 12_500,
                description: String::new(),
                amenities: vec![],
                status: RoomStatus::Available,
            },
        );
        let week = DateRange::parse("2024-06-01", "2024-06-08").unwrap();
        assert_eq!(room.quote(&week), Some(87_500));

        room.price_cents = 10_000_000_000_000;
        let forever = DateRange::parse("2024-01-01", "9999-12-31").unwrap();
        assert_eq!(room.quote(&forever), None);
    }
}
