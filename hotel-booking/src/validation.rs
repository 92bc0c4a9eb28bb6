use hotel_core::dates::parse_date;
use hotel_core::models::{DocumentType, NewReservation, ReservationStatus};
use hotel_core::DateRange;
use serde::Deserialize;
use uuid::Uuid;

use crate::{BookingError, BookingResult};

/// Reservation form as posted by the public site or the back-office.
///
/// Everything arrives as optional text so that a missing or malformed field
/// is reported against its name instead of failing JSON extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationRequest {
    pub room_id: Option<String>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub guest_phone: Option<String>,
    pub document_number: Option<String>,
    pub document_type: Option<String>,
    pub nationality: Option<String>,
    pub checkin: Option<String>,
    pub checkout: Option<String>,
    /// Minor units. Computed from the room price when omitted.
    pub total: Option<i64>,
    pub notes: Option<String>,
}

/// A request that passed every field-level rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidReservation {
    pub room_id: Uuid,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: Option<String>,
    pub document_number: String,
    pub document_type: DocumentType,
    pub nationality: Option<String>,
    pub stay: DateRange,
    pub total_cents: Option<i64>,
    pub notes: Option<String>,
}

impl ValidReservation {
    pub fn into_new(self, total_cents: i64, status: ReservationStatus) -> NewReservation {
        NewReservation {
            room_id: self.room_id,
            guest_name: self.guest_name,
            guest_email: self.guest_email,
            guest_phone: self.guest_phone,
            document_number: self.document_number,
            document_type: self.document_type,
            nationality: self.nationality,
            stay: self.stay,
            total_cents,
            status,
            notes: self.notes,
        }
    }
}

fn present(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn required(field: &'static str, value: &Option<String>) -> BookingResult<String> {
    present(value).ok_or_else(|| BookingError::validation(field, format!("{} is required", field)))
}

impl ReservationRequest {
    /// Applies the field rules in order; the first failure is returned.
    pub fn validate(&self) -> BookingResult<ValidReservation> {
        // 1. Presence and formats
        let room_id = required("room_id", &self.room_id)?;
        let room_id = Uuid::parse_str(&room_id)
            .map_err(|_| BookingError::validation("room_id", "room_id is not a valid identifier"))?;
        let guest_name = required("guest_name", &self.guest_name)?;
        let guest_email = required("guest_email", &self.guest_email)?;
        if !guest_email.contains('@') {
            return Err(BookingError::validation("guest_email", "guest_email is not a valid address"));
        }
        let checkin = required("checkin", &self.checkin)?;
        let checkin = parse_date("checkin", &checkin).map_err(|e| BookingError::validation("checkin", e.to_string()))?;
        let checkout = required("checkout", &self.checkout)?;
        let checkout =
            parse_date("checkout", &checkout).map_err(|e| BookingError::validation("checkout", e.to_string()))?;
        if let Some(total) = self.total {
            if total <= 0 {
                return Err(BookingError::validation("total", "total must be a positive amount"));
            }
        }

        // 2. Range
        let stay = DateRange::new(checkin, checkout).map_err(|e| BookingError::validation("checkout", e.to_string()))?;

        // 3. Identity document
        let document_number = required("document_number", &self.document_number)?;
        let document_type = required("document_type", &self.document_type)?;
        let document_type: DocumentType = document_type
            .parse()
            .map_err(|_| BookingError::validation("document_type", "document_type must be DNI or PASSPORT"))?;
        if !document_type.accepts(&document_number) {
            return Err(BookingError::validation("document_number", document_type.format_hint()));
        }

        Ok(ValidReservation {
            room_id,
            guest_name,
            guest_email,
            guest_phone: present(&self.guest_phone),
            document_number,
            document_type,
            nationality: present(&self.nationality),
            stay,
            total_cents: self.total,
            notes: present(&self.notes),
        })
    }
}
