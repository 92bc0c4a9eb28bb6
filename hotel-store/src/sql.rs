//! Row types and predicate rendering shared by the PostgreSQL repositories.

use chrono::{DateTime, NaiveDate, Utc};
use hotel_core::filter::{ReservationFilter, ReservationPredicate, RoomFilter, RoomPredicate};
use hotel_core::models::{Reservation, Room};
use hotel_core::{CoreError, StoreError};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

pub(crate) const ROOM_COLUMNS: &str =
    "id, room_number, room_type, capacity, price_cents, description, amenities, status, created_at, updated_at";

pub(crate) const RESERVATION_COLUMNS: &str = "id, room_id, guest_name, guest_email, guest_phone, document_number, \
     document_type, nationality, checkin, checkout, total_cents, status, notes, created_at";

/// Numeric room numbers first, in numeric order, then the rest lexically.
pub(crate) const ROOM_ORDER: &str = " ORDER BY (room_number ~ '^[0-9]+$') DESC, \
     CASE WHEN room_number ~ '^[0-9]+$' THEN room_number::NUMERIC END, room_number";

const EXCLUSION_VIOLATION: &str = "23P01";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(sqlx::FromRow)]
pub(crate) struct RoomRow {
    id: Uuid,
    room_number: String,
    room_type: String,
    capacity: i32,
    price_cents: i64,
    description: String,
    amenities: Vec<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = CoreError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Room {
            id: row.id,
            room_number: row.room_number,
            room_type: row.room_type.parse()?,
            capacity: row.capacity,
            price_cents: row.price_cents,
            description: row.description,
            amenities: row.amenities,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ReservationRow {
    id: Uuid,
    room_id: Option<Uuid>,
    guest_name: String,
    guest_email: String,
    guest_phone: Option<String>,
    document_number: String,
    document_type: String,
    nationality: Option<String>,
    checkin: NaiveDate,
    checkout: NaiveDate,
    total_cents: i64,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = CoreError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(Reservation {
            id: row.id,
            room_id: row.room_id,
            guest_name: row.guest_name,
            guest_email: row.guest_email,
            guest_phone: row.guest_phone,
            document_number: row.document_number,
            document_type: row.document_type.parse()?,
            nationality: row.nationality,
            checkin: row.checkin,
            checkout: row.checkout,
            total_cents: row.total_cents,
            status: row.status.parse()?,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

pub(crate) fn push_room_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &RoomFilter) {
    for predicate in filter.predicates() {
        match predicate {
            RoomPredicate::Id(id) => {
                qb.push(" AND id = ").push_bind(*id);
            }
            RoomPredicate::ExcludeId(id) => {
                qb.push(" AND id <> ").push_bind(*id);
            }
            RoomPredicate::Status(status) => {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
            RoomPredicate::Type(room_type) => {
                qb.push(" AND room_type = ").push_bind(room_type.as_str());
            }
            RoomPredicate::MinCapacity(min) => {
                qb.push(" AND capacity >= ").push_bind(*min);
            }
        }
    }
}

pub(crate) fn push_reservation_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ReservationFilter) {
    for predicate in filter.predicates() {
        match predicate {
            ReservationPredicate::Id(id) => {
                qb.push(" AND id = ").push_bind(*id);
            }
            ReservationPredicate::ExcludeId(id) => {
                qb.push(" AND id <> ").push_bind(*id);
            }
            ReservationPredicate::Room(room_id) => {
                qb.push(" AND room_id = ").push_bind(*room_id);
            }
            ReservationPredicate::StatusIn(statuses) => {
                let values: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
                qb.push(" AND status = ANY(").push_bind(values).push(")");
            }
            ReservationPredicate::Overlaps(stay) => {
                qb.push(" AND checkin < ")
                    .push_bind(stay.checkout())
                    .push(" AND checkout > ")
                    .push_bind(stay.checkin());
            }
            ReservationPredicate::CheckinOnOrAfter(day) => {
                qb.push(" AND checkin >= ").push_bind(*day);
            }
            ReservationPredicate::CheckinBefore(day) => {
                qb.push(" AND checkin < ").push_bind(*day);
            }
            ReservationPredicate::Guest(needle) => {
                let pattern = format!("%{}%", escape_like(needle));
                qb.push(" AND (guest_name ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR guest_email ILIKE ")
                    .push_bind(pattern)
                    .push(")");
            }
        }
    }
}

fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub(crate) fn is_exclusion_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == EXCLUSION_VIOLATION)
}

pub(crate) fn map_db_error(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.code().is_some_and(|code| code == UNIQUE_VIOLATION) {
            return StoreError::Duplicate(db.constraint().unwrap_or("unique constraint").to_string());
        }
    }
    StoreError::backend(err)
}
