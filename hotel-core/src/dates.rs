use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Wire format for stay dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stay expressed as the half-open interval `[checkin, checkout)`.
///
/// The checkout day is not occupied: a guest leaving on day X frees the room
/// for a guest arriving on day X. Construction guarantees `checkout > checkin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    checkin: NaiveDate,
    checkout: NaiveDate,
}

impl DateRange {
    pub fn new(checkin: NaiveDate, checkout: NaiveDate) -> CoreResult<Self> {
        if checkout <= checkin {
            return Err(CoreError::InvalidDateRange(format!(
                "checkout ({}) must be after checkin ({})",
                checkout, checkin
            )));
        }
        Ok(Self { checkin, checkout })
    }

    /// Parses two `YYYY-MM-DD` strings.
    pub fn parse(checkin: &str, checkout: &str) -> CoreResult<Self> {
        let checkin = parse_date("checkin", checkin)?;
        let checkout = parse_date("checkout", checkout)?;
        Self::new(checkin, checkout)
    }

    pub fn checkin(&self) -> NaiveDate {
        self.checkin
    }

    pub fn checkout(&self) -> NaiveDate {
        self.checkout
    }

    /// Number of nights in the stay; always at least one.
    pub fn nights(&self) -> i64 {
        (self.checkout - self.checkin).num_days()
    }

    /// `a < d && c < b` for `[a, b)` and `[c, d)`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        intervals_overlap(self.checkin, self.checkout, other.checkin, other.checkout)
    }

    /// Whether the night starting on `day` belongs to the stay.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.checkin <= day && day < self.checkout
    }
}

/// Half-open overlap test on raw bounds. Stored reservations are checked
/// with this directly since their dates come from the database unvalidated.
pub fn intervals_overlap(
    checkin_a: NaiveDate,
    checkout_a: NaiveDate,
    checkin_b: NaiveDate,
    checkout_b: NaiveDate,
) -> bool {
    checkin_a < checkout_b && checkin_b < checkout_a
}

pub fn parse_date(field: &str, value: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        CoreError::InvalidDateRange(format!("{} must be a date in YYYY-MM-DD format, got '{}'", field, value))
    })
}
