use chrono::{Datelike, NaiveDate};
use hotel_core::filter::{ReservationFilter, RoomFilter};
use hotel_core::models::{Reservation, ReservationStatus, Room, RoomStatus};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use crate::{BookingResult, Repositories};

const RECENT_RESERVATIONS: usize = 5;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RoomCounts {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub maintenance: usize,
}

/// Back-office overview for one calendar day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardStats {
    pub today: NaiveDate,
    pub rooms: RoomCounts,
    pub active_reservations: usize,
    pub pending_reservations: usize,
    pub checkins_today: usize,
    pub checkouts_today: usize,
    pub occupied_tonight: usize,
    /// Percent of rooms not under maintenance that hold a guest tonight.
    pub occupancy_rate: f64,
    pub monthly_revenue_cents: i64,
    pub reservations_by_status: BTreeMap<&'static str, usize>,
    pub recent_reservations: Vec<Reservation>,
}

fn count_where(reservations: &[Reservation], pred: impl Fn(&Reservation) -> bool) -> usize {
    reservations.iter().filter(|r| pred(r)).count()
}

impl DashboardStats {
    pub fn compute(rooms: &[Room], reservations: &[Reservation], today: NaiveDate) -> Self {
        let mut counts = RoomCounts {
            total: rooms.len(),
            ..RoomCounts::default()
        };
        for room in rooms {
            match room.status {
                RoomStatus::Available => counts.available += 1,
                RoomStatus::Occupied => counts.occupied += 1,
                RoomStatus::Maintenance => counts.maintenance += 1,
            }
        }

        let known: HashSet<Uuid> = rooms.iter().map(|r| r.id).collect();
        let occupied: HashSet<Uuid> = reservations
            .iter()
            .filter(|r| r.is_active() && r.covers(today))
            .filter_map(|r| r.room_id)
            .filter(|id| known.contains(id))
            .collect();

        let sellable = counts.total - counts.maintenance;
        let occupancy_rate = if sellable == 0 {
            0.0
        } else {
            (occupied.len() as f64 * 1000.0 / sellable as f64).round() / 10.0
        };

        let mut by_status: BTreeMap<&'static str, usize> =
            ReservationStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for r in reservations {
            *by_status.entry(r.status.as_str()).or_default() += 1;
        }

        let monthly_revenue_cents = reservations
            .iter()
            .filter(|r| r.status != ReservationStatus::Cancelled)
            .filter(|r| r.checkin.year() == today.year() && r.checkin.month() == today.month())
            .map(|r| r.total_cents)
            .sum();

        let mut recent: Vec<Reservation> = reservations.to_vec();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(RECENT_RESERVATIONS);

        Self {
            today,
            rooms: counts,
            active_reservations: count_where(reservations, |r| r.is_active()),
            pending_reservations: count_where(reservations, |r| r.status == ReservationStatus::Pending),
            checkins_today: count_where(reservations, |r| r.status == ReservationStatus::Confirmed && r.checkin == today),
            checkouts_today: count_where(reservations, |r| r.status == ReservationStatus::CheckedIn && r.checkout == today),
            occupied_tonight: occupied.len(),
            occupancy_rate,
            monthly_revenue_cents,
            reservations_by_status: by_status,
            recent_reservations: recent,
        }
    }
}

#[derive(Clone)]
pub struct StatsService {
    repos: Repositories,
}

impl StatsService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn dashboard(&self, today: NaiveDate) -> BookingResult<DashboardStats> {
        let rooms = self.repos.rooms.list_rooms(&RoomFilter::new()).await?;
        let reservations = self.repos.reservations.list_reservations(&ReservationFilter::new()).await?;
        Ok(DashboardStats::compute(&rooms, &reservations, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_room, add_stay, day, store};
    use hotel_core::models::RoomType;
    use ReservationStatus::*;

    #[test]
    fn test_empty_hotel() {
        let stats = DashboardStats::compute(&[], &[], day("2024-06-10"));
        assert_eq!(stats.occupancy_rate, 0.0);
        assert_eq!(stats.rooms.total, 0);
        assert_eq!(stats.reservations_by_status.len(), 5);
        assert!(stats.recent_reservations.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_figures() {
        let (store, repos) = store();
        let a = add_room(&store, "1", RoomType::Simple, RoomStatus::Available).await;
        let b = add_room(&store, "2", RoomType::Double, RoomStatus::Available).await;
        let c = add_room(&store, "3", RoomType::Double, RoomStatus::Occupied).await;
        add_room(&store, "4", RoomType::Double, RoomStatus::Maintenance).await;

        // In house tonight, leaving later.
        add_stay(&store, &a, "2024-06-08", "2024-06-12", CheckedIn).await;
        // Leaving today: does not count as occupied tonight.
        add_stay(&store, &b, "2024-06-07", "2024-06-10", CheckedIn).await;
        // Arriving today.
        add_stay(&store, &c, "2024-06-10", "2024-06-11", Confirmed).await;
        add_stay(&store, &b, "2024-06-20", "2024-06-22", Pending).await;
        add_stay(&store, &b, "2024-06-25", "2024-06-27", Cancelled).await;
        add_stay(&store, &a, "2024-05-01", "2024-05-03", CheckedOut).await;

        let stats = StatsService::new(repos).dashboard(day("2024-06-10")).await.unwrap();

        assert_eq!(stats.rooms, RoomCounts { total: 4, available: 2, occupied: 1, maintenance: 1 });
        assert_eq!(stats.active_reservations, 3);
        assert_eq!(stats.pending_reservations, 1);
        assert_eq!(stats.checkins_today, 1);
        assert_eq!(stats.checkouts_today, 1);
        assert_eq!(stats.occupied_tonight, 2);
        assert_eq!(stats.occupancy_rate, 66.7);
        // 4 + 3 + 1 + 2 nights in June at 100.00, cancelled excluded.
        assert_eq!(stats.monthly_revenue_cents, 100_000);
        assert_eq!(stats.reservations_by_status["checked-in"], 2);
        assert_eq!(stats.reservations_by_status["checked-out"], 1);
        assert_eq!(stats.recent_reservations.len(), 5);
    }
}
