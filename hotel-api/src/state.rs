use std::sync::Arc;

use hotel_booking::{
    AvailabilityChecker, DeletionGuard, Repositories, ReservationManager, ReservationWriter, RoomCatalog,
    StatsService,
};
use hotel_core::repository::{AdminRepository, ReservationRepository, RoomRepository};
use hotel_shared::PageRequest;
use hotel_store::app_config::PagingConfig;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub admins: Arc<dyn AdminRepository>,
    pub availability: AvailabilityChecker,
    pub writer: ReservationWriter,
    pub manager: ReservationManager,
    pub guard: DeletionGuard,
    pub catalog: RoomCatalog,
    pub stats: StatsService,
    pub auth: AuthConfig,
    pub paging: PagingConfig,
}

impl AppState {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        reservations: Arc<dyn ReservationRepository>,
        admins: Arc<dyn AdminRepository>,
        auth: AuthConfig,
        paging: PagingConfig,
    ) -> Self {
        let repos = Repositories::new(rooms, reservations);
        Self {
            availability: AvailabilityChecker::new(repos.clone()),
            writer: ReservationWriter::new(repos.clone()),
            manager: ReservationManager::new(repos.clone()),
            guard: DeletionGuard::new(repos.clone()),
            catalog: RoomCatalog::new(repos.clone()),
            stats: StatsService::new(repos.clone()),
            repos,
            admins,
            auth,
            paging,
        }
    }

    pub fn page_request(&self, page: Option<u32>, per_page: Option<u32>) -> PageRequest {
        PageRequest::from_query(page, per_page, self.paging.default_per_page, self.paging.max_per_page)
    }
}
