pub mod admin_repo;
pub mod app_config;
pub mod database;
pub mod memory_repo;
pub mod reservation_repo;
pub mod room_repo;

mod sql;

pub use admin_repo::StoreAdminRepository;
pub use database::DbClient;
pub use memory_repo::MemoryStore;
pub use reservation_repo::StoreReservationRepository;
pub use room_repo::StoreRoomRepository;
