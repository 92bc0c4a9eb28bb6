use async_trait::async_trait;
use hotel_core::filter::RoomFilter;
use hotel_core::models::{ReservationStatus, Room};
use hotel_core::repository::RoomRepository;
use hotel_core::{StoreError, StoreResult};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::sql::{map_db_error, push_room_filter, RoomRow, ROOM_COLUMNS, ROOM_ORDER};

pub struct StoreRoomRepository {
    pool: PgPool,
}

impl StoreRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for StoreRoomRepository {
    async fn create_room(&self, room: &Room) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rooms (id, room_number, room_type, capacity, price_cents, description, amenities, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(room.id)
        .bind(&room.room_number)
        .bind(room.room_type.as_str())
        .bind(room.capacity)
        .bind(room.price_cents)
        .bind(&room.description)
        .bind(&room.amenities)
        .bind(room.status.as_str())
        .bind(room.created_at)
        .bind(room.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        info!("Room created: {} ({})", room.room_number, room.id);
        Ok(())
    }

    async fn get_room(&self, id: Uuid) -> StoreResult<Option<Room>> {
        let row = sqlx::query_as::<_, RoomRow>(&format!("SELECT {} FROM rooms WHERE id = $1", ROOM_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.map(Room::try_from).transpose().map_err(StoreError::from)
    }

    async fn list_rooms(&self, filter: &RoomFilter) -> StoreResult<Vec<Room>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM rooms WHERE TRUE", ROOM_COLUMNS));
        push_room_filter(&mut qb, filter);
        qb.push(ROOM_ORDER);

        let rows = qb
            .build_query_as::<RoomRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error)?;

        rows.into_iter()
            .map(|row| Room::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn update_room(&self, room: &Room) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE rooms
            SET room_number = $1, room_type = $2, capacity = $3, price_cents = $4,
                description = $5, amenities = $6, status = $7, updated_at = NOW()
            WHERE id = $8
            "#,
        )
        .bind(&room.room_number)
        .bind(room.room_type.as_str())
        .bind(room.capacity)
        .bind(room.price_cents)
        .bind(&room.description)
        .bind(&room.amenities)
        .bind(room.status.as_str())
        .bind(room.id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("room {}", room.id)));
        }
        Ok(())
    }

    async fn delete_room(&self, id: Uuid) -> StoreResult<Option<usize>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // 1. Same row lock reservation writers take, so no stay lands meanwhile
        let room_number = sqlx::query_scalar::<_, String>("SELECT room_number FROM rooms WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;
        let Some(room_number) = room_number else {
            return Ok(None);
        };

        // 2. Count linked stays under the lock
        let active_statuses: Vec<&str> = ReservationStatus::ACTIVE.iter().map(|s| s.as_str()).collect();
        let (active, historical): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FILTER (WHERE status = ANY($2)),
                   COUNT(*) FILTER (WHERE status = $3)
            FROM reservations
            WHERE room_id = $1
            "#,
        )
        .bind(id)
        .bind(active_statuses)
        .bind(ReservationStatus::CheckedOut.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        if active > 0 {
            return Err(StoreError::Refused(format!(
                "Room {} has {} active reservation(s) and cannot be deleted",
                room_number, active
            )));
        }

        // 3. Delete; reservations.room_id is ON DELETE SET NULL
        sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;
        info!("Room {} deleted ({} historical reservations detached)", room_number, historical);
        Ok(Some(historical.max(0) as usize))
    }
}
