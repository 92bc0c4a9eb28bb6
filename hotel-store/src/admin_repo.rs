use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hotel_core::models::AdminUser;
use hotel_core::repository::AdminRepository;
use hotel_core::StoreResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::sql::map_db_error;

pub struct StoreAdminRepository {
    pool: PgPool,
}

impl StoreAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AdminRow {
    id: Uuid,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<AdminRow> for AdminUser {
    fn from(row: AdminRow) -> Self {
        AdminUser {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl AdminRepository for StoreAdminRepository {
    async fn find_admin_by_email(&self, email: &str) -> StoreResult<Option<AdminUser>> {
        let row = sqlx::query_as::<_, AdminRow>(
            "SELECT id, email, password_hash, created_at FROM admin_users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(AdminUser::from))
    }

    async fn create_admin(&self, admin: &AdminUser) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO admin_users (id, email, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(admin.id)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    async fn count_admins(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(count.max(0) as u64)
    }
}
