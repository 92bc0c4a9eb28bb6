use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use hotel_booking::DashboardStats;
use hotel_core::dates::parse_date;
use serde::Deserialize;

use crate::middleware::AdminClaims;
use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    /// Day the figures are computed for; today (UTC) when absent.
    pub date: Option<String>,
}

/// GET /admin/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardStats>, AppError> {
    let today = match params.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(day) => parse_date("date", day).map_err(|e| AppError::invalid("date", e.to_string()))?,
        None => Utc::now().date_naive(),
    };
    tracing::debug!("Dashboard for {} requested by {}", today, claims.sub);
    Ok(Json(state.stats.dashboard(today).await?))
}
