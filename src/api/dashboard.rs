use axum::Json;

use crate::analysis::DashboardStats;

/// Headline numbers for the dashboard. All zero until uploads are stored.
pub(super) async fn get_stats() -> Json<DashboardStats> {
    Json(DashboardStats::default())
}
