/// Dashboard
///
/// ```text
/// GET /app
/// ```
///
/// Balance, totals, the five latest transactions, the all-time expense
/// breakdown and an insight over the last 30 days. The reads run in
/// parallel; see [`budgetmate_shared::dashboard`].

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use budgetmate_shared::dashboard::{load as load_dashboard, Dashboard};
use budgetmate_shared::models::session::SessionUser;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: SessionUser,
    #[serde(flatten)]
    pub dashboard: Dashboard,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<DashboardResponse>> {
    let today = Utc::now().date_naive();
    let dashboard = load_dashboard(&state.db, user.family_id, today).await?;

    Ok(Json(DashboardResponse { user, dashboard }))
}
