/// Budget endpoints
///
/// - `GET /app/budgets?month=YYYY-MM` - the budget grid, current month by
///   default
/// - `POST /app/budgets` - set one category's limit
/// - `POST /app/budgets/category` - add a category with a limit
/// - `POST /app/budgets/requests` - open a purchase request
/// - `POST /app/budgets/vote` - vote on a purchase request
///
/// Saving a limit answers with the refreshed row. A category that was not in
/// the grid before the save gets `HX-Refresh: true` instead, asking the page
/// to reload the whole grid.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{non_blank, parse_amount, ValidForm},
};
use axum::{
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use budgetmate_shared::{
    budget_view::{self, BudgetView},
    models::{
        budget::Budget,
        purchase_request::{PurchaseRequest, RequestCard, VoteChoice},
        session::SessionUser,
    },
    voting,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Limit given to a new category when the form leaves it out
pub const DEFAULT_CATEGORY_LIMIT: f64 = 5000.0;

const HX_REFRESH: HeaderName = HeaderName::from_static("hx-refresh");

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BudgetForm {
    #[validate(
        custom(function = "crate::extract::required"),
        length(max = 100, message = "Category must be at most 100 characters")
    )]
    pub category: String,

    #[serde(default)]
    pub amount: Option<String>,

    pub month: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseRequestForm {
    pub item_name: String,
    pub amount: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VoteForm {
    pub request_id: i64,
    pub vote: String,
}

#[derive(Debug, Serialize)]
pub struct RequestList {
    pub requests: Vec<RequestCard>,
}

fn require_month(month: &str) -> ApiResult<String> {
    let month = month.trim();
    budget_view::parse_month(month)
        .map(|_| month.to_string())
        .ok_or_else(|| ApiError::invalid("month", "Month must be YYYY-MM"))
}

fn refresh_response() -> Response {
    (
        StatusCode::OK,
        [(HX_REFRESH, HeaderValue::from_static("true"))],
        Json(serde_json::json!({ "refresh": true })),
    )
        .into_response()
}

pub async fn budget_grid(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<MonthQuery>,
) -> ApiResult<Json<BudgetView>> {
    let today = Utc::now().date_naive();
    let month = budget_view::month_or_current(query.month.as_deref(), today);
    let view = budget_view::load(&state.db, user.family_id, user.user_id, &month).await?;

    Ok(Json(view))
}

/// # Errors
///
/// - `422`: blank category, malformed month, or a negative or non-numeric
///   amount
pub async fn save_budget(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<BudgetForm>,
) -> ApiResult<Response> {
    let month = require_month(&form.month)?;
    let category = form.category.trim();
    let amount = parse_amount("amount", form.amount.as_deref().unwrap_or_default())?;
    if amount < 0.0 {
        return Err(ApiError::invalid("amount", "amount must not be negative"));
    }

    let known = Budget::in_grid(&state.db, user.family_id, category).await?;
    Budget::upsert(&state.db, user.family_id, category, &month, amount).await?;
    tracing::debug!(family_id = user.family_id, category, month = %month, amount, known, "Budget saved");

    if !known {
        return Ok(refresh_response());
    }

    let view = budget_view::load(&state.db, user.family_id, user.user_id, &month).await?;
    match view.row(category) {
        Some(row) => Ok(Json(row.clone()).into_response()),
        None => Ok(refresh_response()),
    }
}

/// Missing, unparsable and non-positive amounts all fall back to
/// [`DEFAULT_CATEGORY_LIMIT`].
pub async fn add_category(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<BudgetForm>,
) -> ApiResult<Response> {
    let month = require_month(&form.month)?;
    let amount = non_blank(form.amount)
        .and_then(|raw| parse_amount("amount", &raw).ok())
        .filter(|amount| *amount > 0.0)
        .unwrap_or(DEFAULT_CATEGORY_LIMIT);

    Budget::upsert(&state.db, user.family_id, form.category.trim(), &month, amount).await?;
    tracing::info!(family_id = user.family_id, category = form.category.trim(), "Budget category added");

    Ok(refresh_response())
}

/// Answers with the family's pending requests, the new one included.
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<PurchaseRequestForm>,
) -> ApiResult<(StatusCode, Json<RequestList>)> {
    let amount = parse_amount("amount", &form.amount)?;

    voting::create_request(
        &state.db,
        user.family_id,
        user.user_id,
        &user.name,
        &form.item_name,
        amount,
    )
    .await?;

    let requests = PurchaseRequest::pending_cards(&state.db, user.family_id, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(RequestList { requests })))
}

/// # Errors
///
/// - `422`: vote is neither `approve` nor `reject`
/// - `404`: unknown request or another family's
/// - `409`: the request was already decided
pub async fn vote(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<VoteForm>,
) -> ApiResult<Json<RequestCard>> {
    let choice = VoteChoice::parse(&form.vote)
        .ok_or_else(|| ApiError::invalid("vote", "Vote must be approve or reject"))?;

    let card = voting::cast_vote(
        &state.db,
        user.family_id,
        form.request_id,
        user.user_id,
        &user.name,
        choice,
    )
    .await?;

    Ok(Json(card))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_month() {
        assert_eq!(require_month(" 2025-06 ").unwrap(), "2025-06");
        assert!(require_month("2025-13").is_err());
        assert!(require_month("June").is_err());
    }

    #[test]
    fn test_refresh_response() {
        let response = refresh_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("HX-Refresh").unwrap(), "true");
    }
}
