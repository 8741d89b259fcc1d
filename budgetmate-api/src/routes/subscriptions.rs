/// Subscription endpoints
///
/// - `GET /app/subscriptions` - upcoming charges, soonest first, and the
///   monthly burn
/// - `POST /app/subscriptions` - add a subscription; names are unique per
///   family, case-insensitively
/// - `DELETE /app/subscriptions/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{non_blank, parse_positive_amount, ValidForm},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use budgetmate_shared::{
    models::{
        session::SessionUser,
        subscription::{CreateSubscription, Subscription},
    },
    schedule::{self, UpcomingCharge},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubscriptionForm {
    #[validate(
        custom(function = "crate::extract::required"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    pub name: String,

    pub amount: String,

    #[validate(range(min = 1, max = 31, message = "Billing day must be between 1 and 31"))]
    pub billing_day: i32,

    #[serde(default)]
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionList {
    pub subscriptions: Vec<UpcomingCharge>,
    pub monthly_burn: f64,
}

pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<SubscriptionList>> {
    let subscriptions = Subscription::list_for_family(&state.db, user.family_id).await?;
    let monthly_burn = schedule::monthly_burn(&subscriptions);
    let today = Utc::now().date_naive();

    Ok(Json(SubscriptionList {
        subscriptions: schedule::upcoming(subscriptions, today),
        monthly_burn,
    }))
}

/// # Errors
///
/// - `409`: the family already has a subscription with this name
/// - `422`: blank name, billing day outside 1-31, non-positive amount
pub async fn create_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<CreateSubscriptionForm>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    let amount = parse_positive_amount("amount", &form.amount)?;
    let name = form.name.trim().to_string();

    if Subscription::find_by_name(&state.db, user.family_id, &name)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Subscription already exists".to_string()));
    }

    let subscription = Subscription::create(
        &state.db,
        CreateSubscription {
            family_id: user.family_id,
            name,
            amount,
            billing_day: form.billing_day,
            category: non_blank(form.category),
        },
    )
    .await?;

    tracing::info!(
        subscription_id = subscription.id,
        family_id = user.family_id,
        "Subscription added"
    );
    Ok((StatusCode::CREATED, Json(subscription)))
}

pub async fn delete_subscription(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Subscription::delete(&state.db, id, user.family_id).await? {
        return Err(ApiError::NotFound("Subscription not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
