/// Notification endpoints
///
/// - `GET /app/notifications` - unread notifications, newest first;
///   `?all=true` includes read ones
/// - `GET /app/notifications/count` - unread count, for the bell badge
/// - `POST /app/notifications/read/:id`
/// - `POST /app/notifications/read-all`
///
/// Notifications belong to a user, not a family: another member's ids
/// answer `404`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use budgetmate_shared::models::{notification::Notification, session::SessionUser};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<NotificationList>> {
    let notifications = if query.all {
        Notification::all_for_user(&state.db, user.user_id).await?
    } else {
        Notification::unread_for_user(&state.db, user.user_id).await?
    };
    let unread = Notification::unread_count(&state.db, user.user_id).await?;

    Ok(Json(NotificationList {
        notifications,
        unread,
    }))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<UnreadCount>> {
    let count = Notification::unread_count(&state.db, user.user_id).await?;
    Ok(Json(UnreadCount { count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Notification::mark_read(&state.db, id, user.user_id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<MarkedRead>> {
    let updated = Notification::mark_all_read(&state.db, user.user_id).await?;
    Ok(Json(MarkedRead { updated }))
}
