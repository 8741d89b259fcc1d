/// Family and invite endpoints
///
/// - `GET /app/family` - the family and its members
/// - `POST /app/family/invite` - a fresh invite link, valid for seven days
/// - `GET /join/:code` - invite preview; works logged out
/// - `POST /join/:code` - move the logged-in caller into the invite's family
/// - `POST /app/settings/invite` - invite an existing user by email; they get
///   an `invite` notification carrying this family's id
/// - `POST /app/settings/invite/:id/accept` - join the family named by one of
///   your invite notifications
/// - `POST /app/settings/invite/:id/decline` - dismiss it
///
/// Joining changes the caller's family, so their cached sessions are
/// dropped and the next request reloads them.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidForm,
    middleware::session::current_user,
};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    Extension, Json,
};
use budgetmate_shared::{
    auth::token::generate_invite_code,
    models::{
        family::Family,
        invite::{Invite, InvitePreview},
        notification::{kind, Notification},
        session::SessionUser,
        user::User,
    },
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

const HX_REDIRECT: HeaderName = HeaderName::from_static("hx-redirect");

#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberForm {
    #[validate(
        contains(pattern = "@", message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct InviteSent {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FamilyOverview {
    pub family: Family,
    pub members: Vec<User>,
    pub member_count: usize,
}

#[derive(Debug, Serialize)]
pub struct InviteLink {
    pub code: String,
    pub link: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct JoinPreview {
    pub code: String,
    pub family_name: String,
    pub expires_at: DateTime<Utc>,
    pub logged_in: bool,
    pub already_member: bool,
}

#[derive(Debug, Serialize)]
pub struct Joined {
    pub family_id: i64,
    pub family_name: String,
    pub redirect: &'static str,
}

/// Absolute link when the request names its host, path-only otherwise.
fn invite_link(headers: &HeaderMap, code: &str, https: bool) -> String {
    let path = format!("/join/{}", code);
    match headers.get(header::HOST).and_then(|h| h.to_str().ok()) {
        Some(host) => format!("{}://{}{}", if https { "https" } else { "http" }, host, path),
        None => path,
    }
}

async fn find_invite(state: &AppState, code: &str) -> ApiResult<InvitePreview> {
    Invite::find_valid(&state.db, code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid or expired invite link".to_string()))
}

pub async fn overview(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<FamilyOverview>> {
    let family = Family::find_by_id(&state.db, user.family_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Family not found".to_string()))?;
    let members = User::list_by_family(&state.db, user.family_id).await?;

    Ok(Json(FamilyOverview {
        family,
        member_count: members.len(),
        members,
    }))
}

pub async fn create_invite(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    headers: HeaderMap,
) -> ApiResult<(StatusCode, Json<InviteLink>)> {
    let code = generate_invite_code();
    let invite = Invite::create(&state.db, &code, user.family_id, user.user_id).await?;

    tracing::info!(family_id = user.family_id, created_by = user.user_id, "Invite created");

    Ok((
        StatusCode::CREATED,
        Json(InviteLink {
            link: invite_link(&headers, &invite.code, state.config.session.secure_cookies),
            code: invite.code,
            expires_at: invite.expires_at,
        }),
    ))
}

pub async fn join_preview(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<JoinPreview>> {
    let invite = find_invite(&state, &code).await?;
    let user = current_user(&state, &headers).await?;

    Ok(Json(JoinPreview {
        already_member: user.as_ref().is_some_and(|u| u.family_id == invite.family_id),
        logged_in: user.is_some(),
        code: invite.code,
        family_name: invite.family_name,
        expires_at: invite.expires_at,
    }))
}

/// # Errors
///
/// - `401`: not logged in
/// - `404`: unknown or expired code
/// - `409`: the caller already belongs to this family
pub async fn join(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Joined>> {
    let user = current_user(&state, &headers)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Log in to accept this invite".to_string()))?;
    let invite = find_invite(&state, &code).await?;

    if user.family_id == invite.family_id {
        return Err(ApiError::Conflict("Already a member of this family".to_string()));
    }

    move_to_family(&state, &user, invite.family_id).await?;

    Ok(Json(Joined {
        family_id: invite.family_id,
        family_name: invite.family_name,
        redirect: "/app",
    }))
}

/// Moves `user` into `family_id` and tells the family. The notification is
/// best-effort.
async fn move_to_family(state: &AppState, user: &SessionUser, family_id: i64) -> ApiResult<()> {
    User::join_family(&state.db, user.user_id, family_id).await?;
    state.sessions.invalidate_user(user.user_id);

    tracing::info!(
        user_id = user.user_id,
        from_family = user.family_id,
        to_family = family_id,
        "User joined family"
    );

    let message = format!("{} joined the family", user.name);
    if let Err(e) = Notification::notify_family(
        &state.db,
        family_id,
        Some(user.user_id),
        kind::MEMBER_JOINED,
        &message,
        &user.user_id.to_string(),
    )
    .await
    {
        tracing::warn!(error = %e, "Failed to notify family of new member");
    }

    Ok(())
}

/// Always answers the same way for unknown addresses, so the endpoint does
/// not reveal who has an account.
///
/// # Errors
///
/// - `422`: email without `@`
/// - `409`: the address belongs to a member of this family
pub async fn invite_member(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<InviteMemberForm>,
) -> ApiResult<Json<InviteSent>> {
    let sent = InviteSent {
        message: "Invitation sent",
    };

    let Some(target) = User::find_by_email(&state.db, form.email.trim()).await? else {
        tracing::debug!(family_id = user.family_id, "Invite addressed to unknown email");
        return Ok(Json(sent));
    };

    if target.family_id == user.family_id {
        return Err(ApiError::Conflict("Already a member of this family".to_string()));
    }

    let family = Family::find_by_id(&state.db, user.family_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Family not found".to_string()))?;

    let message = format!("{} invited you to join their family '{}'", user.name, family.name);
    Notification::create(
        &state.db,
        target.id,
        kind::INVITE,
        &message,
        &family.id.to_string(),
    )
    .await?;

    tracing::info!(
        family_id = family.id,
        invited_by = user.user_id,
        invitee = target.id,
        "Member invited"
    );
    Ok(Json(sent))
}

/// One of the caller's invite notifications; anything else is not found.
async fn find_invite_notification(state: &AppState, id: i64, user_id: i64) -> ApiResult<Notification> {
    Notification::find_for_user(&state.db, id, user_id)
        .await?
        .filter(|n| n.kind == kind::INVITE)
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))
}

/// The family an invite notification points at.
async fn invited_family(state: &AppState, notification: &Notification) -> ApiResult<Family> {
    let family_id: i64 = notification
        .data
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid invite data".to_string()))?;

    Family::find_by_id(&state.db, family_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Family not found".to_string()))
}

/// # Errors
///
/// - `404`: no such invite addressed to the caller, or the family is gone
/// - `409`: the caller already belongs to that family
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<([(HeaderName, HeaderValue); 1], Json<Joined>)> {
    let notification = find_invite_notification(&state, id, user.user_id).await?;
    let family = invited_family(&state, &notification).await?;

    if family.id == user.family_id {
        Notification::mark_read(&state.db, notification.id, user.user_id).await?;
        return Err(ApiError::Conflict("Already a member of this family".to_string()));
    }

    move_to_family(&state, &user, family.id).await?;
    Notification::mark_read(&state.db, notification.id, user.user_id).await?;

    Ok((
        [(HX_REDIRECT, HeaderValue::from_static("/app/settings"))],
        Json(Joined {
            family_id: family.id,
            family_name: family.name,
            redirect: "/app/settings",
        }),
    ))
}

/// Marks the invite read without joining.
pub async fn decline_invite(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let notification = find_invite_notification(&state, id, user.user_id).await?;
    Notification::mark_read(&state.db, notification.id, user.user_id).await?;

    tracing::info!(user_id = user.user_id, notification_id = notification.id, "Invite declined");
    Ok(StatusCode::NO_CONTENT)
}
