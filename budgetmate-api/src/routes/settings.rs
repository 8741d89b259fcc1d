/// Account settings
///
/// - `POST /app/settings/profile` - change name and email
/// - `POST /app/settings/password` - change password; every other session of
///   the user is logged out

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidForm,
    middleware::session::SessionToken,
};
use axum::{extract::State, Extension, Json};
use budgetmate_shared::{
    auth::password::{hash_password, validate_password, verify_password},
    models::{session::SessionUser, user::User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(min = 2, max = 100, message = "Name must be 2 to 100 characters"))]
    pub name: String,

    #[validate(
        contains(pattern = "@", message = "Invalid email address"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordForm {
    #[validate(custom(function = "crate::extract::required"))]
    pub current_password: String,

    pub new_password: String,

    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct PasswordChanged {
    pub message: &'static str,
    pub sessions_revoked: u64,
}

impl ProfileForm {
    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

/// # Errors
///
/// - `422`: name shorter than two characters or email without `@`
/// - `409`: the email belongs to another user
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<ProfileForm>,
) -> ApiResult<Json<User>> {
    // Length rules apply to the trimmed values
    let form = form.trimmed();
    form.validate()?;

    if User::email_taken_by_other(&state.db, &form.email, user.user_id).await? {
        return Err(ApiError::Conflict("Email is already in use".to_string()));
    }

    let updated = User::update_profile(&state.db, user.user_id, &form.name, &form.email).await?;
    let dropped = state.sessions.invalidate_user(user.user_id);

    tracing::info!(user_id = user.user_id, dropped, "Profile updated");
    Ok(Json(updated))
}

/// # Errors
///
/// - `422`: confirmation mismatch or a new password outside the length rules
/// - `401`: the current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Extension(SessionToken(token)): Extension<SessionToken>,
    ValidForm(form): ValidForm<PasswordForm>,
) -> ApiResult<Json<PasswordChanged>> {
    if form.new_password != form.confirm_password {
        return Err(ApiError::invalid("confirm_password", "New passwords do not match"));
    }
    validate_password(&form.new_password).map_err(|e| ApiError::invalid("new_password", e))?;

    let account = User::find_by_id(&state.db, user.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !verify_password(&form.current_password, &account.password_hash)? {
        return Err(ApiError::Unauthorized("Current password is incorrect".to_string()));
    }

    let password_hash = hash_password(&form.new_password)?;
    User::update_password(&state.db, user.user_id, &password_hash).await?;
    let sessions_revoked = state.sessions.revoke_others(user.user_id, &token).await?;

    Ok(Json(PasswordChanged {
        message: "Password updated! Other sessions have been logged out.",
        sessions_revoked,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_rules() {
        let ok = ProfileForm {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
        };
        assert!(ok.validate().is_ok());

        let short = ProfileForm {
            name: " A ".to_string(),
            email: "asha@example.com".to_string(),
        }
        .trimmed();
        assert!(short.validate().is_err());

        let no_at = ProfileForm {
            name: "Asha".to_string(),
            email: "asha.example.com".to_string(),
        };
        assert!(no_at.validate().unwrap_err().field_errors().contains_key("email"));
    }
}
