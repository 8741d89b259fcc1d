/// Authentication endpoints
///
/// - `POST /signup` - create a family and its admin, then log in
/// - `POST /login` - log in with email and password
/// - `POST /demo-login` - log into the shared demo family, creating it once
/// - `POST /logout` - end the current session
///
/// A successful login sets the `session_token` cookie (HttpOnly, seven days
/// by default) and answers with the logged-in user:
///
/// ```json
/// {
///   "user": { "user_id": 1, "email": "asha@example.com", "name": "Asha", ... },
///   "expires_at": "2025-06-08T10:00:00Z",
///   "redirect": "/app"
/// }
/// ```

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidForm,
    middleware::session::{clear_session_cookie, read_session_token, session_cookie},
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use budgetmate_shared::{
    auth::password::{hash_password, validate_password, verify_password},
    models::{
        family::Family,
        session::SessionUser,
        transaction::{CreateTransaction, Transaction, TransactionType},
        user::{CreateUser, User, UserRole},
    },
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEMO_EMAIL: &str = "demo@budgetmate.app";
const DEMO_PASSWORD: &str = "demo123";
const DEMO_FAMILY: &str = "Demo Family";
const DEMO_USER: &str = "Demo User";

#[derive(Debug, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(alias = "familyName")]
    #[validate(
        custom(function = "crate::extract::required"),
        length(max = 100, message = "Family name must be at most 100 characters")
    )]
    pub family_name: String,

    #[validate(
        custom(function = "crate::extract::required"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(custom(function = "crate::extract::required"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: SessionUser,
    pub expires_at: DateTime<Utc>,
    pub redirect: &'static str,
}

/// Issues a session for `user` and builds the cookie-carrying response.
async fn start_session(state: &AppState, user: &User, status: StatusCode) -> ApiResult<Response> {
    let issued = state.sessions.create(user).await?;
    let cookie = session_cookie(
        &issued.token,
        state.sessions.session_ttl().num_seconds(),
        state.config.session.secure_cookies,
    )?;

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user: SessionUser::from(user),
            expires_at: issued.expires_at,
            redirect: "/app",
        }),
    )
        .into_response())
}

/// # Errors
///
/// - `422`: a field is blank, the email is malformed or the password is too
///   short
/// - `409`: the email is already registered
pub async fn signup(
    State(state): State<AppState>,
    ValidForm(form): ValidForm<SignupForm>,
) -> ApiResult<Response> {
    validate_password(&form.password).map_err(|e| ApiError::invalid("password", e))?;

    let email = form.email.trim().to_lowercase();
    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_password(&form.password)?;

    let mut tx = state.db.begin().await?;
    let family = Family::create(&mut *tx, form.family_name.trim()).await?;
    let user = User::create(
        &mut *tx,
        CreateUser {
            email,
            password_hash,
            name: form.name.trim().to_string(),
            family_id: family.id,
            role: UserRole::Admin,
        },
    )
    .await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, family_id = family.id, "Family registered");

    start_session(&state, &user, StatusCode::CREATED).await
}

/// # Errors
///
/// - `401`: unknown email or wrong password (indistinguishable)
pub async fn login(
    State(state): State<AppState>,
    ValidForm(form): ValidForm<LoginForm>,
) -> ApiResult<Response> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, form.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&form.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    start_session(&state, &user, StatusCode::OK).await
}

/// Creates the demo family, its user and a few sample transactions.
async fn seed_demo(state: &AppState) -> ApiResult<User> {
    let password_hash = hash_password(DEMO_PASSWORD)?;
    let today = Utc::now().date_naive();

    let mut tx = state.db.begin().await?;
    let family = Family::create(&mut *tx, DEMO_FAMILY).await?;
    let user = User::create(
        &mut *tx,
        CreateUser {
            email: DEMO_EMAIL.to_string(),
            password_hash,
            name: DEMO_USER.to_string(),
            family_id: family.id,
            role: UserRole::Admin,
        },
    )
    .await?;

    let samples = [
        (249.0, "Food & Dining", 1, "Swiggy - Biryani Order", TransactionType::Expense),
        (187.0, "Groceries", 2, "Blinkit - Fruits & Veggies", TransactionType::Expense),
        (50000.0, "Salary", 5, "Monthly Salary - UPI Credit", TransactionType::Income),
    ];
    for (amount, category, days_ago, description, kind) in samples {
        Transaction::create(
            &mut *tx,
            CreateTransaction {
                amount,
                category: category.to_string(),
                date: today - Duration::days(days_ago),
                description: description.to_string(),
                kind,
                user_id: Some(user.id),
                family_id: family.id,
            },
        )
        .await?;
    }
    tx.commit().await?;

    tracing::info!(family_id = family.id, "Demo family seeded");
    Ok(user)
}

pub async fn demo_login(State(state): State<AppState>) -> ApiResult<Response> {
    let user = match User::find_by_email(&state.db, DEMO_EMAIL).await? {
        Some(user) => user,
        None => match seed_demo(&state).await {
            Ok(user) => user,
            // Lost a race with a concurrent demo login
            Err(ApiError::Conflict(_)) => User::find_by_email(&state.db, DEMO_EMAIL)
                .await?
                .ok_or_else(|| ApiError::InternalError("Demo user vanished".to_string()))?,
            Err(e) => return Err(e),
        },
    };

    start_session(&state, &user, StatusCode::OK).await
}

/// Clears the cookie even when there is no live session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = read_session_token(&headers) {
        state.sessions.destroy(&token).await?;
    }

    Ok((
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.session.secure_cookies),
        )],
        Json(serde_json::json!({ "redirect": "/" })),
    )
        .into_response())
}
