/// Savings goal endpoints
///
/// - `GET /app/goals` - goals with progress and family totals
/// - `POST /app/goals` - create a goal
/// - `POST /app/goals/contribute` - add money to a goal, never past its target
/// - `DELETE /app/goals/:id`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{non_blank, parse_optional_date, parse_positive_amount, ValidForm},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use budgetmate_shared::models::{
    goal::{CreateGoal, Goal},
    owned_by,
    session::SessionUser,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGoalForm {
    #[validate(
        custom(function = "crate::extract::required"),
        length(max = 100, message = "Name must be at most 100 characters")
    )]
    pub name: String,

    pub target_amount: String,

    /// `YYYY-MM-DD`, optional
    #[serde(default)]
    pub deadline: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50, message = "Icon must be at most 50 characters"))]
    pub icon: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20, message = "Color must be at most 20 characters"))]
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContributeForm {
    pub goal_id: i64,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct GoalProgress {
    #[serde(flatten)]
    pub goal: Goal,
    pub percentage: f64,
    pub is_complete: bool,
}

impl From<Goal> for GoalProgress {
    fn from(goal: Goal) -> Self {
        Self {
            percentage: goal.percentage(),
            is_complete: goal.is_complete(),
            goal,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GoalList {
    pub goals: Vec<GoalProgress>,
    pub total_saved: f64,
    pub total_target: f64,
}

pub async fn list_goals(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<GoalList>> {
    let goals = Goal::list_for_family(&state.db, user.family_id).await?;
    let total_saved = goals.iter().map(|g| g.current_amount).sum();
    let total_target = goals.iter().map(|g| g.target_amount).sum();

    Ok(Json(GoalList {
        goals: goals.into_iter().map(GoalProgress::from).collect(),
        total_saved,
        total_target,
    }))
}

pub async fn create_goal(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<CreateGoalForm>,
) -> ApiResult<(StatusCode, Json<GoalProgress>)> {
    let target_amount = parse_positive_amount("target_amount", &form.target_amount)?;
    let deadline = parse_optional_date("deadline", form.deadline)?;

    let goal = Goal::create(
        &state.db,
        CreateGoal {
            family_id: user.family_id,
            name: form.name.trim().to_string(),
            target_amount,
            deadline,
            icon: non_blank(form.icon),
            color: non_blank(form.color),
        },
    )
    .await?;

    tracing::info!(goal_id = goal.id, family_id = user.family_id, "Goal created");
    Ok((StatusCode::CREATED, Json(goal.into())))
}

pub async fn contribute(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<ContributeForm>,
) -> ApiResult<Json<GoalProgress>> {
    let amount = parse_positive_amount("amount", &form.amount)?;

    let not_found = || ApiError::NotFound("Goal not found".to_string());
    owned_by(Goal::find_by_id(&state.db, form.goal_id).await?, user.family_id)
        .ok_or_else(not_found)?;

    let goal = Goal::contribute(&state.db, form.goal_id, user.family_id, amount)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(
        goal_id = goal.id,
        amount,
        saved = goal.current_amount,
        "Contribution added"
    );
    Ok(Json(goal.into()))
}

pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Goal::delete(&state.db, id, user.family_id).await? {
        return Err(ApiError::NotFound("Goal not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
