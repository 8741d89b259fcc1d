/// Category suggestion
///
/// ```text
/// POST /app/categorize
/// Content-Type: application/json
///
/// { "description": "Swiggy dinner" }
/// ```
///
/// ```json
/// { "category": "Food & Dining", "model": "Hybrid (Groq/Rules)" }
/// ```
///
/// Never fails because of the model: any model error falls back to the
/// keyword rules.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::State, Json};
use budgetmate_shared::categorize::Categorization;
use serde::Deserialize;

/// Longest description sent to the model
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CategorizeRequest {
    pub description: String,
}

pub async fn categorize(
    State(state): State<AppState>,
    Json(req): Json<CategorizeRequest>,
) -> ApiResult<Json<Categorization>> {
    let description = req.description.trim();
    if description.is_empty() {
        return Err(ApiError::invalid("description", "Description is required"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ApiError::invalid(
            "description",
            format!("Description must be at most {} characters", MAX_DESCRIPTION_LENGTH),
        ));
    }

    Ok(Json(state.categorizer.categorize(description).await))
}
