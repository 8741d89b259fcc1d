/// Transaction endpoints
///
/// - `GET /app/transactions` - every transaction of the family, newest first
/// - `POST /app/transactions` - record one
/// - `GET /app/transactions/:id`
/// - `POST /app/transactions/:id` - partial update; blank fields are kept
/// - `DELETE /app/transactions/:id`
///
/// Ids belonging to another family answer `404`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{non_blank, parse_optional_amount, parse_optional_date, parse_positive_amount, ValidForm},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use budgetmate_shared::models::{
    owned_by,
    session::SessionUser,
    transaction::{CreateTransaction, Transaction, TransactionType, UpdateTransaction},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionForm {
    pub amount: String,

    #[validate(
        custom(function = "crate::extract::required"),
        length(max = 100, message = "Category must be at most 100 characters")
    )]
    pub category: String,

    #[validate(
        custom(function = "crate::extract::required"),
        length(max = 500, message = "Description must be at most 500 characters")
    )]
    pub description: String,

    #[serde(rename = "type")]
    pub kind: String,

    /// `YYYY-MM-DD`; today when blank
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTransactionForm {
    #[serde(default)]
    pub amount: Option<String>,

    #[serde(default)]
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,

    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransactionList {
    pub transactions: Vec<Transaction>,
    pub count: usize,
}

fn parse_kind(raw: &str) -> ApiResult<TransactionType> {
    TransactionType::parse(raw)
        .ok_or_else(|| ApiError::invalid("type", "Type must be income or expense"))
}

impl UpdateTransactionForm {
    fn into_changes(self) -> ApiResult<UpdateTransaction> {
        let amount = parse_optional_amount("amount", self.amount)?;
        if matches!(amount, Some(a) if a <= 0.0) {
            return Err(ApiError::invalid("amount", "amount must be positive"));
        }

        Ok(UpdateTransaction {
            amount,
            category: non_blank(self.category),
            date: parse_optional_date("date", self.date)?,
            description: non_blank(self.description),
            kind: non_blank(self.kind).map(|k| parse_kind(&k)).transpose()?,
        })
    }
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<TransactionList>> {
    let transactions = Transaction::list_for_family(&state.db, user.family_id).await?;

    Ok(Json(TransactionList {
        count: transactions.len(),
        transactions,
    }))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidForm(form): ValidForm<CreateTransactionForm>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let amount = parse_positive_amount("amount", &form.amount)?;
    let kind = parse_kind(&form.kind)?;
    let date = parse_optional_date("date", form.date)?.unwrap_or_else(|| Utc::now().date_naive());

    let transaction = Transaction::create(
        &state.db,
        CreateTransaction {
            amount,
            category: form.category.trim().to_string(),
            date,
            description: form.description.trim().to_string(),
            kind,
            user_id: Some(user.user_id),
            family_id: user.family_id,
        },
    )
    .await?;

    tracing::info!(
        transaction_id = transaction.id,
        family_id = user.family_id,
        kind = kind.as_str(),
        "Transaction recorded"
    );

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Transaction>> {
    owned_by(Transaction::find_by_id(&state.db, id).await?, user.family_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Transaction not found".to_string()))
}

/// # Errors
///
/// - `400`: no field was given
/// - `404`: unknown id or another family's transaction
/// - `422`: a given field is invalid
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
    ValidForm(form): ValidForm<UpdateTransactionForm>,
) -> ApiResult<Json<Transaction>> {
    let changes = form.into_changes()?;
    if changes.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }

    Transaction::update(&state.db, id, user.family_id, changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Transaction not found".to_string()))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !Transaction::delete(&state.db, id, user.family_id).await? {
        return Err(ApiError::NotFound("Transaction not found".to_string()));
    }

    tracing::info!(transaction_id = id, family_id = user.family_id, "Transaction deleted");
    Ok(StatusCode::NO_CONTENT)
}
