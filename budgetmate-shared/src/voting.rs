/// Purchase-request voting
///
/// A member proposes a purchase; every member of the family (the requester
/// included) may vote approve or reject. After each ballot the tally is
/// recomputed from the `votes` table and compared with the family size:
///
/// ```text
/// majority = floor(members / 2) + 1
/// approve >= majority            -> approved
/// else reject >= majority        -> rejected
/// else                           -> still pending
/// ```
///
/// A family of zero members never resolves. Decided requests accept no
/// further ballots.
///
/// # Notifications
///
/// | Event              | Recipients                  | Kind               |
/// |--------------------|-----------------------------|--------------------|
/// | Request created    | Family minus requester      | `purchase_request` |
/// | Vote cast          | Requester, unless self-vote | `vote`             |
/// | Request decided    | Whole family                | `request_status`   |
///
/// Notifications are written after the main statement succeeds and are not
/// part of a database transaction. A failed notification is logged and the
/// operation still succeeds.

use sqlx::PgPool;
use tracing::{info, warn};

use crate::models::family::Family;
use crate::models::notification::{kind, Notification};
use crate::models::owned_by;
use crate::models::purchase_request::{
    PurchaseRequest, RequestCard, RequestStatus, Vote, VoteChoice, VoteTally,
};
use crate::money::format_inr;

/// Longest accepted item name, in characters
pub const MAX_ITEM_NAME_LENGTH: usize = 255;

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("{0}")]
    Validation(String),

    #[error("purchase request not found")]
    NotFound,

    #[error("purchase request is already {0}")]
    Closed(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Votes needed to decide a request in a family of `members`
pub fn majority(members: i64) -> i64 {
    members / 2 + 1
}

/// Outcome of `tally` in a family of `members`, or `None` while undecided.
pub fn decide(tally: VoteTally, members: i64) -> Option<RequestStatus> {
    if members <= 0 {
        return None;
    }

    let needed = majority(members);
    if tally.approve >= needed {
        Some(RequestStatus::Approved)
    } else if tally.reject >= needed {
        Some(RequestStatus::Rejected)
    } else {
        None
    }
}

/// Trims and checks a new request's fields.
pub fn validate_request(item_name: &str, amount: f64) -> Result<String, VoteError> {
    let item_name = item_name.trim();
    if item_name.is_empty() {
        return Err(VoteError::Validation("Item name is required".to_string()));
    }
    if item_name.chars().count() > MAX_ITEM_NAME_LENGTH {
        return Err(VoteError::Validation(format!(
            "Item name must be at most {} characters",
            MAX_ITEM_NAME_LENGTH
        )));
    }
    if !amount.is_finite() || amount <= 0.0 {
        return Err(VoteError::Validation(
            "Amount must be a positive number".to_string(),
        ));
    }
    Ok(item_name.to_string())
}

/// Opens a pending request and tells the rest of the family.
pub async fn create_request(
    pool: &PgPool,
    family_id: i64,
    requester_id: i64,
    requester_name: &str,
    item_name: &str,
    amount: f64,
) -> Result<PurchaseRequest, VoteError> {
    let item_name = validate_request(item_name, amount)?;
    let request = PurchaseRequest::create(pool, family_id, requester_id, &item_name, amount).await?;

    info!(
        request_id = request.id,
        family_id,
        requester_id,
        amount,
        "Purchase request created"
    );

    let message = format!(
        "{} requested: {} ({})",
        requester_name,
        request.item_name,
        format_inr(request.amount)
    );
    if let Err(e) = Notification::notify_family(
        pool,
        family_id,
        Some(requester_id),
        kind::PURCHASE_REQUEST,
        &message,
        &request.id.to_string(),
    )
    .await
    {
        warn!(request_id = request.id, error = %e, "Failed to notify family of purchase request");
    }

    Ok(request)
}

/// Records a ballot, then decides the request if a majority was reached.
///
/// Returns the request card as `voter_id` now sees it.
pub async fn cast_vote(
    pool: &PgPool,
    family_id: i64,
    request_id: i64,
    voter_id: i64,
    voter_name: &str,
    choice: VoteChoice,
) -> Result<RequestCard, VoteError> {
    let request = owned_by(PurchaseRequest::find_by_id(pool, request_id).await?, family_id)
        .ok_or(VoteError::NotFound)?;

    if request.status.is_terminal() {
        return Err(VoteError::Closed(request.status.as_str()));
    }

    Vote::cast(pool, request_id, voter_id, choice).await?;

    if request.user_id != voter_id {
        let message = format!("{} {} your request: {}", voter_name, choice.verb(), request.item_name);
        if let Err(e) = Notification::create(
            pool,
            request.user_id,
            kind::VOTE,
            &message,
            &request_id.to_string(),
        )
        .await
        {
            warn!(request_id, error = %e, "Failed to notify requester of vote");
        }
    }

    resolve(pool, &request).await?;

    PurchaseRequest::card(pool, request_id, voter_id)
        .await?
        .ok_or(VoteError::NotFound)
}

/// Recomputes the tally and applies the majority rule. Returns the new
/// status when this call performed the transition.
pub async fn resolve(
    pool: &PgPool,
    request: &PurchaseRequest,
) -> Result<Option<RequestStatus>, VoteError> {
    let tally = Vote::tally(pool, request.id).await?;
    let members = Family::member_count(pool, request.family_id).await?;

    let Some(status) = decide(tally, members) else {
        return Ok(None);
    };

    if !PurchaseRequest::resolve(pool, request.id, status).await? {
        // Another ballot got there first
        return Ok(None);
    }

    info!(
        request_id = request.id,
        status = status.as_str(),
        approve = tally.approve,
        reject = tally.reject,
        members,
        "Purchase request decided"
    );

    let message = format!("Request for {} was {}!", request.item_name, status.as_str());
    if let Err(e) = Notification::notify_family(
        pool,
        request.family_id,
        None,
        kind::REQUEST_STATUS,
        &message,
        &request.id.to_string(),
    )
    .await
    {
        warn!(request_id = request.id, error = %e, "Failed to notify family of decision");
    }

    Ok(Some(status))
}
