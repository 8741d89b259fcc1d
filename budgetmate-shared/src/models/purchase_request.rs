/// Purchase requests and votes
///
/// A purchase request is a proposal to spend family money. Members vote on
/// it and the family's majority decides; see `voting` for the rules and the
/// notification fan-out. Nothing here touches budgets or transactions.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE request_status AS ENUM ('pending', 'approved', 'rejected');
/// CREATE TYPE vote_choice AS ENUM ('approve', 'reject');
///
/// CREATE TABLE purchase_requests (
///     id BIGSERIAL PRIMARY KEY,
///     family_id BIGINT NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     item_name VARCHAR(255) NOT NULL,
///     amount DOUBLE PRECISION NOT NULL CHECK (amount > 0),
///     status request_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE votes (
///     request_id BIGINT NOT NULL REFERENCES purchase_requests(id) ON DELETE CASCADE,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     vote vote_choice NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (request_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::FamilyScoped;

/// Lifecycle of a request. Only `Pending` ever changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// A member's ballot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_choice", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    Approve,
    Reject,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::Approve => "approve",
            VoteChoice::Reject => "reject",
        }
    }

    /// Past-tense wording used in notifications.
    pub fn verb(&self) -> &'static str {
        match self {
            VoteChoice::Approve => "approved",
            VoteChoice::Reject => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "approve" => Some(VoteChoice::Approve),
            "reject" => Some(VoteChoice::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseRequest {
    pub id: i64,
    pub family_id: i64,
    /// Requester
    pub user_id: i64,
    pub item_name: String,
    pub amount: f64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl FamilyScoped for PurchaseRequest {
    fn family_id(&self) -> i64 {
        self.family_id
    }
}

/// A request as shown to one viewer: requester details, current tally and
/// the viewer's own ballot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RequestCard {
    pub id: i64,
    pub family_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub item_name: String,
    pub amount: f64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub approve_votes: i64,
    pub reject_votes: i64,
    /// Members of the family, i.e. the electorate
    #[sqlx(skip)]
    pub total_voters: i64,
    pub user_vote: Option<VoteChoice>,
    #[sqlx(skip)]
    pub user_voted: bool,
}

impl RequestCard {
    fn with_electorate(mut self, total_voters: i64) -> Self {
        self.total_voters = total_voters;
        self.user_voted = self.user_vote.is_some();
        self
    }
}

/// Current approve/reject counts for one request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoteTally {
    pub approve: i64,
    pub reject: i64,
}

impl PurchaseRequest {
    pub async fn create(
        pool: &PgPool,
        family_id: i64,
        user_id: i64,
        item_name: &str,
        amount: f64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, PurchaseRequest>(
            r#"
            INSERT INTO purchase_requests (family_id, user_id, item_name, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, family_id, user_id, item_name, amount, status, created_at
            "#,
        )
        .bind(family_id)
        .bind(user_id)
        .bind(item_name)
        .bind(amount)
        .fetch_one(pool)
        .await
    }

    /// Unscoped lookup; callers must check `belongs_to_family` before use.
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseRequest>(
            r#"
            SELECT id, family_id, user_id, item_name, amount, status, created_at
            FROM purchase_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Moves a pending request to `status`.
    ///
    /// Returns `false` when the request was no longer pending. Two voters
    /// crossing the threshold at once both land here; only the first update
    /// matches, so the transition and its notifications happen once.
    pub async fn resolve(
        pool: &PgPool,
        id: i64,
        status: RequestStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE purchase_requests SET status = $2 WHERE id = $1 AND status = 'pending'",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Pending requests of a family, newest first, as seen by `viewer_id`.
    pub async fn pending_cards(
        pool: &PgPool,
        family_id: i64,
        viewer_id: i64,
    ) -> Result<Vec<RequestCard>, sqlx::Error> {
        let total_voters = super::family::Family::member_count(pool, family_id).await?;

        let cards = sqlx::query_as::<_, RequestCard>(
            r#"
            SELECT pr.id, pr.family_id, pr.user_id, u.name AS user_name, u.avatar_url AS user_avatar,
                   pr.item_name, pr.amount, pr.status, pr.created_at,
                   (SELECT COUNT(*) FROM votes v WHERE v.request_id = pr.id AND v.vote = 'approve') AS approve_votes,
                   (SELECT COUNT(*) FROM votes v WHERE v.request_id = pr.id AND v.vote = 'reject') AS reject_votes,
                   (SELECT v.vote FROM votes v WHERE v.request_id = pr.id AND v.user_id = $2) AS user_vote
            FROM purchase_requests pr
            JOIN users u ON u.id = pr.user_id
            WHERE pr.family_id = $1 AND pr.status = 'pending'
            ORDER BY pr.created_at DESC, pr.id DESC
            "#,
        )
        .bind(family_id)
        .bind(viewer_id)
        .fetch_all(pool)
        .await?;

        Ok(cards
            .into_iter()
            .map(|card| card.with_electorate(total_voters))
            .collect())
    }

    /// One request as seen by `viewer_id`, whatever its status.
    pub async fn card(
        pool: &PgPool,
        id: i64,
        viewer_id: i64,
    ) -> Result<Option<RequestCard>, sqlx::Error> {
        let card = sqlx::query_as::<_, RequestCard>(
            r#"
            SELECT pr.id, pr.family_id, pr.user_id, u.name AS user_name, u.avatar_url AS user_avatar,
                   pr.item_name, pr.amount, pr.status, pr.created_at,
                   (SELECT COUNT(*) FROM votes v WHERE v.request_id = pr.id AND v.vote = 'approve') AS approve_votes,
                   (SELECT COUNT(*) FROM votes v WHERE v.request_id = pr.id AND v.vote = 'reject') AS reject_votes,
                   (SELECT v.vote FROM votes v WHERE v.request_id = pr.id AND v.user_id = $2) AS user_vote
            FROM purchase_requests pr
            JOIN users u ON u.id = pr.user_id
            WHERE pr.id = $1
            "#,
        )
        .bind(id)
        .bind(viewer_id)
        .fetch_optional(pool)
        .await?;

        match card {
            Some(card) => {
                let total_voters = super::family::Family::member_count(pool, card.family_id).await?;
                Ok(Some(card.with_electorate(total_voters)))
            }
            None => Ok(None),
        }
    }
}

pub struct Vote;

impl Vote {
    /// Records `choice` for (request, voter), replacing any earlier ballot.
    pub async fn cast(
        pool: &PgPool,
        request_id: i64,
        user_id: i64,
        choice: VoteChoice,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO votes (request_id, user_id, vote)
            VALUES ($1, $2, $3)
            ON CONFLICT (request_id, user_id)
            DO UPDATE SET vote = EXCLUDED.vote, created_at = NOW()
            "#,
        )
        .bind(request_id)
        .bind(user_id)
        .bind(choice)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn tally(pool: &PgPool, request_id: i64) -> Result<VoteTally, sqlx::Error> {
        sqlx::query_as::<_, VoteTally>(
            r#"
            SELECT COUNT(*) FILTER (WHERE vote = 'approve') AS approve,
                   COUNT(*) FILTER (WHERE vote = 'reject') AS reject
            FROM votes
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_one(pool)
        .await
    }

    /// Ballot rows for a request; one per voter at most.
    pub async fn count_for_request(pool: &PgPool, request_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE request_id = $1")
            .bind(request_id)
            .fetch_one(pool)
            .await
    }
}
