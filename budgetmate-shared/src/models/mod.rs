/// Database models for BudgetMate
///
/// One module per table. Each model owns its SQL and returns `sqlx::Error`;
/// callers decide how missing rows and constraint violations surface.
///
/// # Models
///
/// - `family`: Tenants
/// - `user`: Accounts, one family each
/// - `session`: Login sessions, keyed by token hash
/// - `transaction`: Income and expense entries plus the aggregate queries
/// - `budget`: Per-category monthly limits
/// - `purchase_request`: Purchase proposals and their votes
/// - `goal`: Savings goals
/// - `subscription`: Recurring charges
/// - `notification`: Per-user inbox
/// - `invite`: Family invite links
///
/// # Ownership
///
/// Lookups by id (`find_by_id`) are unscoped. Rows that belong to a family
/// implement [`FamilyScoped`], and handlers must check
/// [`FamilyScoped::belongs_to_family`] before reading or mutating a row by id.

pub mod budget;
pub mod family;
pub mod goal;
pub mod invite;
pub mod notification;
pub mod purchase_request;
pub mod session;
pub mod subscription;
pub mod transaction;
pub mod user;

/// A row owned by exactly one family
pub trait FamilyScoped {
    fn family_id(&self) -> i64;

    fn belongs_to_family(&self, family_id: i64) -> bool {
        self.family_id() == family_id
    }
}

/// Returns the row only if it exists and belongs to `family_id`.
///
/// A row of another family is indistinguishable from a missing one.
pub fn owned_by<T: FamilyScoped>(row: Option<T>, family_id: i64) -> Option<T> {
    row.filter(|r| r.belongs_to_family(family_id))
}
