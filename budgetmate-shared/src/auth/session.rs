/// Session lifecycle: create, resolve, destroy, revoke
///
/// [`SessionManager`] is the only code that writes the `sessions` table or
/// the [`SessionCache`], which keeps the two in step:
///
/// - `create` writes the row and eagerly caches the user.
/// - `resolve` serves from the cache, falling back to the database and
///   repopulating on a miss.
/// - `destroy` drops the cache entry before deleting the row.
/// - `revoke_others` and `invalidate_user` purge every cached entry of a
///   user whose profile or credentials changed.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

use super::session_cache::SessionCache;
use super::token::{generate_session_token, hash_token, is_well_formed_session_token};
use crate::models::session::{Session, SessionUser};
use crate::models::user::User;

/// Default lifetime of a login
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 7;

/// A freshly issued session; `token` goes into the cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionManager {
    pool: PgPool,
    cache: Arc<dyn SessionCache>,
    session_ttl: Duration,
}

impl SessionManager {
    pub fn new(pool: PgPool, cache: Arc<dyn SessionCache>, session_ttl: Duration) -> Self {
        Self {
            pool,
            cache,
            session_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn cache(&self) -> &Arc<dyn SessionCache> {
        &self.cache
    }

    /// Starts a session for `user` and caches it immediately.
    pub async fn create(&self, user: &User) -> Result<IssuedSession, sqlx::Error> {
        let token = generate_session_token();
        let expires_at = Utc::now() + self.session_ttl;

        Session::create(&self.pool, &hash_token(&token), user.id, expires_at).await?;
        self.cache.insert(&token, SessionUser::from(user), expires_at);

        info!(user_id = user.id, "Session created");
        Ok(IssuedSession { token, expires_at })
    }

    /// Resolves a cookie token to its user, or `None` when the token is
    /// unknown or expired.
    pub async fn resolve(&self, token: &str) -> Result<Option<SessionUser>, sqlx::Error> {
        if !is_well_formed_session_token(token) {
            return Ok(None);
        }

        if let Some(user) = self.cache.get(token) {
            return Ok(Some(user));
        }

        debug!("Session cache miss");
        match Session::find_live(&self.pool, &hash_token(token)).await? {
            Some(live) => {
                self.cache.insert(token, live.user.clone(), live.expires_at);
                Ok(Some(live.user))
            }
            None => Ok(None),
        }
    }

    /// Logs out one session.
    pub async fn destroy(&self, token: &str) -> Result<(), sqlx::Error> {
        self.cache.remove(token);
        Session::delete(&self.pool, &hash_token(token)).await?;
        Ok(())
    }

    /// Ends every session of `user_id` except `keep_token`.
    pub async fn revoke_others(&self, user_id: i64, keep_token: &str) -> Result<u64, sqlx::Error> {
        let revoked = Session::delete_others(&self.pool, user_id, &hash_token(keep_token)).await?;
        self.cache.invalidate_user(user_id);

        info!(user_id, revoked, "Revoked other sessions");
        Ok(revoked)
    }

    /// Forces the next request of every session of `user_id` to reload the
    /// user from the database.
    pub fn invalidate_user(&self, user_id: i64) -> usize {
        self.cache.invalidate_user(user_id)
    }
}
