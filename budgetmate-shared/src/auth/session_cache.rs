/// In-process cache of resolved sessions
///
/// Every authenticated request needs `token -> user`. The cache answers that
/// without a database round-trip for a short window after the session was
/// last loaded.
///
/// An entry is served only while both hold:
///
/// 1. it was cached less than `ttl` ago (default five minutes), and
/// 2. the session's own database expiry has not passed.
///
/// Anything else is evicted on read and the caller falls back to the
/// database. The cache is per process; a session revoked on another node
/// stays usable here for at most `ttl`.
///
/// Time is read through [`Clock`] so tests can move it by hand.
///
/// # Example
///
/// ```
/// use budgetmate_shared::auth::session_cache::{InMemorySessionCache, SessionCache};
/// use budgetmate_shared::models::{session::SessionUser, user::UserRole};
/// use chrono::{Duration, Utc};
///
/// let cache = InMemorySessionCache::new(Duration::minutes(5));
/// let user = SessionUser {
///     user_id: 1,
///     email: "asha@example.com".to_string(),
///     name: "Asha".to_string(),
///     avatar_url: None,
///     family_id: 1,
///     role: UserRole::Admin,
/// };
///
/// cache.insert("token", user.clone(), Utc::now() + Duration::days(7));
/// assert_eq!(cache.get("token"), Some(user));
///
/// cache.remove("token");
/// assert_eq!(cache.get("token"), None);
/// ```

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tracing::trace;

use crate::models::session::SessionUser;

/// Default time an entry may be served before it is reloaded
pub const DEFAULT_CACHE_TTL_SECS: i64 = 300;

/// Source of "now"
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Token-keyed cache of session users.
///
/// Implementations are shared across request tasks and must be safe to use
/// without outside locking.
pub trait SessionCache: Send + Sync {
    /// Returns the cached user if the entry is still servable; evicts it
    /// otherwise.
    fn get(&self, token: &str) -> Option<SessionUser>;

    /// Caches `user` for `token`. `session_expires_at` is the database
    /// expiry of the session.
    fn insert(&self, token: &str, user: SessionUser, session_expires_at: DateTime<Utc>);

    fn remove(&self, token: &str);

    /// Drops every entry belonging to `user_id`. Returns how many were
    /// removed.
    fn invalidate_user(&self, user_id: i64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct CachedSession {
    user: SessionUser,
    session_expires_at: DateTime<Utc>,
    cached_at: DateTime<Utc>,
}

/// `RwLock<HashMap>`-backed [`SessionCache`]
pub struct InMemorySessionCache {
    entries: RwLock<HashMap<String, CachedSession>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn is_servable(&self, entry: &CachedSession, now: DateTime<Utc>) -> bool {
        now - entry.cached_at < self.ttl && now < entry.session_expires_at
    }

    /// Removes every entry that is no longer servable. Returns how many were
    /// dropped.
    pub fn purge_stale(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| self.is_servable(entry, now));
        before - entries.len()
    }
}

impl SessionCache for InMemorySessionCache {
    fn get(&self, token: &str) -> Option<SessionUser> {
        let now = self.clock.now();

        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(token) {
                None => return None,
                Some(entry) if self.is_servable(entry, now) => return Some(entry.user.clone()),
                Some(_) => {}
            }
        }

        // Stale: evict, unless someone refreshed it between the two locks.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = entries.get(token) {
            if self.is_servable(entry, now) {
                return Some(entry.user.clone());
            }
            entries.remove(token);
            trace!("Evicted stale session cache entry");
        }
        None
    }

    fn insert(&self, token: &str, user: SessionUser, session_expires_at: DateTime<Utc>) {
        let entry = CachedSession {
            user,
            session_expires_at,
            cached_at: self.clock.now(),
        };

        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.to_string(), entry);
    }

    fn remove(&self, token: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(token);
    }

    fn invalidate_user(&self, user_id: i64) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.user.user_id != user_id);
        before - entries.len()
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserRole;

    fn user(id: i64) -> SessionUser {
        SessionUser {
            user_id: id,
            email: format!("user{}@example.com", id),
            name: format!("User {}", id),
            avatar_url: None,
            family_id: 1,
            role: UserRole::Member,
        }
    }

    fn cache_at(start: DateTime<Utc>) -> (Arc<ManualClock>, InMemorySessionCache) {
        let clock = Arc::new(ManualClock::new(start));
        let cache = InMemorySessionCache::with_clock(Duration::minutes(5), clock.clone());
        (clock, cache)
    }

    #[test]
    fn test_hit_within_ttl() {
        let start = Utc::now();
        let (clock, cache) = cache_at(start);

        cache.insert("t1", user(1), start + Duration::days(7));
        clock.advance(Duration::minutes(4));

        assert_eq!(cache.get("t1"), Some(user(1)));
    }

    #[test]
    fn test_entry_expires_after_cache_ttl() {
        let start = Utc::now();
        let (clock, cache) = cache_at(start);

        cache.insert("t1", user(1), start + Duration::days(7));
        clock.advance(Duration::minutes(5));

        assert_eq!(cache.get("t1"), None);
        assert_eq!(cache.len(), 0, "stale entry is evicted on read");
    }

    #[test]
    fn test_entry_expires_with_session() {
        let start = Utc::now();
        let (clock, cache) = cache_at(start);

        // Session itself ends before the cache window does
        cache.insert("t1", user(1), start + Duration::minutes(1));
        clock.advance(Duration::seconds(61));

        assert_eq!(cache.get("t1"), None);
    }

    #[test]
    fn test_reinsert_restarts_ttl() {
        let start = Utc::now();
        let (clock, cache) = cache_at(start);

        cache.insert("t1", user(1), start + Duration::days(7));
        clock.advance(Duration::minutes(4));
        cache.insert("t1", user(1), start + Duration::days(7));
        clock.advance(Duration::minutes(4));

        assert_eq!(cache.get("t1"), Some(user(1)));
    }

    #[test]
    fn test_remove() {
        let cache = InMemorySessionCache::new(Duration::minutes(5));
        cache.insert("t1", user(1), Utc::now() + Duration::days(7));
        cache.remove("t1");
        assert!(cache.get("t1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_user_keeps_other_users() {
        let cache = InMemorySessionCache::new(Duration::minutes(5));
        let expires = Utc::now() + Duration::days(7);

        cache.insert("phone", user(1), expires);
        cache.insert("laptop", user(1), expires);
        cache.insert("other", user(2), expires);

        assert_eq!(cache.invalidate_user(1), 2);
        assert!(cache.get("phone").is_none());
        assert!(cache.get("laptop").is_none());
        assert_eq!(cache.get("other"), Some(user(2)));
    }

    #[test]
    fn test_purge_stale() {
        let start = Utc::now();
        let (clock, cache) = cache_at(start);

        cache.insert("old", user(1), start + Duration::days(7));
        clock.advance(Duration::minutes(6));
        cache.insert("fresh", user(2), start + Duration::days(7));

        assert_eq!(cache.purge_stale(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(InMemorySessionCache::new(Duration::minutes(5)));
        let expires = Utc::now() + Duration::days(7);

        let mut handles = Vec::new();
        for i in 0..16i64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let token = format!("token-{}", i);
                cache.insert(&token, user(i), expires);
                cache.get(&token)
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            let got = handle.await.unwrap();
            assert_eq!(got.map(|u| u.user_id), Some(i as i64));
        }
        assert_eq!(cache.len(), 16);
    }
}
