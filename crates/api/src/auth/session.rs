//! Opaque bearer-token sessions.
//!
//! The client receives a random token; storage only ever sees its SHA-256
//! digest. Resolved sessions are cached in process for a short time so the
//! auth gate does not hit storage on every request.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use hotel_core::error::CoreError;
use hotel_core::types::{DbId, Timestamp};
use hotel_db::models::session::{CreateSession, Session};
use hotel_db::repositories::SessionRepo;
use hotel_db::DbResult;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::{MAX_SESSION_CACHE_TTL_SECS, MAX_SESSION_TTL_HOURS};

/// Request metadata recorded on a new session.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// A freshly created session together with the plaintext token.
///
/// The token is returned to the client exactly once and is not recoverable
/// afterwards.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

struct CachedSession {
    session: Session,
    cached_at: Instant,
}

impl CachedSession {
    fn is_fresh(&self, ttl: Duration, now: Timestamp) -> bool {
        self.cached_at.elapsed() < ttl && self.session.is_valid_at(now)
    }
}

/// Resolved sessions keyed by token digest.
///
/// `epoch` advances on every eviction. A lookup that read storage under an
/// older epoch must not insert, since the row it saw may already be gone.
#[derive(Default)]
struct SessionCache {
    entries: HashMap<String, CachedSession>,
    epoch: u64,
}

impl SessionCache {
    fn evict(&mut self, keep: impl FnMut(&String, &mut CachedSession) -> bool) {
        self.entries.retain(keep);
        self.epoch += 1;
    }
}

/// Issues, resolves and invalidates bearer-token sessions.
pub struct SessionStore {
    repo: SessionRepo,
    ttl: chrono::Duration,
    cache_ttl: Duration,
    cache: RwLock<SessionCache>,
}

/// Generate a random opaque token: two UUIDv4 in simple form (64 hex chars).
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// SHA-256 hex digest of a bearer token.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl SessionStore {
    /// `ttl_hours` is clamped to [`MAX_SESSION_TTL_HOURS`] and
    /// `cache_ttl_secs` to [`MAX_SESSION_CACHE_TTL_SECS`].
    pub fn new(repo: SessionRepo, ttl_hours: i64, cache_ttl_secs: u64) -> Self {
        Self {
            repo,
            ttl: chrono::Duration::hours(ttl_hours.clamp(0, MAX_SESSION_TTL_HOURS)),
            cache_ttl: Duration::from_secs(cache_ttl_secs.min(MAX_SESSION_CACHE_TTL_SECS)),
            cache: RwLock::new(SessionCache::default()),
        }
    }

    /// Start a new session for `user_id` acting as `role`.
    pub async fn create(
        &self,
        user_id: DbId,
        role: &str,
        client: ClientInfo,
    ) -> DbResult<IssuedSession> {
        let token = generate_token();
        let session = self
            .repo
            .create(&CreateSession {
                user_id,
                role: role.to_string(),
                token_hash: hash_token(&token),
                expires_at: Utc::now() + self.ttl,
                user_agent: client.user_agent,
                ip_address: client.ip_address,
            })
            .await?;
        tracing::info!(%user_id, session_id = %session.id, "Session created");
        Ok(IssuedSession { token, session })
    }

    /// Look up the live session for `token`.
    ///
    /// Returns `None` for unknown, inactive or expired tokens.
    pub async fn resolve(&self, token: &str) -> DbResult<Option<Session>> {
        let digest = hash_token(token);
        let now = Utc::now();

        let epoch = match self.cached(&digest, now).await {
            Ok(session) => return Ok(Some(session)),
            Err(epoch) => epoch,
        };

        let Some(session) = self.repo.find_active_by_hash(&digest).await? else {
            return Ok(None);
        };
        if !session.is_valid_at(now) {
            return Ok(None);
        }

        if !self.cache_ttl.is_zero() {
            let mut cache = self.cache.write().await;
            if cache.epoch == epoch {
                let ttl = self.cache_ttl;
                cache.entries.retain(|_, c| c.is_fresh(ttl, now));
                cache.entries.insert(
                    digest,
                    CachedSession {
                        session: session.clone(),
                        cached_at: Instant::now(),
                    },
                );
            }
        }
        Ok(Some(session))
    }

    /// End the session holding `token`.
    ///
    /// Storage is updated first and the cache evicted afterwards, so a
    /// concurrent [`SessionStore::resolve`] can never re-cache the session.
    pub async fn invalidate(&self, token: &str) -> DbResult<()> {
        let digest = hash_token(token);
        let deactivated = self.repo.deactivate_by_hash(&digest).await;
        self.cache.write().await.evict(|key, _| *key != digest);
        if !deactivated? {
            return Err(CoreError::not_found("session", "presented token").into());
        }
        tracing::info!("Session invalidated");
        Ok(())
    }

    /// Drop the cached entry of session `id`, if any.
    pub async fn forget_session(&self, id: DbId) {
        self.cache.write().await.evict(|_, c| c.session.id != id);
    }

    /// Drop every cached session of `user_id`.
    pub async fn forget_user(&self, user_id: DbId) {
        self.cache
            .write()
            .await
            .evict(|_, c| c.session.user_id != user_id);
    }

    /// Cached session for `digest`, or the cache epoch seen on a miss.
    async fn cached(&self, digest: &str, now: Timestamp) -> Result<Session, u64> {
        let epoch = {
            let cache = self.cache.read().await;
            match cache.entries.get(digest) {
                Some(entry) if entry.is_fresh(self.cache_ttl, now) => {
                    return Ok(entry.session.clone());
                }
                Some(_) => None,
                None => Some(cache.epoch),
            }
        };
        match epoch {
            Some(epoch) => Err(epoch),
            None => {
                let mut cache = self.cache.write().await;
                cache.entries.remove(digest);
                Err(cache.epoch)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use hotel_core::filter::{ListQuery, Predicate};
    use hotel_core::patch::{PatchMode, WriteSet};
    use hotel_core::types::new_id;
    use hotel_db::memory::MemoryStore;
    use hotel_db::models::session::UpdateSession;
    use hotel_db::store::RecordStore;
    use hotel_db::DbError;
    use tokio::sync::Notify;

    use super::*;

    fn repo() -> SessionRepo {
        SessionRepo::new(Arc::new(MemoryStore::<Session>::new()), PatchMode::Explicit)
    }

    /// Memory store whose next `find_one` parks after reading until released.
    #[derive(Default)]
    struct ParkingStore {
        inner: MemoryStore<Session>,
        park_next_read: AtomicBool,
        parked: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RecordStore<Session> for ParkingStore {
        async fn insert(&self, record: &Session) -> DbResult<Session> {
            self.inner.insert(record).await
        }

        async fn find_one(&self, predicate: &Predicate) -> DbResult<Option<Session>> {
            let found = self.inner.find_one(predicate).await?;
            if self.park_next_read.swap(false, Ordering::SeqCst) {
                self.parked.notify_one();
                self.release.notified().await;
            }
            Ok(found)
        }

        async fn fetch_page(&self, query: &ListQuery) -> DbResult<Vec<Session>> {
            self.inner.fetch_page(query).await
        }

        async fn count(&self, predicate: &Predicate) -> DbResult<i64> {
            self.inner.count(predicate).await
        }

        async fn apply(&self, id: DbId, writes: &WriteSet) -> DbResult<bool> {
            self.inner.apply(id, writes).await
        }

        async fn delete(&self, id: DbId) -> DbResult<bool> {
            self.inner.delete(id).await
        }

        async fn delete_where(&self, predicate: &Predicate) -> DbResult<u64> {
            self.inner.delete_where(predicate).await
        }
    }

    #[test]
    fn tokens_are_long_hex_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
        assert_eq!(hash_token(&a), hash_token(&a));
        assert_ne!(hash_token(&a), a);
    }

    #[tokio::test]
    async fn create_then_resolve() {
        let store = SessionStore::new(repo(), 24, 60);
        let user = new_id();
        let issued = store.create(user, "guest", ClientInfo::default()).await.unwrap();

        let session = store.resolve(&issued.token).await.unwrap().unwrap();
        assert_eq!(session.user_id, user);
        assert_eq!(session.role, "guest");
        assert!(store.resolve("not-a-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidate_is_visible_immediately() {
        let store = SessionStore::new(repo(), 24, 60);
        let issued = store.create(new_id(), "staff", ClientInfo::default()).await.unwrap();

        // Warm the cache first.
        assert!(store.resolve(&issued.token).await.unwrap().is_some());
        store.invalidate(&issued.token).await.unwrap();
        assert!(store.resolve(&issued.token).await.unwrap().is_none());

        let err = store.invalidate(&issued.token).await.unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn expired_session_does_not_resolve() {
        let store = SessionStore::new(repo(), 1, 0);
        let issued = store.create(new_id(), "guest", ClientInfo::default()).await.unwrap();

        // Push expiry into the past directly through storage.
        store
            .repo
            .create(&CreateSession {
                user_id: new_id(),
                role: "guest".into(),
                token_hash: hash_token("stale-token"),
                expires_at: Utc::now() - chrono::Duration::minutes(1),
                user_agent: None,
                ip_address: None,
            })
            .await
            .unwrap();

        assert!(store.resolve("stale-token").await.unwrap().is_none());
        assert!(store.resolve(&issued.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn forgetting_a_session_drops_the_cached_copy() {
        let repo = repo();
        let store = SessionStore::new(repo.clone(), 24, 3600);
        let issued = store.create(new_id(), "guest", ClientInfo::default()).await.unwrap();
        assert!(store.resolve(&issued.token).await.unwrap().is_some());

        repo.update(&UpdateSession {
            id: issued.session.id,
            is_active: Some(false),
            ..UpdateSession::default()
        })
        .await
        .unwrap();

        // Still served from cache until forgotten.
        assert!(store.resolve(&issued.token).await.unwrap().is_some());
        store.forget_session(issued.session.id).await;
        assert!(store.resolve(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalidate_racing_a_resolve_stays_invalidated() {
        let storage = Arc::new(ParkingStore::default());
        let store = Arc::new(SessionStore::new(
            SessionRepo::new(storage.clone(), PatchMode::Explicit),
            24,
            60,
        ));
        let issued = store.create(new_id(), "guest", ClientInfo::default()).await.unwrap();

        storage.park_next_read.store(true, Ordering::SeqCst);
        let in_flight = tokio::spawn({
            let store = Arc::clone(&store);
            let token = issued.token.clone();
            async move { store.resolve(&token).await }
        });

        // The lookup has read the still-active row; log out before it finishes.
        storage.parked.notified().await;
        store.invalidate(&issued.token).await.unwrap();
        storage.release.notify_one();

        assert!(in_flight.await.unwrap().unwrap().is_some());
        assert!(store.resolve(&issued.token).await.unwrap().is_none());
        assert!(store.cache.read().await.entries.is_empty());
    }

    #[tokio::test]
    async fn expired_cache_entries_are_swept_on_insert() {
        let store = SessionStore::new(repo(), 24, 1);
        for _ in 0..3 {
            let issued = store.create(new_id(), "guest", ClientInfo::default()).await.unwrap();
            assert!(store.resolve(&issued.token).await.unwrap().is_some());
        }
        assert_eq!(store.cache.read().await.entries.len(), 3);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let issued = store.create(new_id(), "guest", ClientInfo::default()).await.unwrap();
        assert!(store.resolve(&issued.token).await.unwrap().is_some());
        assert_eq!(store.cache.read().await.entries.len(), 1);
    }

    #[test]
    fn oversized_ttls_are_clamped() {
        let store = SessionStore::new(repo(), i64::MAX, u64::MAX);
        assert_eq!(store.ttl, chrono::Duration::hours(MAX_SESSION_TTL_HOURS));
        assert_eq!(store.cache_ttl, Duration::from_secs(MAX_SESSION_CACHE_TTL_SECS));
    }
}
