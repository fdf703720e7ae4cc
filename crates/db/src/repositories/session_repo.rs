//! Repository for the `sessions` table.

use std::sync::Arc;

use chrono::Utc;
use hotel_core::filter::{ListFilter, Predicate};
use hotel_core::patch::{PatchMode, UpdateMerger};
use hotel_core::types::{new_id, DbId};

use super::Repository;
use crate::error::DbResult;
use crate::models::session::{CreateSession, Session, UpdateSession};
use crate::models::Page;
use crate::record::Record;
use crate::store::RecordStore;

/// Provides CRUD operations for sessions plus the token-hash lookups used by
/// the session store.
#[derive(Clone)]
pub struct SessionRepo {
    inner: Repository<Session>,
    mode: PatchMode,
}

impl SessionRepo {
    pub fn new(store: Arc<dyn RecordStore<Session>>, mode: PatchMode) -> Self {
        Self {
            inner: Repository::new(store),
            mode,
        }
    }

    /// Insert a new active session issued now.
    pub async fn create(&self, input: &CreateSession) -> DbResult<Session> {
        let now = Utc::now();
        self.inner
            .insert(Session {
                id: new_id(),
                user_id: input.user_id,
                role: input.role.clone(),
                token_hash: input.token_hash.clone(),
                is_active: true,
                user_agent: input.user_agent.clone(),
                ip_address: input.ip_address.clone(),
                issued_at: now,
                expires_at: input.expires_at,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn get_single(&self, id: DbId) -> DbResult<Session> {
        self.inner.get(id).await
    }

    pub async fn get_list(&self, filter: &ListFilter) -> DbResult<Page<Session>> {
        self.inner.list(filter).await
    }

    pub async fn update(&self, input: &UpdateSession) -> DbResult<Session> {
        let writes = UpdateMerger::new(self.mode)
            .text("role", input.role.as_deref())
            .flag("is_active", input.is_active)
            .text("user_agent", input.user_agent.as_deref())
            .text("ip_address", input.ip_address.as_deref())
            .finish(Session::ENTITY, Utc::now())?;
        self.inner.patch(input.id, &writes).await
    }

    pub async fn delete(&self, id: DbId) -> DbResult<()> {
        self.inner.delete(id).await
    }

    /// Remove every session of `user_id`.
    pub async fn delete_for_user(&self, user_id: DbId) -> DbResult<u64> {
        self.inner.delete_where(&Predicate::eq("user_id", user_id)).await
    }

    /// Active session holding the given token digest. Expiry is not checked.
    pub async fn find_active_by_hash(&self, token_hash: &str) -> DbResult<Option<Session>> {
        self.inner
            .find(&Predicate::eq("token_hash", token_hash).and_eq("is_active", true))
            .await
    }

    /// Mark the active session holding `token_hash` inactive.
    ///
    /// Returns `false` when no active session matches.
    pub async fn deactivate_by_hash(&self, token_hash: &str) -> DbResult<bool> {
        let Some(session) = self.find_active_by_hash(token_hash).await? else {
            return Ok(false);
        };
        let writes = UpdateMerger::new(PatchMode::Explicit)
            .flag("is_active", Some(false))
            .finish(Session::ENTITY, Utc::now())?;
        self.inner.patch(session.id, &writes).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::memory::MemoryStore;

    fn repo() -> SessionRepo {
        SessionRepo::new(Arc::new(MemoryStore::<Session>::new()), PatchMode::Sentinel)
    }

    fn input(hash: &str) -> CreateSession {
        CreateSession {
            user_id: new_id(),
            role: "guest".into(),
            token_hash: hash.into(),
            expires_at: Utc::now() + Duration::hours(1),
            user_agent: Some("curl/8.0".into()),
            ip_address: None,
        }
    }

    #[tokio::test]
    async fn created_session_is_active_and_findable_by_hash() {
        let repo = repo();
        let created = repo.create(&input("abc")).await.unwrap();
        assert!(created.is_active);
        assert!(created.is_valid_at(Utc::now()));

        let found = repo.find_active_by_hash("abc").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_active_by_hash("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deactivate_hides_session_from_active_lookup() {
        let repo = repo();
        let created = repo.create(&input("abc")).await.unwrap();

        assert!(repo.deactivate_by_hash("abc").await.unwrap());
        assert!(repo.find_active_by_hash("abc").await.unwrap().is_none());
        assert!(!repo.deactivate_by_hash("abc").await.unwrap());

        let stored = repo.get_single(created.id).await.unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn list_filters_by_user() {
        let repo = repo();
        let first = repo.create(&input("a")).await.unwrap();
        repo.create(&input("b")).await.unwrap();

        let page = repo
            .get_list(&ListFilter::new().with_filter("user_id", first.user_id.to_string()))
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].id, first.id);
    }
}
