//! Repository layer.
//!
//! [`Repository`] implements the shared create/get/list/patch/delete flow for
//! any [`Record`]; each `*_repo` module wraps it with the entity's DTOs and
//! lookup rules. [`Repositories`] bundles all four over one backend.

use std::sync::Arc;

use hotel_core::error::CoreError;
use hotel_core::filter::{compile, ListFilter, Predicate};
use hotel_core::patch::{PatchMode, WriteSet};
use hotel_core::types::DbId;

use crate::error::DbResult;
use crate::memory::MemoryStore;
use crate::models::room::Room;
use crate::models::room_review::RoomReview;
use crate::models::session::Session;
use crate::models::user::User;
use crate::models::Page;
use crate::pg::PgStore;
use crate::record::Record;
use crate::store::RecordStore;
use crate::DbPool;

pub mod room_repo;
pub mod room_review_repo;
pub mod session_repo;
pub mod user_repo;

pub use room_repo::RoomRepo;
pub use room_review_repo::RoomReviewRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;

/// Entity-agnostic repository over a [`RecordStore`].
pub struct Repository<R: Record> {
    store: Arc<dyn RecordStore<R>>,
}

impl<R: Record> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<R: Record> Repository<R> {
    pub fn new(store: Arc<dyn RecordStore<R>>) -> Self {
        Self { store }
    }

    pub async fn insert(&self, record: R) -> DbResult<R> {
        let created = self.store.insert(&record).await?;
        tracing::debug!(entity = R::ENTITY, id = %created.id(), "Record created");
        Ok(created)
    }

    pub async fn find(&self, predicate: &Predicate) -> DbResult<Option<R>> {
        self.store.find_one(predicate).await
    }

    /// Fetch by id, failing with `NotFound` when absent.
    pub async fn get(&self, id: DbId) -> DbResult<R> {
        self.find(&Predicate::eq("id", id))
            .await?
            .ok_or_else(|| CoreError::not_found(R::ENTITY, id).into())
    }

    /// Compile `filter` and fetch one page plus the total match count.
    ///
    /// The page and the count are two separate reads sharing one predicate.
    /// They are not wrapped in a transaction, so a concurrent write between
    /// them can make `total_count` disagree with the page contents.
    pub async fn list(&self, filter: &ListFilter) -> DbResult<Page<R>> {
        let query = compile(R::list_spec(), filter)?;
        let items = self.store.fetch_page(&query).await?;
        let total_count = self.store.count(&query.predicate).await?;
        Ok(Page {
            items,
            total_count,
            page: query.window.page,
            page_size: query.window.page_size,
        })
    }

    /// Apply `writes` and re-read the persisted row.
    pub async fn patch(&self, id: DbId, writes: &WriteSet) -> DbResult<R> {
        if !self.store.apply(id, writes).await? {
            return Err(CoreError::not_found(R::ENTITY, id).into());
        }
        tracing::debug!(
            entity = R::ENTITY,
            %id,
            fields = ?writes.columns().collect::<Vec<_>>(),
            "Record updated"
        );
        self.get(id).await
    }

    pub async fn delete(&self, id: DbId) -> DbResult<()> {
        if !self.store.delete(id).await? {
            return Err(CoreError::not_found(R::ENTITY, id).into());
        }
        tracing::debug!(entity = R::ENTITY, %id, "Record deleted");
        Ok(())
    }

    pub async fn delete_where(&self, predicate: &Predicate) -> DbResult<u64> {
        let removed = self.store.delete_where(predicate).await?;
        tracing::debug!(entity = R::ENTITY, removed, "Records deleted");
        Ok(removed)
    }
}

/// All repositories over a single backend.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepo,
    pub sessions: SessionRepo,
    pub rooms: RoomRepo,
    pub room_reviews: RoomReviewRepo,
}

impl Repositories {
    /// Repositories backed by PostgreSQL.
    pub fn postgres(pool: DbPool, mode: PatchMode) -> Self {
        Self {
            users: UserRepo::new(Arc::new(PgStore::<User>::new(pool.clone())), mode),
            sessions: SessionRepo::new(Arc::new(PgStore::<Session>::new(pool.clone())), mode),
            rooms: RoomRepo::new(Arc::new(PgStore::<Room>::new(pool.clone())), mode),
            room_reviews: RoomReviewRepo::new(Arc::new(PgStore::<RoomReview>::new(pool)), mode),
        }
    }

    /// Delete a user together with every session they hold.
    ///
    /// PostgreSQL already cascades through the `sessions.user_id` foreign
    /// key; the explicit sweep covers backends without one.
    pub async fn delete_user(&self, id: DbId) -> DbResult<()> {
        self.users.delete(id).await?;
        let removed = self.sessions.delete_for_user(id).await?;
        if removed > 0 {
            tracing::debug!(user_id = %id, removed, "Sessions of deleted user removed");
        }
        Ok(())
    }

    /// Repositories backed by in-process memory.
    pub fn in_memory(mode: PatchMode) -> Self {
        Self {
            users: UserRepo::new(Arc::new(MemoryStore::<User>::new()), mode),
            sessions: SessionRepo::new(Arc::new(MemoryStore::<Session>::new()), mode),
            rooms: RoomRepo::new(Arc::new(MemoryStore::<Room>::new()), mode),
            room_reviews: RoomReviewRepo::new(Arc::new(MemoryStore::<RoomReview>::new()), mode),
        }
    }
}
