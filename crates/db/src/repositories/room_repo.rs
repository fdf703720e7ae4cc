//! Repository for the `rooms` table.

use std::sync::Arc;

use chrono::Utc;
use hotel_core::filter::ListFilter;
use hotel_core::patch::{PatchMode, UpdateMerger};
use hotel_core::types::{new_id, DbId};
use validator::Validate;

use super::Repository;
use crate::error::DbResult;
use crate::models::room::{CreateRoom, Room, UpdateRoom};
use crate::models::Page;
use crate::record::Record;
use crate::store::RecordStore;

/// Provides CRUD operations for rooms.
#[derive(Clone)]
pub struct RoomRepo {
    inner: Repository<Room>,
    mode: PatchMode,
}

impl RoomRepo {
    pub fn new(store: Arc<dyn RecordStore<Room>>, mode: PatchMode) -> Self {
        Self {
            inner: Repository::new(store),
            mode,
        }
    }

    pub async fn create(&self, input: &CreateRoom) -> DbResult<Room> {
        input.validate()?;
        let now = Utc::now();
        self.inner
            .insert(Room {
                id: new_id(),
                room_type: input.room_type.clone(),
                category: input.category.clone(),
                status: input.status.clone(),
                price: input.price,
                availability: input.availability,
                rating: input.rating,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn get_single(&self, id: DbId) -> DbResult<Room> {
        self.inner.get(id).await
    }

    pub async fn get_list(&self, filter: &ListFilter) -> DbResult<Page<Room>> {
        self.inner.list(filter).await
    }

    /// Update a room. Values are checked against the same bounds as on create.
    pub async fn update(&self, input: &UpdateRoom) -> DbResult<Room> {
        input.validate()?;
        let writes = UpdateMerger::new(self.mode)
            .text("room_type", input.room_type.as_deref())
            .text("category", input.category.as_deref())
            .text("status", input.status.as_deref())
            .number("price", input.price)
            .flag("availability", input.availability)
            .number("rating", input.rating)
            .finish(Room::ENTITY, Utc::now())?;
        self.inner.patch(input.id, &writes).await
    }

    pub async fn delete(&self, id: DbId) -> DbResult<()> {
        self.inner.delete(id).await
    }
}
