//! Repository for the `room_reviews` table.

use std::sync::Arc;

use chrono::Utc;
use hotel_core::error::CoreError;
use hotel_core::filter::ListFilter;
use hotel_core::patch::{PatchMode, UpdateMerger};
use hotel_core::types::{new_id, DbId};
use validator::Validate;

use super::Repository;
use crate::error::DbResult;
use crate::models::room_review::{CreateRoomReview, RoomReview, UpdateRoomReview};
use crate::models::Page;
use crate::record::Record;
use crate::store::RecordStore;

/// Provides CRUD operations for room reviews.
#[derive(Clone)]
pub struct RoomReviewRepo {
    inner: Repository<RoomReview>,
    mode: PatchMode,
}

impl RoomReviewRepo {
    pub fn new(store: Arc<dyn RecordStore<RoomReview>>, mode: PatchMode) -> Self {
        Self {
            inner: Repository::new(store),
            mode,
        }
    }

    pub async fn create(&self, input: &CreateRoomReview) -> DbResult<RoomReview> {
        input.validate()?;
        let now = Utc::now();
        self.inner
            .insert(RoomReview {
                id: new_id(),
                user_id: input.user_id,
                room_id: input.room_id,
                rating: input.rating,
                comment: input.comment.clone(),
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn get_single(&self, id: DbId) -> DbResult<RoomReview> {
        self.inner.get(id).await
    }

    pub async fn get_list(&self, filter: &ListFilter) -> DbResult<Page<RoomReview>> {
        self.inner.list(filter).await
    }

    pub async fn update(&self, input: &UpdateRoomReview) -> DbResult<RoomReview> {
        if let Some(rating) = input.rating {
            if !(0.0..=5.0).contains(&rating) {
                return Err(CoreError::InvalidRequest(format!(
                    "rating must be between 0 and 5, got {rating}"
                ))
                .into());
            }
        }
        let writes = UpdateMerger::new(self.mode)
            .number("rating", input.rating)
            .text("comment", input.comment.as_deref())
            .finish(RoomReview::ENTITY, Utc::now())?;
        self.inner.patch(input.id, &writes).await
    }

    pub async fn delete(&self, id: DbId) -> DbResult<()> {
        self.inner.delete(id).await
    }
}
