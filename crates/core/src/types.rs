/// All primary keys are UUIDv7, assigned by the application at insert time.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh time-ordered identifier for a new row.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}
