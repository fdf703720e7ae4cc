//! Repository for the `users` table.

use std::sync::Arc;

use chrono::Utc;
use hotel_core::error::CoreError;
use hotel_core::filter::{ListFilter, Predicate};
use hotel_core::patch::{PatchMode, UpdateMerger};
use hotel_core::types::{new_id, DbId};
use validator::Validate;

use super::Repository;
use crate::error::DbResult;
use crate::models::user::{CreateUser, UpdateUser, User, UserLookup};
use crate::models::Page;
use crate::record::Record;
use crate::store::RecordStore;

/// Provides CRUD operations and login lookups for users.
#[derive(Clone)]
pub struct UserRepo {
    inner: Repository<User>,
    mode: PatchMode,
}

impl UserRepo {
    pub fn new(store: Arc<dyn RecordStore<User>>, mode: PatchMode) -> Self {
        Self {
            inner: Repository::new(store),
            mode,
        }
    }

    /// Validate and insert a new user, returning the created row.
    pub async fn create(&self, input: &CreateUser) -> DbResult<User> {
        input.validate()?;
        let now = Utc::now();
        self.inner
            .insert(User {
                id: new_id(),
                full_name: input.full_name.trim().to_string(),
                username: input.username.trim().to_string(),
                email: input.email.trim().to_lowercase(),
                phone: input.phone.trim().to_string(),
                password_hash: input.password_hash.clone(),
                user_type: input.user_type.clone(),
                role: input.role.clone(),
                status: input.status.clone(),
                gender: input.gender.clone(),
                created_at: now,
                updated_at: now,
            })
            .await
    }

    /// Fetch one user by `id`, else `email`, else `role`.
    ///
    /// Fails with `InvalidRequest` when none is given, before touching storage.
    pub async fn get_single(&self, lookup: &UserLookup) -> DbResult<User> {
        let (predicate, key) = if let Some(id) = lookup.id {
            (Predicate::eq("id", id), id.to_string())
        } else if let Some(email) = non_empty(&lookup.email) {
            let email = email.to_lowercase();
            (Predicate::eq("email", email.as_str()), email)
        } else if let Some(role) = non_empty(&lookup.role) {
            (Predicate::eq("role", role.as_str()), role)
        } else {
            return Err(CoreError::InvalidRequest(
                "one of id, email or role is required".into(),
            )
            .into());
        };

        self.inner
            .find(&predicate)
            .await?
            .ok_or_else(|| CoreError::not_found(User::ENTITY, key).into())
    }

    pub async fn find_by_id(&self, id: DbId) -> DbResult<Option<User>> {
        self.inner.find(&Predicate::eq("id", id)).await
    }

    /// Find a user by username, falling back to e-mail.
    pub async fn find_by_login(&self, login: &str) -> DbResult<Option<User>> {
        let login = login.trim();
        if let Some(user) = self.inner.find(&Predicate::eq("username", login)).await? {
            return Ok(Some(user));
        }
        self.inner
            .find(&Predicate::eq("email", login.to_lowercase()))
            .await
    }

    pub async fn get_list(&self, filter: &ListFilter) -> DbResult<Page<User>> {
        self.inner.list(filter).await
    }

    /// Update a user. Only fields that survive the merge are written.
    pub async fn update(&self, input: &UpdateUser) -> DbResult<User> {
        let email = input.email.as_deref().map(|e| e.trim().to_lowercase());
        let writes = UpdateMerger::new(self.mode)
            .text("full_name", input.full_name.as_deref())
            .text("username", input.username.as_deref())
            .text("email", email.as_deref())
            .text("phone", input.phone.as_deref())
            .text("user_type", input.user_type.as_deref())
            .text("role", input.role.as_deref())
            .text("status", input.status.as_deref())
            .text("gender", input.gender.as_deref())
            .finish(User::ENTITY, Utc::now())?;
        self.inner.patch(input.id, &writes).await
    }

    /// Set the account status regardless of the configured patch mode.
    pub async fn set_status(&self, id: DbId, status: &str) -> DbResult<User> {
        let writes = UpdateMerger::new(PatchMode::Explicit)
            .text("status", Some(status))
            .finish(User::ENTITY, Utc::now())?;
        self.inner.patch(id, &writes).await
    }

    pub async fn delete(&self, id: DbId) -> DbResult<()> {
        self.inner.delete(id).await
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hotel_core::roles::{ROLE_GUEST, STATUS_ACTIVE, STATUS_PENDING};

    use super::*;
    use crate::error::DbError;
    use crate::memory::MemoryStore;

    fn repo() -> UserRepo {
        UserRepo::new(Arc::new(MemoryStore::<User>::new()), PatchMode::Sentinel)
    }

    fn new_user(username: &str) -> CreateUser {
        CreateUser {
            full_name: "Jane Doe".into(),
            username: username.into(),
            email: format!("{username}@Hotel.test"),
            phone: "+998901234567".into(),
            password_hash: "$argon2id$stub".into(),
            user_type: "customer".into(),
            role: ROLE_GUEST.into(),
            status: STATUS_PENDING.into(),
            gender: "female".into(),
        }
    }

    #[tokio::test]
    async fn create_normalizes_email_and_assigns_id() {
        let repo = repo();
        let user = repo.create(&new_user("jane")).await.unwrap();
        assert_eq!(user.email, "jane@hotel.test");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_invalid_email() {
        let mut input = new_user("jane");
        input.email = "not-an-email".into();
        let err = repo().create(&input).await.unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn get_single_prefers_id_then_email_then_role() {
        let repo = repo();
        let jane = repo.create(&new_user("jane")).await.unwrap();
        let john = repo.create(&new_user("john")).await.unwrap();

        let by_id = repo
            .get_single(&UserLookup {
                id: Some(john.id),
                email: Some(jane.email.clone()),
                role: None,
            })
            .await
            .unwrap();
        assert_eq!(by_id.id, john.id);

        let by_email = repo
            .get_single(&UserLookup {
                email: Some("JANE@hotel.test".into()),
                ..UserLookup::default()
            })
            .await
            .unwrap();
        assert_eq!(by_email.id, jane.id);

        let by_role = repo
            .get_single(&UserLookup {
                role: Some(ROLE_GUEST.into()),
                ..UserLookup::default()
            })
            .await
            .unwrap();
        assert_eq!(by_role.id, jane.id);
    }

    #[tokio::test]
    async fn get_single_without_identifier_is_invalid() {
        let err = repo()
            .get_single(&UserLookup {
                email: Some("  ".into()),
                ..UserLookup::default()
            })
            .await
            .unwrap_err();
        assert_matches!(err, DbError::Core(CoreError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn find_by_login_accepts_username_or_email() {
        let repo = repo();
        let jane = repo.create(&new_user("jane")).await.unwrap();

        assert_eq!(repo.find_by_login("jane").await.unwrap().unwrap().id, jane.id);
        assert_eq!(
            repo.find_by_login("Jane@Hotel.test").await.unwrap().unwrap().id,
            jane.id
        );
        assert!(repo.find_by_login("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_ignores_placeholder_fields() {
        let repo = repo();
        let jane = repo.create(&new_user("jane")).await.unwrap();

        let updated = repo
            .update(&UpdateUser {
                id: jane.id,
                full_name: Some("Jane Smith".into()),
                username: Some("string".into()),
                phone: Some(String::new()),
                ..UpdateUser::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.full_name, "Jane Smith");
        assert_eq!(updated.username, "jane");
        assert_eq!(updated.phone, jane.phone);
        assert!(updated.updated_at >= jane.updated_at);
    }

    #[tokio::test]
    async fn set_status_activates_account() {
        let repo = repo();
        let jane = repo.create(&new_user("jane")).await.unwrap();
        let active = repo.set_status(jane.id, STATUS_ACTIVE).await.unwrap();
        assert_eq!(active.status, STATUS_ACTIVE);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let repo = repo();
        repo.create(&new_user("jane")).await.unwrap();
        let mut again = new_user("jane");
        again.email = "other@hotel.test".into();
        let err = repo.create(&again).await.unwrap_err();
        assert_matches!(err, DbError::Duplicate { column: "username", .. });
    }
}
