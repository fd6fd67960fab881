use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::user::models::NewUser;
use crate::domain::user::models::Profile;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Process-local user store.
///
/// Used by tests and when no database is configured. Every write takes the
/// single lock, so the email uniqueness check and the insert are atomic.
pub struct InMemoryUserRepository {
    state: RwLock<MemoryState>,
}

struct MemoryState {
    users: HashMap<UserId, User>,
    next_id: i64,
}

impl MemoryState {
    fn email_owner(&self, email: &str) -> Option<UserId> {
        self.users
            .values()
            .find(|user| user.email.as_str() == email)
            .map(|user| user.id)
    }
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                users: HashMap::new(),
                next_id: 1,
            }),
        }
    }
}

impl Default for InMemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, UserError> {
        let mut state = self.state.write().await;

        if state.email_owner(user.email.as_str()).is_some() {
            return Err(UserError::EmailTaken(user.email.to_string()));
        }

        let id = UserId(state.next_id);
        state.next_id += 1;

        let created = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            profile: user.profile,
            refresh_generation: 0,
            created_at: Utc::now(),
        };
        state.users.insert(id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| user.email.as_str() == email)
            .cloned())
    }

    async fn update_profile(&self, id: &UserId, profile: &Profile) -> Result<User, UserError> {
        let mut state = self.state.write().await;

        let stored = state
            .users
            .get_mut(id)
            .ok_or_else(|| UserError::UserNotFound(id.to_string()))?;
        stored.profile = profile.clone();

        Ok(stored.clone())
    }

    async fn set_password_hash(
        &self,
        id: &UserId,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, UserError> {
        let mut state = self.state.write().await;

        match state.users.get_mut(id) {
            Some(user) if user.password_hash == expected_hash => {
                user.password_hash = new_hash.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn advance_refresh_generation(
        &self,
        id: &UserId,
        expected: i64,
    ) -> Result<bool, UserError> {
        let mut state = self.state.write().await;

        match state.users.get_mut(id) {
            Some(user) if user.refresh_generation == expected => {
                user.refresh_generation += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
