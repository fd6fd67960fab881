use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use auth::AuthenticationError;
use auth::TokenPair;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::AccountServicePort;
use crate::user::ports::UserRepository;

/// Domain service implementation for account operations.
///
/// Stateless apart from injected dependencies; safe to share across requests.
pub struct AccountService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
    authenticator: Arc<Authenticator>,
}

impl<UR> AccountService<UR>
where
    UR: UserRepository,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    /// * `authenticator` - Configured password hasher and token issuer
    pub fn new(repository: Arc<UR>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            repository,
            authenticator,
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::UserNotFound(id.to_string()))
    }

    fn hash_password(&self, password: &str) -> Result<String, UserError> {
        self.authenticator
            .hash_password(password)
            .map_err(|e| UserError::Internal(format!("Password hashing failed: {}", e)))
    }
}

#[async_trait]
impl<UR> AccountServicePort for AccountService<UR>
where
    UR: UserRepository,
{
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError> {
        // Early exit only; the store constraint is what closes the race
        if self
            .repository
            .find_by_email(command.email.as_str())
            .await?
            .is_some()
        {
            return Err(UserError::EmailTaken(command.email.to_string()));
        }

        let password_hash = self.hash_password(&command.password)?;

        let user = self
            .repository
            .create(NewUser {
                email: command.email,
                password_hash,
                profile: command.profile,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, UserError> {
        let user = match self.repository.find_by_email(email).await? {
            Some(user) => user,
            None => {
                self.authenticator.verify_password(password, None);
                tracing::warn!("Login rejected: unknown account");
                return Err(UserError::InvalidCredentials);
            }
        };

        let pair = self
            .authenticator
            .authenticate(
                password,
                Some(&user.password_hash),
                &user.token_identity(),
                user.refresh_generation,
            )
            .map_err(|e| match e {
                AuthenticationError::InvalidCredentials => {
                    tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
                    UserError::InvalidCredentials
                }
                AuthenticationError::JwtError(err) => {
                    UserError::Internal(format!("Token generation failed: {}", err))
                }
            })?;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(pair)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, UserError> {
        let claims = self
            .authenticator
            .verify_refresh(refresh_token)
            .map_err(|e| {
                tracing::warn!(reason = %e, "Refresh rejected");
                UserError::InvalidToken
            })?;

        let user_id = UserId(claims.id);
        let user = self.repository.find_by_id(&user_id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %user_id, "Refresh rejected: account no longer exists");
            UserError::InvalidToken
        })?;

        let generation = match claims.gen {
            Some(generation) if generation == user.refresh_generation => generation,
            _ => {
                tracing::warn!(
                    user_id = %user.id,
                    token_generation = ?claims.gen,
                    current_generation = user.refresh_generation,
                    "Refresh rejected: token superseded"
                );
                return Err(UserError::InvalidToken);
            }
        };

        if !self
            .repository
            .advance_refresh_generation(&user.id, generation)
            .await?
        {
            tracing::warn!(user_id = %user.id, "Refresh rejected: concurrent rotation");
            return Err(UserError::InvalidToken);
        }

        let pair = self
            .authenticator
            .issue_pair(&user.token_identity(), generation + 1)
            .map_err(|e| UserError::Internal(format!("Token generation failed: {}", e)))?;

        tracing::info!(user_id = %user.id, generation = generation + 1, "Refresh token rotated");

        Ok(pair)
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.require_user(id).await
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        let user = self.require_user(id).await?;

        let profile = user.profile.patched(command)?;

        let updated_user = self.repository.update_profile(&user.id, &profile).await?;

        tracing::info!(user_id = %updated_user.id, "User profile updated");

        Ok(updated_user)
    }

    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError> {
        let user = self.require_user(id).await?;

        if !self
            .authenticator
            .verify_password(&command.current_password, Some(&user.password_hash))
        {
            tracing::warn!(user_id = %user.id, "Password change rejected: wrong current password");
            return Err(UserError::WrongCurrentPassword);
        }

        // Reuse is detected against the stored hash, not by comparing plaintexts
        if self
            .authenticator
            .verify_password(&command.new_password, Some(&user.password_hash))
        {
            return Err(UserError::PasswordUnchanged);
        }

        let new_hash = self.hash_password(&command.new_password)?;

        // Only succeeds against the hash the current password was checked on
        if !self
            .repository
            .set_password_hash(&user.id, &user.password_hash, &new_hash)
            .await?
        {
            tracing::warn!(user_id = %user.id, "Password change rejected: password changed concurrently");
            return Err(UserError::WrongCurrentPassword);
        }

        tracing::info!(user_id = %id, "Password changed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use auth::PasswordHasher;
    use auth::TokenSettings;
    use chrono::Utc;
    use mockall::mock;
    use tokio::sync::oneshot;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::Profile;
    use crate::outbound::repositories::InMemoryUserRepository;

    // Define mocks in the test module using mockall
    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: NewUser) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
            async fn update_profile(&self, id: &UserId, profile: &Profile) -> Result<User, UserError>;
            async fn set_password_hash(&self, id: &UserId, expected_hash: &str, new_hash: &str) -> Result<bool, UserError>;
            async fn advance_refresh_generation(&self, id: &UserId, expected: i64) -> Result<bool, UserError>;
        }
    }

    fn authenticator() -> Arc<Authenticator> {
        let settings =
            TokenSettings::new("test-secret-key-for-jwt-signing-at-least-32-bytes", "HS256", 15, 10080)
                .unwrap();
        Arc::new(Authenticator::new(settings))
    }

    fn profile() -> Profile {
        Profile::new(
            "Ada".to_string(),
            "Lovelace".to_string(),
            "London".to_string(),
            Some("The Castle".to_string()),
            "bouldering".to_string(),
        )
        .unwrap()
    }

    fn stored_user(id: i64, email: &str, password: &str, generation: i64) -> User {
        User {
            id: UserId(id),
            email: EmailAddress::new(email.to_string()).unwrap(),
            password_hash: PasswordHasher::new().hash(password).unwrap(),
            profile: profile(),
            refresh_generation: generation,
            created_at: Utc::now(),
        }
    }

    fn register_command(email: &str, password: &str) -> RegisterUserCommand {
        RegisterUserCommand::new(
            EmailAddress::new(email.to_string()).unwrap(),
            password.to_string(),
            profile(),
        )
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .withf(|email| email == "a@x.com")
            .times(1)
            .returning(|_| Ok(None));

        repository
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "a@x.com"
                    && user.password_hash.starts_with("$argon2")
                    && user.password_hash != "pw1"
            })
            .times(1)
            .returning(|user| {
                Ok(User {
                    id: UserId(1),
                    email: user.email,
                    password_hash: user.password_hash,
                    profile: user.profile,
                    refresh_generation: 0,
                    created_at: Utc::now(),
                })
            });

        let service = AccountService::new(Arc::new(repository), authenticator());

        let user = service
            .register(register_command("a@x.com", "pw1"))
            .await
            .expect("Registration failed");

        assert_eq!(user.id, UserId(1));
        assert_eq!(user.email.as_str(), "a@x.com");
        assert_eq!(user.profile.home_gym(), Some("The Castle"));
        // Password is hashed with real Argon2
        assert!(PasswordHasher::new().verify("pw1", &user.password_hash));
    }

    #[tokio::test]
    async fn test_register_existing_email() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(stored_user(1, "a@x.com", "pw1", 0))));
        repository.expect_create().times(0);

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service.register(register_command("a@x.com", "pw2")).await;
        assert!(matches!(result, Err(UserError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_register_lost_race_reports_email_taken() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));
        repository
            .expect_create()
            .times(1)
            .returning(|user| Err(UserError::EmailTaken(user.email.to_string())));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service.register(register_command("a@x.com", "pw2")).await;
        assert!(matches!(result, Err(UserError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_email()
            .withf(|email| email == "a@x.com")
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let authenticator = authenticator();
        let service = AccountService::new(Arc::new(repository), Arc::clone(&authenticator));

        let pair = service.login("a@x.com", "pw1").await.expect("Login failed");
        assert_eq!(pair.token_type, "bearer");

        let access = authenticator.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.id, 5);
        assert_eq!(access.sub, "a@x.com");

        let refresh = authenticator.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.id, 5);
        assert_eq!(refresh.sub, "a@x.com");
        assert_eq!(refresh.gen, Some(0));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_email()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service.login("a@x.com", "wrong").await;
        assert!(matches!(result, Err(UserError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_indistinguishable() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let err = service.login("nobody@x.com", "pw1").await.unwrap_err();
        assert!(matches!(err, UserError::InvalidCredentials));
        assert_eq!(err.to_string(), UserError::InvalidCredentials.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rotates_generation() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_id()
            .withf(|id| *id == UserId(5))
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_advance_refresh_generation()
            .withf(|id, expected| *id == UserId(5) && *expected == 0)
            .times(1)
            .returning(|_, _| Ok(true));

        let authenticator = authenticator();
        let original = authenticator
            .issue_pair(&auth::TokenIdentity::new("a@x.com", 5), 0)
            .unwrap();

        let service = AccountService::new(Arc::new(repository), Arc::clone(&authenticator));

        let pair = service
            .refresh(&original.refresh_token)
            .await
            .expect("Refresh failed");

        let access = authenticator.verify_access(&pair.access_token).unwrap();
        assert_eq!(access.identity(), auth::TokenIdentity::new("a@x.com", 5));

        let refresh = authenticator.verify_refresh(&pair.refresh_token).unwrap();
        assert_eq!(refresh.gen, Some(1));
    }

    #[tokio::test]
    async fn test_refresh_with_superseded_token() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 1);

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_advance_refresh_generation().times(0);

        let authenticator = authenticator();
        let stale = authenticator
            .issue_pair(&auth::TokenIdentity::new("a@x.com", 5), 0)
            .unwrap();

        let service = AccountService::new(Arc::new(repository), authenticator);

        let result = service.refresh(&stale.refresh_token).await;
        assert!(matches!(result, Err(UserError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_account() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let authenticator = authenticator();
        let pair = authenticator
            .issue_pair(&auth::TokenIdentity::new("gone@x.com", 9), 0)
            .unwrap();

        let service = AccountService::new(Arc::new(repository), authenticator);

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(UserError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let mut repository = MockTestUserRepository::new();
        repository.expect_find_by_id().times(0);

        let authenticator = authenticator();
        let pair = authenticator
            .issue_pair(&auth::TokenIdentity::new("a@x.com", 5), 0)
            .unwrap();

        let service = AccountService::new(Arc::new(repository), authenticator);

        let result = service.refresh(&pair.access_token).await;
        assert!(matches!(result, Err(UserError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_refresh_lost_rotation_race() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_advance_refresh_generation()
            .times(1)
            .returning(|_, _| Ok(false));

        let authenticator = authenticator();
        let pair = authenticator
            .issue_pair(&auth::TokenIdentity::new("a@x.com", 5), 0)
            .unwrap();

        let service = AccountService::new(Arc::new(repository), authenticator);

        let result = service.refresh(&pair.refresh_token).await;
        assert!(matches!(result, Err(UserError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service.get_user(&UserId(404)).await;
        assert!(matches!(result, Err(UserError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_user_success() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);
        let stored = user.clone();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update_profile()
            .withf(|id, profile| {
                *id == UserId(5)
                    && profile.location() == "Paris"
                    && profile.home_gym().is_none()
                    && profile.first_name() == "Ada"
            })
            .times(1)
            .returning(move |_, profile| {
                let mut user = stored.clone();
                user.profile = profile.clone();
                Ok(user)
            });
        repository.expect_set_password_hash().times(0);

        let service = AccountService::new(Arc::new(repository), authenticator());

        let command = UpdateUserCommand {
            location: Some("Paris".to_string()),
            home_gym: Some(None),
            ..Default::default()
        };

        let updated = service
            .update_user(&UserId(5), command)
            .await
            .expect("Update failed");
        assert_eq!(updated.profile.location(), "Paris");
        assert_eq!(updated.profile.first_name(), "Ada");
    }

    #[tokio::test]
    async fn test_update_user_invalid_field() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_update_profile().times(0);

        let service = AccountService::new(Arc::new(repository), authenticator());

        let command = UpdateUserCommand {
            first_name: Some("x".repeat(51)),
            ..Default::default()
        };

        let result = service.update_user(&UserId(5), command).await;
        assert!(matches!(result, Err(UserError::InvalidProfile(_))));
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let result = service
            .update_user(&UserId(1), UpdateUserCommand::default())
            .await;
        assert!(matches!(result, Err(UserError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_change_password_success() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);
        let current_hash = user.password_hash.clone();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_set_password_hash()
            .withf(move |id, expected_hash, new_hash| {
                let hasher = PasswordHasher::new();
                *id == UserId(5)
                    && expected_hash == current_hash
                    && hasher.verify("pw2", new_hash)
                    && !hasher.verify("pw1", new_hash)
            })
            .times(1)
            .returning(|_, _, _| Ok(true));
        repository.expect_update_profile().times(0);

        let service = AccountService::new(Arc::new(repository), authenticator());

        let command = ChangePasswordCommand {
            current_password: "pw1".to_string(),
            new_password: "pw2".to_string(),
        };

        assert!(service.change_password(&UserId(5), command).await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_unchanged() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_set_password_hash().times(0);

        let service = AccountService::new(Arc::new(repository), authenticator());

        let command = ChangePasswordCommand {
            current_password: "pw1".to_string(),
            new_password: "pw1".to_string(),
        };

        let result = service.change_password(&UserId(5), command).await;
        assert!(matches!(result, Err(UserError::PasswordUnchanged)));
    }

    #[tokio::test]
    async fn test_change_password_wrong_current() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository.expect_set_password_hash().times(0);

        let service = AccountService::new(Arc::new(repository), authenticator());

        let command = ChangePasswordCommand {
            current_password: "nope".to_string(),
            new_password: "pw2".to_string(),
        };

        let result = service.change_password(&UserId(5), command).await;
        assert!(matches!(result, Err(UserError::WrongCurrentPassword)));
    }

    #[tokio::test]
    async fn test_change_password_lost_race_is_rejected() {
        let mut repository = MockTestUserRepository::new();
        let user = stored_user(5, "a@x.com", "pw1", 0);

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_set_password_hash()
            .times(1)
            .returning(|_, _, _| Ok(false));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let command = ChangePasswordCommand {
            current_password: "pw1".to_string(),
            new_password: "pw2".to_string(),
        };

        let result = service.change_password(&UserId(5), command).await;
        assert!(matches!(result, Err(UserError::WrongCurrentPassword)));
    }

    #[tokio::test]
    async fn test_change_password_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = AccountService::new(Arc::new(repository), authenticator());

        let command = ChangePasswordCommand {
            current_password: "pw1".to_string(),
            new_password: "pw2".to_string(),
        };

        let result = service.change_password(&UserId(5), command).await;
        assert!(matches!(result, Err(UserError::UserNotFound(_))));
    }

    /// In-memory store whose next `find_by_id` stops after reading until released.
    struct PausingRepository {
        inner: InMemoryUserRepository,
        pause: tokio::sync::Mutex<Option<(oneshot::Sender<()>, oneshot::Receiver<()>)>>,
    }

    impl PausingRepository {
        fn new() -> Self {
            Self {
                inner: InMemoryUserRepository::new(),
                pause: tokio::sync::Mutex::new(None),
            }
        }

        /// Returns a receiver signalled once a reader is paused, and the sender releasing it.
        async fn pause_next_read(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
            let (paused_tx, paused_rx) = oneshot::channel();
            let (release_tx, release_rx) = oneshot::channel();
            *self.pause.lock().await = Some((paused_tx, release_rx));
            (paused_rx, release_tx)
        }
    }

    #[async_trait]
    impl UserRepository for PausingRepository {
        async fn create(&self, user: NewUser) -> Result<User, UserError> {
            self.inner.create(user).await
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
            let user = self.inner.find_by_id(id).await;
            let pause = self.pause.lock().await.take();
            if let Some((paused, release)) = pause {
                let _ = paused.send(());
                let _ = release.await;
            }
            user
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
            self.inner.find_by_email(email).await
        }

        async fn update_profile(&self, id: &UserId, profile: &Profile) -> Result<User, UserError> {
            self.inner.update_profile(id, profile).await
        }

        async fn set_password_hash(
            &self,
            id: &UserId,
            expected_hash: &str,
            new_hash: &str,
        ) -> Result<bool, UserError> {
            self.inner
                .set_password_hash(id, expected_hash, new_hash)
                .await
        }

        async fn advance_refresh_generation(
            &self,
            id: &UserId,
            expected: i64,
        ) -> Result<bool, UserError> {
            self.inner.advance_refresh_generation(id, expected).await
        }
    }

    #[tokio::test]
    async fn test_profile_update_does_not_revert_concurrent_password_change() {
        let repository = Arc::new(PausingRepository::new());
        let service = Arc::new(AccountService::new(Arc::clone(&repository), authenticator()));

        let user = service
            .register(register_command("a@x.com", "pw1"))
            .await
            .unwrap();

        // update_user reads the account, then waits while the password changes
        let (paused, release) = repository.pause_next_read().await;
        let update = tokio::spawn({
            let service = Arc::clone(&service);
            let id = user.id;
            async move {
                let command = UpdateUserCommand {
                    location: Some("Paris".to_string()),
                    ..Default::default()
                };
                service.update_user(&id, command).await
            }
        });
        paused.await.unwrap();

        service
            .change_password(
                &user.id,
                ChangePasswordCommand {
                    current_password: "pw1".to_string(),
                    new_password: "pw2".to_string(),
                },
            )
            .await
            .expect("Password change failed");
        assert!(service.login("a@x.com", "pw2").await.is_ok());

        release.send(()).unwrap();
        let updated = update.await.unwrap().expect("Update failed");
        assert_eq!(updated.profile.location(), "Paris");

        assert!(service.login("a@x.com", "pw2").await.is_ok());
        assert!(matches!(
            service.login("a@x.com", "pw1").await,
            Err(UserError::InvalidCredentials)
        ));
    }
}
