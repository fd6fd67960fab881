use async_trait::async_trait;
use auth::TokenPair;

use crate::domain::user::models::ChangePasswordCommand;
use crate::domain::user::models::NewUser;
use crate::domain::user::models::Profile;
use crate::domain::user::models::RegisterUserCommand;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;

/// Port for account domain service operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new user.
    ///
    /// # Arguments
    /// * `command` - Validated command containing email, password, and profile
    ///
    /// # Returns
    /// Created user entity with its store-assigned id
    ///
    /// # Errors
    /// * `EmailTaken` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn register(&self, command: RegisterUserCommand) -> Result<User, UserError>;

    /// Check credentials and issue an access/refresh token pair.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown email or wrong password (not distinguished)
    /// * `DatabaseError` - Database operation failed
    async fn login(&self, email: &str, password: &str) -> Result<TokenPair, UserError>;

    /// Exchange a refresh token for a new pair, rotating the refresh token.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is invalid, expired, superseded, or its user is gone
    /// * `DatabaseError` - Database operation failed
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Update profile fields of an existing user.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `InvalidProfile` - A provided field is invalid
    /// * `DatabaseError` - Database operation failed
    async fn update_user(&self, id: &UserId, command: UpdateUserCommand)
        -> Result<User, UserError>;

    /// Replace the password after checking the current one.
    ///
    /// Issued tokens stay valid until they expire.
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `WrongCurrentPassword` - Current password does not match
    /// * `PasswordUnchanged` - New password matches the current hash
    /// * `DatabaseError` - Database operation failed
    async fn change_password(
        &self,
        id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), UserError>;
}

/// Persistence operations for user aggregate.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Persist a new user, assigning its id.
    ///
    /// Email uniqueness is enforced here atomically with the insert.
    ///
    /// # Errors
    /// * `EmailTaken` - Email is already registered
    /// * `DatabaseError` - Database operation failed
    async fn create(&self, user: NewUser) -> Result<User, UserError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;

    /// Retrieve user by exact (case-sensitive) email.
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    /// Replace the profile fields of an existing user.
    ///
    /// Email, password hash and refresh generation are left untouched.
    ///
    /// # Returns
    /// The user as stored after the write
    ///
    /// # Errors
    /// * `UserNotFound` - User does not exist
    /// * `DatabaseError` - Database operation failed
    async fn update_profile(&self, id: &UserId, profile: &Profile) -> Result<User, UserError>;

    /// Replace the password hash if it still equals `expected_hash`.
    ///
    /// # Returns
    /// True when this call wrote `new_hash`, false when the stored hash had
    /// already changed or the user no longer exists
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn set_password_hash(
        &self,
        id: &UserId,
        expected_hash: &str,
        new_hash: &str,
    ) -> Result<bool, UserError>;

    /// Advance the refresh generation if it still equals `expected`.
    ///
    /// # Returns
    /// True when this call performed the advance, false when the generation
    /// had already moved or the user no longer exists
    ///
    /// # Errors
    /// * `DatabaseError` - Database operation failed
    async fn advance_refresh_generation(
        &self,
        id: &UserId,
        expected: i64,
    ) -> Result<bool, UserError>;
}
