//! User service (registration, login, token auth, profile).

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use snapfeed_common::{AppError, AppResult, IdGenerator};
use snapfeed_db::{entities::user, repositories::UserRepository};
use validator::Validate;

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for updating a user profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserInput {
    #[validate(email)]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 128))]
    pub password: Option<String>,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        // Check if email is taken
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let user_id = self.id_gen.generate();
        let token = self.id_gen.generate_token();

        let model = user::ActiveModel {
            id: Set(user_id),
            email: Set(input.email),
            password_hash: Set(password_hash),
            token: Set(Some(token)),
            is_active: Set(true),
            is_verified: Set(false),
            verify_token: Set(None),
            reset_token: Set(None),
            created_at: Set(Utc::now().into()),
        };

        self.user_repo.create(model).await
    }

    /// Authenticate by email and password, returning the account.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        Ok(user)
    }

    /// Resolve a bearer token to its user. Backs the required-auth routes.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Update profile fields (email, password).
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(id).await?;

        let mut model: user::ActiveModel = user.into();

        if let Some(email) = input.email {
            // A changed email must be re-verified
            if let Some(existing) = self.user_repo.find_by_email(&email).await? {
                if existing.id != id {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
            }
            model.email = Set(email);
            model.is_verified = Set(false);
        }

        if let Some(password) = input.password {
            model.password_hash = Set(hash_password(&password)?);
        }

        self.user_repo.update(model).await
    }

    /// Issue an email verification token.
    ///
    /// Token delivery is delegated to an external channel; it is logged here.
    pub async fn request_verify_token(&self, user: user::Model) -> AppResult<()> {
        if user.is_verified {
            return Err(AppError::BadRequest("Account already verified".to_string()));
        }

        let token = self.id_gen.generate_token();
        tracing::info!(user_id = %user.id, token = %token, "Issued verification token");

        let mut model: user::ActiveModel = user.into();
        model.verify_token = Set(Some(token));
        self.user_repo.update(model).await?;

        Ok(())
    }

    /// Confirm an email verification token.
    pub async fn verify(&self, token: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_verify_token(token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid verification token".to_string()))?;

        let mut model: user::ActiveModel = user.into();
        model.is_verified = Set(true);
        model.verify_token = Set(None);
        self.user_repo.update(model).await
    }

    /// Issue a password reset token for the given email.
    ///
    /// Unknown emails are not revealed to the caller.
    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = self.id_gen.generate_token();
        tracing::info!(user_id = %user.id, token = %token, "Issued password reset token");

        let mut model: user::ActiveModel = user.into();
        model.reset_token = Set(Some(token));
        self.user_repo.update(model).await?;

        Ok(())
    }

    /// Reset the password using a previously issued token.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> AppResult<()> {
        if new_password.len() < 8 {
            return Err(AppError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let user = self
            .user_repo
            .find_by_reset_token(token)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid reset token".to_string()))?;

        let mut model: user::ActiveModel = user.into();
        model.password_hash = Set(hash_password(new_password)?);
        model.reset_token = Set(None);
        // Invalidate the bearer token so existing sessions re-authenticate
        model.token = Set(None);
        self.user_repo.update(model).await?;

        Ok(())
    }
}

/// Hash a password with Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str, email: &str, password: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: hash_password(password).unwrap(),
            token: Some(format!("token-{id}")),
            is_active: true,
            is_verified: false,
            verify_token: None,
            reset_token: None,
            created_at: Utc::now().into(),
        }
    }

    // Unit tests for password functions
    #[test]
    fn test_hash_password() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password_correct() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("right-password").unwrap();

        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let existing = create_test_user("u1", "alice@example.com", "password123");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[existing]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service
            .register(RegisterInput {
                email: "alice@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = UserService::new(UserRepository::new(db));
        let result = service
            .register(RegisterInput {
                email: "bob@example.com".to_string(),
                password: "short".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let user = create_test_user("u1", "alice@example.com", "password123");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.login("alice@example.com", "wrong-password").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_login_inactive_account() {
        let mut user = create_test_user("u1", "alice@example.com", "password123");
        user.is_active = false;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.login("alice@example.com", "password123").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_login_success() {
        let user = create_test_user("u1", "alice@example.com", "password123");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.login("alice@example.com", "password123").await.unwrap();

        assert_eq!(result.id, "u1");
    }

    #[tokio::test]
    async fn test_authenticate_by_token_miss_is_unauthorized() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.authenticate_by_token("bogus").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_verify_flips_flag() {
        let mut user = create_test_user("u1", "alice@example.com", "password123");
        user.verify_token = Some("vtoken".to_string());

        let mut verified = user.clone();
        verified.is_verified = true;
        verified.verify_token = None;

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![user], vec![verified]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.verify("vtoken").await.unwrap();

        assert!(result.is_verified);
        assert!(result.verify_token.is_none());
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_is_silent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let service = UserService::new(UserRepository::new(db));
        let result = service.forgot_password("nobody@example.com").await;

        assert!(result.is_ok());
    }
}
