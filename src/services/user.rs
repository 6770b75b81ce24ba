use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use uuid::Uuid;

use crate::{
    auth::{AuthUser, issue_token},
    config::AppConfig,
    error::{AppError, Result},
    models::{
        LoginUserRequest, RegisterUserRequest, TokenResponse, UpdateUserRequest, User,
        UserResponse,
    },
    repository::{Repository, RepositoryError},
    validation::validate,
};

fn user_not_found() -> AppError {
    AppError::NotFound("user is not found".to_string())
}

fn wrong_credentials() -> AppError {
    AppError::Unauthorized("Username or password wrong".to_string())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored hash. An unparseable hash counts as a mismatch.
fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// UserService
///
/// Registration, login/logout and profile management. Login issues a session token
/// bound to a fresh session id; logout clears the id, revoking the token.
pub struct UserService<'a> {
    repo: &'a dyn Repository,
    config: &'a AppConfig,
}

impl<'a> UserService<'a> {
    pub fn new(repo: &'a dyn Repository, config: &'a AppConfig) -> Self {
        Self { repo, config }
    }

    /// register
    ///
    /// # Errors
    /// `BadRequest("Username already exists")` if the username is taken, including when a
    /// concurrent registration wins the race after the count check.
    pub async fn register(&self, request: RegisterUserRequest) -> Result<UserResponse> {
        let new_user = validate(request)?;

        if self.repo.count_users(&new_user.username).await? != 0 {
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        let user = User {
            password: hash_password(&new_user.password)?,
            username: new_user.username,
            name: new_user.name,
            token: None,
        };

        let created = self.repo.create_user(user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AppError::BadRequest("Username already exists".to_string())
            }
            other => AppError::Repository(other),
        })?;
        tracing::info!(username = %created.username, "user registered");
        Ok(created.into())
    }

    /// login
    ///
    /// Unknown usernames and wrong passwords produce the same error.
    pub async fn login(&self, request: LoginUserRequest) -> Result<TokenResponse> {
        let credentials = validate(request)?;

        let user = self
            .repo
            .find_user(&credentials.username)
            .await?
            .ok_or_else(wrong_credentials)?;

        if !verify_password(&credentials.password, &user.password) {
            tracing::debug!(username = %user.username, "login rejected");
            return Err(wrong_credentials());
        }

        let session_id = Uuid::new_v4().to_string();
        self.repo
            .set_user_token(&user.username, Some(session_id.clone()))
            .await?;

        let token = issue_token(self.config, &user.username, &session_id)?;
        tracing::info!(username = %user.username, "user logged in");
        Ok(TokenResponse { token })
    }

    pub async fn get(&self, user: &AuthUser) -> Result<UserResponse> {
        self.repo
            .find_user(&user.username)
            .await?
            .map(UserResponse::from)
            .ok_or_else(user_not_found)
    }

    /// update
    ///
    /// Partial: only the provided name and/or password change.
    pub async fn update(
        &self,
        user: &AuthUser,
        request: UpdateUserRequest,
    ) -> Result<UserResponse> {
        let changes = validate(request)?;

        if self.repo.count_users(&user.username).await? != 1 {
            return Err(user_not_found());
        }

        let password_hash = changes
            .password
            .as_deref()
            .map(hash_password)
            .transpose()?;

        let updated = self
            .repo
            .update_user(&user.username, changes.name, password_hash)
            .await?
            .ok_or_else(user_not_found)?;
        Ok(updated.into())
    }

    pub async fn logout(&self, user: &AuthUser) -> Result<()> {
        if !self.repo.set_user_token(&user.username, None).await? {
            return Err(user_not_found());
        }
        tracing::info!(username = %user.username, "user logged out");
        Ok(())
    }
}
