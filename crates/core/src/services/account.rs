//! Account lifecycle: signup, login, password reset.

use crate::services::mailer::MailerService;
use crate::services::token::{TokenPair, TokenService};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::{password_reset, user};
use quill_db::repositories::{PasswordResetRepository, UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use validator::Validate;

/// Signup request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupInput {
    /// Desired username.
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    /// Email address, unique per account.
    #[validate(email)]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// Password confirmation, must match `password`.
    pub password2: String,
    /// Optional first name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Optional last name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Password reset confirmation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetConfirmInput {
    /// Email of the account being reset.
    #[validate(email)]
    pub email: String,
    /// Token from the reset email.
    pub token: String,
    /// New password.
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    /// New password confirmation.
    pub password2: String,
}

/// Account service for signup, login, and password resets.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    reset_repo: PasswordResetRepository,
    tokens: TokenService,
    mailer: MailerService,
    reset_ttl_secs: i64,
    id_gen: IdGenerator,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        reset_repo: PasswordResetRepository,
        tokens: TokenService,
        mailer: MailerService,
        reset_ttl_secs: i64,
    ) -> Self {
        Self {
            user_repo,
            reset_repo,
            tokens,
            mailer,
            reset_ttl_secs,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account.
    pub async fn signup(&self, input: SignupInput) -> AppResult<user::Model> {
        input.validate()?;

        if input.password != input.password2 {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        if self
            .user_repo
            .find_by_username(&input.username)
            .await?
            .is_some()
        {
            return Err(AppError::Validation(
                "username: already taken".to_string(),
            ));
        }

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Validation(
                "email: already registered".to_string(),
            ));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            password_hash: Set(hash_password(&input.password)?),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            is_active: Set(true),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User signed up");
        Ok(user)
    }

    /// Authenticate by email and password, issuing a token pair.
    ///
    /// Bad credentials and deactivated accounts both map to the same
    /// error so the response does not leak which one it was.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(user::Model, TokenPair)> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? || !user.is_active {
            return Err(AppError::Unauthorized);
        }

        let pair = self.tokens.issue_pair(&user.id)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, pair))
    }

    /// Exchange a refresh token for a new token pair.
    pub fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        self.tokens.refresh(refresh_token)
    }

    /// Start a password reset: store a hashed single-use token and mail
    /// the raw token to the account's email.
    pub async fn request_password_reset(&self, email: &str) -> AppResult<()> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::Validation("No account with this email".to_string()))?;

        let token = self.id_gen.generate_token();
        let model = password_reset::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user.id.clone()),
            token_hash: Set(hash_token(&token)),
            expires_at: Set((Utc::now() + Duration::seconds(self.reset_ttl_secs)).into()),
            used: Set(false),
            created_at: Set(Utc::now().into()),
        };
        self.reset_repo.create(model).await?;

        if let Err(e) = self
            .mailer
            .send_password_reset(&user.email, &user.username, &token)
            .await
        {
            tracing::warn!(error = %e, user_id = %user.id, "Failed to send reset email");
        }

        tracing::info!(user_id = %user.id, "Password reset requested");
        Ok(())
    }

    /// Complete a password reset with a mailed token.
    pub async fn confirm_password_reset(&self, input: ResetConfirmInput) -> AppResult<()> {
        input.validate()?;

        if input.password != input.password2 {
            return Err(AppError::Validation("Passwords do not match".to_string()));
        }

        let user = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let reset = self
            .reset_repo
            .find_valid(&user.id, &hash_token(&input.token))
            .await?
            .ok_or_else(|| AppError::BadRequest("Invalid or expired reset token".to_string()))?;

        let model = user::ActiveModel {
            id: Set(user.id.clone()),
            password_hash: Set(hash_password(&input.password)?),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.user_repo.update(model).await?;
        self.reset_repo.mark_used(&reset.id).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }
}

/// Hash a password with Argon2id.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a stored Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// SHA-256 digest of a reset token, hex-encoded. Only the digest is stored.
fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
