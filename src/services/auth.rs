//! Staff authentication service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};

use crate::{
    config::{AuthConfig, BootstrapConfig},
    error::{AppError, AppResult},
    models::account::{Account, AccountRole, UserClaims},
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Check credentials and issue a signed token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, Account)> {
        let account = self
            .repository
            .accounts
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !account.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        if !verify_password(&account.password_hash, password)? {
            tracing::warn!("Failed login for {}", account.username);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.create_token(&account)?;
        self.repository.accounts.touch_last_login(account.id).await?;
        tracing::info!("Login: {} ({})", account.username, account.role);

        Ok((token, account))
    }

    /// Decode and check a token
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))
    }

    /// Decode a token and confirm its account still exists and is active.
    /// The role is taken from the account, not the token.
    pub async fn verify_session(&self, token: &str) -> AppResult<UserClaims> {
        let claims = self.verify_token(token)?;

        let account = match self.repository.accounts.get_by_id(claims.account_id).await {
            Ok(account) => account,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Account no longer exists".to_string()))
            }
            Err(e) => return Err(e),
        };

        if !account.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        Ok(UserClaims {
            sub: account.username,
            role: account.role,
            ..claims
        })
    }

    pub async fn get_account(&self, id: i32) -> AppResult<Account> {
        self.repository.accounts.get_by_id(id).await
    }

    /// Create the configured admin account unless it already exists
    pub async fn ensure_bootstrap_admin(&self, bootstrap: &BootstrapConfig) -> AppResult<Option<Account>> {
        let (Some(username), Some(password)) = (&bootstrap.admin_username, &bootstrap.admin_password) else {
            return Ok(None);
        };

        if self.repository.accounts.get_by_username(username).await?.is_some() {
            return Ok(None);
        }

        let hash = hash_password(password)?;
        let account = self
            .repository
            .accounts
            .create(username, &hash, AccountRole::Admin)
            .await?;
        tracing::info!("Bootstrap admin account created: {}", account.username);
        Ok(Some(account))
    }

    fn create_token(&self, account: &Account) -> AppResult<String> {
        let now = Utc::now();
        // capped at a year
        let hours = self.config.jwt_expiration_hours.min(24 * 365) as i64;
        let claims = UserClaims {
            sub: account.username.clone(),
            account_id: account.id,
            role: account.role,
            exp: (now + Duration::hours(hours)).timestamp(),
            iat: now.timestamp(),
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
