use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use shared::config::LiveConfig;
use shared::types::{CreateUserRequest, GameClaims, LoginData, LoginResponse, UserView};

use crate::auth::{Policy, TokenIssuer, authorize};
use crate::database::users::{self, NewUser};
use crate::database::{
    generate_uuid, get_timestamp, hash_password, is_strong_password, is_valid_email,
    is_valid_username, sanitize_string, stats, verify_password,
};
use crate::error::{ServiceError, ServiceResult, is_unique_violation, storage};

pub const NAME_TAKEN: &str = "User with such name already exists";
pub const EMAIL_TAKEN: &str = "User with such email already exists";
pub const INVALID_LOGIN: &str = "Invalid login/password";
pub const USER_NOT_FOUND: &str = "Could not find user";
pub const NON_MVP: &str = "Non-MVP endpoint";

/// Accounts, login and currency grants (`ledger.rs`).
#[derive(Clone, Debug)]
pub struct UsersService {
    pub(crate) db: SqlitePool,
    config: LiveConfig,
    issuer: TokenIssuer,
}

impl UsersService {
    pub fn new(db: SqlitePool, config: LiveConfig, issuer: TokenIssuer) -> Self {
        Self { db, config, issuer }
    }

    /// Register a user with empty balances and zeroed stats.
    pub async fn create_user(&self, req: &CreateUserRequest) -> ServiceResult<UserView> {
        let name = sanitize_string(&req.name);
        let email = sanitize_string(&req.email);
        debug!("User registration started for '{}'", name);

        if !is_valid_username(&name) {
            return Err(ServiceError::invalid(
                "Username must be 3-20 characters of letters, digits or underscores",
            ));
        }
        if !is_valid_email(&email) {
            return Err(ServiceError::invalid("Invalid email address"));
        }
        if !is_strong_password(&req.password) {
            return Err(ServiceError::invalid(
                "Password must be at least 8 characters with a letter and a digit",
            ));
        }

        if users::name_exists(&self.db, &name)
            .await
            .map_err(|e| storage("Could not create new user", e))?
        {
            warn!("{}: '{}'", NAME_TAKEN, name);
            return Err(ServiceError::invalid(NAME_TAKEN));
        }
        if users::email_exists(&self.db, &email)
            .await
            .map_err(|e| storage("Could not create new user", e))?
        {
            warn!("{}: '{}'", EMAIL_TAKEN, email);
            return Err(ServiceError::invalid(EMAIL_TAKEN));
        }

        let password_hash = hash_password(&req.password).map_err(|e| {
            error!("Failed to hash password: {:#}", e);
            ServiceError::Internal("Could not create new user".into())
        })?;

        let new_user = NewUser {
            id: generate_uuid(),
            name,
            email,
            password_hash,
            created_at: get_timestamp(),
        };

        let mut tx = self
            .db
            .begin()
            .await
            .map_err(|e| storage("Could not create new user", e))?;

        let inserted = users::insert_user(&mut *tx, &new_user).await;
        if let Err(e) = inserted {
            if !is_unique_violation(&e) {
                return Err(storage("Could not create new user", e));
            }
            warn!("Registration of '{}' raced with another", new_user.name);
            tx.rollback()
                .await
                .map_err(|e| storage("Could not create new user", e))?;

            // Name is checked first, as above.
            let name_taken = users::name_exists(&self.db, &new_user.name)
                .await
                .map_err(|e| storage("Could not create new user", e))?;
            return Err(ServiceError::invalid(if name_taken {
                NAME_TAKEN
            } else {
                EMAIL_TAKEN
            }));
        }
        stats::insert_stats(&mut *tx, &new_user.id)
            .await
            .map_err(|e| storage("Could not create new user", e))?;

        tx.commit()
            .await
            .map_err(|e| storage("Could not create new user", e))?;

        let user = users::get_user_by_id(&self.db, &new_user.id)
            .await
            .map_err(|e| storage("Could not create new user", e))?
            .ok_or_else(|| ServiceError::Internal("Could not create new user".into()))?;

        debug!("User registration finished for {}", user.id);
        Ok(user.to_view())
    }

    /// Read a user by id, name or email.
    pub async fn read_user(&self, claims: &GameClaims, identifier: &str) -> ServiceResult<UserView> {
        debug!("Read user '{}'", identifier);
        authorize(claims, Policy::SelfByIdentifierOrAdmin, identifier)?;

        self.find(identifier).await.map(|user| user.to_view())
    }

    /// Deleting a missing user is not an error.
    pub async fn delete_user(&self, claims: &GameClaims, user_id: &str) -> ServiceResult<()> {
        debug!("Delete user {}", user_id);
        authorize(claims, Policy::SelfOrAdmin, user_id)?;

        users::delete_user(&self.db, user_id)
            .await
            .map_err(|e| storage("Could not delete user", e))?;
        Ok(())
    }

    pub async fn update_user(&self, user_id: &str) -> ServiceResult<UserView> {
        debug!("Update user {}", user_id);
        Err(ServiceError::Unimplemented(NON_MVP.into()))
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<UserView>> {
        debug!("List users");
        Err(ServiceError::Unimplemented(NON_MVP.into()))
    }

    /// Check credentials and hand out a signed token.
    pub async fn login(&self, data: &LoginData) -> ServiceResult<LoginResponse> {
        debug!("Login attempt for '{}'", data.id);

        let user = match users::find_user_by_identifier(&self.db, &data.id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Login failed - no user '{}'", data.id);
                return Err(ServiceError::invalid(INVALID_LOGIN));
            }
            Err(e) => {
                error!("Login failed for '{}': {}", data.id, e);
                return Err(ServiceError::invalid(INVALID_LOGIN));
            }
        };

        let password_valid = verify_password(&user.password, &data.password).unwrap_or_else(|e| {
            error!("Password verification error for {}: {:#}", user.id, e);
            false
        });
        if !password_valid {
            warn!("Login failed - wrong password for {}", user.id);
            return Err(ServiceError::invalid(INVALID_LOGIN));
        }

        let auth = self.config.read().await.auth.clone();
        let (token, expires_at) = self.issuer.issue_for_user(&user, &auth).map_err(|e| {
            error!("Failed to sign claims for {}: {:#}", user.id, e);
            ServiceError::Internal("Unable to login".into())
        })?;

        info!("Login successful for user: {} (ID: {})", user.name, user.id);
        Ok(LoginResponse {
            token,
            expires_at,
            is_admin: user.is_admin,
        })
    }

    /// Grant the admin flag. Used by the `promote` command.
    pub async fn promote(&self, identifier: &str) -> ServiceResult<UserView> {
        let user = self.find(identifier).await?;
        users::promote_user(&self.db, &user.id)
            .await
            .map_err(|e| storage("Could not promote user", e))?;
        info!("User {} ({}) is now an admin", user.name, user.id);
        self.find(&user.id).await.map(|user| user.to_view())
    }

    /// Sign a token with the service audience. Used by the `service-token`
    /// command.
    pub async fn service_token(&self, name: &str, ttl_secs: i64) -> ServiceResult<(String, i64)> {
        if name.trim().is_empty() || ttl_secs <= 0 {
            return Err(ServiceError::invalid(
                "Service name and a positive lifetime are required",
            ));
        }
        let auth = self.config.read().await.auth.clone();
        self.issuer
            .issue_for_service(name, &auth, ttl_secs)
            .map_err(|e| {
                error!("Failed to sign service token for {}: {:#}", name, e);
                ServiceError::Internal("Could not sign token".into())
            })
    }

    async fn find(&self, identifier: &str) -> ServiceResult<users::User> {
        users::find_user_by_identifier(&self.db, identifier)
            .await
            .map_err(|e| storage(USER_NOT_FOUND, e))?
            .ok_or_else(|| {
                warn!("Could not find user by any criteria: '{}'", identifier);
                ServiceError::not_found(USER_NOT_FOUND)
            })
    }
}
