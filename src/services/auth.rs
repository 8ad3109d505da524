//! Authenticator: registration, login, token validation and the role gate.
//!
//! The role gate only looks at [`AccessRole`]. Every owner passes it regardless
//! of [`SystemRole`], so Admin and Staff accounts have the same rights.

use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::metrics::record_login_failure;
use crate::crypto::{hash_password, verify_password, TokenClaims, TokenKeys};
use crate::db::{
    self, avatar_url, now_timestamp, AccessRole, AuthResponse, Customer, LoginRequest,
    RegisterRequest, SystemRole, UpdateProfileRequest, User, UserResponse,
};
use crate::DbPool;

use super::error::{is_unique_violation, ServiceError, ValidationErrorBuilder};
use super::validation::{
    normalize, validate_email, validate_password, validate_required_text,
};

/// The authenticated identity of one request
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub claims: TokenClaims,
}

pub struct Authenticator<'a> {
    db: &'a DbPool,
    tokens: &'a TokenKeys,
}

impl<'a> Authenticator<'a> {
    pub fn new(db: &'a DbPool, tokens: &'a TokenKeys) -> Self {
        Self { db, tokens }
    }

    /// Create a user and return it with a signed token.
    ///
    /// Customers also get a ledger entry keyed by their email, unless one already exists.
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        let name = normalize(req.name.as_deref());
        let email = normalize(req.email.as_deref());
        let access_role = normalize(req.access_role.as_deref());
        let system_role = normalize(req.system_role.as_deref());

        let mut errors = ValidationErrorBuilder::new();
        errors.check("name", validate_required_text(name.as_deref(), "Name"));
        errors.check("email", validate_email(email.as_deref()));
        errors.check("password", validate_password(req.password.as_deref()));

        let access_role = match access_role.map(|r| r.parse::<AccessRole>()) {
            Some(Ok(role)) => Some(role),
            Some(Err(e)) => {
                errors.add("accessRole", e);
                None
            }
            None => {
                errors.add("accessRole", "Access role is required");
                None
            }
        };

        let system_role = match system_role.map(|r| r.parse::<SystemRole>()) {
            Some(Ok(role)) => Some(role),
            Some(Err(e)) => {
                errors.add("systemRole", e);
                None
            }
            None => None,
        };

        errors.finish()?;

        let (Some(name), Some(email), Some(password), Some(access_role)) =
            (name, email, req.password, access_role)
        else {
            return Err(ServiceError::validation_field(
                "request",
                "Missing required fields. Please provide name, email, password, and access role.",
            ));
        };

        if db::find_user_by_email(self.db, &email).await?.is_some() {
            return Err(ServiceError::DuplicateEmail);
        }

        let system_role = match access_role {
            AccessRole::Owner => Some(system_role.unwrap_or(SystemRole::Admin)),
            AccessRole::Customer => None,
        };

        let now = now_timestamp();
        let user = User {
            id: Uuid::new_v4().to_string(),
            avatar_url: avatar_url(&name),
            name,
            email,
            password_hash: hash_password(&password)?,
            access_role,
            system_role,
            created_at: now.clone(),
            updated_at: now,
        };

        db::insert_user(self.db, &user).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::DuplicateEmail
            } else {
                ServiceError::Database(e)
            }
        })?;

        if user.access_role == AccessRole::Customer {
            self.ensure_customer_record(&user).await?;
        }

        info!(user_id = %user.id, role = %user.access_role, "Registered user {}", user.email);

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse {
            user: UserResponse::from(user),
            token,
        })
    }

    /// Link a customer user to the ledger by email, creating an empty entry if needed
    async fn ensure_customer_record(&self, user: &User) -> Result<(), ServiceError> {
        if db::find_customer_by_email(self.db, &user.email).await?.is_some() {
            debug!(email = %user.email, "Customer record already exists");
            return Ok(());
        }

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: String::new(),
            total_purchases: Decimal::ZERO,
            last_purchase_date: None,
            created_at: user.created_at.clone(),
            updated_at: user.created_at.clone(),
        };

        match db::insert_customer(self.db, &customer).await {
            Ok(()) => Ok(()),
            // Created concurrently by someone else
            Err(e) if is_unique_violation(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue a token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse, ServiceError> {
        let email = req.email.trim();
        let user = match db::find_user_by_email(self.db, email).await? {
            Some(user) if verify_password(&req.password, &user.password_hash) => user,
            _ => {
                record_login_failure();
                return Err(ServiceError::InvalidCredentials);
            }
        };

        debug!(user_id = %user.id, "User logged in");

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse {
            user: UserResponse::from(user),
            token,
        })
    }

    /// Resolve a bearer token to the current user record
    pub async fn validate_token(&self, token: &str) -> Result<Session, ServiceError> {
        if token.is_empty() {
            return Err(ServiceError::unauthenticated("Not authorized, no token"));
        }

        let claims = self
            .tokens
            .verify(token)
            .map_err(|_| ServiceError::unauthenticated("Not authorized, token failed"))?;

        let user = db::find_user_by_id(self.db, &claims.sub)
            .await?
            .ok_or_else(|| ServiceError::unauthenticated("Not authorized, user not found"))?;

        Ok(Session { user, claims })
    }

    /// Fail with `Forbidden` unless the user has the given access role
    pub fn require_role(user: &User, role: AccessRole) -> Result<(), ServiceError> {
        if user.access_role == role {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!(
                "Not authorized as {}",
                role
            )))
        }
    }

    /// Change name, email and/or password of a user and issue a new token.
    ///
    /// Blank fields keep their current value. The avatar is regenerated from the
    /// resulting name. A customer's ledger entry is not touched.
    pub async fn update_profile(
        &self,
        user_id: &str,
        req: UpdateProfileRequest,
    ) -> Result<AuthResponse, ServiceError> {
        let mut user = db::find_user_by_id(self.db, user_id)
            .await?
            .ok_or(ServiceError::NotFound("User"))?;

        let mut errors = ValidationErrorBuilder::new();
        let name = normalize(req.name.as_deref());
        if name.is_some() {
            errors.check("name", validate_required_text(name.as_deref(), "Name"));
        }
        let email = normalize(req.email.as_deref());
        if email.is_some() {
            errors.check("email", validate_email(email.as_deref()));
        }
        errors.finish()?;

        if let Some(name) = name {
            user.name = name;
        }

        if let Some(email) = email {
            if email != user.email {
                if db::find_user_by_email(self.db, &email).await?.is_some() {
                    return Err(ServiceError::DuplicateEmail);
                }
                user.email = email;
            }
        }

        if let Some(password) = req.password.filter(|p| !p.is_empty()) {
            user.password_hash = hash_password(&password)?;
        }

        user.avatar_url = avatar_url(&user.name);
        user.updated_at = now_timestamp();

        db::update_user_profile(self.db, &user).await.map_err(|e| {
            if is_unique_violation(&e) {
                ServiceError::DuplicateEmail
            } else {
                ServiceError::Database(e)
            }
        })?;

        info!(user_id = %user.id, "Updated profile");

        let token = self.tokens.issue(&user)?;
        Ok(AuthResponse {
            user: UserResponse::from(user),
            token,
        })
    }

    /// All owner accounts
    pub async fn list_system_users(&self) -> Result<Vec<UserResponse>, ServiceError> {
        let users = db::list_owner_users(self.db).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Hard-delete a user. An actor cannot remove themself.
    pub async fn remove_user(&self, actor: &User, id: &str) -> Result<(), ServiceError> {
        if actor.id == id {
            return Err(ServiceError::forbidden("You cannot remove your own account"));
        }

        if db::delete_user(self.db, id).await? == 0 {
            return Err(ServiceError::NotFound("User"));
        }

        info!(user_id = %id, removed_by = %actor.email, "Removed user");
        Ok(())
    }
}
