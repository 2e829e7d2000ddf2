//! Account service: registration, login and profiles.
//!
//! Registration creates the user and its single profile in one transaction;
//! the response carries a freshly issued access token.

use tracing::{info, warn};

use crate::dto::AuthResponse;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use coderr_core::accounts::{LoginInput, NewAccount, ProfilePatch, ProfilePatchInput, RegistrationInput};
use coderr_core::policy::{self, Action, Target};
use coderr_core::{Actor, CoreError, Profile, ProfileKind};
use coderr_db::credentials::{hash_password, verify_password};
use coderr_db::{DbError, NewUserRecord};

/// Account service implementation.
pub struct AccountService {
    state: AppState,
}

impl AccountService {
    /// Create a new account service.
    pub fn new(state: AppState) -> Self {
        AccountService { state }
    }

    /// Registers a user with a customer or business profile.
    pub async fn register(&self, input: RegistrationInput) -> ApiResult<AuthResponse> {
        let account = NewAccount::validate(input)?;
        let password = account.password.clone();
        let password_hash = run_blocking(move || hash_password(&password)).await??;

        let record = NewUserRecord {
            username: account.username.clone(),
            email: account.email.clone(),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
        };

        let user_id = self
            .state
            .db
            .users()
            .create_account(&record, account.kind)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { field } if field.contains("users.username") => {
                    CoreError::conflict("A user with this username already exists.").into()
                }
                DbError::UniqueViolation { field } if field.contains("users.email") => {
                    CoreError::conflict("A user with this email already exists.").into()
                }
                other => ApiError::from(other),
            })?;

        info!(user_id, username = %account.username, kind = %account.kind, "Account registered");

        Ok(AuthResponse {
            token: self.state.jwt.generate_access_token(user_id)?,
            username: account.username,
            email: account.email,
            user_id,
        })
    }

    /// Exchanges username and password for an access token.
    pub async fn login(&self, input: LoginInput) -> ApiResult<AuthResponse> {
        let (username, password) = input.validate()?;

        let credentials = self.state.db.users().find_credentials(&username).await?;

        let verified = match credentials {
            Some(c) => {
                let hash = c.password_hash.clone();
                run_blocking(move || verify_password(&password, &hash))
                    .await?
                    .then_some(c)
            }
            None => None,
        };

        let Some(credentials) = verified else {
            warn!(username = %username, "Failed login");
            return Err(ApiError::invalid("non_field_errors", "Invalid credentials."));
        };

        info!(user_id = credentials.id, "Login successful");

        Ok(AuthResponse {
            token: self.state.jwt.generate_access_token(credentials.id)?,
            username: credentials.username,
            email: credentials.email,
            user_id: credentials.id,
        })
    }

    /// A user's profile.
    pub async fn get_profile(&self, actor: Option<&Actor>, user_id: i64) -> ApiResult<Profile> {
        policy::ensure(actor, Action::ProfileRetrieve, None)?;

        let profile = self.state.db.users().get_profile(user_id).await?;
        profile.ok_or_else(|| CoreError::not_found("Profile", user_id).into())
    }

    /// Updates the caller's own profile.
    pub async fn update_profile(
        &self,
        actor: Option<&Actor>,
        user_id: i64,
        input: ApiResult<ProfilePatchInput>,
    ) -> ApiResult<Profile> {
        policy::require_actor(actor)?;

        if self.state.db.users().profile_kind(user_id).await?.is_none() {
            return Err(CoreError::not_found("Profile", user_id).into());
        }

        policy::ensure(actor, Action::ProfileUpdate, Some(&Target::Profile { user_id })).map_err(|e| {
            warn!(profile_user = user_id, "Profile update denied");
            e
        })?;

        let patch = ProfilePatch::validate(input?)?;

        let profile = self
            .state
            .db
            .users()
            .update_profile(user_id, &patch)
            .await
            .map_err(|e| match e {
                DbError::UniqueViolation { .. } => {
                    CoreError::conflict("A user with this email already exists.").into()
                }
                other => ApiError::from(other),
            })?;

        info!(user_id, "Profile updated");
        Ok(profile)
    }

    /// All profiles of one kind.
    pub async fn list_profiles(&self, actor: Option<&Actor>, kind: ProfileKind) -> ApiResult<Vec<Profile>> {
        policy::ensure(actor, Action::ProfileList, None)?;

        Ok(self.state.db.users().list_profiles(kind).await?)
    }
}

/// Runs argon2 work off the async workers.
async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("Password task failed: {e}")))
}
