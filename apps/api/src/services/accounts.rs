//! Account service: registration, login, profile, derived stats.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use givehub_core::{validation, Account, AccountStats, CoreError, Identity, Role};
use givehub_db::repository::generate_id;

// =============================================================================
// Inputs / Outputs
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Token plus the account it belongs to.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub account: Account,
}

// =============================================================================
// Operations
// =============================================================================

/// Registers a new account. The role is always `user`; admins are promoted
/// by another admin, never self-registered.
pub async fn register(state: &AppState, input: RegisterInput) -> ApiResult<AuthResponse> {
    let email = validation::validate_email(&input.email)?;
    validation::validate_password(&input.password)?;
    validation::validate_name("first_name", &input.first_name)?;
    validation::validate_name("last_name", &input.last_name)?;
    if let Some(bio) = &input.bio {
        validation::validate_bio(bio)?;
    }

    if state.db.accounts().get_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(format!(
            "email '{email}' already exists"
        )));
    }

    let now = Utc::now();
    let account = Account {
        id: generate_id(),
        email,
        password_hash: hash_password(&input.password)?,
        first_name: input.first_name.trim().to_string(),
        last_name: input.last_name.trim().to_string(),
        phone: input.phone,
        bio: input.bio,
        avatar_url: input.avatar_url,
        location: input.location,
        role: Role::User,
        is_active: true,
        created_at: now,
        updated_at: now,
        last_login: Some(now),
    };

    state.db.accounts().insert(&account).await?;
    info!(account_id = %account.id, "Account registered");

    let token = state.jwt.generate_token(&account)?;
    Ok(AuthResponse { token, account })
}

/// Verifies credentials and issues a token.
pub async fn login(state: &AppState, input: LoginInput) -> ApiResult<AuthResponse> {
    let email = validation::validate_email(&input.email)?;

    let account = state
        .db
        .accounts()
        .get_by_email(&email)
        .await?
        .filter(|account| verify_password(&input.password, &account.password_hash))
        .ok_or_else(|| ApiError::Unauthenticated("Invalid email or password".to_string()))?;

    if !account.is_active {
        return Err(ApiError::Forbidden("account is deactivated".to_string()));
    }

    state.db.accounts().touch_last_login(&account.id).await?;
    info!(account_id = %account.id, "Login");

    let token = state.jwt.generate_token(&account)?;
    Ok(AuthResponse { token, account })
}

/// Loads the calling account.
pub async fn me(state: &AppState, identity: &Identity) -> ApiResult<Account> {
    let account = state
        .db
        .accounts()
        .get_by_id(&identity.account_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Account", &identity.account_id))?;

    Ok(account)
}

/// Applies a profile patch to the calling account.
pub async fn update_me(
    state: &AppState,
    identity: &Identity,
    input: UpdateProfileInput,
) -> ApiResult<Account> {
    let mut account = me(state, identity).await?;

    if let Some(first_name) = input.first_name {
        validation::validate_name("first_name", &first_name)?;
        account.first_name = first_name.trim().to_string();
    }
    if let Some(last_name) = input.last_name {
        validation::validate_name("last_name", &last_name)?;
        account.last_name = last_name.trim().to_string();
    }
    if let Some(bio) = &input.bio {
        validation::validate_bio(bio)?;
    }
    if input.phone.is_some() {
        account.phone = input.phone;
    }
    if input.bio.is_some() {
        account.bio = input.bio;
    }
    if input.avatar_url.is_some() {
        account.avatar_url = input.avatar_url;
    }
    if input.location.is_some() {
        account.location = input.location;
    }

    state.db.accounts().update_profile(&account).await?;
    me(state, identity).await
}

/// Changes the calling account's password after verifying the current one.
pub async fn change_password(
    state: &AppState,
    identity: &Identity,
    input: ChangePasswordInput,
) -> ApiResult<()> {
    let account = me(state, identity).await?;

    if !verify_password(&input.current_password, &account.password_hash) {
        return Err(ApiError::Forbidden("current password is wrong".to_string()));
    }

    validation::validate_password(&input.new_password)?;
    let hash = hash_password(&input.new_password)?;
    state.db.accounts().update_password(&account.id, &hash).await?;

    info!(account_id = %account.id, "Password changed");
    Ok(())
}

/// Soft-deactivates the calling account.
pub async fn deactivate_me(state: &AppState, identity: &Identity) -> ApiResult<()> {
    state
        .db
        .accounts()
        .set_active(&identity.account_id, false)
        .await?;

    info!(account_id = %identity.account_id, "Account deactivated");
    Ok(())
}

/// Computes the derived stats of an account on demand.
pub async fn stats_for(state: &AppState, account_id: &str) -> ApiResult<AccountStats> {
    if state.db.accounts().get_by_id(account_id).await?.is_none() {
        return Err(CoreError::not_found("Account", account_id).into());
    }

    Ok(state.db.stats().account_stats(account_id).await?)
}
