use anyhow::Result;
use chrono::Utc;
use contracts::system::auth::{RoleTag, TokenClaims};
use contracts::system::users::{
    ChangePasswordDto, ProvisionResponse, ProvisionStage, ProvisionUserDto,
    ProvisionValidationError, UpdateUserDto, User,
};
use sea_orm::DatabaseConnection;
use thiserror::Error;

use super::repository;
use crate::system::auth::password;

/// Failure of one provisioning step
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Validation(#[from] ProvisionValidationError),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Only administrators can create accounts")]
    NotAdmin,

    #[error("The first account must be an administrator")]
    BootstrapRole,

    #[error("Email already registered")]
    Duplicate,

    #[error("Failed to create user: {0}")]
    Create(anyhow::Error),

    #[error("Created user could not be read back")]
    Verify,

    #[error("Failed to assign role: {0}")]
    AssignRole(anyhow::Error),
}

impl ProvisionError {
    pub fn stage(&self) -> ProvisionStage {
        match self {
            ProvisionError::Validation(_) => ProvisionStage::Validation,
            ProvisionError::Unauthenticated
            | ProvisionError::NotAdmin
            | ProvisionError::BootstrapRole => ProvisionStage::AdminCheck,
            ProvisionError::Duplicate | ProvisionError::Create(_) => ProvisionStage::CreateUser,
            ProvisionError::Verify => ProvisionStage::PostCreateVerify,
            ProvisionError::AssignRole(_) => ProvisionStage::AssignRole,
        }
    }
}

/// Create an account from the provisioning form.
///
/// While no administrator exists the request is accepted without a caller
/// (first-admin bootstrap); afterwards only administrators may provision.
/// A failure after the insert removes the half-created account again.
pub async fn provision(
    db: &DatabaseConnection,
    dto: ProvisionUserDto,
    requester: Option<&TokenClaims>,
) -> Result<ProvisionResponse, ProvisionError> {
    let valid = dto.validate()?;

    let admins = repository::count_admins(db)
        .await
        .map_err(ProvisionError::Create)?;
    let bootstrap = admins == 0;
    if bootstrap {
        if valid.role != RoleTag::Admin {
            return Err(ProvisionError::BootstrapRole);
        }
        tracing::warn!("No administrator exists, bootstrapping {}", valid.email);
    } else {
        match requester {
            None => return Err(ProvisionError::Unauthenticated),
            Some(claims) if !claims.is_admin() => return Err(ProvisionError::NotAdmin),
            Some(_) => {}
        }
    }

    if repository::get_by_username(db, &valid.email)
        .await
        .map_err(ProvisionError::Create)?
        .is_some()
    {
        return Err(ProvisionError::Duplicate);
    }

    let password_hash = password::hash_password(&valid.password).map_err(ProvisionError::Create)?;
    let user_id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();
    let user = User {
        id: user_id.clone(),
        username: valid.email.clone(),
        email: Some(valid.email.clone()),
        full_name: Some(valid.name.clone()),
        is_active: true,
        roles: Vec::new(),
        warehouse_id: valid.warehouse_id,
        client_id: valid.client_id,
        created_at: now.clone(),
        updated_at: now.clone(),
        last_login_at: None,
        created_by: requester.map(|c| c.sub.clone()),
    };
    repository::create_with_password(db, &user, &password_hash)
        .await
        .map_err(ProvisionError::Create)?;

    match repository::get_by_id(db, &user_id).await {
        Ok(Some(_)) => {}
        Ok(None) | Err(_) => {
            rollback(db, &user_id).await;
            return Err(ProvisionError::Verify);
        }
    }

    if let Err(e) = repository::assign_role(db, &user_id, valid.role).await {
        rollback(db, &user_id).await;
        return Err(ProvisionError::AssignRole(e));
    }

    tracing::info!(
        "Provisioned {} as {} (bootstrap: {})",
        valid.email,
        valid.role,
        bootstrap
    );

    Ok(ProvisionResponse {
        success: true,
        user_id,
        email: valid.email,
        role: valid.role,
        timestamp: now,
        request_id: uuid::Uuid::new_v4().to_string(),
        first_admin_bootstrap: bootstrap,
    })
}

async fn rollback(db: &DatabaseConnection, user_id: &str) {
    if let Err(e) = repository::delete(db, user_id).await {
        tracing::error!("Rollback of user {} failed: {}", user_id, e);
    }
}

/// Update profile fields
pub async fn update(db: &DatabaseConnection, dto: UpdateUserDto) -> Result<()> {
    let mut user = repository::get_by_id(db, &dto.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found"))?;

    if let Some(ref email) = dto.email {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(anyhow::anyhow!("Invalid email format"));
        }
    }

    user.email = dto.email;
    user.full_name = dto.full_name;
    user.is_active = dto.is_active;
    user.updated_at = Utc::now().to_rfc3339();

    repository::update(db, &user).await
}

pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<bool> {
    repository::delete(db, id).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<User>> {
    repository::get_by_id(db, id).await
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<User>> {
    repository::list_all(db).await
}

/// Change a password; admins may change anybody's without the old one
pub async fn change_password(
    db: &DatabaseConnection,
    dto: ChangePasswordDto,
    requester: &TokenClaims,
) -> Result<()> {
    repository::get_by_id(db, &dto.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found"))?;

    if dto.user_id != requester.sub {
        if !requester.is_admin() {
            return Err(anyhow::anyhow!("Permission denied"));
        }
    } else {
        let old_password = dto
            .old_password
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Old password required"))?;
        let current_hash = repository::get_password_hash(db, &dto.user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

        if !password::verify_password(old_password, &current_hash)? {
            return Err(anyhow::anyhow!("Invalid old password"));
        }
    }

    password::validate_password_strength(&dto.new_password)?;
    let new_hash = password::hash_password(&dto.new_password)?;
    repository::update_password(db, &dto.user_id, &new_hash).await
}

/// Verify user credentials (for login)
pub async fn verify_credentials(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<Option<User>> {
    let username = username.trim().to_lowercase();
    let user = match repository::get_by_username(db, &username).await? {
        Some(u) => u,
        None => return Ok(None),
    };

    if !user.is_active {
        return Ok(None);
    }

    let password_hash = repository::get_password_hash(db, &user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Password hash not found"))?;

    if !password::verify_password(password, &password_hash)? {
        return Ok(None);
    }

    if let Err(e) = repository::update_last_login(db, &user.id).await {
        tracing::warn!("Failed to record last login of {}: {}", user.id, e);
    }

    Ok(Some(user))
}
