use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::auth::RoleTag;
use crate::domain::a001_warehouse::aggregate::WarehouseId;
use crate::domain::a002_client::aggregate::ClientId;

/// Passwords rejected regardless of length
pub const WEAK_PASSWORDS: [&str; 6] = [
    "123456", "12345678", "password", "senha123", "admin123", "qwerty",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub roles: Vec<RoleTag>,
    pub warehouse_id: Option<WarehouseId>,
    pub client_id: Option<ClientId>,
    pub created_at: String,
    pub updated_at: String,
    pub last_login_at: Option<String>,
    pub created_by: Option<String>,
}

impl User {
    pub fn has_role(&self, role: RoleTag) -> bool {
        self.roles.contains(&role)
    }
}

/// Account provisioning request (POST /api/system/users)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionUserDto {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: RoleTag,
    pub warehouse_id: Option<WarehouseId>,
    pub client_id: Option<ClientId>,
}

/// Provisioning request after normalization and validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidProvision {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: RoleTag,
    pub warehouse_id: Option<WarehouseId>,
    pub client_id: Option<ClientId>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProvisionValidationError {
    #[error("Invalid payload: {}", .0.join("; "))]
    InvalidPayload(Vec<String>),
    #[error("Weak password")]
    WeakPassword,
}

impl ProvisionUserDto {
    /// Trim and lower-case the email, trim the name, then check every field.
    /// All field problems are reported together.
    pub fn validate(&self) -> Result<ValidProvision, ProvisionValidationError> {
        let email = self.email.trim().to_lowercase();
        let name = self.name.trim().to_string();
        let mut problems = Vec::new();

        if email.len() > 255 || !is_valid_email(&email) {
            problems.push("email: invalid email address".to_string());
        }
        let password_len = self.password.chars().count();
        if !(6..=128).contains(&password_len) {
            problems.push("password: must be between 6 and 128 characters".to_string());
        }
        let name_len = name.chars().count();
        if !(2..=100).contains(&name_len) {
            problems.push("name: must be between 2 and 100 characters".to_string());
        }
        match self.role {
            RoleTag::Warehouse if self.warehouse_id.is_none() => {
                problems.push("warehouse_id: required for warehouse accounts".to_string());
            }
            RoleTag::Client if self.client_id.is_none() => {
                problems.push("client_id: required for client accounts".to_string());
            }
            _ => {}
        }

        if !problems.is_empty() {
            return Err(ProvisionValidationError::InvalidPayload(problems));
        }
        if WEAK_PASSWORDS.contains(&self.password.as_str()) {
            return Err(ProvisionValidationError::WeakPassword);
        }

        Ok(ValidProvision {
            email,
            password: self.password.clone(),
            name,
            role: self.role,
            warehouse_id: self.warehouse_id.filter(|_| self.role == RoleTag::Warehouse),
            client_id: self.client_id.filter(|_| self.role == RoleTag::Client),
        })
    }
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Step of the provisioning flow a failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvisionStage {
    Validation,
    AdminCheck,
    CreateUser,
    PostCreateVerify,
    AssignRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionResponse {
    pub success: bool,
    pub user_id: String,
    pub email: String,
    pub role: RoleTag,
    pub timestamp: String,
    pub request_id: String,
    pub first_admin_bootstrap: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionErrorBody {
    pub error: String,
    pub details: Option<String>,
    pub stage: ProvisionStage,
    pub request_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordDto {
    pub user_id: String,
    pub old_password: Option<String>, // None if admin changing someone else's password
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto() -> ProvisionUserDto {
        ProvisionUserDto {
            email: "  Joao@Example.COM ".into(),
            password: "s3nha-forte".into(),
            name: " João ".into(),
            role: RoleTag::Logistics,
            warehouse_id: None,
            client_id: None,
        }
    }

    #[test]
    fn test_valid_request_is_normalized() {
        let valid = dto().validate().unwrap();
        assert_eq!(valid.email, "joao@example.com");
        assert_eq!(valid.name, "João");
    }

    #[test]
    fn test_all_field_problems_are_reported() {
        let mut bad = dto();
        bad.email = "no-at-sign".into();
        bad.password = "123".into();
        bad.name = "J".into();
        match bad.validate() {
            Err(ProvisionValidationError::InvalidPayload(problems)) => assert_eq!(problems.len(), 3),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_weak_password_is_rejected() {
        let mut weak = dto();
        weak.password = "senha123".into();
        assert_eq!(weak.validate(), Err(ProvisionValidationError::WeakPassword));
    }

    #[test]
    fn test_warehouse_account_requires_link() {
        let mut warehouse = dto();
        warehouse.role = RoleTag::Warehouse;
        assert!(warehouse.validate().is_err());
        warehouse.warehouse_id = Some(WarehouseId::new_v4());
        assert!(warehouse.validate().is_ok());
    }

    #[test]
    fn test_link_is_dropped_for_other_roles() {
        let mut staff = dto();
        staff.client_id = Some(ClientId::new_v4());
        assert_eq!(staff.validate().unwrap().client_id, None);
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@.co"));
    }
}
