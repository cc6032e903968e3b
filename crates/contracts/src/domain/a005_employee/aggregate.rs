use serde::{Deserialize, Serialize};

use crate::domain::common::{AggregateRoot, EntityMetadata};
use crate::system::auth::RoleTag;

crate::aggregate_id!(
    /// Unique employee identifier
    EmployeeId
);

/// Staff member ("colaborador")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    /// CPF, digits only
    pub cpf: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub role: RoleTag,
    pub active: bool,
    /// Linked login, when one was provisioned
    pub user_id: Option<String>,
    pub metadata: EntityMetadata,
}

impl Employee {
    pub fn new_for_insert(dto: &CreateEmployeeDto) -> Self {
        Self {
            id: EmployeeId::new_v4(),
            name: dto.name.trim().to_string(),
            cpf: dto.cpf.chars().filter(|c| c.is_ascii_digit()).collect(),
            email: dto.email.trim().to_lowercase(),
            phone: non_blank(&dto.phone),
            position: non_blank(&dto.position),
            department: non_blank(&dto.department),
            role: dto.role,
            active: true,
            user_id: None,
            metadata: EntityMetadata::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.cpf.is_empty() || self.email.is_empty() {
            return Err("Name, CPF and email are required".into());
        }
        if self.cpf.len() != 11 {
            return Err("CPF must have 11 digits".into());
        }
        if !self.email.contains('@') {
            return Err("Invalid email format".into());
        }
        if !matches!(
            self.role,
            RoleTag::Admin | RoleTag::Logistics | RoleTag::Commercial
        ) {
            return Err(format!("Role '{}' cannot be assigned to an employee", self.role));
        }
        Ok(())
    }

    /// Flip the active flag
    pub fn toggle_active(&mut self) {
        self.active = !self.active;
        self.metadata.touch();
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AggregateRoot for Employee {
    type Id = EmployeeId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn aggregate_index() -> &'static str {
        "a005"
    }

    fn collection_name() -> &'static str {
        "employee"
    }

    fn element_name() -> &'static str {
        "Colaborador"
    }

    fn list_name() -> &'static str {
        "Colaboradores"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeDto {
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub role: RoleTag,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(role: RoleTag) -> CreateEmployeeDto {
        CreateEmployeeDto {
            name: " Maria Souza ".into(),
            cpf: "123.456.789-01".into(),
            email: "Maria@Example.com".into(),
            phone: Some("  ".into()),
            position: Some("Analista".into()),
            department: None,
            role,
        }
    }

    #[test]
    fn test_new_employee_is_normalized() {
        let employee = Employee::new_for_insert(&dto(RoleTag::Commercial));
        assert_eq!(employee.name, "Maria Souza");
        assert_eq!(employee.cpf, "12345678901");
        assert_eq!(employee.email, "maria@example.com");
        assert_eq!(employee.phone, None);
        assert!(employee.active);
        assert!(employee.validate().is_ok());
    }

    #[test]
    fn test_warehouse_role_is_not_an_employee_role() {
        let employee = Employee::new_for_insert(&dto(RoleTag::Warehouse));
        assert!(employee.validate().is_err());
    }

    #[test]
    fn test_toggle_active() {
        let mut employee = Employee::new_for_insert(&dto(RoleTag::Logistics));
        employee.toggle_active();
        assert!(!employee.active);
        assert_eq!(employee.metadata.version, 1);
        employee.toggle_active();
        assert!(employee.active);
    }
}
