use super::repository;
use contracts::domain::a005_employee::aggregate::{CreateEmployeeDto, Employee, EmployeeId};
use sea_orm::DatabaseConnection;

pub async fn create(db: &DatabaseConnection, dto: CreateEmployeeDto) -> anyhow::Result<EmployeeId> {
    let aggregate = Employee::new_for_insert(&dto);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    if repository::get_by_cpf(db, &aggregate.cpf).await?.is_some() {
        return Err(anyhow::anyhow!("CPF already registered"));
    }

    repository::insert(db, &aggregate).await
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Employee>> {
    repository::list_all(db).await
}

/// Activate or deactivate an employee; returns the new state
pub async fn toggle_active(db: &DatabaseConnection, id: EmployeeId) -> anyhow::Result<Option<Employee>> {
    let Some(mut employee) = repository::get_by_id(db, id).await? else {
        return Ok(None);
    };
    employee.toggle_active();
    repository::update(db, &employee).await?;
    tracing::info!(
        "Employee {} is now {}",
        employee.name,
        if employee.active { "active" } else { "inactive" }
    );
    Ok(Some(employee))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;
    use contracts::system::auth::RoleTag;

    fn dto(cpf: &str) -> CreateEmployeeDto {
        CreateEmployeeDto {
            name: "Carlos Lima".into(),
            cpf: cpf.into(),
            email: "carlos@example.com".into(),
            phone: None,
            position: Some("Supervisor".into()),
            department: Some("Logística".into()),
            role: RoleTag::Logistics,
        }
    }

    #[tokio::test]
    async fn test_create_and_toggle() {
        let db = open_in_memory().await;
        let id = create(&db, dto("111.222.333-44")).await.unwrap();

        let toggled = toggle_active(&db, id).await.unwrap().unwrap();
        assert!(!toggled.active);
        assert_eq!(toggled.metadata.version, 1);

        let stored = list_all(&db).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].active);
        assert_eq!(stored[0].role, RoleTag::Logistics);
    }

    #[tokio::test]
    async fn test_cpf_is_unique() {
        let db = open_in_memory().await;
        create(&db, dto("11122233344")).await.unwrap();
        assert!(create(&db, dto("111.222.333-44")).await.is_err());
    }

    #[tokio::test]
    async fn test_toggle_unknown_employee() {
        let db = open_in_memory().await;
        assert!(toggle_active(&db, EmployeeId::new_v4()).await.unwrap().is_none());
    }
}
