use chrono::Utc;
use contracts::domain::a005_employee::aggregate::{Employee, EmployeeId};
use contracts::domain::common::{AggregateId, EntityMetadata};
use contracts::system::auth::RoleTag;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a005_employee")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub cpf: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub role: String,
    pub active: bool,
    pub user_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Employee {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let role = RoleTag::parse(&m.role)
            .ok_or_else(|| anyhow::anyhow!("Unknown role '{}' on employee {}", m.role, m.id))?;
        Ok(Employee {
            id: EmployeeId::from_string(&m.id).map_err(anyhow::Error::msg)?,
            name: m.name,
            cpf: m.cpf,
            email: m.email,
            phone: m.phone,
            position: m.position,
            department: m.department,
            role,
            active: m.active,
            user_id: m.user_id,
            metadata: EntityMetadata {
                created_at: m.created_at.unwrap_or_else(Utc::now),
                updated_at: m.updated_at.unwrap_or_else(Utc::now),
                is_deleted: m.is_deleted,
                version: m.version,
            },
        })
    }
}

fn to_active(aggregate: &Employee) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.id.as_string()),
        name: Set(aggregate.name.clone()),
        cpf: Set(aggregate.cpf.clone()),
        email: Set(aggregate.email.clone()),
        phone: Set(aggregate.phone.clone()),
        position: Set(aggregate.position.clone()),
        department: Set(aggregate.department.clone()),
        role: Set(aggregate.role.as_str().to_string()),
        active: Set(aggregate.active),
        user_id: Set(aggregate.user_id.clone()),
        is_deleted: Set(aggregate.metadata.is_deleted),
        created_at: Set(Some(aggregate.metadata.created_at)),
        updated_at: Set(Some(aggregate.metadata.updated_at)),
        version: Set(aggregate.metadata.version),
    }
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Employee>> {
    let mut items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .all(db)
        .await?
        .into_iter()
        .map(Employee::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(items)
}

pub async fn get_by_id(db: &DatabaseConnection, id: EmployeeId) -> anyhow::Result<Option<Employee>> {
    Entity::find_by_id(id.as_string())
        .one(db)
        .await?
        .filter(|m| !m.is_deleted)
        .map(Employee::try_from)
        .transpose()
}

pub async fn get_by_cpf(db: &DatabaseConnection, cpf: &str) -> anyhow::Result<Option<Employee>> {
    Entity::find()
        .filter(Column::Cpf.eq(cpf))
        .one(db)
        .await?
        .map(Employee::try_from)
        .transpose()
}

pub async fn insert(db: &DatabaseConnection, aggregate: &Employee) -> anyhow::Result<EmployeeId> {
    to_active(aggregate).insert(db).await?;
    Ok(aggregate.id)
}

pub async fn update(db: &DatabaseConnection, aggregate: &Employee) -> anyhow::Result<()> {
    let mut active = to_active(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}
