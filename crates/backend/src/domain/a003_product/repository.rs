use chrono::Utc;
use contracts::domain::a003_product::aggregate::{Product, ProductId, Unit};
use contracts::domain::common::{AggregateId, EntityMetadata};
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a003_product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub unit: String,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Product {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let unit = Unit::parse(&m.unit)
            .ok_or_else(|| anyhow::anyhow!("Unknown unit '{}' on product {}", m.unit, m.id))?;
        Ok(Product {
            id: ProductId::from_string(&m.id).map_err(anyhow::Error::msg)?,
            name: m.name,
            unit,
            metadata: EntityMetadata {
                created_at: m.created_at.unwrap_or_else(Utc::now),
                updated_at: m.updated_at.unwrap_or_else(Utc::now),
                is_deleted: m.is_deleted,
                version: m.version,
            },
        })
    }
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Product>> {
    let mut items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .all(db)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect::<anyhow::Result<Vec<_>>>()?;
    items.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(items)
}

pub async fn get_by_id(db: &DatabaseConnection, id: ProductId) -> anyhow::Result<Option<Product>> {
    Entity::find_by_id(id.as_string())
        .one(db)
        .await?
        .filter(|m| !m.is_deleted)
        .map(Product::try_from)
        .transpose()
}

pub async fn insert(db: &DatabaseConnection, aggregate: &Product) -> anyhow::Result<ProductId> {
    let active = ActiveModel {
        id: Set(aggregate.id.as_string()),
        name: Set(aggregate.name.clone()),
        unit: Set(aggregate.unit.as_str().to_string()),
        is_deleted: Set(aggregate.metadata.is_deleted),
        created_at: Set(Some(aggregate.metadata.created_at)),
        updated_at: Set(Some(aggregate.metadata.updated_at)),
        version: Set(aggregate.metadata.version),
    };
    active.insert(db).await?;
    Ok(aggregate.id)
}
