use anyhow::Context;
use contracts::domain::a001_warehouse::aggregate::WarehouseId;
use contracts::domain::a003_product::aggregate::ProductId;
use contracts::domain::a004_stock::aggregate::{StockEntry, StockEntryId};
use contracts::domain::common::AggregateId;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, DatabaseBackend, EntityTrait, QueryFilter, Set, Statement};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a004_stock")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub product_id: String,
    pub warehouse_id: String,
    pub quantity: f64,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub updated_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for StockEntry {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        Ok(StockEntry {
            id: StockEntryId::from_string(&m.id).map_err(anyhow::Error::msg)?,
            product_id: ProductId::from_string(&m.product_id).map_err(anyhow::Error::msg)?,
            warehouse_id: WarehouseId::from_string(&m.warehouse_id).map_err(anyhow::Error::msg)?,
            quantity: m.quantity,
            updated_at: m.updated_at,
            updated_by: m.updated_by,
        })
    }
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<StockEntry>> {
    Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(StockEntry::try_from)
        .collect()
}

pub async fn get_by_id(
    db: &DatabaseConnection,
    id: StockEntryId,
) -> anyhow::Result<Option<StockEntry>> {
    Entity::find_by_id(id.as_string())
        .one(db)
        .await?
        .map(StockEntry::try_from)
        .transpose()
}

pub async fn get_by_pair(
    db: &DatabaseConnection,
    product_id: ProductId,
    warehouse_id: WarehouseId,
) -> anyhow::Result<Option<StockEntry>> {
    Entity::find()
        .filter(Column::ProductId.eq(product_id.as_string()))
        .filter(Column::WarehouseId.eq(warehouse_id.as_string()))
        .one(db)
        .await?
        .map(StockEntry::try_from)
        .transpose()
}

/// Insert the row of a (product, warehouse) pair or add onto its quantity
/// in a single statement
pub async fn add_quantity(db: &DatabaseConnection, entry: &StockEntry) -> anyhow::Result<()> {
    db.execute(Statement::from_sql_and_values(
        DatabaseBackend::Sqlite,
        "INSERT INTO a004_stock (id, product_id, warehouse_id, quantity, updated_at, updated_by)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT (product_id, warehouse_id) DO UPDATE SET
             quantity = a004_stock.quantity + excluded.quantity,
             updated_at = excluded.updated_at,
             updated_by = excluded.updated_by",
        [
            entry.id.as_string().into(),
            entry.product_id.as_string().into(),
            entry.warehouse_id.as_string().into(),
            entry.quantity.into(),
            entry.updated_at.to_rfc3339().into(),
            entry.updated_by.clone().into(),
        ],
    ))
    .await
    .context("Failed to add stock")?;

    Ok(())
}

pub async fn update(db: &DatabaseConnection, entry: &StockEntry) -> anyhow::Result<()> {
    let active = ActiveModel {
        id: Set(entry.id.as_string()),
        product_id: Set(entry.product_id.as_string()),
        warehouse_id: Set(entry.warehouse_id.as_string()),
        quantity: Set(entry.quantity),
        updated_at: Set(entry.updated_at),
        updated_by: Set(entry.updated_by.clone()),
    };
    active.update(db).await?;
    Ok(())
}
