use super::repository;
use contracts::domain::a001_warehouse::aggregate::{Warehouse, WarehouseDto, WarehouseId};
use sea_orm::DatabaseConnection;

pub async fn create(db: &DatabaseConnection, dto: WarehouseDto) -> anyhow::Result<WarehouseId> {
    let aggregate = Warehouse::new_for_insert(&dto);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    let id = repository::insert(db, &aggregate).await?;
    tracing::info!("Created warehouse {} ({})", aggregate.name, id);
    Ok(id)
}

pub async fn get_by_id(db: &DatabaseConnection, id: WarehouseId) -> anyhow::Result<Option<Warehouse>> {
    repository::get_by_id(db, id).await
}

/// All warehouses, ordered by city then name
pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Warehouse>> {
    repository::list_all(db).await
}
