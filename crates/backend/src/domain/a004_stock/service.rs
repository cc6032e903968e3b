use contracts::domain::a001_warehouse::aggregate::WarehouseId;
use contracts::domain::a003_product::aggregate::ProductId;
use contracts::domain::a004_stock::aggregate::{
    group_by_warehouse, validate_added_quantity, AddStockDto, StockEntry, StockEntryId,
    UpdateQuantityDto, WarehouseStock,
};
use contracts::domain::common::AggregateId;
use sea_orm::DatabaseConnection;
use thiserror::Error;

use super::repository;
use crate::domain::{a001_warehouse, a003_product};

#[derive(Debug, Error)]
pub enum StockError {
    #[error("{0}")]
    Invalid(String),

    #[error("Product not found")]
    ProductNotFound,

    #[error("Warehouse not found")]
    WarehouseNotFound,

    #[error("Warehouse is inactive")]
    WarehouseInactive,

    #[error("Stock entry not found")]
    EntryNotFound,

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// Add a quantity of a product to a warehouse, creating the stock row on
/// first use. Returns the row after the write.
pub async fn add_stock(
    db: &DatabaseConnection,
    dto: AddStockDto,
    updated_by: Option<String>,
) -> Result<StockEntry, StockError> {
    let product_id = ProductId::from_string(&dto.product_id).map_err(StockError::Invalid)?;
    let warehouse_id = WarehouseId::from_string(&dto.warehouse_id).map_err(StockError::Invalid)?;
    validate_added_quantity(dto.quantity).map_err(StockError::Invalid)?;

    a003_product::repository::get_by_id(db, product_id)
        .await?
        .ok_or(StockError::ProductNotFound)?;
    let warehouse = a001_warehouse::repository::get_by_id(db, warehouse_id)
        .await?
        .ok_or(StockError::WarehouseNotFound)?;
    if !warehouse.active {
        return Err(StockError::WarehouseInactive);
    }

    let mut entry = StockEntry::new(product_id, warehouse_id);
    entry
        .add(dto.quantity, updated_by)
        .map_err(StockError::Invalid)?;
    repository::add_quantity(db, &entry).await?;

    let stored = repository::get_by_pair(db, product_id, warehouse_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Stock row missing after write"))?;
    tracing::info!(
        "Stock of {} in {} is now {}",
        product_id,
        warehouse.name,
        stored.quantity
    );
    Ok(stored)
}

/// Overwrite the quantity of an existing stock row
pub async fn update_quantity(
    db: &DatabaseConnection,
    id: StockEntryId,
    dto: UpdateQuantityDto,
    updated_by: Option<String>,
) -> Result<StockEntry, StockError> {
    let mut entry = repository::get_by_id(db, id)
        .await?
        .ok_or(StockError::EntryNotFound)?;
    entry
        .set_quantity(dto.quantity, updated_by)
        .map_err(StockError::Invalid)?;
    repository::update(db, &entry).await?;
    Ok(entry)
}

/// Stock grouped per warehouse
pub async fn list_grouped(db: &DatabaseConnection) -> anyhow::Result<Vec<WarehouseStock>> {
    let entries = repository::list_all(db).await?;
    let warehouses = a001_warehouse::repository::list_all(db).await?;
    let products = a003_product::repository::list_all(db).await?;
    Ok(group_by_warehouse(&entries, &warehouses, &products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;
    use contracts::domain::a001_warehouse::aggregate::WarehouseDto;
    use contracts::domain::a003_product::aggregate::ProductDto;
    use contracts::domain::a004_stock::aggregate::StockStatus;

    async fn setup(db: &DatabaseConnection, active: bool) -> (ProductId, WarehouseId) {
        let product = a003_product::service::create(
            db,
            ProductDto {
                name: "Milho".into(),
                unit: None,
            },
        )
        .await
        .unwrap();
        let warehouse = a001_warehouse::service::create(
            db,
            WarehouseDto {
                name: "Armazém Sul".into(),
                city: "Rio Verde".into(),
                active: Some(active),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        (product, warehouse)
    }

    fn add(product: ProductId, warehouse: WarehouseId, quantity: f64) -> AddStockDto {
        AddStockDto {
            product_id: product.as_string(),
            warehouse_id: warehouse.as_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn test_additions_accumulate_on_one_row() {
        let db = open_in_memory().await;
        let (product, warehouse) = setup(&db, true).await;

        let first = add_stock(&db, add(product, warehouse, 4.0), Some("u1".into()))
            .await
            .unwrap();
        let second = add_stock(&db, add(product, warehouse, 8.5), Some("u2".into()))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 12.5);
        assert_eq!(second.updated_by.as_deref(), Some("u2"));
        assert_eq!(repository::list_all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_requires_known_product_and_active_warehouse() {
        let db = open_in_memory().await;
        let (product, inactive) = setup(&db, false).await;

        let err = add_stock(&db, add(product, inactive, 1.0), None).await.unwrap_err();
        assert!(matches!(err, StockError::WarehouseInactive));

        let err = add_stock(&db, add(ProductId::new_v4(), inactive, 1.0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::ProductNotFound));

        let err = add_stock(&db, add(product, WarehouseId::new_v4(), 1.0), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::WarehouseNotFound));
    }

    #[tokio::test]
    async fn test_non_positive_addition_is_invalid() {
        let db = open_in_memory().await;
        let (product, warehouse) = setup(&db, true).await;
        let err = add_stock(&db, add(product, warehouse, 0.0), None).await.unwrap_err();
        assert!(matches!(err, StockError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_update_quantity_and_grouping() {
        let db = open_in_memory().await;
        let (product, warehouse) = setup(&db, true).await;
        let entry = add_stock(&db, add(product, warehouse, 50.0), None).await.unwrap();

        let updated = update_quantity(&db, entry.id, UpdateQuantityDto { quantity: 3.0 }, None)
            .await
            .unwrap();
        assert_eq!(updated.quantity, 3.0);

        let err = update_quantity(&db, entry.id, UpdateQuantityDto { quantity: -1.0 }, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StockError::Invalid(_)));

        let grouped = list_grouped(&db).await.unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].products[0].product_name, "Milho");
        assert_eq!(grouped[0].products[0].status, StockStatus::Low);
    }
}
