use super::repository;
use contracts::domain::a003_product::aggregate::{Product, ProductDto, ProductId};
use sea_orm::DatabaseConnection;

pub async fn create(db: &DatabaseConnection, dto: ProductDto) -> anyhow::Result<ProductId> {
    let aggregate = Product::new_for_insert(&dto);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    repository::insert(db, &aggregate).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: ProductId) -> anyhow::Result<Option<Product>> {
    repository::get_by_id(db, id).await
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Product>> {
    repository::list_all(db).await
}
