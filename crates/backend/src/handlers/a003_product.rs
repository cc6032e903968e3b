use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a003_product::aggregate::{Product, ProductDto, ProductId};
use serde_json::json;

use super::{db_or_500, parse_id};
use crate::domain::a003_product;

/// GET /api/products
pub async fn list_all() -> Result<Json<Vec<Product>>, StatusCode> {
    let db = db_or_500()?;
    match a003_product::service::list_all(db).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list products: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/products/:id
pub async fn get_by_id(Path(id): Path<String>) -> Result<Json<Product>, StatusCode> {
    let db = db_or_500()?;
    let id: ProductId = parse_id(&id)?;
    match a003_product::service::get_by_id(db, id).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Failed to get product {}: {}", id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/products
pub async fn create(Json(dto): Json<ProductDto>) -> Result<Json<serde_json::Value>, StatusCode> {
    let db = db_or_500()?;
    match a003_product::service::create(db, dto).await {
        Ok(id) => Ok(Json(json!({ "id": id.to_string() }))),
        Err(e) => {
            tracing::error!("Failed to create product: {}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
