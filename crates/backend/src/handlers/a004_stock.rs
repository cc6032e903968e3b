use axum::{extract::Path, http::StatusCode, Json};
use contracts::domain::a004_stock::aggregate::{
    AddStockDto, StockEntry, StockEntryId, UpdateQuantityDto, WarehouseStock,
};
use contracts::system::permissions::{Action, Resource};

use super::{db_or_500, parse_id, require_permission};
use crate::domain::a004_stock::service::{self, StockError};
use crate::system::auth::extractor::CurrentActor;

fn stock_status(error: &StockError) -> StatusCode {
    match error {
        StockError::Invalid(_) | StockError::WarehouseInactive => StatusCode::BAD_REQUEST,
        StockError::ProductNotFound | StockError::WarehouseNotFound | StockError::EntryNotFound => {
            StatusCode::NOT_FOUND
        }
        StockError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// GET /api/stock
pub async fn list_grouped(
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<WarehouseStock>>, StatusCode> {
    let db = db_or_500()?;
    require_permission(db, &actor, Resource::Stock, Action::Read).await?;

    service::list_grouped(db).await.map(Json).map_err(|e| {
        tracing::error!("Failed to list stock: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// POST /api/stock
pub async fn add(
    CurrentActor(actor): CurrentActor,
    Json(dto): Json<AddStockDto>,
) -> Result<Json<StockEntry>, StatusCode> {
    let db = db_or_500()?;
    require_permission(db, &actor, Resource::Stock, Action::Create).await?;

    service::add_stock(db, dto, Some(actor.actor_id.clone()))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Stock addition by {} failed: {}", actor.actor_id, e);
            stock_status(&e)
        })
}

/// PUT /api/stock/:id
pub async fn update_quantity(
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(dto): Json<UpdateQuantityDto>,
) -> Result<Json<StockEntry>, StatusCode> {
    let db = db_or_500()?;
    require_permission(db, &actor, Resource::Stock, Action::Update).await?;
    let id: StockEntryId = parse_id(&id)?;

    service::update_quantity(db, id, dto, Some(actor.actor_id.clone()))
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Stock update of {} failed: {}", id, e);
            stock_status(&e)
        })
}
