use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::a001_warehouse::aggregate::{Warehouse, WarehouseId};
use crate::domain::a003_product::aggregate::{Product, ProductId, Unit};
use crate::domain::common::AggregateRoot;

crate::aggregate_id!(
    /// Unique stock entry identifier
    StockEntryId
);

/// Quantity under which a stock line is flagged as low
pub const LOW_STOCK_THRESHOLD: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Normal,
    Low,
}

impl StockStatus {
    pub fn for_quantity(quantity: f64) -> Self {
        if quantity < LOW_STOCK_THRESHOLD {
            StockStatus::Low
        } else {
            StockStatus::Normal
        }
    }
}

/// Quantity of one product held in one warehouse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub id: StockEntryId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: f64,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

impl StockEntry {
    pub fn new(product_id: ProductId, warehouse_id: WarehouseId) -> Self {
        Self {
            id: StockEntryId::new_v4(),
            product_id,
            warehouse_id,
            quantity: 0.0,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    /// Add a positive amount on top of the current quantity
    pub fn add(&mut self, amount: f64, updated_by: Option<String>) -> Result<(), String> {
        validate_added_quantity(amount)?;
        self.quantity += amount;
        self.updated_at = Utc::now();
        self.updated_by = updated_by;
        Ok(())
    }

    /// Overwrite the quantity (inventory correction)
    pub fn set_quantity(&mut self, quantity: f64, updated_by: Option<String>) -> Result<(), String> {
        if !quantity.is_finite() || quantity < 0.0 {
            return Err("Quantity must be zero or greater".into());
        }
        self.quantity = quantity;
        self.updated_at = Utc::now();
        self.updated_by = updated_by;
        Ok(())
    }

    pub fn status(&self) -> StockStatus {
        StockStatus::for_quantity(self.quantity)
    }
}

impl AggregateRoot for StockEntry {
    type Id = StockEntryId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn aggregate_index() -> &'static str {
        "a004"
    }

    fn collection_name() -> &'static str {
        "stock"
    }

    fn element_name() -> &'static str {
        "Estoque"
    }

    fn list_name() -> &'static str {
        "Estoques"
    }
}

pub fn validate_added_quantity(amount: f64) -> Result<(), String> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err("Quantity must be greater than zero".into());
    }
    Ok(())
}

/// POST /api/stock body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStockDto {
    pub product_id: String,
    pub warehouse_id: String,
    pub quantity: f64,
}

/// PUT /api/stock/:id body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateQuantityDto {
    pub quantity: f64,
}

// ============================================================================
// Grouped view
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub id: StockEntryId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: f64,
    pub unit: Unit,
    pub status: StockStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseStock {
    pub warehouse_id: WarehouseId,
    pub name: String,
    pub city: String,
    pub state: Option<String>,
    pub capacity_total: Option<f64>,
    pub active: bool,
    pub products: Vec<StockLine>,
}

/// Group stock entries per warehouse, warehouses ordered by city then name.
///
/// Entries whose warehouse is unknown are skipped; an unknown product is
/// reported as "N/A" in tonnes.
pub fn group_by_warehouse(
    entries: &[StockEntry],
    warehouses: &[Warehouse],
    products: &[Product],
) -> Vec<WarehouseStock> {
    let mut grouped: BTreeMap<WarehouseId, WarehouseStock> = BTreeMap::new();

    for entry in entries {
        let Some(warehouse) = warehouses.iter().find(|w| w.id == entry.warehouse_id) else {
            continue;
        };
        let product = products.iter().find(|p| p.id == entry.product_id);

        grouped
            .entry(warehouse.id)
            .or_insert_with(|| WarehouseStock {
                warehouse_id: warehouse.id,
                name: warehouse.name.clone(),
                city: warehouse.city.clone(),
                state: warehouse.state.clone(),
                capacity_total: warehouse.capacity_total,
                active: warehouse.active,
                products: Vec::new(),
            })
            .products
            .push(StockLine {
                id: entry.id,
                product_id: entry.product_id,
                product_name: product.map(|p| p.name.clone()).unwrap_or_else(|| "N/A".into()),
                quantity: entry.quantity,
                unit: product.map(|p| p.unit).unwrap_or_default(),
                status: entry.status(),
                updated_at: entry.updated_at,
            });
    }

    let mut result: Vec<WarehouseStock> = grouped.into_values().collect();
    result.sort_by(|a, b| a.city.cmp(&b.city).then_with(|| a.name.cmp(&b.name)));
    result
}
