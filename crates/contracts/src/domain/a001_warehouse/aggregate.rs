use serde::{Deserialize, Serialize};

use crate::domain::common::{AggregateRoot, EntityMetadata};

crate::aggregate_id!(
    /// Unique warehouse identifier
    WarehouseId
);

/// Warehouse ("armazém") where loads are performed and stock is kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub city: String,
    pub state: Option<String>,
    /// Total capacity in tonnes
    pub capacity_total: Option<f64>,
    pub active: bool,
    pub metadata: EntityMetadata,
}

impl Warehouse {
    pub fn new_for_insert(dto: &WarehouseDto) -> Self {
        Self {
            id: WarehouseId::new_v4(),
            name: dto.name.trim().to_string(),
            city: dto.city.trim().to_string(),
            state: dto.state.clone().filter(|s| !s.trim().is_empty()),
            capacity_total: dto.capacity_total,
            active: dto.active.unwrap_or(true),
            metadata: EntityMetadata::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Warehouse name cannot be empty".into());
        }
        if self.city.trim().is_empty() {
            return Err("Warehouse city cannot be empty".into());
        }
        if let Some(capacity) = self.capacity_total {
            if capacity < 0.0 {
                return Err("Capacity cannot be negative".into());
            }
        }
        Ok(())
    }
}

impl AggregateRoot for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn aggregate_index() -> &'static str {
        "a001"
    }

    fn collection_name() -> &'static str {
        "warehouse"
    }

    fn element_name() -> &'static str {
        "Armazém"
    }

    fn list_name() -> &'static str {
        "Armazéns"
    }
}

/// DTO for creating a warehouse
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseDto {
    pub name: String,
    pub city: String,
    pub state: Option<String>,
    pub capacity_total: Option<f64>,
    pub active: Option<bool>,
}
