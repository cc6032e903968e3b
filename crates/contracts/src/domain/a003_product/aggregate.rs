use serde::{Deserialize, Serialize};

use crate::domain::common::{AggregateRoot, EntityMetadata};

crate::aggregate_id!(
    /// Unique product identifier
    ProductId
);

/// Unit of measure for stock quantities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Tonnes
    #[default]
    T,
    Kg,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::T => "t",
            Unit::Kg => "kg",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "t" => Some(Unit::T),
            "kg" => Some(Unit::Kg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit: Unit,
    pub metadata: EntityMetadata,
}

impl Product {
    pub fn new_for_insert(dto: &ProductDto) -> Self {
        Self {
            id: ProductId::new_v4(),
            name: dto.name.trim().to_string(),
            unit: dto.unit.unwrap_or_default(),
            metadata: EntityMetadata::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Product name cannot be empty".into());
        }
        Ok(())
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn aggregate_index() -> &'static str {
        "a003"
    }

    fn collection_name() -> &'static str {
        "product"
    }

    fn element_name() -> &'static str {
        "Produto"
    }

    fn list_name() -> &'static str {
        "Produtos"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductDto {
    pub name: String,
    pub unit: Option<Unit>,
}
