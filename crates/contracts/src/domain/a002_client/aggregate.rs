use serde::{Deserialize, Serialize};

use crate::domain::common::{AggregateRoot, EntityMetadata};

crate::aggregate_id!(
    /// Unique client identifier
    ClientId
);

/// Customer that owns loads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    /// CNPJ / CPF, digits only
    pub document: String,
    pub email: Option<String>,
    pub metadata: EntityMetadata,
}

impl Client {
    pub fn new_for_insert(dto: &ClientDto) -> Self {
        Self {
            id: ClientId::new_v4(),
            name: dto.name.trim().to_string(),
            document: dto.document.chars().filter(|c| c.is_ascii_digit()).collect(),
            email: dto.email.clone().filter(|e| !e.trim().is_empty()),
            metadata: EntityMetadata::new(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Client name cannot be empty".into());
        }
        // CPF has 11 digits, CNPJ has 14
        if self.document.len() != 11 && self.document.len() != 14 {
            return Err("Document must have 11 (CPF) or 14 (CNPJ) digits".into());
        }
        if let Some(ref email) = self.email {
            if !email.contains('@') {
                return Err("Invalid email format".into());
            }
        }
        Ok(())
    }
}

impl AggregateRoot for Client {
    type Id = ClientId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn aggregate_index() -> &'static str {
        "a002"
    }

    fn collection_name() -> &'static str {
        "client"
    }

    fn element_name() -> &'static str {
        "Cliente"
    }

    fn list_name() -> &'static str {
        "Clientes"
    }
}

/// DTO for creating a client
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub name: String,
    pub document: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_is_normalized_to_digits() {
        let client = Client::new_for_insert(&ClientDto {
            name: "Agro Sul".into(),
            document: "12.345.678/0001-90".into(),
            email: None,
        });
        assert_eq!(client.document, "12345678000190");
        assert!(client.validate().is_ok());
    }

    #[test]
    fn test_short_document_is_rejected() {
        let client = Client::new_for_insert(&ClientDto {
            name: "Agro Sul".into(),
            document: "123".into(),
            email: None,
        });
        assert!(client.validate().is_err());
    }
}
