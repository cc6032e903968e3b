use super::repository;
use contracts::domain::a002_client::aggregate::{Client, ClientDto, ClientId};
use sea_orm::DatabaseConnection;

/// Create a client; the document (CPF / CNPJ) must be unique
pub async fn create(db: &DatabaseConnection, dto: ClientDto) -> anyhow::Result<ClientId> {
    let aggregate = Client::new_for_insert(&dto);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;

    if repository::get_by_document(db, &aggregate.document)
        .await?
        .is_some()
    {
        return Err(anyhow::anyhow!(
            "A client with document {} already exists",
            aggregate.document
        ));
    }

    repository::insert(db, &aggregate).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: ClientId) -> anyhow::Result<Option<Client>> {
    repository::get_by_id(db, id).await
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Client>> {
    repository::list_all(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;

    fn dto(document: &str) -> ClientDto {
        ClientDto {
            name: "Cooperativa Agro".into(),
            document: document.into(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_document_is_stored_as_digits() {
        let db = open_in_memory().await;
        let id = create(&db, dto("12.345.678/0001-90")).await.unwrap();
        let client = get_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(client.document, "12345678000190");
    }

    #[tokio::test]
    async fn test_duplicate_document_is_rejected() {
        let db = open_in_memory().await;
        create(&db, dto("123.456.789-01")).await.unwrap();
        assert!(create(&db, dto("12345678901")).await.is_err());
        assert_eq!(list_all(&db).await.unwrap().len(), 1);
    }
}
