use contracts::domain::a001_warehouse::aggregate::WarehouseId;
use contracts::domain::a002_client::aggregate::ClientId;
use contracts::domain::a006_load::aggregate::{Load, LoadId, LoadStatus, StageRecord};
use contracts::domain::common::AggregateId;
use serde::{Deserialize, Serialize};

use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "a006_load")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub status: String,
    pub current_stage: i32,
    pub client_id: String,
    pub warehouse_id: String,
    pub created_at: DateTimeUtc,
    pub stage1_timestamp: Option<DateTimeUtc>,
    pub stage1_observation: Option<String>,
    pub stage1_attachment_url: Option<String>,
    pub stage2_timestamp: Option<DateTimeUtc>,
    pub stage2_observation: Option<String>,
    pub stage2_attachment_url: Option<String>,
    pub stage3_timestamp: Option<DateTimeUtc>,
    pub stage3_observation: Option<String>,
    pub stage3_attachment_url: Option<String>,
    pub stage4_timestamp: Option<DateTimeUtc>,
    pub stage4_observation: Option<String>,
    pub stage4_attachment_url: Option<String>,
    pub stage5_timestamp: Option<DateTimeUtc>,
    pub stage5_observation: Option<String>,
    pub stage5_attachment_url: Option<String>,
    pub stage5_secondary_attachment_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn record(
    timestamp: Option<DateTimeUtc>,
    observation: Option<String>,
    attachment_url: Option<String>,
) -> StageRecord {
    StageRecord {
        timestamp,
        observation,
        attachment_url,
        secondary_attachment_url: None,
    }
}

impl TryFrom<Model> for Load {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let status = LoadStatus::parse(&m.status)
            .ok_or_else(|| anyhow::anyhow!("Unknown status '{}' on load {}", m.status, m.id))?;
        let current_stage = u8::try_from(m.current_stage)
            .map_err(|_| anyhow::anyhow!("Stage {} out of range on load {}", m.current_stage, m.id))?;

        let mut stage5 = record(m.stage5_timestamp, m.stage5_observation, m.stage5_attachment_url);
        stage5.secondary_attachment_url = m.stage5_secondary_attachment_url;

        let load = Load {
            id: LoadId::from_string(&m.id).map_err(anyhow::Error::msg)?,
            status,
            current_stage,
            client_id: ClientId::from_string(&m.client_id).map_err(anyhow::Error::msg)?,
            warehouse_id: WarehouseId::from_string(&m.warehouse_id).map_err(anyhow::Error::msg)?,
            created_at: m.created_at,
            stage1: record(m.stage1_timestamp, m.stage1_observation, m.stage1_attachment_url),
            stage2: record(m.stage2_timestamp, m.stage2_observation, m.stage2_attachment_url),
            stage3: record(m.stage3_timestamp, m.stage3_observation, m.stage3_attachment_url),
            stage4: record(m.stage4_timestamp, m.stage4_observation, m.stage4_attachment_url),
            stage5,
        };
        load.check_invariants()
            .map_err(|e| anyhow::anyhow!("Load {} is inconsistent: {}", m.id, e))?;
        Ok(load)
    }
}

/// Every mutable column of the load; identity and creation columns unset
fn state_columns(load: &Load) -> ActiveModel {
    ActiveModel {
        id: NotSet,
        status: Set(load.status.as_str().to_string()),
        current_stage: Set(load.current_stage as i32),
        client_id: NotSet,
        warehouse_id: NotSet,
        created_at: NotSet,
        stage1_timestamp: Set(load.stage1.timestamp),
        stage1_observation: Set(load.stage1.observation.clone()),
        stage1_attachment_url: Set(load.stage1.attachment_url.clone()),
        stage2_timestamp: Set(load.stage2.timestamp),
        stage2_observation: Set(load.stage2.observation.clone()),
        stage2_attachment_url: Set(load.stage2.attachment_url.clone()),
        stage3_timestamp: Set(load.stage3.timestamp),
        stage3_observation: Set(load.stage3.observation.clone()),
        stage3_attachment_url: Set(load.stage3.attachment_url.clone()),
        stage4_timestamp: Set(load.stage4.timestamp),
        stage4_observation: Set(load.stage4.observation.clone()),
        stage4_attachment_url: Set(load.stage4.attachment_url.clone()),
        stage5_timestamp: Set(load.stage5.timestamp),
        stage5_observation: Set(load.stage5.observation.clone()),
        stage5_attachment_url: Set(load.stage5.attachment_url.clone()),
        stage5_secondary_attachment_url: Set(load.stage5.secondary_attachment_url.clone()),
    }
}

pub async fn insert(db: &DatabaseConnection, load: &Load) -> anyhow::Result<LoadId> {
    let mut active = state_columns(load);
    active.id = Set(load.id.as_string());
    active.client_id = Set(load.client_id.as_string());
    active.warehouse_id = Set(load.warehouse_id.as_string());
    active.created_at = Set(load.created_at);
    active.insert(db).await?;
    Ok(load.id)
}

pub async fn get_by_id(db: &DatabaseConnection, id: LoadId) -> anyhow::Result<Option<Load>> {
    Entity::find_by_id(id.as_string())
        .one(db)
        .await?
        .map(Load::try_from)
        .transpose()
}

/// Newest first
pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Load>> {
    Entity::find()
        .order_by_desc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Load::try_from)
        .collect()
}

/// Write `next` only if the stored record still has the stage and status of
/// `prev`. Returns false when no row matched.
pub async fn update_if_unchanged(
    db: &DatabaseConnection,
    next: &Load,
    prev: &Load,
) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .set(state_columns(next))
        .filter(Column::Id.eq(prev.id.as_string()))
        .filter(Column::CurrentStage.eq(prev.current_stage as i32))
        .filter(Column::Status.eq(prev.status.as_str()))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn exists(db: &DatabaseConnection, id: LoadId) -> anyhow::Result<bool> {
    Ok(Entity::find_by_id(id.as_string()).one(db).await?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::open_in_memory;
    use contracts::domain::a006_load::aggregate::StageCompletion;
    use sea_orm::sea_query::Expr;

    fn completion(stage: u8) -> StageCompletion {
        StageCompletion {
            stage,
            completed_at: chrono::Utc::now(),
            observation: Some(format!("obs {}", stage)),
            attachment_url: format!("/files/{}.pdf", stage),
            secondary_attachment_url: Some("/files/nf.xml".into()),
        }
    }

    #[tokio::test]
    async fn test_round_trip_keeps_every_stage_column() {
        let db = open_in_memory().await;
        let mut load = Load::new(ClientId::new_v4(), WarehouseId::new_v4());
        insert(&db, &load).await.unwrap();

        for stage in 1..=5 {
            let next = load.complete_stage(completion(stage)).unwrap();
            assert!(update_if_unchanged(&db, &next, &load).await.unwrap());
            load = next;
        }

        let stored = get_by_id(&db, load.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LoadStatus::Finalized);
        assert_eq!(stored.current_stage, 6);
        assert_eq!(stored.stage3.observation.as_deref(), Some("obs 3"));
        assert_eq!(stored.stage5.secondary_attachment_url.as_deref(), Some("/files/nf.xml"));
        assert_eq!(stored.stage1.secondary_attachment_url, None);
        assert!(stored.check_invariants().is_ok());
    }

    #[tokio::test]
    async fn test_stale_expected_stage_writes_nothing() {
        let db = open_in_memory().await;
        let load = Load::new(ClientId::new_v4(), WarehouseId::new_v4());
        insert(&db, &load).await.unwrap();

        let first = load.complete_stage(completion(1)).unwrap();
        assert!(update_if_unchanged(&db, &first, &load).await.unwrap());

        let mut competing = first.clone();
        competing.stage1.observation = Some("late".into());
        assert!(!update_if_unchanged(&db, &competing, &load).await.unwrap());

        let stored = get_by_id(&db, load.id).await.unwrap().unwrap();
        assert_eq!(stored.stage1.observation.as_deref(), Some("obs 1"));
    }

    #[tokio::test]
    async fn test_cancelled_record_rejects_write_based_on_earlier_read() {
        let db = open_in_memory().await;
        let load = Load::new(ClientId::new_v4(), WarehouseId::new_v4());
        insert(&db, &load).await.unwrap();

        let mut cancelled = load.clone();
        cancelled.cancel().unwrap();
        assert!(update_if_unchanged(&db, &cancelled, &load).await.unwrap());

        // same stage, but the status moved on since `load` was read
        let advanced = load.complete_stage(completion(1)).unwrap();
        assert!(!update_if_unchanged(&db, &advanced, &load).await.unwrap());

        let stored = get_by_id(&db, load.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LoadStatus::Cancelled);
        assert_eq!(stored.current_stage, 0);
    }

    #[tokio::test]
    async fn test_out_of_range_stage_is_rejected_on_read() {
        let db = open_in_memory().await;
        let load = Load::new(ClientId::new_v4(), WarehouseId::new_v4());
        insert(&db, &load).await.unwrap();

        Entity::update_many()
            .col_expr(Column::CurrentStage, Expr::value(255i32))
            .filter(Column::Id.eq(load.id.as_string()))
            .exec(&db)
            .await
            .unwrap();

        assert!(get_by_id(&db, load.id).await.is_err());
        assert!(list_all(&db).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_load() {
        let db = open_in_memory().await;
        let id = LoadId::new_v4();
        assert!(get_by_id(&db, id).await.unwrap().is_none());
        assert!(!exists(&db, id).await.unwrap());
    }
}
