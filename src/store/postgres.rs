use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{Jsonb, Nullable, Text, Uuid as DieselUuid};
use log::{debug, info};
use serde_json::Value;
use uuid::Uuid;

use crate::core::shared::utils::DbPool;
use crate::flows::types::{
    Flow, FlowDataRecord, FlowGraph, FlowNode, FlowPatch, NodeUpdate, PublishedFlow,
};
use crate::store::{DocumentStore, StoreError};

#[derive(QueryableByName)]
struct DocRow {
    #[diesel(sql_type = Jsonb)]
    doc: Value,
}

#[derive(QueryableByName)]
struct FlowDataRow {
    #[diesel(sql_type = DieselUuid)]
    flow_id: Uuid,
    #[diesel(sql_type = Jsonb)]
    draft: Value,
    #[diesel(sql_type = Nullable<Jsonb>)]
    published: Option<Value>,
    #[diesel(sql_type = Text)]
    updated_at: String,
}

#[derive(QueryableByName)]
struct PingRow {
    #[diesel(sql_type = diesel::sql_types::Integer)]
    #[allow(dead_code)]
    ok: i32,
}

fn row_to_flow_data(row: FlowDataRow) -> Result<FlowDataRecord, StoreError> {
    let published_data = match row.published {
        Some(Value::Null) | None => None,
        Some(value) => Some(serde_json::from_value(value)?),
    };
    Ok(FlowDataRecord {
        flow_id: row.flow_id,
        flow_data: serde_json::from_value(row.draft)?,
        published_data,
        updated_at: row.updated_at,
    })
}

fn docs_into<T: serde::de::DeserializeOwned>(rows: Vec<DocRow>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row.doc).map_err(StoreError::from))
        .collect()
}

pub fn create_flow_tables_migration() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS flows (
        id UUID PRIMARY KEY,
        doc JSONB NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE TABLE IF NOT EXISTS flow_nodes (
        id BIGSERIAL PRIMARY KEY,
        flow_id UUID NOT NULL,
        node_id TEXT NOT NULL,
        doc JSONB NOT NULL
    );

    CREATE TABLE IF NOT EXISTS flow_data (
        flow_id UUID PRIMARY KEY,
        draft JSONB NOT NULL DEFAULT '{}'::jsonb,
        published JSONB,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_flow_nodes_flow ON flow_nodes(flow_id);
    CREATE INDEX IF NOT EXISTS idx_flow_nodes_node ON flow_nodes(node_id);
    "#
}

/// Creates the collections if they do not exist yet.
pub fn ensure_schema(pool: &DbPool) -> Result<(), StoreError> {
    let mut conn = pool.get()?;
    conn.batch_execute(create_flow_tables_migration())?;
    info!("Flow store schema ready");
    Ok(())
}

/// Postgres-backed store keeping each record as a JSONB document.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: DbPool,
}

impl PgDocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            op(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.run(|conn| {
            diesel::sql_query("SELECT 1 AS ok").get_result::<PingRow>(conn)?;
            Ok(())
        })
        .await
    }

    async fn insert_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        let id = flow.id;
        let doc = serde_json::to_value(flow)?;
        self.run(move |conn| {
            diesel::sql_query("INSERT INTO flows (id, doc) VALUES ($1, $2)")
                .bind::<DieselUuid, _>(id)
                .bind::<Jsonb, _>(doc)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn find_flows(&self) -> Result<Vec<Flow>, StoreError> {
        self.run(|conn| {
            let rows: Vec<DocRow> =
                diesel::sql_query("SELECT doc FROM flows ORDER BY created_at, id").load(conn)?;
            docs_into(rows)
        })
        .await
    }

    async fn find_flow(&self, id: Uuid) -> Result<Option<Flow>, StoreError> {
        self.run(move |conn| {
            let rows: Vec<DocRow> = diesel::sql_query("SELECT doc FROM flows WHERE id = $1")
                .bind::<DieselUuid, _>(id)
                .load(conn)?;
            Ok(docs_into(rows)?.into_iter().next())
        })
        .await
    }

    async fn update_flow(&self, id: Uuid, patch: &FlowPatch) -> Result<bool, StoreError> {
        let patch = serde_json::to_value(patch)?;
        self.run(move |conn| {
            let updated = diesel::sql_query("UPDATE flows SET doc = doc || $2 WHERE id = $1")
                .bind::<DieselUuid, _>(id)
                .bind::<Jsonb, _>(patch)
                .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn delete_flow(&self, id: Uuid) -> Result<bool, StoreError> {
        self.run(move |conn| {
            let deleted = diesel::sql_query("DELETE FROM flows WHERE id = $1")
                .bind::<DieselUuid, _>(id)
                .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn insert_node(&self, node: &FlowNode) -> Result<(), StoreError> {
        let flow_id = node.flow_id;
        let node_id = node.node_id.clone();
        let doc = serde_json::to_value(node)?;
        self.run(move |conn| {
            diesel::sql_query("INSERT INTO flow_nodes (flow_id, node_id, doc) VALUES ($1, $2, $3)")
                .bind::<DieselUuid, _>(flow_id)
                .bind::<Text, _>(node_id)
                .bind::<Jsonb, _>(doc)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn find_nodes(&self, flow_id: Uuid) -> Result<Vec<FlowNode>, StoreError> {
        self.run(move |conn| {
            let rows: Vec<DocRow> =
                diesel::sql_query("SELECT doc FROM flow_nodes WHERE flow_id = $1 ORDER BY id")
                    .bind::<DieselUuid, _>(flow_id)
                    .load(conn)?;
            docs_into(rows)
        })
        .await
    }

    async fn find_node(&self, node_id: &str) -> Result<Option<FlowNode>, StoreError> {
        let node_id = node_id.to_string();
        self.run(move |conn| {
            let rows: Vec<DocRow> = diesel::sql_query(
                "SELECT doc FROM flow_nodes WHERE node_id = $1 ORDER BY id LIMIT 1",
            )
            .bind::<Text, _>(node_id)
            .load(conn)?;
            Ok(docs_into(rows)?.into_iter().next())
        })
        .await
    }

    async fn update_node(&self, node_id: &str, update: &NodeUpdate) -> Result<bool, StoreError> {
        let node_id = node_id.to_string();
        let patch = serde_json::to_value(update)?;
        self.run(move |conn| {
            let updated = diesel::sql_query(
                r#"
                UPDATE flow_nodes SET doc = doc || $2
                WHERE id = (SELECT id FROM flow_nodes WHERE node_id = $1 ORDER BY id LIMIT 1)
                "#,
            )
            .bind::<Text, _>(node_id)
            .bind::<Jsonb, _>(patch)
            .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn clear_start_nodes(&self, flow_id: Uuid) -> Result<u64, StoreError> {
        self.run(move |conn| {
            let updated = diesel::sql_query(
                r#"
                UPDATE flow_nodes SET doc = jsonb_set(doc, '{isStart}', 'false'::jsonb)
                WHERE flow_id = $1 AND COALESCE((doc->>'isStart')::boolean, FALSE)
                "#,
            )
            .bind::<DieselUuid, _>(flow_id)
            .execute(conn)?;
            debug!("Cleared {updated} start node(s) in flow {flow_id}");
            Ok(updated as u64)
        })
        .await
    }

    async fn delete_node(&self, node_id: &str) -> Result<bool, StoreError> {
        let node_id = node_id.to_string();
        self.run(move |conn| {
            let deleted = diesel::sql_query(
                r#"
                DELETE FROM flow_nodes
                WHERE id = (SELECT id FROM flow_nodes WHERE node_id = $1 ORDER BY id LIMIT 1)
                "#,
            )
            .bind::<Text, _>(node_id)
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn delete_nodes(&self, flow_id: Uuid) -> Result<u64, StoreError> {
        self.run(move |conn| {
            let deleted = diesel::sql_query("DELETE FROM flow_nodes WHERE flow_id = $1")
                .bind::<DieselUuid, _>(flow_id)
                .execute(conn)?;
            Ok(deleted as u64)
        })
        .await
    }

    async fn find_flow_data(&self, flow_id: Uuid) -> Result<Option<FlowDataRecord>, StoreError> {
        self.run(move |conn| {
            let rows: Vec<FlowDataRow> = diesel::sql_query(
                "SELECT flow_id, draft, published, updated_at FROM flow_data WHERE flow_id = $1",
            )
            .bind::<DieselUuid, _>(flow_id)
            .load(conn)?;
            rows.into_iter().next().map(row_to_flow_data).transpose()
        })
        .await
    }

    async fn upsert_flow_data(
        &self,
        flow_id: Uuid,
        draft: Option<&FlowGraph>,
        published: Option<&PublishedFlow>,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        let draft = draft.map(serde_json::to_value).transpose()?;
        let published = published.map(serde_json::to_value).transpose()?;
        let updated_at = updated_at.to_string();
        self.run(move |conn| {
            diesel::sql_query(
                r#"
                INSERT INTO flow_data (flow_id, draft, published, updated_at)
                VALUES ($1, COALESCE($2, '{}'::jsonb), $3, $4)
                ON CONFLICT (flow_id) DO UPDATE SET
                    draft = COALESCE($2, flow_data.draft),
                    published = COALESCE($3, flow_data.published),
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind::<DieselUuid, _>(flow_id)
            .bind::<Nullable<Jsonb>, _>(draft)
            .bind::<Nullable<Jsonb>, _>(published)
            .bind::<Text, _>(updated_at)
            .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn set_node_content(
        &self,
        flow_id: Uuid,
        node_id: &str,
        content: &Value,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        let node_id = node_id.to_string();
        let content = content.clone();
        let updated_at = updated_at.to_string();
        self.run(move |conn| {
            diesel::sql_query(
                r#"
                INSERT INTO flow_data (flow_id, draft, updated_at)
                VALUES ($1, jsonb_build_object('nodeContents', jsonb_build_object($2::text, $3::jsonb)), $4)
                ON CONFLICT (flow_id) DO UPDATE SET
                    draft = jsonb_set(
                        flow_data.draft,
                        '{nodeContents}',
                        COALESCE(flow_data.draft->'nodeContents', '{}'::jsonb)
                            || jsonb_build_object($2::text, $3::jsonb)
                    ),
                    updated_at = EXCLUDED.updated_at
                "#,
            )
            .bind::<DieselUuid, _>(flow_id)
            .bind::<Text, _>(node_id)
            .bind::<Jsonb, _>(content)
            .bind::<Text, _>(updated_at)
            .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn delete_flow_data(&self, flow_id: Uuid) -> Result<u64, StoreError> {
        self.run(move |conn| {
            let deleted = diesel::sql_query("DELETE FROM flow_data WHERE flow_id = $1")
                .bind::<DieselUuid, _>(flow_id)
                .execute(conn)?;
            Ok(deleted as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_migration_creates_all_collections() {
        let sql = create_flow_tables_migration();
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS flows"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS flow_nodes"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS flow_data"));
    }

    #[test]
    fn test_row_to_flow_data_treats_null_snapshot_as_absent() {
        let row = FlowDataRow {
            flow_id: Uuid::nil(),
            draft: json!({ "nodeContents": { "n1": [] } }),
            published: Some(Value::Null),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let record = row_to_flow_data(row).unwrap();
        assert!(record.published_data.is_none());
        assert!(record.flow_data.nodes.is_empty());
        assert!(record.flow_data.node_contents.contains_key("n1"));
    }
}
