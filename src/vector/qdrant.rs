//! Qdrant backend
//!
//! Thin adapter over `qdrant-client`; converts between the crate's
//! JSON payloads and Qdrant's protobuf values.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, ListValue, PointId, PointStruct, SearchPointsBuilder, Struct,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use secrecy::ExposeSecret;
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use super::config::{CollectionConfig, QdrantConfig};
use super::error::VectorError;
use super::store::{ScoredPoint, VectorBackend, VectorPoint, VectorResult};
use crate::config::QdrantCredentials;

/// Vector store backed by a hosted Qdrant cluster
pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl QdrantStore {
    /// Build a client without touching the network
    pub fn new(credentials: &QdrantCredentials, config: &QdrantConfig) -> VectorResult<Self> {
        let client = Qdrant::from_url(&credentials.url)
            .api_key(credentials.api_key.expose_secret().clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| VectorError::ConnectionFailed {
                url: credentials.url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: credentials.url.clone(),
        })
    }

    /// Build a client and check the server by listing collections
    pub async fn connect(credentials: &QdrantCredentials, config: &QdrantConfig) -> VectorResult<Self> {
        let store = Self::new(credentials, config)?;

        let response = store
            .client
            .list_collections()
            .await
            .map_err(|e| VectorError::ConnectionFailed {
                url: store.url.clone(),
                reason: e.to_string(),
            })?;

        info!(
            "Connected to Qdrant at {} ({} collections)",
            store.url,
            response.collections.len()
        );
        Ok(store)
    }

    /// Endpoint this store talks to
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl VectorBackend for QdrantStore {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorError::ListFailed { reason: e.to_string() })?;

        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }

    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| VectorError::ListFailed { reason: e.to_string() })
    }

    async fn ensure_collection(&self, config: &CollectionConfig) -> VectorResult<bool> {
        if self.collection_exists(&config.name).await? {
            return Ok(false);
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(config.name.clone()).vectors_config(
                    VectorParamsBuilder::new(config.vector_size, config.distance.to_qdrant()),
                ),
            )
            .await
            .map_err(|e| VectorError::CollectionCreationFailed { reason: e.to_string() })?;

        info!(
            "Created collection '{}' (size {}, {:?})",
            config.name, config.vector_size, config.distance
        );
        Ok(true)
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> VectorResult<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let written = points.len();
        let points: Vec<PointStruct> = points.into_iter().map(to_point_struct).collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(|e| VectorError::UpsertFailed { reason: e.to_string() })?;

        debug!("Upserted {} points into '{}'", written, collection);
        Ok(written)
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, query.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(|e| VectorError::SearchFailed { reason: e.to_string() })?;

        Ok(response
            .result
            .into_iter()
            .map(|point| ScoredPoint {
                id: point.id.and_then(point_id_to_string),
                score: point.score,
                payload: point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, qdrant_to_json(v)))
                    .collect(),
            })
            .collect())
    }
}

fn to_point_struct(point: VectorPoint) -> PointStruct {
    let payload: HashMap<String, QdrantValue> = point
        .payload
        .into_iter()
        .map(|(k, v)| (k, json_to_qdrant(v)))
        .collect();

    PointStruct::new(point.id.to_string(), point.vector, Payload::from(payload))
}

pub(crate) fn point_id_to_string(id: PointId) -> Option<String> {
    match id.point_id_options? {
        PointIdOptions::Num(n) => Some(n.to_string()),
        PointIdOptions::Uuid(u) => Some(u),
    }
}

pub(crate) fn qdrant_to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::Number(i.into()),
        Some(Kind::DoubleValue(d)) => Number::from_f64(d).map(Value::Number).unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_to_json).collect())
        }
        Some(Kind::StructValue(st)) => Value::Object(
            st.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
    }
}

pub(crate) fn json_to_qdrant(value: Value) -> QdrantValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Kind::StringValue(s),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_qdrant).collect(),
        }),
        Value::Object(fields) => Kind::StructValue(Struct {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k, json_to_qdrant(v)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}
