use std::{collections::HashMap, time::Duration};

use qdrant_client::qdrant::{
	point_id::PointIdOptions, value::Kind, Condition, Document, Filter, Query,
	QueryPointsBuilder, ScoredPoint, Value,
};

use crate::{models::SearchRow, Error, Result};

pub const BM25_MODEL: &str = "qdrant/bm25";
pub const BM25_VECTOR_NAME: &str = "bm25";

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
}
impl QdrantStore {
	pub fn new(cfg: &bosun_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone() })
	}

	pub(crate) async fn run_search(
		&self,
		text: &str,
		filter: &[(String, String)],
		limit: u32,
		timeout_ms: u64,
	) -> Result<Vec<SearchRow>> {
		let must: Vec<Condition> = filter
			.iter()
			.map(|(field, value)| Condition::matches(field.clone(), value.clone()))
			.collect();
		let filter =
			Filter { must, should: Vec::new(), must_not: Vec::new(), min_should: None };
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(Document::new(text.to_string(), BM25_MODEL)))
			.using(BM25_VECTOR_NAME)
			.filter(filter)
			.with_payload(true)
			.limit(limit as u64);
		let request = self.client.query(search);
		let response = match tokio::time::timeout(Duration::from_millis(timeout_ms), request).await
		{
			Ok(response) => response?,
			Err(_) => return Err(Error::StatementTimeout { timeout_ms }),
		};

		Ok(response.result.iter().filter_map(point_to_search_row).collect())
	}
}

fn point_to_search_row(point: &ScoredPoint) -> Option<SearchRow> {
	let object_id = point
		.id
		.as_ref()
		.and_then(point_id_text)
		.or_else(|| payload_text(&point.payload, "object_id"))?;
	let object_type =
		payload_text(&point.payload, "object_type").unwrap_or_else(|| "document".to_string());
	let snippet = payload_text(&point.payload, "snippet")
		.or_else(|| payload_text(&point.payload, "title"))
		.unwrap_or_default();
	let payload: serde_json::Map<String, serde_json::Value> = point
		.payload
		.iter()
		.map(|(key, value)| (key.clone(), value_to_json(value)))
		.collect();

	Some(SearchRow {
		object_type,
		object_id,
		score: point.score,
		snippet,
		payload: serde_json::Value::Object(payload),
	})
}

fn point_id_text(point_id: &qdrant_client::qdrant::PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn payload_text(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.clone()),
		_ => None,
	}
}

fn value_to_json(value: &Value) -> serde_json::Value {
	match &value.kind {
		None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
		Some(Kind::BoolValue(value)) => serde_json::Value::Bool(*value),
		Some(Kind::IntegerValue(value)) => serde_json::Value::from(*value),
		Some(Kind::DoubleValue(value)) => {
			serde_json::Number::from_f64(*value)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null)
		},
		Some(Kind::StringValue(value)) => serde_json::Value::String(value.clone()),
		Some(Kind::ListValue(list)) => {
			serde_json::Value::Array(list.values.iter().map(value_to_json).collect())
		},
		Some(Kind::StructValue(object)) => serde_json::Value::Object(
			object
				.fields
				.iter()
				.map(|(key, value)| (key.clone(), value_to_json(value)))
				.collect(),
		),
	}
}
