use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

use crate::{models::SearchRow, Error, Result};

pub struct Db {
	pub pool: sqlx::PgPool,
}
impl Db {
	pub async fn connect(cfg: &bosun_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	/// Runs one generated search statement. Every capability statement yields
	/// the same shape: object_type, object_id, score, snippet, payload.
	pub(crate) async fn run_search(
		&self,
		text: &str,
		binds: &[String],
		timeout_ms: u64,
	) -> Result<Vec<SearchRow>> {
		let mut query = sqlx::query_as::<_, SqlSearchRow>(text);

		for bind in binds {
			query = query.bind(bind);
		}

		let fetch = query.fetch_all(&self.pool);

		match tokio::time::timeout(Duration::from_millis(timeout_ms), fetch).await {
			Ok(rows) => Ok(rows?.into_iter().map(SqlSearchRow::into_search_row).collect()),
			Err(_) => Err(Error::StatementTimeout { timeout_ms }),
		}
	}
}

#[derive(Debug, sqlx::FromRow)]
struct SqlSearchRow {
	object_type: String,
	object_id: String,
	score: f32,
	snippet: String,
	payload: serde_json::Value,
}
impl SqlSearchRow {
	fn into_search_row(self) -> SearchRow {
		SearchRow {
			object_type: self.object_type,
			object_id: self.object_id,
			score: self.score,
			snippet: self.snippet,
			payload: self.payload,
		}
	}
}
