pub mod backend;
pub mod db;
pub mod models;
pub mod qdrant;

mod error;

pub use backend::{BoxFuture, BuiltQuery, CapabilityBackend};
pub use error::Error;
pub use models::SearchRow;

use tracing::debug;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Production storage: Postgres for the exact and text shards, Qdrant for the
/// vector shard. Read-only from the engine's point of view.
pub struct TenantStore {
	pub db: db::Db,
	pub qdrant: qdrant::QdrantStore,
}
impl TenantStore {
	pub async fn connect(cfg: &bosun_config::Storage) -> Result<Self> {
		let db = db::Db::connect(&cfg.postgres).await?;
		let qdrant = qdrant::QdrantStore::new(&cfg.qdrant)?;

		Ok(Self { db, qdrant })
	}
}
impl CapabilityBackend for TenantStore {
	fn run<'a>(
		&'a self,
		capability: &'a str,
		query: &'a BuiltQuery,
		timeout_ms: u64,
	) -> BoxFuture<'a, Result<Vec<SearchRow>>> {
		Box::pin(async move {
			debug!(capability, timeout_ms, "Running capability query.");

			match query {
				BuiltQuery::Sql { text, binds } => {
					self.db.run_search(text, binds, timeout_ms).await
				},
				BuiltQuery::Vector { text, filter, limit } => {
					self.qdrant.run_search(text, filter, *limit, timeout_ms).await
				},
			}
		})
	}
}
