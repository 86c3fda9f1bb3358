use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub engine: Engine,
	pub composer: Composer,
	pub routing: Routing,
	pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Engine {
	pub log_level: String,
	pub max_query_chars: u32,
	/// Capability names that operators have switched off. Matching capabilities
	/// stay registered and report as blocked instead of executing.
	#[serde(default)]
	pub disabled_capabilities: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Composer {
	pub global_concurrency_cap: u32,
	pub per_domain_cap: u32,
	pub global_timeout_ms: u64,
	pub db_timeout_ms: u64,
	pub merge: String,
}

#[derive(Debug, Deserialize)]
pub struct Routing {
	pub exact_budget_ms: u64,
	pub text_budget_ms: u64,
	pub vector_budget_ms: u64,
	pub row_limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
}
