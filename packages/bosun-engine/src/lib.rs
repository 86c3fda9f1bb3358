pub mod capabilities;
pub mod composer;
pub mod executor;
pub mod merge;
pub mod registry;

mod error;

use std::{collections::BTreeMap, sync::Arc};

use tracing::info;

use bosun_config::Config;
use bosun_domain::{
	context::UserContext,
	entity::Entity,
	outcome::{self, OutcomeInput, OutcomeResult},
	querygate::{self, GateReject},
	router,
};
use bosun_storage::CapabilityBackend;

pub use composer::{ComposeMetrics, ComposedResponse, UnitMetric, UnitState};
pub use error::{Error, Result};
pub use executor::{CapabilityError, CapabilityResult};
pub use merge::{MergeStrategy, SearchHit};
pub use registry::{
	BlockedReason, CapabilityCall, CapabilityDescriptor, CapabilityRegistry, CapabilityStatus,
	QuerySpec, SqlCondition,
};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ComposeRequest {
	pub context: UserContext,
	pub query: String,
	#[serde(default)]
	pub entities: Vec<Entity>,
	/// Extra column filters folded into every unit's parameters. Columns are
	/// validated per capability against its allowlist.
	#[serde(default)]
	pub filters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComposeResponse {
	pub composed: ComposedResponse,
	pub outcome: OutcomeResult,
}

/// The search composition engine: gate, route, fan out, classify. Immutable
/// after construction; one instance serves all requests concurrently.
pub struct ComposeEngine {
	pub cfg: Config,
	pub registry: CapabilityRegistry,
	pub backend: Arc<dyn CapabilityBackend>,
	strategy: MergeStrategy,
}
impl ComposeEngine {
	pub fn new(cfg: Config, backend: Arc<dyn CapabilityBackend>) -> Self {
		let registry = capabilities::standard_registry(&cfg);

		Self::with_registry(cfg, backend, registry)
	}

	pub fn with_registry(
		cfg: Config,
		backend: Arc<dyn CapabilityBackend>,
		registry: CapabilityRegistry,
	) -> Self {
		let strategy = MergeStrategy::from_config(&cfg.composer.merge);

		Self { cfg, registry, backend, strategy }
	}

	/// Runs one request end to end. Capability failures degrade the response;
	/// the only hard errors are a gate rejection and a broken routing
	/// fallback.
	pub async fn compose(&self, req: ComposeRequest) -> Result<ComposeResponse> {
		querygate::query_gate(&req.query, &self.cfg)
			.map_err(|reject| Error::QueryRejected { reason: gate_reason_code(reject) })?;

		let plan = router::route_plan(&req.entities, req.context, &self.cfg, &req.query);

		if plan.targets.is_empty() {
			return Err(Error::NoTargets);
		}

		info!(
			search_id = %plan.search_id,
			targets = plan.targets.len(),
			entities = req.entities.len(),
			"Route plan built."
		);

		let composed = composer::compose(composer::ComposeArgs {
			plan: &plan,
			entities: &req.entities,
			registry: &self.registry,
			backend: self.backend.clone(),
			strategy: self.strategy,
			filters: &req.filters,
		})
		.await;
		let outcome = outcome::classify(OutcomeInput {
			raw_query: &req.query,
			entities: &req.entities,
			has_results: composed.total_count > 0,
			result_count: composed.total_count,
		});

		info!(
			search_id = %composed.search_id,
			outcome = outcome.outcome.as_str(),
			confidence = outcome.confidence,
			"Search outcome classified."
		);

		Ok(ComposeResponse { composed, outcome })
	}
}

pub fn gate_reason_code(reject: GateReject) -> &'static str {
	match reject {
		GateReject::RejectEmpty => "REJECT_EMPTY",
		GateReject::RejectTooLong => "REJECT_TOO_LONG",
		GateReject::RejectControlChar => "REJECT_CONTROL_CHAR",
		GateReject::RejectZeroWidthChar => "REJECT_ZERO_WIDTH_CHAR",
		GateReject::RejectInstructionOverride => "REJECT_INSTRUCTION_OVERRIDE",
		GateReject::RejectSqlSplice => "REJECT_SQL_SPLICE",
	}
}
