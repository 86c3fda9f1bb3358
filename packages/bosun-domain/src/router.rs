use std::collections::HashSet;

use uuid::Uuid;

use crate::{
	catalog::{self, Domain, Shard},
	context::UserContext,
	entity::{Entity, EntityType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SearchTarget {
	pub shard: Shard,
	pub domain: Domain,
	pub budget_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoutePolicy {
	pub global_concurrency_cap: u32,
	pub per_domain_cap: u32,
	pub global_timeout_ms: u64,
	pub db_timeout_ms: u64,
	pub row_limit: u32,
}
impl RoutePolicy {
	pub fn from_config(cfg: &bosun_config::Config) -> Self {
		Self {
			global_concurrency_cap: cfg.composer.global_concurrency_cap,
			per_domain_cap: cfg.composer.per_domain_cap,
			global_timeout_ms: cfg.composer.global_timeout_ms,
			db_timeout_ms: cfg.composer.db_timeout_ms,
			row_limit: cfg.routing.row_limit,
		}
	}
}

/// One request's routing decision. Built once, immutable, consumed by the
/// composer. Either fully formed or not produced at all.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RoutePlan {
	pub search_id: Uuid,
	pub targets: Vec<SearchTarget>,
	pub policy: RoutePolicy,
	pub context: UserContext,
	pub raw_query: String,
	pub entity_types: Vec<EntityType>,
}

/// Pure mapping from extracted entities to a route plan, O(entities). Target
/// order is first-entity-type-seen; a `(shard, domain)` collision keeps the
/// first budget and drops the duplicate silently. An empty target list is
/// replaced by the fallback sweep so every request yields at least one target.
pub fn route_plan(
	entities: &[Entity],
	context: UserContext,
	cfg: &bosun_config::Config,
	raw_query: &str,
) -> RoutePlan {
	let mut targets = Vec::new();
	let mut seen = HashSet::new();
	let mut entity_types = Vec::new();

	for entity in entities {
		if !entity_types.contains(&entity.entity_type) {
			entity_types.push(entity.entity_type);
		}

		for (shard, domain) in catalog::targets_for(entity.entity_type) {
			if !seen.insert((*shard, *domain)) {
				continue;
			}

			targets.push(SearchTarget {
				shard: *shard,
				domain: *domain,
				budget_ms: shard.budget_ms(&cfg.routing),
			});
		}
	}

	if targets.is_empty() {
		targets = fallback_targets(&cfg.routing);
	}

	RoutePlan {
		search_id: Uuid::new_v4(),
		targets,
		policy: RoutePolicy::from_config(cfg),
		context,
		raw_query: raw_query.to_string(),
		entity_types,
	}
}

pub fn fallback_targets(routing: &bosun_config::Routing) -> Vec<SearchTarget> {
	catalog::FALLBACK_TARGETS
		.iter()
		.map(|(shard, domain)| SearchTarget {
			shard: *shard,
			domain: *domain,
			budget_ms: shard.budget_ms(routing),
		})
		.collect()
}
