use std::{collections::BTreeMap, sync::Arc, time::Duration};

use ahash::AHashMap;
use tokio::{
	sync::Semaphore,
	task::JoinSet,
	time::{self, Instant},
};
use tracing::{info, warn};
use uuid::Uuid;

use bosun_domain::{
	catalog::{Domain, Shard},
	entity::Entity,
	router::RoutePlan,
};
use bosun_storage::CapabilityBackend;

use crate::{
	capabilities,
	executor::{self, CapabilityError, CapabilityResult, ExecuteArgs},
	merge::{self, MergeStrategy, SearchHit},
	registry::{BlockedReason, CapabilityCall, CapabilityDescriptor, CapabilityRegistry},
};

/// Per-target lifecycle. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
	Pending,
	Running,
	Completed,
	TimedOut,
	Blocked,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlockedCapability {
	pub name: String,
	pub reason: BlockedReason,
}

/// Per-unit observability record: enough to compute error rates and latency
/// percentiles without extra instrumentation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct UnitMetric {
	pub capability: String,
	pub domain: Domain,
	pub shard: Shard,
	pub state: UnitState,
	pub latency_ms: u64,
	pub row_count: u32,
	pub error: Option<CapabilityError>,
	pub generated_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComposeMetrics {
	pub total_latency_ms: u64,
	pub units: Vec<UnitMetric>,
}

/// Terminal, built once per request. Every considered capability lands in
/// exactly one of executed, blocked, or timed_out.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ComposedResponse {
	pub search_id: Uuid,
	pub success: bool,
	pub total_count: u32,
	pub results: Vec<SearchHit>,
	pub partial_results: bool,
	pub capabilities_considered: Vec<String>,
	pub capabilities_executed: Vec<String>,
	pub capabilities_blocked: Vec<BlockedCapability>,
	pub capabilities_timed_out: Vec<String>,
	pub metrics: ComposeMetrics,
}

pub struct ComposeArgs<'a> {
	pub plan: &'a RoutePlan,
	pub entities: &'a [Entity],
	pub registry: &'a CapabilityRegistry,
	pub backend: Arc<dyn CapabilityBackend>,
	pub strategy: MergeStrategy,
	pub filters: &'a BTreeMap<String, String>,
}

struct ScheduledUnit {
	rank: usize,
	descriptor: CapabilityDescriptor,
	call: CapabilityCall,
	budget_ms: u64,
}

struct UnitOutcome {
	rank: usize,
	latency_ms: u64,
	/// None when the per-unit budget expired; the execution was cancelled.
	result: Option<CapabilityResult>,
}

/// Fans the plan's targets out to capability executors under the global and
/// per-domain concurrency caps and the global deadline, then folds the tagged
/// results into one response. No capability failure escapes this function.
pub async fn compose(args: ComposeArgs<'_>) -> ComposedResponse {
	let ComposeArgs { plan, entities, registry, backend, strategy, filters } = args;
	let started = Instant::now();
	let deadline = started + Duration::from_millis(plan.policy.global_timeout_ms);

	// Blocked detection happens before scheduling and consumes no slot.
	let mut blocked: Vec<(usize, BlockedCapability, Shard, Domain)> = Vec::new();
	let mut units: Vec<ScheduledUnit> = Vec::new();
	let mut scheduled_meta: AHashMap<usize, (String, Domain, Shard)> = AHashMap::new();

	for (rank, target) in plan.targets.iter().enumerate() {
		match registry.resolve_target(target.shard, target.domain) {
			Err((name, reason)) => {
				blocked.push((
					rank,
					BlockedCapability { name, reason },
					target.shard,
					target.domain,
				));
			},
			Ok(descriptor) => {
				let mut params = capabilities::derive_params(target, entities, &plan.raw_query);

				params.extend(filters.iter().map(|(k, v)| (k.clone(), v.clone())));

				let call = CapabilityCall {
					capability: descriptor.name.clone(),
					needle: plan.raw_query.trim().to_string(),
					params,
				};

				scheduled_meta
					.insert(rank, (descriptor.name.clone(), target.domain, target.shard));
				units.push(ScheduledUnit {
					rank,
					descriptor: descriptor.clone(),
					call,
					budget_ms: target.budget_ms,
				});
			},
		}
	}

	let global_slots =
		Arc::new(Semaphore::new(plan.policy.global_concurrency_cap as usize));
	let mut domain_slots: AHashMap<Domain, Arc<Semaphore>> = AHashMap::new();

	for target in &plan.targets {
		domain_slots
			.entry(target.domain)
			.or_insert_with(|| Arc::new(Semaphore::new(plan.policy.per_domain_cap as usize)));
	}

	let mut join_set = JoinSet::new();

	for unit in units {
		let global_slots = global_slots.clone();
		let domain_slot = domain_slots[&unit.descriptor.domain].clone();
		let backend = backend.clone();
		let context = plan.context.clone();
		let policy = plan.policy;

		join_set.spawn(async move {
			let Ok(_global_permit) = global_slots.acquire_owned().await else {
				return UnitOutcome { rank: unit.rank, latency_ms: 0, result: None };
			};
			let Ok(_domain_permit) = domain_slot.acquire_owned().await else {
				return UnitOutcome { rank: unit.rank, latency_ms: 0, result: None };
			};

			// The budget races the execution alone; queueing for a slot is
			// covered by the global deadline instead.
			let ran_at = Instant::now();
			let result = time::timeout(
				Duration::from_millis(unit.budget_ms),
				executor::execute(ExecuteArgs {
					descriptor: &unit.descriptor,
					call: &unit.call,
					context: &context,
					policy: &policy,
					backend: backend.as_ref(),
				}),
			)
			.await
			.ok();

			UnitOutcome {
				rank: unit.rank,
				latency_ms: ran_at.elapsed().as_millis() as u64,
				result,
			}
		});
	}

	let mut outcomes: AHashMap<usize, UnitOutcome> = AHashMap::new();
	let mut deadline_expired = false;

	loop {
		match time::timeout_at(deadline, join_set.join_next()).await {
			Ok(Some(Ok(outcome))) => {
				outcomes.insert(outcome.rank, outcome);
			},
			Ok(Some(Err(err))) => {
				warn!(search_id = %plan.search_id, error = %err, "Capability task failed to join.");
			},
			Ok(None) => break,
			Err(_) => {
				// Global deadline: abandon incomplete units. Their eventual
				// results are discarded, never merged after this point.
				join_set.abort_all();

				deadline_expired = true;

				break;
			},
		}
	}

	let mut executed_results: Vec<(u32, CapabilityResult)> = Vec::new();
	let mut capabilities_executed = Vec::new();
	let mut capabilities_timed_out = Vec::new();
	let mut units_metrics: Vec<UnitMetric> = Vec::new();

	for rank in 0..plan.targets.len() {
		if let Some((_, blocked_unit, shard, domain)) =
			blocked.iter().find(|(blocked_rank, ..)| *blocked_rank == rank)
		{
			units_metrics.push(UnitMetric {
				capability: blocked_unit.name.clone(),
				domain: *domain,
				shard: *shard,
				state: UnitState::Blocked,
				latency_ms: 0,
				row_count: 0,
				error: None,
				generated_query: None,
			});

			continue;
		}

		let Some((name, domain, shard)) = scheduled_meta.get(&rank) else {
			continue;
		};

		match outcomes.remove(&rank) {
			Some(UnitOutcome { latency_ms, result: Some(result), .. }) => {
				capabilities_executed.push(result.capability_name.clone());
				units_metrics.push(UnitMetric {
					capability: result.capability_name.clone(),
					domain: *domain,
					shard: *shard,
					state: UnitState::Completed,
					latency_ms,
					row_count: result.row_count,
					error: result.error.clone(),
					generated_query: result.generated_query.clone(),
				});
				executed_results.push((rank as u32, result));
			},
			Some(UnitOutcome { latency_ms, result: None, .. }) => {
				capabilities_timed_out.push(name.clone());
				units_metrics.push(UnitMetric {
					capability: name.clone(),
					domain: *domain,
					shard: *shard,
					state: UnitState::TimedOut,
					latency_ms,
					row_count: 0,
					error: None,
					generated_query: None,
				});
			},
			None => {
				// Abandoned at the global deadline before completing.
				capabilities_timed_out.push(name.clone());
				units_metrics.push(UnitMetric {
					capability: name.clone(),
					domain: *domain,
					shard: *shard,
					state: UnitState::TimedOut,
					latency_ms: plan.policy.global_timeout_ms,
					row_count: 0,
					error: None,
					generated_query: None,
				});
			},
		}
	}

	let capabilities_blocked: Vec<BlockedCapability> =
		blocked.into_iter().map(|(_, blocked_unit, ..)| blocked_unit).collect();
	let capabilities_considered: Vec<String> =
		units_metrics.iter().map(|unit| unit.capability.clone()).collect();
	let success = executed_results.iter().any(|(_, result)| result.success);
	let successful: Vec<(u32, &CapabilityResult)> = executed_results
		.iter()
		.filter(|(_, result)| result.success)
		.map(|(rank, result)| (*rank, result))
		.collect();
	let results = merge::merge(strategy, &successful);
	let partial_results = deadline_expired || !capabilities_timed_out.is_empty();
	let total_latency_ms = started.elapsed().as_millis() as u64;

	info!(
		search_id = %plan.search_id,
		executed = capabilities_executed.len(),
		blocked = capabilities_blocked.len(),
		timed_out = capabilities_timed_out.len(),
		total_count = results.len(),
		partial = partial_results,
		latency_ms = total_latency_ms,
		strategy = strategy.as_str(),
		"Composition finished."
	);

	ComposedResponse {
		search_id: plan.search_id,
		success,
		total_count: results.len() as u32,
		results,
		partial_results,
		capabilities_considered,
		capabilities_executed,
		capabilities_blocked,
		capabilities_timed_out,
		metrics: ComposeMetrics { total_latency_ms, units: units_metrics },
	}
}
