use std::{collections::BTreeMap, sync::Arc, time::Instant};

use bosun_domain::entity::{Entity, EntityType};
use bosun_engine::{ComposeEngine, ComposeRequest, ComposeResponse};
use bosun_testkit::{row, test_config, test_context, Script, ScriptedBackend};

fn entity(entity_type: EntityType, value: &str) -> Entity {
	Entity { entity_type, value: value.to_string(), confidence: 0.9 }
}

/// Six targets across four domains: faults x2, documents, parts x2,
/// shopping list.
fn six_target_entities() -> Vec<Entity> {
	vec![
		entity(EntityType::FaultCode, "WARN-335"),
		entity(EntityType::PartNumber, "IMP-020"),
	]
}

fn request(query: &str, entities: Vec<Entity>) -> ComposeRequest {
	ComposeRequest {
		context: test_context(),
		query: query.to_string(),
		entities,
		filters: BTreeMap::new(),
	}
}

fn assert_buckets_cover_considered(response: &ComposeResponse) {
	assert_eq!(
		response.composed.capabilities_considered.len(),
		response.composed.capabilities_executed.len()
			+ response.composed.capabilities_blocked.len()
			+ response.composed.capabilities_timed_out.len()
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn global_cap_bounds_in_flight_executions() {
	bosun_testkit::init_tracing();

	let mut cfg = test_config();

	cfg.composer.global_concurrency_cap = 2;
	cfg.composer.per_domain_cap = 2;

	let backend = Arc::new(ScriptedBackend::new().with_default(Script::slow(50, Vec::new())));
	let engine = ComposeEngine::new(cfg, backend.clone());
	let started = Instant::now();
	let response = engine
		.compose(request("WARN-335 IMP-020", six_target_entities()))
		.await
		.expect("Compose must succeed.");
	let elapsed = started.elapsed();

	assert_buckets_cover_considered(&response);
	assert_eq!(response.composed.capabilities_executed.len(), 6);
	assert!(
		backend.high_water_mark() <= 2,
		"Cap of 2 exceeded: {} in flight.",
		backend.high_water_mark()
	);
	// Three waves of two 50 ms units: the cap is enforced, not ignored.
	assert!(
		elapsed.as_millis() >= 140,
		"Six 50 ms units under cap 2 finished in {} ms.",
		elapsed.as_millis()
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn uncapped_units_actually_run_in_parallel() {
	let mut cfg = test_config();

	cfg.composer.global_concurrency_cap = 8;
	cfg.composer.per_domain_cap = 8;

	let backend = Arc::new(ScriptedBackend::new().with_default(Script::slow(50, Vec::new())));
	let engine = ComposeEngine::new(cfg, backend.clone());
	let started = Instant::now();
	let response = engine
		.compose(request("WARN-335 IMP-020", six_target_entities()))
		.await
		.expect("Compose must succeed.");
	let elapsed = started.elapsed();

	assert_eq!(response.composed.capabilities_executed.len(), 6);
	assert!(backend.high_water_mark() >= 2, "Units were fully serialized.");
	// Serial execution would take ~300 ms.
	assert!(
		elapsed.as_millis() < 280,
		"Six parallel 50 ms units took {} ms.",
		elapsed.as_millis()
	);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn per_domain_cap_serializes_one_domain_only() {
	let mut cfg = test_config();

	cfg.composer.global_concurrency_cap = 8;
	cfg.composer.per_domain_cap = 1;

	let backend = Arc::new(ScriptedBackend::new().with_default(Script::slow(50, Vec::new())));
	let engine = ComposeEngine::new(cfg, backend.clone());
	let started = Instant::now();
	// Faults domain gets two targets (exact + text); they must not overlap.
	let response = engine
		.compose(request("WARN-335 main engine", vec![
			entity(EntityType::FaultCode, "WARN-335"),
			entity(EntityType::Equipment, "main engine"),
		]))
		.await
		.expect("Compose must succeed.");
	let elapsed = started.elapsed();

	assert_eq!(response.composed.capabilities_executed.len(), 5);
	assert!(
		elapsed.as_millis() >= 90,
		"Two faults units under a per-domain cap of 1 finished in {} ms.",
		elapsed.as_millis()
	);
	assert!(!response.composed.partial_results);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn unit_budget_cancels_only_that_unit() {
	let mut cfg = test_config();

	cfg.routing.exact_budget_ms = 80;

	let backend = Arc::new(
		ScriptedBackend::new()
			.with_default(Script::rows(Vec::new()))
			.script("faults_by_code", Script::slow(5_000, vec![row("fault", "f-1", 1.0)]))
			.script("faults_text", Script::rows(vec![row("fault", "f-2", 0.6)])),
	);
	let engine = ComposeEngine::new(cfg, backend.clone());
	let started = Instant::now();
	let response = engine
		.compose(request("WARN-335 main engine", vec![
			entity(EntityType::FaultCode, "WARN-335"),
			entity(EntityType::Equipment, "main engine"),
		]))
		.await
		.expect("Compose must succeed.");
	let elapsed = started.elapsed();

	assert_buckets_cover_considered(&response);
	assert_eq!(
		response.composed.capabilities_timed_out,
		vec!["faults_by_code".to_string()]
	);
	assert!(response.composed.success, "The other units still executed.");
	assert!(response.composed.partial_results);
	assert!(elapsed.as_millis() < 2_000, "Unit timeout must not stall the plan.");
	assert!(
		!backend.completed().contains(&"faults_by_code".to_string()),
		"The timed-out execution must be cancelled, not left running."
	);
	// The timed-out unit is simply omitted from the merge.
	assert!(response.composed.results.iter().all(|hit| hit.object_id != "f-1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn global_deadline_returns_partial_results() {
	let mut cfg = test_config();

	cfg.composer.global_timeout_ms = 150;

	let backend = Arc::new(
		ScriptedBackend::new()
			.with_default(Script::slow(5_000, Vec::new()))
			.script("faults_by_code", Script::rows(vec![row("fault", "f-1", 1.0)])),
	);
	let engine = ComposeEngine::new(cfg, backend.clone());
	let started = Instant::now();
	let response = engine
		.compose(request("WARN-335 main engine", vec![
			entity(EntityType::FaultCode, "WARN-335"),
			entity(EntityType::Equipment, "main engine"),
		]))
		.await
		.expect("Compose must succeed.");
	let elapsed = started.elapsed();

	assert_buckets_cover_considered(&response);
	assert!(
		elapsed.as_millis() < 700,
		"Global deadline of 150 ms returned after {} ms.",
		elapsed.as_millis()
	);
	assert!(response.composed.partial_results);
	assert!(response.composed.success);
	assert!(response
		.composed
		.capabilities_executed
		.contains(&"faults_by_code".to_string()));
	assert_eq!(response.composed.capabilities_timed_out.len(), 4);
	assert_eq!(response.composed.total_count, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn abandoned_units_never_merge_after_return() {
	let mut cfg = test_config();

	cfg.composer.global_timeout_ms = 150;

	let backend = Arc::new(
		ScriptedBackend::new()
			.with_default(Script::slow(400, vec![row("document", "late-1", 0.9)]))
			.script("faults_by_code", Script::rows(vec![row("fault", "f-1", 1.0)])),
	);
	let engine = ComposeEngine::new(cfg, backend.clone());
	let response = engine
		.compose(request("WARN-335 main engine", vec![
			entity(EntityType::FaultCode, "WARN-335"),
			entity(EntityType::Equipment, "main engine"),
		]))
		.await
		.expect("Compose must succeed.");

	assert_eq!(response.composed.total_count, 1);

	// Give abandoned tasks time to have finished, had they kept running.
	tokio::time::sleep(std::time::Duration::from_millis(500)).await;

	let completed = backend.completed();

	assert!(
		completed.iter().all(|name| name == "faults_by_code"),
		"Abandoned executions ran to completion: {completed:?}."
	);
	assert!(response.composed.results.iter().all(|hit| hit.object_id != "late-1"));
}
