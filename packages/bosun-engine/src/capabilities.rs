use std::collections::BTreeMap;

use bosun_domain::{
	catalog::{Domain, Shard},
	entity::{Entity, EntityType},
	router::SearchTarget,
};

use crate::registry::{
	CapabilityCall, CapabilityDescriptor, CapabilityRegistry, CapabilityStatus, QuerySpec,
	SqlCondition,
};

/// The standard capability set, one or more per data domain. Operator
/// configuration can flip individual capabilities to disabled without
/// unregistering them.
pub fn standard_registry(cfg: &bosun_config::Config) -> CapabilityRegistry {
	let mut registry = CapabilityRegistry::new();

	registry.register(descriptor(
		"faults_by_code",
		Domain::Faults,
		Shard::Exact,
		&["code"],
		build_faults_by_code,
	));
	registry.register(descriptor(
		"faults_text",
		Domain::Faults,
		Shard::Text,
		&["code", "equipment", "severity"],
		build_faults_text,
	));
	registry.register(descriptor(
		"work_orders_text",
		Domain::WorkOrders,
		Shard::Text,
		&["status", "assignee", "equipment"],
		build_work_orders_text,
	));
	registry.register(descriptor(
		"parts_by_number",
		Domain::Parts,
		Shard::Exact,
		&["part_number"],
		build_parts_by_number,
	));
	registry.register(descriptor(
		"parts_text",
		Domain::Parts,
		Shard::Text,
		&["part_number", "manufacturer", "category"],
		build_parts_text,
	));
	registry.register(descriptor(
		"documents_text",
		Domain::Documents,
		Shard::Text,
		&["doc_type", "equipment"],
		build_documents_text,
	));
	registry.register(descriptor(
		"documents_semantic",
		Domain::Documents,
		Shard::Vector,
		&["doc_type"],
		build_documents_semantic,
	));
	registry.register(descriptor(
		"shopping_list_text",
		Domain::ShoppingList,
		Shard::Text,
		&["status"],
		build_shopping_list_text,
	));

	for name in &cfg.engine.disabled_capabilities {
		registry.set_status(name, CapabilityStatus::Disabled);
	}

	registry
}

fn descriptor(
	name: &str,
	domain: Domain,
	shard: Shard,
	columns: &[&str],
	builder: fn(&CapabilityCall) -> QuerySpec,
) -> CapabilityDescriptor {
	CapabilityDescriptor {
		name: name.to_string(),
		domain,
		shard,
		columns: columns.iter().map(|column| column.to_string()).collect(),
		status: CapabilityStatus::Active,
		builder,
	}
}

/// Derives the parameter filters one target receives: exact shards key on the
/// first matching entity value, text and vector shards ride on the needle
/// alone. Caller-supplied filters are merged on top by the composer.
pub fn derive_params(target: &SearchTarget, entities: &[Entity], raw_query: &str) -> BTreeMap<String, String> {
	let mut params = BTreeMap::new();

	if target.shard != Shard::Exact {
		return params;
	}

	let (entity_type, column) = match target.domain {
		Domain::Faults => (EntityType::FaultCode, "code"),
		Domain::Parts => (EntityType::PartNumber, "part_number"),
		_ => return params,
	};
	let value = entities
		.iter()
		.find(|entity| entity.entity_type == entity_type)
		.map(|entity| entity.value.trim().to_string())
		.unwrap_or_else(|| raw_query.trim().to_string());

	params.insert(column.to_string(), value);

	params
}

fn eq_conditions(params: &BTreeMap<String, String>) -> Vec<SqlCondition> {
	params
		.iter()
		.map(|(column, value)| SqlCondition::Eq { column: column.clone(), value: value.clone() })
		.collect()
}

fn contains_conditions(columns: &[&str], needle: &str) -> Vec<SqlCondition> {
	columns
		.iter()
		.map(|column| SqlCondition::Contains {
			column: column.to_string(),
			needle: needle.to_string(),
		})
		.collect()
}

fn build_faults_by_code(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Sql {
		select: "\
SELECT 'fault' AS object_type,
	fault_id::text AS object_id,
	1.0::real AS score,
	code || ': ' || title AS snippet,
	jsonb_build_object('code', code, 'title', title, 'severity', severity) AS payload
FROM faults"
			.to_string(),
		all_of: eq_conditions(&call.params),
		any_of: Vec::new(),
	}
}

fn build_faults_text(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Sql {
		select: "\
SELECT 'fault' AS object_type,
	fault_id::text AS object_id,
	0.6::real AS score,
	code || ': ' || title AS snippet,
	jsonb_build_object('code', code, 'title', title, 'severity', severity) AS payload
FROM faults"
			.to_string(),
		all_of: eq_conditions(&call.params),
		any_of: contains_conditions(&["code", "title", "description"], &call.needle),
	}
}

fn build_work_orders_text(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Sql {
		select: "\
SELECT 'work_order' AS object_type,
	work_order_id::text AS object_id,
	0.6::real AS score,
	title AS snippet,
	jsonb_build_object('title', title, 'status', status, 'assignee', assignee) AS payload
FROM work_orders"
			.to_string(),
		all_of: eq_conditions(&call.params),
		any_of: contains_conditions(&["title", "description", "equipment"], &call.needle),
	}
}

fn build_parts_by_number(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Sql {
		select: "\
SELECT 'part' AS object_type,
	part_id::text AS object_id,
	1.0::real AS score,
	part_number || ': ' || name AS snippet,
	jsonb_build_object('part_number', part_number, 'name', name, 'stock', stock) AS payload
FROM parts"
			.to_string(),
		all_of: eq_conditions(&call.params),
		any_of: Vec::new(),
	}
}

fn build_parts_text(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Sql {
		select: "\
SELECT 'part' AS object_type,
	part_id::text AS object_id,
	0.6::real AS score,
	part_number || ': ' || name AS snippet,
	jsonb_build_object('part_number', part_number, 'name', name, 'stock', stock) AS payload
FROM parts"
			.to_string(),
		all_of: eq_conditions(&call.params),
		any_of: contains_conditions(&["part_number", "name", "description"], &call.needle),
	}
}

fn build_documents_text(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Sql {
		select: "\
SELECT 'document' AS object_type,
	document_id::text AS object_id,
	0.6::real AS score,
	title AS snippet,
	jsonb_build_object('title', title, 'doc_type', doc_type) AS payload
FROM documents"
			.to_string(),
		all_of: eq_conditions(&call.params),
		any_of: contains_conditions(&["title", "body"], &call.needle),
	}
}

fn build_documents_semantic(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Vector { text: call.needle.clone() }
}

fn build_shopping_list_text(call: &CapabilityCall) -> QuerySpec {
	QuerySpec::Sql {
		select: "\
SELECT 'shopping_item' AS object_type,
	item_id::text AS object_id,
	0.6::real AS score,
	item_name AS snippet,
	jsonb_build_object('item_name', item_name, 'status', status) AS payload
FROM shopping_list_items"
			.to_string(),
		all_of: eq_conditions(&call.params),
		any_of: contains_conditions(&["item_name", "notes"], &call.needle),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entity(entity_type: EntityType, value: &str) -> Entity {
		Entity { entity_type, value: value.to_string(), confidence: 0.9 }
	}

	#[test]
	fn exact_fault_target_keys_on_fault_code_entity() {
		let target = SearchTarget { shard: Shard::Exact, domain: Domain::Faults, budget_ms: 400 };
		let entities = vec![
			entity(EntityType::Equipment, "main engine"),
			entity(EntityType::FaultCode, "WARN-335"),
		];
		let params = derive_params(&target, &entities, "WARN-335 main engine");

		assert_eq!(params.get("code").map(String::as_str), Some("WARN-335"));
	}

	#[test]
	fn text_targets_carry_no_derived_params() {
		let target = SearchTarget { shard: Shard::Text, domain: Domain::Faults, budget_ms: 800 };
		let params = derive_params(&target, &[], "impeller wear");

		assert!(params.is_empty());
	}

	#[test]
	fn exact_target_falls_back_to_the_needle() {
		let target = SearchTarget { shard: Shard::Exact, domain: Domain::Parts, budget_ms: 400 };
		let params = derive_params(&target, &[], "IMP-020");

		assert_eq!(params.get("part_number").map(String::as_str), Some("IMP-020"));
	}
}
