use crate::entity::EntityType;

/// Search modality. Exact hits keyed columns, text hits substring indexes,
/// vector hits the semantic document index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shard {
	Exact,
	Text,
	Vector,
}
impl Shard {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Exact => "exact",
			Self::Text => "text",
			Self::Vector => "vector",
		}
	}

	pub fn budget_ms(self, routing: &bosun_config::Routing) -> u64 {
		match self {
			Self::Exact => routing.exact_budget_ms,
			Self::Text => routing.text_budget_ms,
			Self::Vector => routing.vector_budget_ms,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
	Faults,
	WorkOrders,
	Parts,
	Documents,
	ShoppingList,
}
impl Domain {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Faults => "faults",
			Self::WorkOrders => "work_orders",
			Self::Parts => "parts",
			Self::Documents => "documents",
			Self::ShoppingList => "shopping_list",
		}
	}
}

/// Static routing table: entity type to ordered `(shard, domain)` pairs.
/// Budgets are attached per shard class by the router.
pub fn targets_for(entity_type: EntityType) -> &'static [(Shard, Domain)] {
	match entity_type {
		EntityType::FaultCode => &[
			(Shard::Exact, Domain::Faults),
			(Shard::Text, Domain::Faults),
			(Shard::Text, Domain::Documents),
		],
		EntityType::PartNumber => &[
			(Shard::Exact, Domain::Parts),
			(Shard::Text, Domain::Parts),
			(Shard::Text, Domain::ShoppingList),
		],
		EntityType::Equipment => &[
			(Shard::Text, Domain::WorkOrders),
			(Shard::Text, Domain::Faults),
			(Shard::Vector, Domain::Documents),
		],
		EntityType::Symptom => &[(Shard::Vector, Domain::Documents), (Shard::Text, Domain::Faults)],
		EntityType::DocumentTopic => {
			&[(Shard::Text, Domain::Documents), (Shard::Vector, Domain::Documents)]
		},
		EntityType::Person => &[(Shard::Text, Domain::WorkOrders)],
		EntityType::Date => &[(Shard::Text, Domain::WorkOrders)],
	}
}

/// Every request routes somewhere. When no entity matches the catalog, the
/// plan falls back to a broad text plus vector sweep over documents.
pub const FALLBACK_TARGETS: [(Shard, Domain); 2] =
	[(Shard::Text, Domain::Documents), (Shard::Vector, Domain::Documents)];
