use ahash::{AHashMap, AHashSet};

use crate::executor::CapabilityResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
	Union,
	Intersection,
	Priority,
}
impl MergeStrategy {
	pub fn from_config(mode: &str) -> Self {
		match mode {
			"intersection" => Self::Intersection,
			"priority" => Self::Priority,
			_ => Self::Union,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Union => "union",
			Self::Intersection => "intersection",
			Self::Priority => "priority",
		}
	}
}

/// One merged result with provenance: which capability surfaced it and the
/// rank of the originating target within the plan.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
	pub object_type: String,
	pub object_id: String,
	pub score: f32,
	pub snippet: String,
	pub payload: serde_json::Value,
	pub capability: String,
	pub source_rank: u32,
}

/// Folds successful executions (sorted by target rank) into one result list.
/// All strategies share the identity/dedupe step; they differ only in which
/// identities survive.
pub(crate) fn merge(
	strategy: MergeStrategy,
	executions: &[(u32, &CapabilityResult)],
) -> Vec<SearchHit> {
	let mut hits = match strategy {
		MergeStrategy::Union => union(executions),
		MergeStrategy::Intersection => intersection(executions),
		MergeStrategy::Priority => priority(executions),
	};

	// Stable: equal scores keep originating target order, then arrival order.
	hits.sort_by(|a, b| {
		b.score.total_cmp(&a.score).then_with(|| a.source_rank.cmp(&b.source_rank))
	});

	hits
}

fn union(executions: &[(u32, &CapabilityResult)]) -> Vec<SearchHit> {
	let mut seen = AHashSet::new();
	let mut hits = Vec::new();

	for (rank, result) in executions {
		for row in &result.rows {
			if !seen.insert((row.object_type.clone(), row.object_id.clone())) {
				continue;
			}

			hits.push(hit(row, &result.capability_name, *rank));
		}
	}

	hits
}

fn intersection(executions: &[(u32, &CapabilityResult)]) -> Vec<SearchHit> {
	if executions.is_empty() {
		return Vec::new();
	}

	let mut counts: AHashMap<(String, String), usize> = AHashMap::new();

	for (_, result) in executions {
		let identities: AHashSet<(String, String)> = result
			.rows
			.iter()
			.map(|row| (row.object_type.clone(), row.object_id.clone()))
			.collect();

		for identity in identities {
			*counts.entry(identity).or_insert(0) += 1;
		}
	}

	let mut seen = AHashSet::new();
	let mut hits = Vec::new();

	for (rank, result) in executions {
		for row in &result.rows {
			let identity = (row.object_type.clone(), row.object_id.clone());

			if counts.get(&identity).copied() != Some(executions.len()) {
				continue;
			}
			if !seen.insert(identity) {
				continue;
			}

			hits.push(hit(row, &result.capability_name, *rank));
		}
	}

	hits
}

fn priority(executions: &[(u32, &CapabilityResult)]) -> Vec<SearchHit> {
	for (rank, result) in executions {
		if result.rows.is_empty() {
			continue;
		}

		return union(&[(*rank, *result)]);
	}

	Vec::new()
}

fn hit(row: &bosun_storage::SearchRow, capability: &str, rank: u32) -> SearchHit {
	SearchHit {
		object_type: row.object_type.clone(),
		object_id: row.object_id.clone(),
		score: row.score,
		snippet: row.snippet.clone(),
		payload: row.payload.clone(),
		capability: capability.to_string(),
		source_rank: rank,
	}
}
