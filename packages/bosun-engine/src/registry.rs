use std::collections::BTreeMap;

use ahash::AHashMap;

use bosun_domain::catalog::{Domain, Shard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityStatus {
	Active,
	Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockedReason {
	Unregistered,
	Disabled,
}
impl BlockedReason {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Unregistered => "unregistered",
			Self::Disabled => "disabled",
		}
	}
}

/// One invocation of a capability: the free-text needle plus column-keyed
/// parameter filters. Parameter columns are validated against the
/// capability's allowlist before anything reaches storage.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapabilityCall {
	pub capability: String,
	pub needle: String,
	pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlCondition {
	Eq { column: String, value: String },
	Contains { column: String, needle: String },
}

/// What a query builder produces: the tenant-unscoped core of a query. The
/// executor alone attaches tenant scoping, placeholder numbering, ordering,
/// and the row limit.
#[derive(Debug, Clone, PartialEq)]
pub enum QuerySpec {
	Sql { select: String, all_of: Vec<SqlCondition>, any_of: Vec<SqlCondition> },
	Vector { text: String },
}

pub type QueryBuilder = fn(&CapabilityCall) -> QuerySpec;

#[derive(Debug, Clone)]
pub struct CapabilityDescriptor {
	pub name: String,
	pub domain: Domain,
	pub shard: Shard,
	pub columns: Vec<String>,
	pub status: CapabilityStatus,
	pub builder: QueryBuilder,
}
impl CapabilityDescriptor {
	pub fn allows_column(&self, column: &str) -> bool {
		self.columns.iter().any(|allowed| allowed == column)
	}
}

/// Process-wide catalog of named, read-only search capabilities. Built once
/// at startup and shared by reference; concurrent reads need no
/// synchronization.
pub struct CapabilityRegistry {
	ordered: Vec<CapabilityDescriptor>,
	by_name: AHashMap<String, usize>,
}
impl CapabilityRegistry {
	pub fn new() -> Self {
		Self { ordered: Vec::new(), by_name: AHashMap::new() }
	}

	pub fn register(&mut self, descriptor: CapabilityDescriptor) {
		if let Some(index) = self.by_name.get(&descriptor.name) {
			self.ordered[*index] = descriptor;

			return;
		}

		self.by_name.insert(descriptor.name.clone(), self.ordered.len());
		self.ordered.push(descriptor);
	}

	pub fn set_status(&mut self, name: &str, status: CapabilityStatus) {
		if let Some(index) = self.by_name.get(name) {
			self.ordered[*index].status = status;
		}
	}

	pub fn get(&self, name: &str) -> Option<&CapabilityDescriptor> {
		self.by_name.get(name).map(|index| &self.ordered[*index])
	}

	/// Resolves the capability serving a `(shard, domain)` target, in
	/// registration order. A missing or disabled capability is a blocked
	/// target, not an error.
	pub fn resolve_target(
		&self,
		shard: Shard,
		domain: Domain,
	) -> Result<&CapabilityDescriptor, (String, BlockedReason)> {
		let Some(descriptor) = self
			.ordered
			.iter()
			.find(|descriptor| descriptor.shard == shard && descriptor.domain == domain)
		else {
			return Err((
				format!("{}_{}", domain.as_str(), shard.as_str()),
				BlockedReason::Unregistered,
			));
		};

		if descriptor.status == CapabilityStatus::Disabled {
			return Err((descriptor.name.clone(), BlockedReason::Disabled));
		}

		Ok(descriptor)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.ordered.iter().map(|descriptor| descriptor.name.as_str())
	}
}

impl Default for CapabilityRegistry {
	fn default() -> Self {
		Self::new()
	}
}
