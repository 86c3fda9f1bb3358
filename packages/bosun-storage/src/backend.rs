use std::{future::Future, pin::Pin};

use crate::{models::SearchRow, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A fully built, tenant-scoped query. The SQL variant carries bind
/// placeholders only, so the literal text is safe to log and return for
/// audit. The vector variant is resolved by the Qdrant store with
/// server-side BM25 inference.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BuiltQuery {
	Sql { text: String, binds: Vec<String> },
	Vector { text: String, filter: Vec<(String, String)>, limit: u32 },
}
impl BuiltQuery {
	/// The literal generated query, for the audit trail.
	pub fn audit_text(&self) -> String {
		match self {
			Self::Sql { text, .. } => text.clone(),
			Self::Vector { text, filter, limit } => {
				let conditions: Vec<String> = filter
					.iter()
					.map(|(field, value)| format!("{field}={value}"))
					.collect();

				format!("vector({text:?}, filter: [{}], limit: {limit})", conditions.join(", "))
			},
		}
	}
}

/// The storage boundary the capability executor talks to. Implementations
/// are read-only; the executor owns validation and scoping, the backend owns
/// transport.
pub trait CapabilityBackend
where
	Self: Send + Sync,
{
	fn run<'a>(
		&'a self,
		capability: &'a str,
		query: &'a BuiltQuery,
		timeout_ms: u64,
	) -> BoxFuture<'a, Result<Vec<SearchRow>>>;
}
