use tracing::warn;

use bosun_domain::{context::UserContext, router::RoutePolicy};
use bosun_storage::{BuiltQuery, CapabilityBackend, SearchRow};

use crate::registry::{CapabilityCall, CapabilityDescriptor, QuerySpec, SqlCondition};

/// Tagged failure classes. Validation failures are client-correctable,
/// execution failures are backend trouble; the composer treats them
/// differently and neither is ever raised as an exception.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapabilityError {
	Validation { message: String },
	Execution { message: String },
}

/// One executor invocation's outcome. Ephemeral; the composer folds these
/// into the composed response.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapabilityResult {
	pub capability_name: String,
	pub success: bool,
	pub rows: Vec<SearchRow>,
	pub row_count: u32,
	pub generated_query: Option<String>,
	pub error: Option<CapabilityError>,
}
impl CapabilityResult {
	fn failure(name: &str, generated_query: Option<String>, error: CapabilityError) -> Self {
		Self {
			capability_name: name.to_string(),
			success: false,
			rows: Vec::new(),
			row_count: 0,
			generated_query,
			error: Some(error),
		}
	}
}

pub(crate) struct ExecuteArgs<'a> {
	pub(crate) descriptor: &'a CapabilityDescriptor,
	pub(crate) call: &'a CapabilityCall,
	pub(crate) context: &'a UserContext,
	pub(crate) policy: &'a RoutePolicy,
	pub(crate) backend: &'a dyn CapabilityBackend,
}

/// Executes exactly one capability. The caller owns the time budget race;
/// this function only guards the single backend statement with the
/// database timeout.
pub(crate) async fn execute(args: ExecuteArgs<'_>) -> CapabilityResult {
	let ExecuteArgs { descriptor, call, context, policy, backend } = args;
	let unknown: Vec<&str> = call
		.params
		.keys()
		.map(String::as_str)
		.filter(|column| !descriptor.allows_column(column))
		.collect();

	if !unknown.is_empty() {
		return CapabilityResult::failure(
			&descriptor.name,
			None,
			CapabilityError::Validation {
				message: format!("Unknown parameter columns: {}.", unknown.join(", ")),
			},
		);
	}

	let scope = scope_filter(context);
	let built = match (descriptor.builder)(call) {
		QuerySpec::Sql { select, all_of, any_of } => {
			compose_sql(&select, &scope, &all_of, &any_of, policy.row_limit)
		},
		QuerySpec::Vector { text } => {
			let mut filter = scope.clone();

			filter.extend(call.params.iter().map(|(column, value)| {
				(column.clone(), value.clone())
			}));

			BuiltQuery::Vector { text, filter, limit: policy.row_limit }
		},
	};

	match backend.run(&descriptor.name, &built, policy.db_timeout_ms).await {
		Ok(rows) => success(&descriptor.name, rows, built),
		Err(err) => {
			// Internal error text stays in the log; callers only see the class.
			warn!(
				capability = %descriptor.name,
				param_columns = ?call.params.keys().collect::<Vec<_>>(),
				generated_query = %built.audit_text(),
				error = %err,
				"Capability execution failed."
			);

			let message = match err {
				bosun_storage::Error::StatementTimeout { .. } => "statement timeout",
				_ => "backend failure",
			};

			CapabilityResult::failure(
				&descriptor.name,
				Some(built.audit_text()),
				CapabilityError::Execution { message: message.to_string() },
			)
		},
	}
}

fn success(name: &str, rows: Vec<SearchRow>, built: BuiltQuery) -> CapabilityResult {
	CapabilityResult {
		capability_name: name.to_string(),
		success: true,
		row_count: rows.len() as u32,
		rows,
		generated_query: Some(built.audit_text()),
		error: None,
	}
}

/// Tenant isolation in one place: org always, yacht when the context narrows
/// to one. Every capability, SQL or vector, gets exactly these conditions.
fn scope_filter(context: &UserContext) -> Vec<(String, String)> {
	let mut filter = vec![("org_id".to_string(), context.org_id.clone())];

	if let Some(yacht_id) = &context.yacht_id {
		filter.push(("yacht_id".to_string(), yacht_id.clone()));
	}

	filter
}

fn compose_sql(
	select: &str,
	scope: &[(String, String)],
	all_of: &[SqlCondition],
	any_of: &[SqlCondition],
	row_limit: u32,
) -> BuiltQuery {
	let mut binds = Vec::new();
	let mut clauses = Vec::new();

	for (column, value) in scope {
		binds.push(value.clone());
		clauses.push(format!("{column} = ${}", binds.len()));
	}
	for condition in all_of {
		clauses.push(render_condition(condition, &mut binds));
	}

	if !any_of.is_empty() {
		let ors: Vec<String> = any_of
			.iter()
			.map(|condition| render_condition(condition, &mut binds))
			.collect();

		clauses.push(format!("({})", ors.join(" OR ")));
	}

	let text = format!(
		"{select}\nWHERE {}\nORDER BY score DESC, object_id\nLIMIT {row_limit}",
		clauses.join("\n\tAND ")
	);

	BuiltQuery::Sql { text, binds }
}

fn render_condition(condition: &SqlCondition, binds: &mut Vec<String>) -> String {
	match condition {
		SqlCondition::Eq { column, value } => {
			binds.push(value.clone());

			format!("{column} = ${}", binds.len())
		},
		SqlCondition::Contains { column, needle } => {
			binds.push(format!("%{needle}%"));

			format!("{column} ILIKE ${}", binds.len())
		},
	}
}
