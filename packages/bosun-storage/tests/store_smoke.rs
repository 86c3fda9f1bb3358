use std::env;

use bosun_config::Postgres;
use bosun_storage::{db::Db, Error};

fn env_dsn() -> Option<String> {
	env::var("BOSUN_PG_DSN").ok().filter(|dsn| !dsn.trim().is_empty())
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOSUN_PG_DSN to run."]
async fn decodes_the_capability_row_shape() {
	let Some(dsn) = env_dsn() else {
		eprintln!("Skipping decodes_the_capability_row_shape; set BOSUN_PG_DSN to run this test.");

		return;
	};
	let cfg = Postgres { dsn, pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");
	let store = bosun_storage::TenantStore {
		db,
		qdrant: unreachable_qdrant(),
	};
	let query = bosun_storage::BuiltQuery::Sql {
		text: "\
SELECT 'fault'::text AS object_type,
	$1::text AS object_id,
	1.0::real AS score,
	''::text AS snippet,
	jsonb_build_object('code', $2::text) AS payload"
			.to_string(),
		binds: vec!["f-1".to_string(), "WARN-335".to_string()],
	};
	let rows = run(&store, &query, 1_000).await.expect("Statement must run.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].object_type, "fault");
	assert_eq!(rows[0].object_id, "f-1");
	assert_eq!(rows[0].payload["code"], "WARN-335");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BOSUN_PG_DSN to run."]
async fn slow_statement_hits_the_statement_timeout() {
	let Some(dsn) = env_dsn() else {
		eprintln!("Skipping slow_statement_hits_the_statement_timeout; set BOSUN_PG_DSN to run.");

		return;
	};
	let cfg = Postgres { dsn, pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");
	let store = bosun_storage::TenantStore {
		db,
		qdrant: unreachable_qdrant(),
	};
	let query = bosun_storage::BuiltQuery::Sql {
		text: "\
SELECT 'fault'::text AS object_type,
	''::text AS object_id,
	1.0::real AS score,
	''::text AS snippet,
	'{}'::jsonb AS payload
FROM pg_sleep(2)"
			.to_string(),
		binds: Vec::new(),
	};
	let result = run(&store, &query, 100).await;

	assert!(matches!(result, Err(Error::StatementTimeout { .. })));
}

async fn run(
	store: &bosun_storage::TenantStore,
	query: &bosun_storage::BuiltQuery,
	timeout_ms: u64,
) -> bosun_storage::Result<Vec<bosun_storage::SearchRow>> {
	use bosun_storage::CapabilityBackend;

	store.run("store_smoke", query, timeout_ms).await
}

fn unreachable_qdrant() -> bosun_storage::qdrant::QdrantStore {
	let cfg = bosun_config::Qdrant {
		url: "http://localhost:6334".to_string(),
		collection: "bosun_smoke".to_string(),
	};

	bosun_storage::qdrant::QdrantStore::new(&cfg).expect("Qdrant client must build.")
}
