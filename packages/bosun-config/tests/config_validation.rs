use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use bosun_config::Error;

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_with<F>(mutate: F) -> String
where
	F: FnOnce(&mut toml::value::Table),
{
	let mut value: Value =
		toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let root = value.as_table_mut().expect("Sample config must be a table.");

	mutate(root);

	toml::to_string(&value).expect("Failed to render sample config.")
}

fn set_composer(root: &mut toml::value::Table, key: &str, value: Value) {
	root.get_mut("composer")
		.and_then(Value::as_table_mut)
		.expect("Sample config must include [composer].")
		.insert(key.to_string(), value);
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("bosun_config_{pid}_{nanos}_{ordinal}.toml"));
	fs::write(&path, payload).expect("Failed to write temp config.");

	path
}

fn load(payload: String) -> bosun_config::Result<bosun_config::Config> {
	let path = write_temp_config(payload);
	let result = bosun_config::load(&path);

	let _ = fs::remove_file(&path);

	result
}

#[test]
fn accepts_sample_config() {
	let cfg = load(SAMPLE_CONFIG_TOML.to_string()).expect("Sample config must validate.");

	assert_eq!(cfg.composer.global_concurrency_cap, 8);
	assert_eq!(cfg.composer.merge, "union");
	assert_eq!(cfg.routing.vector_budget_ms, 1500);
}

#[test]
fn rejects_zero_concurrency_cap() {
	let payload = sample_with(|root| set_composer(root, "global_concurrency_cap", Value::Integer(0)));

	assert!(matches!(load(payload), Err(Error::Validation { .. })));
}

#[test]
fn rejects_domain_cap_above_global_cap() {
	let payload = sample_with(|root| set_composer(root, "per_domain_cap", Value::Integer(16)));

	assert!(matches!(load(payload), Err(Error::Validation { .. })));
}

#[test]
fn rejects_unknown_merge_mode() {
	let payload =
		sample_with(|root| set_composer(root, "merge", Value::String("newest_wins".to_string())));

	assert!(matches!(load(payload), Err(Error::Validation { .. })));
}

#[test]
fn rejects_budget_above_global_timeout() {
	let payload = sample_with(|root| {
		root.get_mut("routing")
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [routing].")
			.insert("vector_budget_ms".to_string(), Value::Integer(60_000));
	});

	assert!(matches!(load(payload), Err(Error::Validation { .. })));
}

#[test]
fn rejects_empty_dsn() {
	let payload = sample_with(|root| {
		root.get_mut("storage")
			.and_then(Value::as_table_mut)
			.and_then(|storage| storage.get_mut("postgres"))
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [storage.postgres].")
			.insert("dsn".to_string(), Value::String(" ".to_string()));
	});

	assert!(matches!(load(payload), Err(Error::Validation { .. })));
}

#[test]
fn normalizes_disabled_capability_names() {
	let payload = sample_with(|root| {
		root.get_mut("engine")
			.and_then(Value::as_table_mut)
			.expect("Sample config must include [engine].")
			.insert(
				"disabled_capabilities".to_string(),
				Value::Array(vec![
					Value::String(" faults_text ".to_string()),
					Value::String(String::new()),
				]),
			);
	});
	let cfg = load(payload).expect("Config with disabled capabilities must validate.");

	assert_eq!(cfg.engine.disabled_capabilities, vec!["faults_text".to_string()]);
}
