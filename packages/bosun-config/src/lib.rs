mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Composer, Config, Engine, Postgres, Qdrant, Routing, Storage};

use std::{fs, path::Path};

pub const MERGE_MODES: [&str; 3] = ["union", "intersection", "priority"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.engine.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "engine.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.engine.max_query_chars == 0 {
		return Err(Error::Validation {
			message: "engine.max_query_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.composer.global_concurrency_cap == 0 {
		return Err(Error::Validation {
			message: "composer.global_concurrency_cap must be greater than zero.".to_string(),
		});
	}
	if cfg.composer.per_domain_cap == 0 {
		return Err(Error::Validation {
			message: "composer.per_domain_cap must be greater than zero.".to_string(),
		});
	}
	if cfg.composer.per_domain_cap > cfg.composer.global_concurrency_cap {
		return Err(Error::Validation {
			message: "composer.per_domain_cap must not exceed composer.global_concurrency_cap."
				.to_string(),
		});
	}
	if cfg.composer.global_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "composer.global_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.composer.db_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "composer.db_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !MERGE_MODES.contains(&cfg.composer.merge.as_str()) {
		return Err(Error::Validation {
			message: "composer.merge must be one of union, intersection, or priority.".to_string(),
		});
	}

	for (label, budget) in [
		("routing.exact_budget_ms", cfg.routing.exact_budget_ms),
		("routing.text_budget_ms", cfg.routing.text_budget_ms),
		("routing.vector_budget_ms", cfg.routing.vector_budget_ms),
	] {
		if budget == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
		if budget > cfg.composer.global_timeout_ms {
			return Err(Error::Validation {
				message: format!("{label} must not exceed composer.global_timeout_ms."),
			});
		}
	}

	if cfg.routing.row_limit == 0 {
		return Err(Error::Validation {
			message: "routing.row_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.engine.disabled_capabilities.retain(|name| !name.trim().is_empty());

	for name in &mut cfg.engine.disabled_capabilities {
		*name = name.trim().to_string();
	}
}
