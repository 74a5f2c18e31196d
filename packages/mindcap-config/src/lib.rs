mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Echo, Entropy, IntervalUnit, Keywords, Postgres, Review, ReviewStep, Service, Storage,
};

use std::{fs, path::Path};

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
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
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
	if cfg.keywords.min_token_chars == 0 {
		return Err(Error::Validation {
			message: "keywords.min_token_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.entropy.diary_window_days == 0 {
		return Err(Error::Validation {
			message: "entropy.diary_window_days must be greater than zero.".to_string(),
		});
	}
	if cfg.entropy.focus_window_hours == 0 {
		return Err(Error::Validation {
			message: "entropy.focus_window_hours must be greater than zero.".to_string(),
		});
	}
	if cfg.entropy.forgotten_after_days == 0 {
		return Err(Error::Validation {
			message: "entropy.forgotten_after_days must be greater than zero.".to_string(),
		});
	}

	validate_review(&cfg.review)?;

	if cfg.echo.semantic_window_days == 0 {
		return Err(Error::Validation {
			message: "echo.semantic_window_days must be greater than zero.".to_string(),
		});
	}
	if cfg.echo.temporal_window_seconds == 0 {
		return Err(Error::Validation {
			message: "echo.temporal_window_seconds must be greater than zero.".to_string(),
		});
	}
	if u64::from(cfg.echo.temporal_window_seconds)
		> u64::from(cfg.echo.semantic_window_days) * 86_400
	{
		return Err(Error::Validation {
			message: "echo.temporal_window_seconds must not exceed echo.semantic_window_days."
				.to_string(),
		});
	}
	if cfg.echo.min_common_keywords == 0 {
		return Err(Error::Validation {
			message: "echo.min_common_keywords must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn validate_review(review: &Review) -> Result<()> {
	if review.steps.is_empty() {
		return Err(Error::Validation { message: "review.steps must be non-empty.".to_string() });
	}

	let mut bookmark_ladder_started = false;

	for step in &review.steps {
		if step.amount == 0 {
			return Err(Error::Validation {
				message: "review.steps.amount must be greater than zero.".to_string(),
			});
		}
		if step.bookmarked_only {
			bookmark_ladder_started = true;
		} else if bookmark_ladder_started {
			return Err(Error::Validation {
				message:
					"review.steps must not place an any-entry step after a bookmarked_only step."
						.to_string(),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.log_level = cfg.service.log_level.trim().to_string();
	cfg.keywords.extra_stop_words = cfg
		.keywords
		.extra_stop_words
		.iter()
		.map(|word| word.trim().to_lowercase())
		.filter(|word| !word.is_empty())
		.collect();
}
