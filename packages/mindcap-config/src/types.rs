use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub keywords: Keywords,
	#[serde(default)]
	pub entropy: Entropy,
	#[serde(default)]
	pub review: Review,
	#[serde(default)]
	pub echo: Echo,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Keywords {
	/// Tokens with fewer characters than this are dropped.
	#[serde(default = "default_min_token_chars")]
	pub min_token_chars: u32,
	/// Appended to the built-in stop-word list.
	#[serde(default)]
	pub extra_stop_words: Vec<String>,
}
impl Default for Keywords {
	fn default() -> Self {
		Self { min_token_chars: default_min_token_chars(), extra_stop_words: Vec::new() }
	}
}

#[derive(Debug, Deserialize, Clone)]
pub struct Entropy {
	/// Fade window for the diary surface.
	#[serde(default = "default_diary_window_days")]
	pub diary_window_days: u32,
	/// Fade window for the short-lived focus surface.
	#[serde(default = "default_focus_window_hours")]
	pub focus_window_hours: u32,
	/// Bookmarked entries untouched for longer than this resurface as forgotten.
	#[serde(default = "default_forgotten_after_days")]
	pub forgotten_after_days: u32,
}
impl Default for Entropy {
	fn default() -> Self {
		Self {
			diary_window_days: default_diary_window_days(),
			focus_window_hours: default_focus_window_hours(),
			forgotten_after_days: default_forgotten_after_days(),
		}
	}
}

#[derive(Debug, Deserialize, Clone)]
pub struct Review {
	/// Step `n` is the interval applied after the entry has been reviewed `n` times.
	#[serde(default = "default_review_steps")]
	pub steps: Vec<ReviewStep>,
}
impl Default for Review {
	fn default() -> Self {
		Self { steps: default_review_steps() }
	}
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ReviewStep {
	pub amount: u32,
	pub unit: IntervalUnit,
	#[serde(default)]
	pub bookmarked_only: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
	Minutes,
	Hours,
	Days,
	Months,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Echo {
	/// Only entries created this recently are considered as link candidates.
	#[serde(default = "default_semantic_window_days")]
	pub semantic_window_days: u32,
	#[serde(default = "default_temporal_window_seconds")]
	pub temporal_window_seconds: u32,
	#[serde(default = "default_min_common_keywords")]
	pub min_common_keywords: u32,
}
impl Default for Echo {
	fn default() -> Self {
		Self {
			semantic_window_days: default_semantic_window_days(),
			temporal_window_seconds: default_temporal_window_seconds(),
			min_common_keywords: default_min_common_keywords(),
		}
	}
}

fn default_min_token_chars() -> u32 {
	2
}

fn default_diary_window_days() -> u32 {
	40
}

fn default_focus_window_hours() -> u32 {
	24
}

fn default_forgotten_after_days() -> u32 {
	28
}

fn default_review_steps() -> Vec<ReviewStep> {
	vec![
		ReviewStep { amount: 10, unit: IntervalUnit::Minutes, bookmarked_only: false },
		ReviewStep { amount: 24, unit: IntervalUnit::Hours, bookmarked_only: false },
		ReviewStep { amount: 7, unit: IntervalUnit::Days, bookmarked_only: true },
		ReviewStep { amount: 30, unit: IntervalUnit::Days, bookmarked_only: true },
		ReviewStep { amount: 4, unit: IntervalUnit::Months, bookmarked_only: true },
	]
}

fn default_semantic_window_days() -> u32 {
	90
}

fn default_temporal_window_seconds() -> u32 {
	300
}

fn default_min_common_keywords() -> u32 {
	2
}
