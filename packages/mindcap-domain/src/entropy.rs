use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use mindcap_config::Entropy;

/// The render surface an entry is faded on. Each surface has its own decay window.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DecaySurface {
	#[default]
	Diary,
	Focus,
}
impl DecaySurface {
	pub fn window(self, cfg: &Entropy) -> Duration {
		match self {
			Self::Diary => Duration::days(i64::from(cfg.diary_window_days)),
			Self::Focus => Duration::hours(i64::from(cfg.focus_window_hours)),
		}
	}
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct FadeStyle {
	pub grayscale_pct: f64,
	pub opacity: f64,
}

/// Visibility in `[0, 1]` of an entry last touched at `updated_at`.
///
/// Bookmarked entries never fade. An `updated_at` in the future counts as zero elapsed time.
pub fn visibility(
	updated_at: OffsetDateTime,
	is_bookmarked: bool,
	now: OffsetDateTime,
	window: Duration,
) -> f64 {
	if is_bookmarked {
		return 1.0;
	}
	if !window.is_positive() {
		return 0.0;
	}

	let elapsed = (now - updated_at).max(Duration::ZERO);
	let ratio = elapsed.as_seconds_f64() / window.as_seconds_f64();

	(1.0 - ratio).clamp(0.0, 1.0)
}

pub fn fade_style(visibility: f64) -> FadeStyle {
	let visibility = if visibility.is_finite() { visibility.clamp(0.0, 1.0) } else { 0.0 };

	FadeStyle { grayscale_pct: 100.0 - visibility * 100.0, opacity: 0.3 + visibility * 0.7 }
}
