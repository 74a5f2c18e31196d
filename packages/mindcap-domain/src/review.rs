use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, util};

use mindcap_config::{IntervalUnit, Review, ReviewStep};

use crate::{Error, Result};

/// Outcome of scheduling. `Finished` means the entry never resurfaces again, which is distinct
/// from an entry that has not been scheduled yet.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "state", content = "at", rename_all = "snake_case")]
pub enum ReviewSchedule {
	At(OffsetDateTime),
	Finished,
}
impl ReviewSchedule {
	pub fn at(self) -> Option<OffsetDateTime> {
		match self {
			Self::At(at) => Some(at),
			Self::Finished => None,
		}
	}
}

pub fn next_review(
	cfg: &Review,
	review_count: i32,
	is_bookmarked: bool,
	base: OffsetDateTime,
) -> Result<ReviewSchedule> {
	if review_count < 0 {
		return Err(Error::NegativeReviewCount(review_count));
	}

	let Some(step) = cfg.steps.get(review_count as usize) else {
		return Ok(ReviewSchedule::Finished);
	};

	if step.bookmarked_only && !is_bookmarked {
		return Ok(ReviewSchedule::Finished);
	}

	apply_step(step, base).map(ReviewSchedule::At)
}

fn apply_step(step: &ReviewStep, base: OffsetDateTime) -> Result<OffsetDateTime> {
	let amount = i64::from(step.amount);
	let next = match step.unit {
		IntervalUnit::Minutes => base.checked_add(Duration::minutes(amount)),
		IntervalUnit::Hours => base.checked_add(Duration::hours(amount)),
		IntervalUnit::Days => base.checked_add(Duration::days(amount)),
		IntervalUnit::Months => return add_months(base, step.amount),
	};

	next.ok_or(Error::DateOutOfRange)
}

/// Calendar month addition. The day is clamped to the last day of the target month.
pub fn add_months(base: OffsetDateTime, months: u32) -> Result<OffsetDateTime> {
	let month_index = i64::from(u8::from(base.month())) - 1 + i64::from(months);
	let year = i64::from(base.year()) + month_index.div_euclid(12);
	let year = i32::try_from(year).map_err(|_| Error::DateOutOfRange)?;
	let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8)
		.map_err(|_| Error::DateOutOfRange)?;
	let day = base.day().min(util::days_in_year_month(year, month));
	let date = Date::from_calendar_date(year, month, day).map_err(|_| Error::DateOutOfRange)?;

	Ok(base.replace_date(date))
}
