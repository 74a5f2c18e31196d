use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, macros::datetime};
use uuid::Uuid;

use crate::{EngineEvent, EntryView, MindcapService, Result};
use mindcap_domain::{entropy::DecaySurface, review};
use mindcap_storage::{Error as StorageError, TimeField, models::Entry};

// Lower bound for stale-entry scans.
const EARLIEST: OffsetDateTime = datetime!(0001-01-01 00:00 UTC);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
	pub entry_id: Uuid,
	pub review_count: i32,
	pub review_state: String,
	#[serde(with = "crate::time_serde::option")]
	pub next_review_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookmarkRequest {
	pub entry_id: Uuid,
	/// Kept only while the entry is bookmarked.
	#[serde(default)]
	pub reason: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookmarkResponse {
	pub entry_id: Uuid,
	pub is_bookmarked: bool,
	pub bookmark_reason: Option<String>,
	pub review_state: String,
	#[serde(with = "crate::time_serde::option")]
	pub next_review_at: Option<OffsetDateTime>,
}

impl MindcapService {
	/// Counts one more review and moves the entry to the next step of the ladder.
	pub async fn mark_reviewed(&self, entry_id: Uuid) -> Result<ReviewResponse> {
		self.mark_reviewed_at(entry_id, OffsetDateTime::now_utc()).await
	}

	pub async fn mark_reviewed_at(
		&self,
		entry_id: Uuid,
		now: OffsetDateTime,
	) -> Result<ReviewResponse> {
		let review_cfg = self.cfg.review.clone();
		let entry = self
			.store
			.update_entry(
				entry_id,
				Box::new(move |entry: &mut Entry| {
					let review_count = entry.review_count.checked_add(1).ok_or_else(|| {
						StorageError::InvalidArgument("review_count is at its maximum".to_string())
					})?;
					let schedule =
						review::next_review(&review_cfg, review_count, entry.is_bookmarked, now)
							.map_err(crate::storage_invalid)?;

					entry.review_count = review_count;

					crate::apply_schedule(entry, schedule);

					Ok(())
				}),
			)
			.await?;

		tracing::info!(
			entry_id = %entry_id,
			review_count = entry.review_count,
			review_state = %entry.review_state,
			"Entry reviewed."
		);

		self.emit_schedule(&entry);

		Ok(ReviewResponse {
			entry_id,
			review_count: entry.review_count,
			review_state: entry.review_state,
			next_review_at: entry.next_review_at,
		})
	}

	/// Flips the bookmark and schedules the entry as if it had never been reviewed.
	///
	/// `review_count` is left as is, so a finished entry resurfaces on the first ladder step
	/// whichever way the bookmark goes.
	pub async fn toggle_bookmark(&self, req: BookmarkRequest) -> Result<BookmarkResponse> {
		let now = OffsetDateTime::now_utc();
		let review_cfg = self.cfg.review.clone();
		let reason = req
			.reason
			.map(|reason| reason.trim().to_string())
			.filter(|reason| !reason.is_empty());
		let entry = self
			.store
			.update_entry(
				req.entry_id,
				Box::new(move |entry: &mut Entry| {
					let is_bookmarked = !entry.is_bookmarked;
					let schedule = review::next_review(&review_cfg, 0, is_bookmarked, now)
						.map_err(crate::storage_invalid)?;

					entry.is_bookmarked = is_bookmarked;
					entry.bookmark_reason = if is_bookmarked { reason } else { None };
					entry.updated_at = now.max(entry.created_at);

					crate::apply_schedule(entry, schedule);

					Ok(())
				}),
			)
			.await?;

		tracing::info!(
			entry_id = %entry.entry_id,
			is_bookmarked = entry.is_bookmarked,
			"Bookmark toggled."
		);

		self.emit_schedule(&entry);

		Ok(BookmarkResponse {
			entry_id: entry.entry_id,
			is_bookmarked: entry.is_bookmarked,
			bookmark_reason: entry.bookmark_reason,
			review_state: entry.review_state,
			next_review_at: entry.next_review_at,
		})
	}

	/// Scheduled entries with `next_review_at <= now`, earliest first.
	pub async fn due_entries(&self, now: OffsetDateTime) -> Result<Vec<EntryView>> {
		let entries = self.store.list_due_entries(now).await?;

		Ok(entries
			.into_iter()
			.map(|entry| self.entry_view(entry, DecaySurface::Diary, false, now))
			.collect())
	}

	/// Bookmarked entries left untouched for more than `entropy.forgotten_after_days` whole days,
	/// least recently touched first.
	pub async fn forgotten_entries(&self, now: OffsetDateTime) -> Result<Vec<EntryView>> {
		let days = i64::from(self.cfg.entropy.forgotten_after_days) + 1;
		let Some(cutoff) = now.checked_sub(Duration::days(days)) else {
			return Ok(Vec::new());
		};

		if cutoff < EARLIEST {
			return Ok(Vec::new());
		}

		let entries =
			self.store.query_entries_by_time(TimeField::UpdatedAt, EARLIEST, cutoff).await?;

		Ok(entries
			.into_iter()
			.filter(|entry| entry.is_bookmarked)
			.map(|entry| self.entry_view(entry, DecaySurface::Diary, false, now))
			.collect())
	}

	fn emit_schedule(&self, entry: &Entry) {
		self.events.emit(EngineEvent::ReviewScheduled {
			entry_id: entry.entry_id,
			next_review_at: entry.next_review_at,
		});
	}
}
