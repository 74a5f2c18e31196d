use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{EngineEvent, Error, MindcapService, Result, echo};
use mindcap_domain::{
	entropy::{self, DecaySurface, FadeStyle},
	review,
};
use mindcap_storage::models::{
	ENTRY_KIND_MOOD, ENTRY_KIND_TASK, ENTRY_STATUS_ACTIVE, ENTRY_STATUS_COMPLETED, Entry,
	REVIEW_STATE_UNSCHEDULED,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveEntryRequest {
	pub kind: String,
	pub content: String,
	/// Links the new entry to an existing one with a structural link.
	#[serde(default)]
	pub derived_from: Option<Uuid>,
	/// Backdates the entry, for imports. Defaults to the save time.
	#[serde(default, with = "crate::time_serde::option")]
	pub created_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SaveEntryResponse {
	pub entry_id: Uuid,
	#[serde(with = "crate::time_serde::option")]
	pub next_review_at: Option<OffsetDateTime>,
	pub structural_link_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditEntryRequest {
	pub entry_id: Uuid,
	pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditEntryResponse {
	pub entry_id: Uuid,
	pub review_count: i32,
	#[serde(with = "crate::time_serde::option")]
	pub next_review_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompleteEntryResponse {
	pub entry_id: Uuid,
	pub status: String,
	#[serde(with = "crate::time_serde")]
	pub completed_at: OffsetDateTime,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteEntryResponse {
	pub entry_id: Uuid,
	pub deleted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GetEntryRequest {
	pub entry_id: Uuid,
	#[serde(default)]
	pub surface: DecaySurface,
	/// Search hits are shown at full visibility regardless of age.
	#[serde(default)]
	pub force_visible: bool,
}

/// An entry as rendered, with its current visibility.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntryView {
	pub entry_id: Uuid,
	pub kind: String,
	pub content: String,
	pub status: String,
	pub is_bookmarked: bool,
	pub bookmark_reason: Option<String>,
	pub review_count: i32,
	pub review_state: String,
	#[serde(with = "crate::time_serde::option")]
	pub next_review_at: Option<OffsetDateTime>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub completed_at: Option<OffsetDateTime>,
	pub visibility: f64,
	pub fade: FadeStyle,
}

impl MindcapService {
	/// Persists a new entry and detaches link discovery for it.
	///
	/// Returns once the entry is durable. Structural link failures are reported through the event
	/// sink and do not fail the save.
	pub async fn save_entry(&self, req: SaveEntryRequest) -> Result<SaveEntryResponse> {
		let now = OffsetDateTime::now_utc();
		let kind = req.kind.trim();
		let content = req.content.trim();

		if kind != ENTRY_KIND_TASK && kind != ENTRY_KIND_MOOD {
			return Err(Error::InvalidRequest {
				message: format!("kind must be {ENTRY_KIND_TASK} or {ENTRY_KIND_MOOD}."),
			});
		}
		if content.is_empty() {
			return Err(Error::InvalidRequest { message: "content must be non-empty.".to_string() });
		}

		let created_at = req.created_at.unwrap_or(now);

		if created_at > now {
			return Err(Error::InvalidRequest {
				message: "created_at must not be in the future.".to_string(),
			});
		}

		let parent = match req.derived_from {
			Some(parent_id) => Some(self.store.get_entry(parent_id).await?.ok_or_else(|| {
				Error::InvalidRequest {
					message: format!("derived_from entry {parent_id} does not exist."),
				}
			})?),
			None => None,
		};
		let mut entry = Entry {
			entry_id: Uuid::new_v4(),
			kind: kind.to_string(),
			content: content.to_string(),
			status: ENTRY_STATUS_ACTIVE.to_string(),
			is_bookmarked: false,
			bookmark_reason: None,
			review_count: 0,
			review_state: REVIEW_STATE_UNSCHEDULED.to_string(),
			next_review_at: None,
			created_at,
			updated_at: created_at,
			completed_at: None,
		};
		let schedule = review::next_review(&self.cfg.review, 0, false, created_at)?;

		crate::apply_schedule(&mut entry, schedule);

		self.store.insert_entry(&entry).await?;

		tracing::info!(entry_id = %entry.entry_id, kind = %entry.kind, "Entry saved.");

		self.events.emit(EngineEvent::EntrySaved { entry_id: entry.entry_id });
		self.events.emit(EngineEvent::ReviewScheduled {
			entry_id: entry.entry_id,
			next_review_at: entry.next_review_at,
		});

		let structural_link_id = match parent {
			Some(parent) => self.link_to_parent(&entry, &parent, now).await,
			None => None,
		};
		let response = SaveEntryResponse {
			entry_id: entry.entry_id,
			next_review_at: entry.next_review_at,
			structural_link_id,
		};

		self.schedule_links(entry);

		Ok(response)
	}

	/// Replaces the content and schedules the next pass with the first ladder step.
	///
	/// `review_count` is kept, so the pass after that continues from step `review_count + 1`.
	/// Link discovery runs again for the new content.
	pub async fn edit_entry(&self, req: EditEntryRequest) -> Result<EditEntryResponse> {
		let now = OffsetDateTime::now_utc();
		let content = req.content.trim().to_string();

		if content.is_empty() {
			return Err(Error::InvalidRequest { message: "content must be non-empty.".to_string() });
		}

		let review_cfg = self.cfg.review.clone();
		let entry = self
			.store
			.update_entry(
				req.entry_id,
				Box::new(move |entry: &mut Entry| {
					let schedule = review::next_review(&review_cfg, 0, entry.is_bookmarked, now)
						.map_err(crate::storage_invalid)?;

					entry.content = content;
					entry.updated_at = now.max(entry.created_at);

					crate::apply_schedule(entry, schedule);

					Ok(())
				}),
			)
			.await?;

		tracing::info!(entry_id = %entry.entry_id, "Entry edited.");

		self.events.emit(EngineEvent::ReviewScheduled {
			entry_id: entry.entry_id,
			next_review_at: entry.next_review_at,
		});

		let response = EditEntryResponse {
			entry_id: entry.entry_id,
			review_count: entry.review_count,
			next_review_at: entry.next_review_at,
			updated_at: entry.updated_at,
		};

		self.schedule_links(entry);

		Ok(response)
	}

	/// Marks a task as completed. Completing an already completed task keeps the first timestamp.
	pub async fn complete_entry(&self, entry_id: Uuid) -> Result<CompleteEntryResponse> {
		let now = OffsetDateTime::now_utc();
		let current = self.load_entry(entry_id).await?;

		if current.kind != ENTRY_KIND_TASK {
			return Err(Error::InvalidRequest {
				message: "Only task entries can be completed.".to_string(),
			});
		}

		let entry = self
			.store
			.update_entry(
				entry_id,
				Box::new(move |entry: &mut Entry| {
					if entry.status != ENTRY_STATUS_COMPLETED {
						entry.status = ENTRY_STATUS_COMPLETED.to_string();
						entry.completed_at = Some(now);
						entry.updated_at = now.max(entry.created_at);
					}

					Ok(())
				}),
			)
			.await?;
		let completed_at = entry.completed_at.unwrap_or(entry.updated_at);

		tracing::info!(entry_id = %entry_id, "Entry completed.");

		Ok(CompleteEntryResponse { entry_id, status: entry.status, completed_at })
	}

	/// Deletes the entry with its links and cancels its pending link discovery.
	pub async fn delete_entry(&self, entry_id: Uuid) -> Result<DeleteEntryResponse> {
		if self.tasks.cancel(entry_id) {
			tracing::debug!(entry_id = %entry_id, "Cancelled link discovery for deleted entry.");
		}

		let deleted = self.store.delete_entry(entry_id).await?;

		if deleted {
			tracing::info!(entry_id = %entry_id, "Entry deleted.");
		}

		Ok(DeleteEntryResponse { entry_id, deleted })
	}

	pub async fn get_entry(&self, req: GetEntryRequest) -> Result<EntryView> {
		let entry = self.load_entry(req.entry_id).await?;

		Ok(self.entry_view(entry, req.surface, req.force_visible, OffsetDateTime::now_utc()))
	}

	pub fn entry_view(
		&self,
		entry: Entry,
		surface: DecaySurface,
		force_visible: bool,
		now: OffsetDateTime,
	) -> EntryView {
		let visibility = if force_visible {
			1.0
		} else {
			entropy::visibility(
				entry.updated_at,
				entry.is_bookmarked,
				now,
				surface.window(&self.cfg.entropy),
			)
		};

		EntryView {
			entry_id: entry.entry_id,
			kind: entry.kind,
			content: entry.content,
			status: entry.status,
			is_bookmarked: entry.is_bookmarked,
			bookmark_reason: entry.bookmark_reason,
			review_count: entry.review_count,
			review_state: entry.review_state,
			next_review_at: entry.next_review_at,
			created_at: entry.created_at,
			updated_at: entry.updated_at,
			completed_at: entry.completed_at,
			visibility,
			fade: entropy::fade_style(visibility),
		}
	}

	async fn link_to_parent(
		&self,
		entry: &Entry,
		parent: &Entry,
		now: OffsetDateTime,
	) -> Option<Uuid> {
		let link = echo::structural_link(entry.entry_id, parent.entry_id, now);

		match self.store.append_links(std::slice::from_ref(&link)).await {
			Ok(()) => {
				tracing::info!(
					entry_id = %entry.entry_id,
					parent_id = %parent.entry_id,
					"Structural link persisted."
				);

				Some(link.link_id)
			},
			Err(err) => {
				let err = Error::from(err);

				tracing::warn!(entry_id = %entry.entry_id, error = %err, "Structural link failed.");

				self.events.emit(EngineEvent::LinkDiscoveryFailed {
					entry_id: entry.entry_id,
					message: err.to_string(),
				});

				None
			},
		}
	}
}
