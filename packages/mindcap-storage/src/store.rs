use std::{future::Future, pin::Pin};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{EchoLink, Entry, REVIEW_STATE_SCHEDULED},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Applied to one entry under that entry's lock. Returning an error discards the change.
pub type EntryMutation = Box<dyn FnOnce(&mut Entry) -> Result<()> + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeField {
	CreatedAt,
	UpdatedAt,
}
impl TimeField {
	pub fn column(self) -> &'static str {
		match self {
			Self::CreatedAt => "created_at",
			Self::UpdatedAt => "updated_at",
		}
	}

	pub fn of(self, entry: &Entry) -> OffsetDateTime {
		match self {
			Self::CreatedAt => entry.created_at,
			Self::UpdatedAt => entry.updated_at,
		}
	}
}

/// Persistence for entries and echo links.
///
/// Links are append-only. Deleting an entry removes every link that references it.
pub trait Store
where
	Self: Send + Sync,
{
	fn insert_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>>;

	fn get_entry<'a>(&'a self, entry_id: Uuid) -> BoxFuture<'a, Result<Option<Entry>>>;

	fn update_entry<'a>(
		&'a self,
		entry_id: Uuid,
		mutation: EntryMutation,
	) -> BoxFuture<'a, Result<Entry>>;

	/// Returns whether the entry existed.
	fn delete_entry<'a>(&'a self, entry_id: Uuid) -> BoxFuture<'a, Result<bool>>;

	/// Entries whose `field` lies in `[from, to]`, oldest first.
	fn query_entries_by_time<'a>(
		&'a self,
		field: TimeField,
		from: OffsetDateTime,
		to: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Entry>>>;

	/// Scheduled entries with `next_review_at <= now`, earliest first.
	fn list_due_entries<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<Vec<Entry>>>;

	fn count_entries<'a>(&'a self) -> BoxFuture<'a, Result<u64>>;

	fn append_links<'a>(&'a self, links: &'a [EchoLink]) -> BoxFuture<'a, Result<()>>;

	/// Links where the entry is either the source or the target.
	fn list_links_for_entry<'a>(
		&'a self,
		entry_id: Uuid,
	) -> BoxFuture<'a, Result<Vec<EchoLink>>>;

	fn list_links<'a>(&'a self) -> BoxFuture<'a, Result<Vec<EchoLink>>>;
}

pub fn validate_new_entry(entry: &Entry) -> Result<()> {
	if entry.content.trim().is_empty() {
		return Err(Error::InvalidArgument("entry content must not be empty".to_string()));
	}
	if entry.updated_at < entry.created_at {
		return Err(Error::InvalidArgument(
			"entry updated_at must not precede created_at".to_string(),
		));
	}
	if entry.review_count < 0 {
		return Err(Error::InvalidArgument("entry review_count must not be negative".to_string()));
	}
	if (entry.review_state == REVIEW_STATE_SCHEDULED) != entry.next_review_at.is_some() {
		return Err(Error::InvalidArgument(
			"entry next_review_at must be set exactly when review_state is scheduled".to_string(),
		));
	}

	Ok(())
}

/// Rejects mutations that would break the invariants of an existing entry.
pub fn validate_entry_mutation(before: &Entry, after: &Entry) -> Result<()> {
	if after.entry_id != before.entry_id {
		return Err(Error::InvalidArgument("entry_id is immutable".to_string()));
	}
	if after.created_at != before.created_at {
		return Err(Error::InvalidArgument("entry created_at is immutable".to_string()));
	}
	if after.review_count < before.review_count {
		return Err(Error::InvalidArgument("entry review_count must not decrease".to_string()));
	}

	validate_new_entry(after)
}

pub fn validate_links(links: &[EchoLink]) -> Result<()> {
	for link in links {
		if link.source_id == link.target_id {
			return Err(Error::InvalidArgument(format!(
				"echo link {} must connect two different entries",
				link.link_id
			)));
		}
	}

	Ok(())
}
