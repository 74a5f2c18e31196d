use std::{
	collections::HashMap,
	future,
	sync::{Mutex, MutexGuard},
};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, EntryMutation, Error, Result, Store, TimeField,
	models::{EchoLink, Entry},
	store,
};

#[derive(Default)]
struct MemoryState {
	entries: HashMap<Uuid, Entry>,
	links: Vec<EchoLink>,
}

/// Process-local store. Every operation completes under a single lock, so per-entry updates are
/// atomic.
#[derive(Default)]
pub struct MemoryStore {
	state: Mutex<MemoryState>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock(&self) -> MutexGuard<'_, MemoryState> {
		self.state.lock().unwrap_or_else(|err| err.into_inner())
	}

	fn insert_entry_now(&self, entry: &Entry) -> Result<()> {
		store::validate_new_entry(entry)?;

		let mut state = self.lock();

		if state.entries.contains_key(&entry.entry_id) {
			return Err(Error::Conflict(format!("entry {} already exists", entry.entry_id)));
		}

		state.entries.insert(entry.entry_id, entry.clone());

		Ok(())
	}

	fn update_entry_now(&self, entry_id: Uuid, mutation: EntryMutation) -> Result<Entry> {
		let mut state = self.lock();
		let Some(current) = state.entries.get(&entry_id) else {
			return Err(Error::NotFound(format!("entry {entry_id}")));
		};
		let mut next = current.clone();

		mutation(&mut next)?;

		store::validate_entry_mutation(current, &next)?;

		state.entries.insert(entry_id, next.clone());

		Ok(next)
	}

	fn delete_entry_now(&self, entry_id: Uuid) -> bool {
		let mut state = self.lock();
		let existed = state.entries.remove(&entry_id).is_some();

		state.links.retain(|link| link.source_id != entry_id && link.target_id != entry_id);

		existed
	}

	fn query_entries_now(
		&self,
		field: TimeField,
		from: OffsetDateTime,
		to: OffsetDateTime,
	) -> Vec<Entry> {
		let state = self.lock();
		let mut entries = state
			.entries
			.values()
			.filter(|entry| {
				let at = field.of(entry);

				at >= from && at <= to
			})
			.cloned()
			.collect::<Vec<_>>();

		entries.sort_by_key(|entry| (field.of(entry), entry.entry_id));

		entries
	}

	fn list_due_now(&self, now: OffsetDateTime) -> Vec<Entry> {
		let state = self.lock();
		let mut entries =
			state.entries.values().filter(|entry| entry.is_due(now)).cloned().collect::<Vec<_>>();

		entries.sort_by_key(|entry| (entry.next_review_at, entry.entry_id));

		entries
	}

	fn append_links_now(&self, links: &[EchoLink]) -> Result<()> {
		store::validate_links(links)?;

		let mut state = self.lock();

		for link in links {
			for endpoint in [link.source_id, link.target_id] {
				if !state.entries.contains_key(&endpoint) {
					return Err(Error::NotFound(format!(
						"entry {endpoint} referenced by echo link {}",
						link.link_id
					)));
				}
			}
		}

		state.links.extend_from_slice(links);

		Ok(())
	}

	fn links_for_entry_now(&self, entry_id: Uuid) -> Vec<EchoLink> {
		self.lock()
			.links
			.iter()
			.filter(|link| link.source_id == entry_id || link.target_id == entry_id)
			.cloned()
			.collect()
	}
}
impl Store for MemoryStore {
	fn insert_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>> {
		Box::pin(future::ready(self.insert_entry_now(entry)))
	}

	fn get_entry<'a>(&'a self, entry_id: Uuid) -> BoxFuture<'a, Result<Option<Entry>>> {
		let entry = self.lock().entries.get(&entry_id).cloned();

		Box::pin(future::ready(Ok(entry)))
	}

	fn update_entry<'a>(
		&'a self,
		entry_id: Uuid,
		mutation: EntryMutation,
	) -> BoxFuture<'a, Result<Entry>> {
		Box::pin(future::ready(self.update_entry_now(entry_id, mutation)))
	}

	fn delete_entry<'a>(&'a self, entry_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(future::ready(Ok(self.delete_entry_now(entry_id))))
	}

	fn query_entries_by_time<'a>(
		&'a self,
		field: TimeField,
		from: OffsetDateTime,
		to: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(future::ready(Ok(self.query_entries_now(field, from, to))))
	}

	fn list_due_entries<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(future::ready(Ok(self.list_due_now(now))))
	}

	fn count_entries<'a>(&'a self) -> BoxFuture<'a, Result<u64>> {
		let count = self.lock().entries.len() as u64;

		Box::pin(future::ready(Ok(count)))
	}

	fn append_links<'a>(&'a self, links: &'a [EchoLink]) -> BoxFuture<'a, Result<()>> {
		Box::pin(future::ready(self.append_links_now(links)))
	}

	fn list_links_for_entry<'a>(
		&'a self,
		entry_id: Uuid,
	) -> BoxFuture<'a, Result<Vec<EchoLink>>> {
		Box::pin(future::ready(Ok(self.links_for_entry_now(entry_id))))
	}

	fn list_links<'a>(&'a self) -> BoxFuture<'a, Result<Vec<EchoLink>>> {
		let links = self.lock().links.clone();

		Box::pin(future::ready(Ok(links)))
	}
}
