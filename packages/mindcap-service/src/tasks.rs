use std::{
	collections::HashMap,
	sync::{Arc, Mutex, MutexGuard},
};

use time::OffsetDateTime;
use tokio::task::{AbortHandle, JoinHandle};
use uuid::Uuid;

use crate::{Result, echo::EchoEngine};
use mindcap_storage::models::Entry;

#[derive(Default)]
struct TaskTable {
	next_generation: u64,
	current: HashMap<Uuid, (u64, AbortHandle)>,
	handles: Vec<JoinHandle<()>>,
}

/// Detached link discovery runs, at most one live run per entry.
///
/// A newer run for the same entry aborts the older one, and a run only writes links while it is
/// still the newest run for an entry that still exists.
#[derive(Clone, Default)]
pub struct LinkTasks {
	table: Arc<Mutex<TaskTable>>,
}
impl LinkTasks {
	pub fn new() -> Self {
		Self::default()
	}

	/// Spawns discovery for `entry` and returns the generation of the new run.
	pub fn schedule(&self, engine: Arc<EchoEngine>, entry: Entry) -> u64 {
		let entry_id = entry.entry_id;
		let mut table = self.lock();

		table.next_generation += 1;

		let generation = table.next_generation;
		let tasks = self.clone();
		let handle = tokio::spawn(async move {
			if let Err(err) = run(&engine, &tasks, &entry, generation).await {
				engine.report_failure(entry.entry_id, &err);
			}

			tasks.finish(entry.entry_id, generation);
		});

		if let Some((_, previous)) =
			table.current.insert(entry_id, (generation, handle.abort_handle()))
		{
			previous.abort();

			tracing::debug!(entry_id = %entry_id, "Superseded in-flight link discovery.");
		}

		table.handles.retain(|handle| !handle.is_finished());
		table.handles.push(handle);

		generation
	}

	/// Aborts the live run for `entry_id`. Returns whether one was in flight.
	pub fn cancel(&self, entry_id: Uuid) -> bool {
		match self.lock().current.remove(&entry_id) {
			Some((_, handle)) => {
				handle.abort();

				true
			},
			None => false,
		}
	}

	pub fn is_current(&self, entry_id: Uuid, generation: u64) -> bool {
		self.lock().current.get(&entry_id).is_some_and(|(current, _)| *current == generation)
	}

	pub fn in_flight(&self) -> usize {
		self.lock().current.len()
	}

	/// Resolves once every run, including runs scheduled while waiting, has ended.
	pub async fn wait_idle(&self) {
		loop {
			let handles = std::mem::take(&mut self.lock().handles);

			if handles.is_empty() {
				return;
			}

			for handle in handles {
				if let Err(err) = handle.await
					&& err.is_panic()
				{
					tracing::error!(error = %err, "Link discovery task panicked.");
				}
			}
		}
	}

	fn finish(&self, entry_id: Uuid, generation: u64) {
		let mut table = self.lock();

		if table.current.get(&entry_id).is_some_and(|(current, _)| *current == generation) {
			table.current.remove(&entry_id);
		}
	}

	fn lock(&self) -> MutexGuard<'_, TaskTable> {
		self.table.lock().unwrap_or_else(|err| err.into_inner())
	}
}

async fn run(engine: &EchoEngine, tasks: &LinkTasks, entry: &Entry, generation: u64) -> Result<()> {
	let links = engine.scan(entry, OffsetDateTime::now_utc()).await?;

	if !tasks.is_current(entry.entry_id, generation) {
		tracing::debug!(entry_id = %entry.entry_id, "Dropping links from a superseded run.");

		return Ok(());
	}
	if engine.store().get_entry(entry.entry_id).await?.is_none() {
		tracing::debug!(entry_id = %entry.entry_id, "Dropping links for a deleted entry.");

		return Ok(());
	}

	engine.persist(entry.entry_id, &links).await
}
