pub mod echo;
pub mod entries;
pub mod events;
pub mod related;
pub mod review;
pub mod tasks;
pub mod time_serde;

mod error;

pub use echo::{EchoEngine, discover_links, structural_link};
pub use entries::{
	CompleteEntryResponse, DeleteEntryResponse, EditEntryRequest, EditEntryResponse, EntryView,
	GetEntryRequest, SaveEntryRequest, SaveEntryResponse,
};
pub use error::{Error, Result};
pub use events::{EngineEvent, EventSink, NoopSink};
pub use related::{GraphStats, RelatedEntriesResponse, RelatedEntry};
pub use review::{BookmarkRequest, BookmarkResponse, ReviewResponse};
pub use tasks::LinkTasks;

use std::sync::Arc;

use mindcap_config::Config;
use mindcap_domain::review::ReviewSchedule;
use mindcap_storage::{
	Store,
	models::{Entry, REVIEW_STATE_FINISHED, REVIEW_STATE_SCHEDULED},
};

pub struct MindcapService {
	pub cfg: Config,
	pub store: Arc<dyn Store>,
	pub engine: Arc<EchoEngine>,
	pub tasks: LinkTasks,
	pub events: Arc<dyn EventSink>,
}
impl MindcapService {
	pub fn new(cfg: Config, store: Arc<dyn Store>) -> Self {
		Self::with_events(cfg, store, Arc::new(NoopSink))
	}

	pub fn with_events(cfg: Config, store: Arc<dyn Store>, events: Arc<dyn EventSink>) -> Self {
		let engine =
			Arc::new(EchoEngine::new(&cfg.echo, &cfg.keywords, store.clone(), events.clone()));

		Self { cfg, store, engine, tasks: LinkTasks::new(), events }
	}

	/// Waits for every detached link discovery run to finish.
	pub async fn wait_idle(&self) {
		self.tasks.wait_idle().await;
	}

	pub(crate) async fn load_entry(&self, entry_id: uuid::Uuid) -> Result<Entry> {
		self.store
			.get_entry(entry_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: format!("Entry {entry_id} does not exist.") })
	}

	pub(crate) fn schedule_links(&self, entry: Entry) {
		self.tasks.schedule(self.engine.clone(), entry);
	}
}

pub(crate) fn apply_schedule(entry: &mut Entry, schedule: ReviewSchedule) {
	match schedule {
		ReviewSchedule::At(at) => {
			entry.review_state = REVIEW_STATE_SCHEDULED.to_string();
			entry.next_review_at = Some(at);
		},
		ReviewSchedule::Finished => {
			entry.review_state = REVIEW_STATE_FINISHED.to_string();
			entry.next_review_at = None;
		},
	}
}

/// Domain failures raised inside a store mutation are rejected as invalid input.
pub(crate) fn storage_invalid(err: mindcap_domain::Error) -> mindcap_storage::Error {
	mindcap_storage::Error::InvalidArgument(err.to_string())
}
