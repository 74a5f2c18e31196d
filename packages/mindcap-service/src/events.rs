use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
	EntrySaved { entry_id: Uuid },
	LinksDiscovered { entry_id: Uuid, count: usize },
	LinkDiscoveryFailed { entry_id: Uuid, message: String },
	/// `next_review_at` is `None` once the ladder is exhausted.
	ReviewScheduled { entry_id: Uuid, next_review_at: Option<OffsetDateTime> },
}

/// Receives engine notifications. Emitting must not block.
pub trait EventSink
where
	Self: Send + Sync,
{
	fn emit(&self, event: EngineEvent);
}

pub struct NoopSink;
impl EventSink for NoopSink {
	fn emit(&self, _event: EngineEvent) {}
}

impl EventSink for UnboundedSender<EngineEvent> {
	fn emit(&self, event: EngineEvent) {
		// A closed receiver only means nobody is listening anymore.
		let _ = self.send(event);
	}
}
