use time::OffsetDateTime;
use uuid::Uuid;

pub const ENTRY_KIND_TASK: &str = "task";
pub const ENTRY_KIND_MOOD: &str = "mood";

pub const ENTRY_STATUS_ACTIVE: &str = "active";
pub const ENTRY_STATUS_COMPLETED: &str = "completed";
pub const ENTRY_STATUS_ARCHIVED: &str = "archived";

pub const REVIEW_STATE_UNSCHEDULED: &str = "unscheduled";
pub const REVIEW_STATE_SCHEDULED: &str = "scheduled";
pub const REVIEW_STATE_FINISHED: &str = "finished";

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Entry {
	pub entry_id: Uuid,
	pub kind: String,
	pub content: String,
	pub status: String,
	pub is_bookmarked: bool,
	pub bookmark_reason: Option<String>,
	pub review_count: i32,
	/// `next_review_at` is set iff this is `scheduled`.
	pub review_state: String,
	pub next_review_at: Option<OffsetDateTime>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub completed_at: Option<OffsetDateTime>,
}
impl Entry {
	pub fn is_due(&self, now: OffsetDateTime) -> bool {
		self.review_state == REVIEW_STATE_SCHEDULED
			&& self.next_review_at.is_some_and(|next_review_at| next_review_at <= now)
	}
}

#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct EchoLink {
	pub link_id: Uuid,
	pub source_id: Uuid,
	pub target_id: Uuid,
	pub link_type: String,
	pub strength: i32,
	pub keywords: Vec<String>,
	pub created_at: OffsetDateTime,
}
impl EchoLink {
	/// The endpoint opposite to `entry_id`, if the link touches it.
	pub fn other_end(&self, entry_id: Uuid) -> Option<Uuid> {
		if self.source_id == entry_id {
			Some(self.target_id)
		} else if self.target_id == entry_id {
			Some(self.source_id)
		} else {
			None
		}
	}
}
