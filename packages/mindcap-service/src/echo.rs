use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{EngineEvent, Error, EventSink, Result};
use mindcap_config::{Echo, Keywords};
use mindcap_domain::{
	keywords::{self, KeywordExtractor},
	link::LinkType,
};
use mindcap_storage::{
	Store, TimeField,
	models::{EchoLink, Entry},
};

/// Discovers temporal and semantic links between a saved entry and its recent neighbours.
pub struct EchoEngine {
	cfg: Echo,
	extractor: KeywordExtractor,
	store: Arc<dyn Store>,
	events: Arc<dyn EventSink>,
}
impl EchoEngine {
	pub fn new(
		cfg: &Echo,
		keywords: &Keywords,
		store: Arc<dyn Store>,
		events: Arc<dyn EventSink>,
	) -> Self {
		Self { cfg: cfg.clone(), extractor: KeywordExtractor::new(keywords), store, events }
	}

	pub fn extractor(&self) -> &KeywordExtractor {
		&self.extractor
	}

	/// Runs discovery for `entry` and returns the persisted links.
	///
	/// Never fails: errors are logged, reported as [`EngineEvent::LinkDiscoveryFailed`], and
	/// yield an empty result. Repeated calls for the same entry append duplicate links.
	pub async fn process_entry(&self, entry: &Entry) -> Vec<EchoLink> {
		self.process_entry_at(entry, OffsetDateTime::now_utc()).await
	}

	pub async fn process_entry_at(&self, entry: &Entry, now: OffsetDateTime) -> Vec<EchoLink> {
		match self.try_process_entry(entry, now).await {
			Ok(links) => links,
			Err(err) => {
				self.report_failure(entry.entry_id, &err);

				Vec::new()
			},
		}
	}

	pub async fn try_process_entry(
		&self,
		entry: &Entry,
		now: OffsetDateTime,
	) -> Result<Vec<EchoLink>> {
		let links = self.scan(entry, now).await?;

		self.persist(entry.entry_id, &links).await?;

		Ok(links)
	}

	/// Loads the candidate window ending at `now` and classifies it without writing anything.
	pub async fn scan(&self, entry: &Entry, now: OffsetDateTime) -> Result<Vec<EchoLink>> {
		let window = Duration::days(i64::from(self.cfg.semantic_window_days));
		let from = now.checked_sub(window).ok_or_else(|| Error::InvalidRequest {
			message: "echo.semantic_window_days reaches before the earliest timestamp.".to_string(),
		})?;
		let candidates = self.store.query_entries_by_time(TimeField::CreatedAt, from, now).await?;

		tracing::debug!(
			entry_id = %entry.entry_id,
			candidates = candidates.len(),
			"Scanning echo link candidates."
		);

		Ok(discover_links(&self.cfg, &self.extractor, entry, &candidates, now))
	}

	pub(crate) fn store(&self) -> &Arc<dyn Store> {
		&self.store
	}

	pub(crate) async fn persist(&self, entry_id: Uuid, links: &[EchoLink]) -> Result<()> {
		if !links.is_empty() {
			self.store.append_links(links).await?;

			tracing::info!(entry_id = %entry_id, links = links.len(), "Echo links persisted.");
		}

		self.events.emit(EngineEvent::LinksDiscovered { entry_id, count: links.len() });

		Ok(())
	}

	pub(crate) fn report_failure(&self, entry_id: Uuid, err: &Error) {
		tracing::warn!(entry_id = %entry_id, error = %err, "Echo link discovery failed.");

		self.events.emit(EngineEvent::LinkDiscoveryFailed { entry_id, message: err.to_string() });
	}
}

/// Classifies every candidate against `entry`.
///
/// A candidate created within the temporal window gets a temporal link and is not checked for
/// keyword overlap. Otherwise it gets a semantic link when it shares at least
/// `min_common_keywords` keywords with `entry`. The entry itself is skipped.
pub fn discover_links(
	cfg: &Echo,
	extractor: &KeywordExtractor,
	entry: &Entry,
	candidates: &[Entry],
	now: OffsetDateTime,
) -> Vec<EchoLink> {
	let temporal_window = Duration::seconds(i64::from(cfg.temporal_window_seconds));
	let min_common = cfg.min_common_keywords as usize;
	let entry_keywords = extractor.extract(&entry.content);
	let mut links = Vec::new();

	for candidate in candidates {
		if candidate.entry_id == entry.entry_id {
			continue;
		}
		if (entry.created_at - candidate.created_at).abs() <= temporal_window {
			links.push(new_link(
				entry.entry_id,
				candidate.entry_id,
				LinkType::Temporal,
				Vec::new(),
				now,
			));

			continue;
		}

		let common = keywords::find_common_keywords(
			&entry_keywords,
			&extractor.extract(&candidate.content),
		);

		if common.len() >= min_common {
			links.push(new_link(entry.entry_id, candidate.entry_id, LinkType::Semantic, common, now));
		}
	}

	links
}

/// Link from a derived entry to the entry it was derived from.
pub fn structural_link(entry_id: Uuid, parent_id: Uuid, now: OffsetDateTime) -> EchoLink {
	new_link(entry_id, parent_id, LinkType::Structural, Vec::new(), now)
}

fn new_link(
	source_id: Uuid,
	target_id: Uuid,
	link_type: LinkType,
	keywords: Vec<String>,
	now: OffsetDateTime,
) -> EchoLink {
	EchoLink {
		link_id: Uuid::new_v4(),
		source_id,
		target_id,
		link_type: link_type.as_str().to_string(),
		strength: link_type.strength(),
		keywords,
		created_at: now,
	}
}
