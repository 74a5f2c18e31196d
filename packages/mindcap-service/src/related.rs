use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MindcapService, Result};
use mindcap_domain::link::{self, LinkType};
use mindcap_storage::models::EchoLink;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelatedEntry {
	pub entry_id: Uuid,
	pub content: String,
	pub link_types: Vec<LinkType>,
	/// Shared keywords from semantic links.
	pub keywords: Vec<String>,
	/// Sum of the strengths of the distinct links to this entry.
	pub score: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelatedEntriesResponse {
	pub entry_id: Uuid,
	pub related: Vec<RelatedEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphStats {
	pub entry_count: u64,
	pub link_count: usize,
	pub total_strength: i64,
	pub cross_pollination_index: f64,
}

#[derive(Default)]
struct Neighbour {
	link_types: BTreeSet<LinkType>,
	keywords: BTreeSet<String>,
	score: i32,
}

impl MindcapService {
	/// Entries linked to `entry_id` in either direction, strongest first.
	///
	/// Duplicate links count once and links whose other end no longer exists are skipped.
	pub async fn related_entries(&self, entry_id: Uuid) -> Result<RelatedEntriesResponse> {
		self.load_entry(entry_id).await?;

		let links = self.store.list_links_for_entry(entry_id).await?;
		let mut neighbours: BTreeMap<Uuid, Neighbour> = BTreeMap::new();

		for (link, link_type) in distinct_links(&links) {
			let Some(other_id) = link.other_end(entry_id) else {
				continue;
			};
			let neighbour = neighbours.entry(other_id).or_default();

			neighbour.link_types.insert(link_type);
			neighbour.keywords.extend(link.keywords.iter().cloned());

			neighbour.score += link.strength;
		}

		let mut related = Vec::with_capacity(neighbours.len());

		for (other_id, neighbour) in neighbours {
			let Some(other) = self.store.get_entry(other_id).await? else {
				tracing::debug!(
					entry_id = %entry_id,
					other_id = %other_id,
					"Skipping dangling echo link."
				);

				continue;
			};

			related.push(RelatedEntry {
				entry_id: other_id,
				content: other.content,
				link_types: neighbour.link_types.into_iter().collect(),
				keywords: neighbour.keywords.into_iter().collect(),
				score: neighbour.score,
			});
		}

		related.sort_by(|a, b| b.score.cmp(&a.score).then(a.entry_id.cmp(&b.entry_id)));

		Ok(RelatedEntriesResponse { entry_id, related })
	}

	/// Sum of distinct link strengths divided by the number of entries, 0 for an empty store.
	pub async fn cross_pollination_index(&self) -> Result<f64> {
		Ok(self.graph_stats().await?.cross_pollination_index)
	}

	pub async fn graph_stats(&self) -> Result<GraphStats> {
		let entry_count = self.store.count_entries().await?;
		let links = self.store.list_links().await?;
		let distinct = distinct_links(&links);
		let total_strength = distinct.iter().map(|(link, _)| i64::from(link.strength)).sum::<i64>();
		let cross_pollination_index =
			if entry_count == 0 { 0.0 } else { total_strength as f64 / entry_count as f64 };

		Ok(GraphStats {
			entry_count,
			link_count: distinct.len(),
			total_strength,
			cross_pollination_index,
		})
	}
}

/// Keeps the first link per unordered entry pair and link type. Unknown link types are skipped.
fn distinct_links(links: &[EchoLink]) -> Vec<(&EchoLink, LinkType)> {
	let mut seen = HashSet::new();
	let mut out = Vec::with_capacity(links.len());

	for link in links {
		let link_type = match link.link_type.parse::<LinkType>() {
			Ok(link_type) => link_type,
			Err(err) => {
				tracing::warn!(link_id = %link.link_id, error = %err, "Skipping echo link.");

				continue;
			},
		};

		if seen.insert(link::pair_key(link.source_id, link.target_id, link_type)) {
			out.push((link, link_type));
		}
	}

	out
}
