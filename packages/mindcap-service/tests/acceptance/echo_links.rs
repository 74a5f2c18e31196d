use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use super::{FaultyStore, drain, memory_service, observed_service, save_request, save_settled};
use mindcap_service::{EngineEvent, SaveEntryRequest};
use mindcap_storage::Store;

#[tokio::test]
async fn entries_two_minutes_apart_get_a_temporal_link() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let first = save_settled(&service, "buy milk", now - Duration::minutes(3)).await;
	let second = save_settled(&service, "call grandma", now - Duration::minutes(1)).await;
	let links = store.list_links().await.expect("Failed to list links.");

	assert_eq!(links.len(), 1);
	assert_eq!((links[0].source_id, links[0].target_id), (second, first));
	assert_eq!(links[0].link_type, "temporal");
	assert_eq!(links[0].strength, 1);
}

#[tokio::test]
async fn entries_sharing_two_keywords_get_a_semantic_link() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let first = save_settled(&service, "Deploy the server tonight", now - Duration::days(10)).await;
	let second = save_settled(&service, "server deploy finished!", now).await;
	let links = store.list_links().await.expect("Failed to list links.");

	assert_eq!(links.len(), 1);
	assert_eq!((links[0].source_id, links[0].target_id), (second, first));
	assert_eq!(links[0].link_type, "semantic");
	assert_eq!(links[0].strength, 2);
	assert_eq!(links[0].keywords, vec!["deploy".to_string(), "server".to_string()]);
}

#[tokio::test]
async fn a_single_shared_keyword_is_not_enough() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();

	save_settled(&service, "deploy tonight", now - Duration::days(10)).await;
	save_settled(&service, "deploy tomorrow", now).await;

	assert!(store.list_links().await.expect("Failed to list links.").is_empty());
}

#[tokio::test]
async fn candidates_outside_the_semantic_window_are_ignored() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();

	save_settled(&service, "deploy server", now - Duration::days(91)).await;
	save_settled(&service, "deploy server", now).await;

	assert!(store.list_links().await.expect("Failed to list links.").is_empty());
}

#[tokio::test]
async fn temporal_match_short_circuits_the_semantic_rule() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();

	save_settled(&service, "deploy the server", now - Duration::minutes(2)).await;
	save_settled(&service, "server deploy done", now).await;

	let links = store.list_links().await.expect("Failed to list links.");

	assert_eq!(links.len(), 1);
	assert_eq!(links[0].link_type, "temporal");
	assert!(links[0].keywords.is_empty());
}

#[tokio::test]
async fn derived_entries_always_get_a_structural_link() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let parent = save_settled(&service, "quarterly plan", now - Duration::days(200)).await;
	let response = service
		.save_entry(SaveEntryRequest {
			kind: "task".to_string(),
			content: "book flights".to_string(),
			derived_from: Some(parent),
			created_at: None,
		})
		.await
		.expect("Failed to save derived entry.");

	service.wait_idle().await;

	let links = store.list_links().await.expect("Failed to list links.");

	assert_eq!(links.len(), 1);
	assert_eq!(Some(links[0].link_id), response.structural_link_id);
	assert_eq!((links[0].source_id, links[0].target_id), (response.entry_id, parent));
	assert_eq!(links[0].link_type, "structural");
	assert_eq!(links[0].strength, 3);
}

#[tokio::test]
async fn repeated_direct_processing_appends_duplicates() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();

	save_settled(&service, "buy milk", now - Duration::minutes(1)).await;

	let second = save_settled(&service, "call grandma", now).await;
	let entry = store.get_entry(second).await.expect("get").expect("Entry missing.");
	let first_run = service.engine.process_entry(&entry).await;
	let second_run = service.engine.process_entry(&entry).await;

	assert_eq!(first_run.len(), 1);
	assert_eq!(second_run.len(), 1);
	assert_eq!(store.list_links().await.expect("Failed to list links.").len(), 3);

	let related = service.related_entries(second).await.expect("Failed to load related entries.");

	assert_eq!(related.related.len(), 1);
	assert_eq!(related.related[0].score, 1);
}

#[tokio::test]
async fn concurrent_direct_processing_may_duplicate_links() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let first = save_settled(&service, "deploy the server", now - Duration::days(3)).await;
	let second = save_settled(&service, "server deploy checklist", now).await;
	let entry = store.get_entry(second).await.expect("get").expect("Entry missing.");
	let (left, right) =
		tokio::join!(service.engine.process_entry(&entry), service.engine.process_entry(&entry));

	assert_eq!(left.len(), 1);
	assert_eq!(right.len(), 1);
	assert_ne!(left[0].link_id, right[0].link_id);

	let links = store.list_links().await.expect("Failed to list links.");

	assert_eq!(links.len(), 3);
	assert!(links.iter().all(|link| (link.source_id, link.target_id) == (second, first)));
	assert!(links.iter().all(|link| link.link_type == "semantic"));

	let related = service.related_entries(second).await.expect("Failed to load related entries.");

	assert_eq!(related.related.len(), 1);
	assert_eq!(related.related[0].entry_id, first);
	assert_eq!(related.related[0].score, 2);
}

#[tokio::test]
async fn failing_store_does_not_fail_the_save() {
	let store = Arc::new(FaultyStore::failing_candidates());
	let (service, mut events) = observed_service(store.clone());
	let now = OffsetDateTime::now_utc();
	let response = service
		.save_entry(save_request("task", "deploy server", now))
		.await
		.expect("Save must succeed even when discovery fails.");

	service.wait_idle().await;

	assert!(store.get_entry(response.entry_id).await.expect("get").is_some());
	assert!(store.list_links().await.expect("Failed to list links.").is_empty());

	let events = drain(&mut events);

	assert!(events.contains(&EngineEvent::EntrySaved { entry_id: response.entry_id }));
	assert!(events.iter().any(|event| matches!(
		event,
		EngineEvent::LinkDiscoveryFailed { entry_id, .. } if *entry_id == response.entry_id
	)));
	assert!(!events.iter().any(|event| matches!(event, EngineEvent::LinksDiscovered { .. })));
}

#[tokio::test]
async fn direct_processing_swallows_store_failures() {
	let store = Arc::new(FaultyStore::failing_candidates());
	let (service, mut events) = observed_service(store.clone());
	let response = service
		.save_entry(save_request("mood", "calm evening", OffsetDateTime::now_utc()))
		.await
		.expect("Failed to save entry.");

	service.wait_idle().await;
	drain(&mut events);

	let entry = store.get_entry(response.entry_id).await.expect("get").expect("Entry missing.");
	let links = service.engine.process_entry(&entry).await;

	assert!(links.is_empty());
	assert!(matches!(
		drain(&mut events).as_slice(),
		[EngineEvent::LinkDiscoveryFailed { .. }]
	));
}
