use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{drain, memory_service, observed_service, save_settled};
use mindcap_service::{BookmarkRequest, EngineEvent, Error};
use mindcap_storage::{EntryMutation, Store, memory::MemoryStore, models::Entry};

#[tokio::test]
async fn unbookmarked_entries_finish_after_two_reviews() {
	let (service, _store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let entry_id = save_settled(&service, "stretch", now).await;
	let first = service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");

	assert_eq!(first.review_count, 1);
	assert_eq!(first.review_state, "scheduled");
	assert_eq!(first.next_review_at, Some(now + Duration::hours(24)));

	let second = service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");

	assert_eq!(second.review_count, 2);
	assert_eq!(second.review_state, "finished");
	assert_eq!(second.next_review_at, None);

	let third = service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");

	assert_eq!(third.review_count, 3);
	assert_eq!(third.review_state, "finished");
}

#[tokio::test]
async fn toggling_the_bookmark_restarts_from_the_first_step() {
	let (service, _store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let entry_id = save_settled(&service, "first apartment", now).await;

	service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");
	service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");

	let before = OffsetDateTime::now_utc();
	let bookmarked = service
		.toggle_bookmark(BookmarkRequest {
			entry_id,
			reason: Some("  the day we moved in ".to_string()),
		})
		.await
		.expect("Failed to bookmark entry.");
	let next_review_at = bookmarked.next_review_at.expect("Bookmarked entry must be scheduled.");

	assert!(bookmarked.is_bookmarked);
	assert_eq!(bookmarked.bookmark_reason.as_deref(), Some("the day we moved in"));
	assert_eq!(bookmarked.review_state, "scheduled");
	assert!(next_review_at >= before + Duration::minutes(10));
	assert!(next_review_at <= OffsetDateTime::now_utc() + Duration::minutes(10));

	let third = service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");

	assert_eq!(third.review_count, 3);
	assert_eq!(third.next_review_at, Some(now + Duration::days(30)));

	let before = OffsetDateTime::now_utc();
	let unbookmarked = service
		.toggle_bookmark(BookmarkRequest { entry_id, reason: Some("ignored".to_string()) })
		.await
		.expect("Failed to remove bookmark.");
	let next_review_at =
		unbookmarked.next_review_at.expect("Unbookmarked entry must still get one quick pass.");

	assert!(!unbookmarked.is_bookmarked);
	assert_eq!(unbookmarked.bookmark_reason, None);
	assert_eq!(unbookmarked.review_state, "scheduled");
	assert!(next_review_at >= before + Duration::minutes(10));
	assert!(next_review_at <= OffsetDateTime::now_utc() + Duration::minutes(10));

	let fourth = service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");

	assert_eq!(fourth.review_count, 4);
	assert_eq!(fourth.review_state, "finished");
}

#[tokio::test]
async fn forgotten_entries_are_stale_bookmarks() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let stale = save_settled(&service, "grandpa's garden", now - Duration::days(40)).await;
	let recent = save_settled(&service, "new keyboard", now - Duration::days(40)).await;
	let plain = save_settled(&service, "old receipt", now - Duration::days(40)).await;

	for entry_id in [stale, recent] {
		service
			.toggle_bookmark(BookmarkRequest { entry_id, reason: None })
			.await
			.expect("Failed to bookmark entry.");
	}

	store.update_entry(stale, touched_at(now - Duration::days(30))).await.expect("Failed to age.");
	store.update_entry(recent, touched_at(now - Duration::days(28))).await.expect("Failed to age.");
	store.update_entry(plain, touched_at(now - Duration::days(35))).await.expect("Failed to age.");

	let forgotten = service.forgotten_entries(now).await.expect("Failed to list forgotten entries.");

	assert_eq!(forgotten.iter().map(|view| view.entry_id).collect::<Vec<_>>(), vec![stale]);
	assert_eq!(forgotten[0].visibility, 1.0);

	let later = service
		.forgotten_entries(now + Duration::days(2))
		.await
		.expect("Failed to list forgotten entries.");

	assert_eq!(later.iter().map(|view| view.entry_id).collect::<Vec<_>>(), vec![stale, recent]);
}

#[tokio::test]
async fn reviewing_a_missing_entry_is_not_found() {
	let (service, _store) = memory_service();
	let err = service.mark_reviewed(Uuid::new_v4()).await.expect_err("Expected not found.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn due_entries_lists_only_entries_past_their_review_time() {
	let (service, _store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let overdue = save_settled(&service, "overdue", now - Duration::hours(1)).await;
	let fresh = save_settled(&service, "fresh", now).await;
	let due = service.due_entries(now).await.expect("Failed to list due entries.");

	assert_eq!(due.iter().map(|view| view.entry_id).collect::<Vec<_>>(), vec![overdue]);
	assert!(due[0].visibility > 0.99);

	let later = service
		.due_entries(now + Duration::minutes(10))
		.await
		.expect("Failed to list due entries.");

	assert_eq!(later.len(), 2);
	assert!(later.iter().any(|view| view.entry_id == fresh));
}

#[tokio::test]
async fn schedule_changes_are_reported_as_events() {
	let (service, mut events) = observed_service(Arc::new(MemoryStore::new()));
	let now = OffsetDateTime::now_utc();
	let entry_id = save_settled(&service, "journal", now).await;
	let saved = drain(&mut events);

	assert_eq!(saved[0], EngineEvent::EntrySaved { entry_id });
	assert_eq!(saved[1], EngineEvent::ReviewScheduled {
		entry_id,
		next_review_at: Some(now + Duration::minutes(10)),
	});
	assert!(saved.contains(&EngineEvent::LinksDiscovered { entry_id, count: 0 }));

	service.mark_reviewed_at(entry_id, now).await.expect("Failed to review entry.");

	assert_eq!(drain(&mut events), vec![EngineEvent::ReviewScheduled {
		entry_id,
		next_review_at: Some(now + Duration::hours(24)),
	}]);
}

fn touched_at(updated_at: OffsetDateTime) -> EntryMutation {
	Box::new(move |entry: &mut Entry| {
		entry.updated_at = updated_at;

		Ok(())
	})
}
