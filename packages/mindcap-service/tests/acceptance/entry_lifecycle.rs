use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::{memory_service, save_request, save_settled};
use mindcap_domain::entropy::DecaySurface;
use mindcap_service::{EditEntryRequest, Error, GetEntryRequest, SaveEntryRequest};
use mindcap_storage::Store;

#[tokio::test]
async fn save_schedules_the_first_review_ten_minutes_out() {
	let (service, store) = memory_service();
	let created_at = OffsetDateTime::now_utc() - Duration::hours(1);
	let response = service
		.save_entry(save_request("task", "  water the plants  ", created_at))
		.await
		.expect("Failed to save entry.");
	let entry = store.get_entry(response.entry_id).await.expect("get").expect("Entry missing.");

	assert_eq!(response.next_review_at, Some(created_at + Duration::minutes(10)));
	assert_eq!(entry.content, "water the plants");
	assert_eq!(entry.review_state, "scheduled");
	assert_eq!(entry.review_count, 0);
	assert_eq!(entry.status, "active");
	assert_eq!(entry.updated_at, entry.created_at);
}

#[tokio::test]
async fn save_rejects_invalid_input() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();

	for request in [
		save_request("note", "deploy server", now),
		save_request("task", "   ", now),
		save_request("task", "deploy server", now + Duration::days(1)),
		SaveEntryRequest {
			kind: "task".to_string(),
			content: "follow-up".to_string(),
			derived_from: Some(Uuid::new_v4()),
			created_at: None,
		},
	] {
		let err = service.save_entry(request).await.expect_err("Expected invalid request.");

		assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");
	}

	assert_eq!(store.count_entries().await.expect("Failed to count entries."), 0);
	assert_eq!(service.tasks.in_flight(), 0);
}

#[tokio::test]
async fn editing_schedules_one_quick_pass_and_rediscovers_links() {
	let (service, store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let first = save_settled(&service, "deploy server tonight", now - Duration::days(10)).await;
	let second = save_settled(&service, "random thoughts", now - Duration::days(5)).await;

	service.mark_reviewed(second).await.expect("Failed to review entry.");

	assert!(store.list_links().await.expect("Failed to list links.").is_empty());

	let before = OffsetDateTime::now_utc();
	let edited = service
		.edit_entry(EditEntryRequest { entry_id: second, content: "server deploy notes".to_string() })
		.await
		.expect("Failed to edit entry.");

	service.wait_idle().await;

	assert_eq!(edited.review_count, 1);
	assert!(edited.updated_at >= before);

	let next_review_at = edited.next_review_at.expect("Edited entry must be scheduled.");

	assert!(next_review_at >= before + Duration::minutes(10));
	assert!(next_review_at <= OffsetDateTime::now_utc() + Duration::minutes(10));

	let links = store.list_links().await.expect("Failed to list links.");

	assert_eq!(links.len(), 1);
	assert_eq!((links[0].source_id, links[0].target_id), (second, first));
	assert_eq!(links[0].link_type, "semantic");

	let reviewed = service.mark_reviewed_at(second, now).await.expect("Failed to review entry.");

	assert_eq!(reviewed.review_count, 2);
	assert_eq!(reviewed.review_state, "finished");
	assert_eq!(reviewed.next_review_at, None);
}

#[tokio::test]
async fn editing_a_missing_entry_is_not_found() {
	let (service, _store) = memory_service();
	let err = service
		.edit_entry(EditEntryRequest { entry_id: Uuid::new_v4(), content: "x y".to_string() })
		.await
		.expect_err("Expected not found.");

	assert!(matches!(err, Error::NotFound { .. }), "Unexpected error: {err:?}");
}

#[tokio::test]
async fn only_tasks_can_be_completed_and_completion_is_stable() {
	let (service, _store) = memory_service();
	let now = OffsetDateTime::now_utc();
	let mood = save_settled(&service, "feeling calm", now).await;
	let err = service.complete_entry(mood).await.expect_err("Mood entries cannot be completed.");

	assert!(matches!(err, Error::InvalidRequest { .. }), "Unexpected error: {err:?}");

	let task = service
		.save_entry(save_request("task", "file taxes", now))
		.await
		.expect("Failed to save entry.")
		.entry_id;
	let first = service.complete_entry(task).await.expect("Failed to complete entry.");
	let second = service.complete_entry(task).await.expect("Failed to complete entry.");

	assert_eq!(first.status, "completed");
	assert_eq!(first.completed_at, second.completed_at);
}

#[tokio::test]
async fn deleting_twice_reports_the_second_as_noop() {
	let (service, _store) = memory_service();
	let entry_id = save_settled(&service, "old note", OffsetDateTime::now_utc()).await;

	assert!(service.delete_entry(entry_id).await.expect("delete").deleted);
	assert!(!service.delete_entry(entry_id).await.expect("delete").deleted);
}

#[tokio::test]
async fn entry_view_reports_visibility_per_surface() {
	let (service, store) = memory_service();
	let created_at = OffsetDateTime::now_utc() - Duration::days(30);
	let entry_id = save_settled(&service, "old memory", created_at).await;
	let entry = store.get_entry(entry_id).await.expect("get").expect("Entry missing.");
	let at = created_at + Duration::days(20);
	let diary = service.entry_view(entry.clone(), DecaySurface::Diary, false, at);
	let focus = service.entry_view(entry.clone(), DecaySurface::Focus, false, at);
	let forced = service.entry_view(entry, DecaySurface::Focus, true, at);

	assert!((diary.visibility - 0.5).abs() < 1e-9);
	assert!((diary.fade.grayscale_pct - 50.0).abs() < 1e-9);
	assert!((diary.fade.opacity - 0.65).abs() < 1e-9);
	assert_eq!(focus.visibility, 0.0);
	assert!((focus.fade.opacity - 0.3).abs() < 1e-9);
	assert_eq!(forced.visibility, 1.0);

	let view = service
		.get_entry(GetEntryRequest { entry_id, surface: DecaySurface::Diary, force_visible: false })
		.await
		.expect("Failed to load entry view.");

	assert!(view.visibility > 0.2 && view.visibility < 0.3);

	let json = serde_json::to_value(&view).expect("Failed to serialize entry view.");

	assert!(json["created_at"].as_str().is_some_and(|raw| raw.ends_with('Z')));
}
