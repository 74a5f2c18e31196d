use std::sync::Arc;

use time::{Duration, OffsetDateTime};

use super::test_config;
use mindcap_service::{MindcapService, SaveEntryRequest};
use mindcap_storage::{Store, db::Db};
use mindcap_testkit::TestDatabase;

#[tokio::test]
#[ignore = "Requires external Postgres. Set MINDCAP_PG_DSN to run."]
async fn save_discover_and_relate_against_postgres() {
	let Some(base_dsn) = mindcap_testkit::env_dsn() else {
		eprintln!(
			"Skipping save_discover_and_relate_against_postgres; set MINDCAP_PG_DSN to run this test."
		);

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = test_config(test_db.dsn().to_string());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	let pool = db.pool.clone();
	let service = MindcapService::new(cfg, Arc::new(db));
	let now = OffsetDateTime::now_utc();
	let first = service
		.save_entry(SaveEntryRequest {
			kind: "task".to_string(),
			content: "Deploy the server tonight".to_string(),
			derived_from: None,
			created_at: Some(now - Duration::days(10)),
		})
		.await
		.expect("Failed to save entry.")
		.entry_id;

	service.wait_idle().await;

	let second = service
		.save_entry(SaveEntryRequest {
			kind: "mood".to_string(),
			content: "server deploy went fine".to_string(),
			derived_from: Some(first),
			created_at: None,
		})
		.await
		.expect("Failed to save entry.")
		.entry_id;

	service.wait_idle().await;

	let links = service.store.list_links().await.expect("Failed to list links.");
	let mut types = links.iter().map(|link| link.link_type.as_str()).collect::<Vec<_>>();

	types.sort_unstable();

	assert_eq!(types, vec!["semantic", "structural"]);

	let related = service.related_entries(first).await.expect("Failed to load related entries.");

	assert_eq!(related.related.len(), 1);
	assert_eq!(related.related[0].entry_id, second);
	assert_eq!(related.related[0].score, 5);

	let reviewed = service.mark_reviewed(first).await.expect("Failed to review entry.");

	assert_eq!(reviewed.review_count, 1);
	assert!(service.delete_entry(second).await.expect("Failed to delete entry.").deleted);
	assert!(service.store.list_links().await.expect("Failed to list links.").is_empty());

	pool.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
