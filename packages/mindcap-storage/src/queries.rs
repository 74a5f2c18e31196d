use sqlx::{PgConnection, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result, TimeField,
	models::{EchoLink, Entry},
};

const ENTRY_COLUMNS: &str = "\
	entry_id,
	kind,
	content,
	status,
	is_bookmarked,
	bookmark_reason,
	review_count,
	review_state,
	next_review_at,
	created_at,
	updated_at,
	completed_at";

const LINK_COLUMNS: &str = "\
	link_id,
	source_id,
	target_id,
	link_type,
	strength,
	keywords,
	created_at";

pub async fn insert_entry(executor: &mut PgConnection, entry: &Entry) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO entries (
	entry_id,
	kind,
	content,
	status,
	is_bookmarked,
	bookmark_reason,
	review_count,
	review_state,
	next_review_at,
	created_at,
	updated_at,
	completed_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)",
	)
	.bind(entry.entry_id)
	.bind(entry.kind.as_str())
	.bind(entry.content.as_str())
	.bind(entry.status.as_str())
	.bind(entry.is_bookmarked)
	.bind(entry.bookmark_reason.as_deref())
	.bind(entry.review_count)
	.bind(entry.review_state.as_str())
	.bind(entry.next_review_at)
	.bind(entry.created_at)
	.bind(entry.updated_at)
	.bind(entry.completed_at)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn get_entry(executor: &mut PgConnection, entry_id: Uuid) -> Result<Option<Entry>> {
	let sql = format!("SELECT {ENTRY_COLUMNS}\nFROM entries\nWHERE entry_id = $1");
	let row = sqlx::query_as::<_, Entry>(&sql)
		.bind(entry_id)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

/// Loads the entry and holds its row lock until the surrounding transaction ends.
pub async fn lock_entry(executor: &mut PgConnection, entry_id: Uuid) -> Result<Option<Entry>> {
	let sql = format!("SELECT {ENTRY_COLUMNS}\nFROM entries\nWHERE entry_id = $1\nFOR UPDATE");
	let row = sqlx::query_as::<_, Entry>(&sql)
		.bind(entry_id)
		.fetch_optional(&mut *executor)
		.await?;

	Ok(row)
}

pub async fn update_entry(executor: &mut PgConnection, entry: &Entry) -> Result<()> {
	sqlx::query(
		"\
UPDATE entries
SET
	kind = $2,
	content = $3,
	status = $4,
	is_bookmarked = $5,
	bookmark_reason = $6,
	review_count = $7,
	review_state = $8,
	next_review_at = $9,
	updated_at = $10,
	completed_at = $11
WHERE entry_id = $1",
	)
	.bind(entry.entry_id)
	.bind(entry.kind.as_str())
	.bind(entry.content.as_str())
	.bind(entry.status.as_str())
	.bind(entry.is_bookmarked)
	.bind(entry.bookmark_reason.as_deref())
	.bind(entry.review_count)
	.bind(entry.review_state.as_str())
	.bind(entry.next_review_at)
	.bind(entry.updated_at)
	.bind(entry.completed_at)
	.execute(&mut *executor)
	.await?;

	Ok(())
}

pub async fn delete_entry(executor: &mut PgConnection, entry_id: Uuid) -> Result<bool> {
	let result = sqlx::query("DELETE FROM entries WHERE entry_id = $1")
		.bind(entry_id)
		.execute(&mut *executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn query_entries_by_time(
	executor: &mut PgConnection,
	field: TimeField,
	from: OffsetDateTime,
	to: OffsetDateTime,
) -> Result<Vec<Entry>> {
	let column = field.column();
	let sql = format!(
		"SELECT {ENTRY_COLUMNS}\nFROM entries\nWHERE {column} >= $1 AND {column} <= $2\nORDER BY {column}, entry_id"
	);
	let rows = sqlx::query_as::<_, Entry>(&sql)
		.bind(from)
		.bind(to)
		.fetch_all(&mut *executor)
		.await?;

	Ok(rows)
}

pub async fn list_due_entries(
	executor: &mut PgConnection,
	now: OffsetDateTime,
) -> Result<Vec<Entry>> {
	let sql = format!(
		"SELECT {ENTRY_COLUMNS}\nFROM entries\nWHERE review_state = 'scheduled' AND next_review_at <= $1\nORDER BY next_review_at, entry_id"
	);
	let rows = sqlx::query_as::<_, Entry>(&sql).bind(now).fetch_all(&mut *executor).await?;

	Ok(rows)
}

pub async fn count_entries(executor: &mut PgConnection) -> Result<u64> {
	let count: i64 =
		sqlx::query_scalar("SELECT count(*) FROM entries").fetch_one(&mut *executor).await?;

	Ok(count.max(0) as u64)
}

pub async fn insert_links(executor: &mut PgConnection, links: &[EchoLink]) -> Result<()> {
	if links.is_empty() {
		return Ok(());
	}

	let mut builder: QueryBuilder<Postgres> =
		QueryBuilder::new(format!("INSERT INTO echo_links ({LINK_COLUMNS}) "));

	builder.push_values(links, |mut row, link| {
		row.push_bind(link.link_id)
			.push_bind(link.source_id)
			.push_bind(link.target_id)
			.push_bind(link.link_type.clone())
			.push_bind(link.strength)
			.push_bind(link.keywords.clone())
			.push_bind(link.created_at);
	});
	builder.build().execute(&mut *executor).await?;

	Ok(())
}

pub async fn list_links_for_entry(
	executor: &mut PgConnection,
	entry_id: Uuid,
) -> Result<Vec<EchoLink>> {
	let sql = format!(
		"SELECT {LINK_COLUMNS}\nFROM echo_links\nWHERE source_id = $1 OR target_id = $1\nORDER BY created_at, link_id"
	);
	let rows = sqlx::query_as::<_, EchoLink>(&sql).bind(entry_id).fetch_all(&mut *executor).await?;

	Ok(rows)
}

pub async fn list_links(executor: &mut PgConnection) -> Result<Vec<EchoLink>> {
	let sql = format!("SELECT {LINK_COLUMNS}\nFROM echo_links\nORDER BY created_at, link_id");
	let rows = sqlx::query_as::<_, EchoLink>(&sql).fetch_all(&mut *executor).await?;

	Ok(rows)
}
