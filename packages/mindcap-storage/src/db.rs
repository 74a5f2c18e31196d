use sqlx::{PgPool, postgres::PgPoolOptions};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, EntryMutation, Error, Result, Store, TimeField,
	models::{EchoLink, Entry},
	queries, schema, store,
};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &mindcap_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let lock_id: i64 = 6_270_431;
		// Concurrent processes serialize on this lock; it is released at commit.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		tracing::debug!("Database schema is up to date.");

		Ok(())
	}

	async fn update_entry_locked(&self, entry_id: Uuid, mutation: EntryMutation) -> Result<Entry> {
		let mut tx = self.pool.begin().await?;
		let Some(current) = queries::lock_entry(&mut tx, entry_id).await? else {
			return Err(Error::NotFound(format!("entry {entry_id}")));
		};
		let mut next = current.clone();

		mutation(&mut next)?;

		store::validate_entry_mutation(&current, &next)?;
		queries::update_entry(&mut tx, &next).await?;

		tx.commit().await?;

		Ok(next)
	}

	async fn append_links_batch(&self, links: &[EchoLink]) -> Result<()> {
		store::validate_links(links)?;

		let mut tx = self.pool.begin().await?;

		queries::insert_links(&mut tx, links).await?;

		tx.commit().await?;

		Ok(())
	}
}
impl Store for Db {
	fn insert_entry<'a>(&'a self, entry: &'a Entry) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			store::validate_new_entry(entry)?;

			let mut conn = self.pool.acquire().await?;

			queries::insert_entry(&mut conn, entry).await
		})
	}

	fn get_entry<'a>(&'a self, entry_id: Uuid) -> BoxFuture<'a, Result<Option<Entry>>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::get_entry(&mut conn, entry_id).await
		})
	}

	fn update_entry<'a>(
		&'a self,
		entry_id: Uuid,
		mutation: EntryMutation,
	) -> BoxFuture<'a, Result<Entry>> {
		Box::pin(self.update_entry_locked(entry_id, mutation))
	}

	fn delete_entry<'a>(&'a self, entry_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::delete_entry(&mut conn, entry_id).await
		})
	}

	fn query_entries_by_time<'a>(
		&'a self,
		field: TimeField,
		from: OffsetDateTime,
		to: OffsetDateTime,
	) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::query_entries_by_time(&mut conn, field, from, to).await
		})
	}

	fn list_due_entries<'a>(&'a self, now: OffsetDateTime) -> BoxFuture<'a, Result<Vec<Entry>>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::list_due_entries(&mut conn, now).await
		})
	}

	fn count_entries<'a>(&'a self) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::count_entries(&mut conn).await
		})
	}

	fn append_links<'a>(&'a self, links: &'a [EchoLink]) -> BoxFuture<'a, Result<()>> {
		Box::pin(self.append_links_batch(links))
	}

	fn list_links_for_entry<'a>(
		&'a self,
		entry_id: Uuid,
	) -> BoxFuture<'a, Result<Vec<EchoLink>>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::list_links_for_entry(&mut conn, entry_id).await
		})
	}

	fn list_links<'a>(&'a self) -> BoxFuture<'a, Result<Vec<EchoLink>>> {
		Box::pin(async move {
			let mut conn = self.pool.acquire().await?;

			queries::list_links(&mut conn).await
		})
	}
}
