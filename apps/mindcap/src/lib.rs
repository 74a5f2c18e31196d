use std::{path::PathBuf, sync::Arc};

use clap::{
	Parser, Subcommand, ValueEnum,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use serde::Serialize;
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use mindcap_domain::entropy::DecaySurface;
use mindcap_service::{
	BookmarkRequest, EditEntryRequest, GetEntryRequest, MindcapService, SaveEntryRequest,
};
use mindcap_storage::db::Db;

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab", styles = styles())]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Save a new entry.
	Capture {
		content: String,
		#[arg(long, value_parser = ["task", "mood"], default_value = "task")]
		kind: String,
		/// Entry this one was derived from.
		#[arg(long, value_name = "ENTRY_ID")]
		derived_from: Option<Uuid>,
	},
	/// Replace the content of an entry.
	Edit { entry_id: Uuid, content: String },
	/// Mark a task as completed.
	Complete { entry_id: Uuid },
	/// Record one review of an entry.
	Review { entry_id: Uuid },
	/// Toggle the bookmark of an entry.
	Bookmark {
		entry_id: Uuid,
		#[arg(long)]
		reason: Option<String>,
	},
	Delete { entry_id: Uuid },
	/// Show an entry with its current visibility.
	Show {
		entry_id: Uuid,
		#[arg(long, value_enum, default_value_t = Surface::Diary)]
		surface: Surface,
		#[arg(long)]
		force_visible: bool,
	},
	/// List entries due for review.
	Due,
	/// List bookmarked entries that have not been touched in a long time.
	Forgotten,
	/// List entries linked to an entry.
	Related { entry_id: Uuid },
	/// Print link graph statistics.
	Stats,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Surface {
	Diary,
	Focus,
}
impl From<Surface> for DecaySurface {
	fn from(surface: Surface) -> Self {
		match surface {
			Surface::Diary => Self::Diary,
			Surface::Focus => Self::Focus,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = mindcap_config::load(&args.config)?;

	init_tracing(&config)?;

	tracing::debug!(config = %args.config.display(), "Configuration loaded.");

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let service = MindcapService::new(config, Arc::new(db));
	let result = execute(&service, args.command).await;

	// Detached link discovery must land before the process exits.
	service.wait_idle().await;

	result
}

async fn execute(service: &MindcapService, command: Command) -> color_eyre::Result<()> {
	match command {
		Command::Capture { content, kind, derived_from } => print_json(
			&service
				.save_entry(SaveEntryRequest { kind, content, derived_from, created_at: None })
				.await?,
		),
		Command::Edit { entry_id, content } =>
			print_json(&service.edit_entry(EditEntryRequest { entry_id, content }).await?),
		Command::Complete { entry_id } => print_json(&service.complete_entry(entry_id).await?),
		Command::Review { entry_id } => print_json(&service.mark_reviewed(entry_id).await?),
		Command::Bookmark { entry_id, reason } =>
			print_json(&service.toggle_bookmark(BookmarkRequest { entry_id, reason }).await?),
		Command::Delete { entry_id } => print_json(&service.delete_entry(entry_id).await?),
		Command::Show { entry_id, surface, force_visible } => print_json(
			&service
				.get_entry(GetEntryRequest { entry_id, surface: surface.into(), force_visible })
				.await?,
		),
		Command::Due => print_json(&service.due_entries(OffsetDateTime::now_utc()).await?),
		Command::Forgotten =>
			print_json(&service.forgotten_entries(OffsetDateTime::now_utc()).await?),
		Command::Related { entry_id } => print_json(&service.related_entries(entry_id).await?),
		Command::Stats => print_json(&service.graph_stats().await?),
	}
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: Serialize,
{
	println!("{}", serde_json::to_string_pretty(value)?);

	Ok(())
}

fn init_tracing(config: &mindcap_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default() | Effects::BOLD)
		.usage(AnsiColor::Green.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Yellow.on_default())
}
