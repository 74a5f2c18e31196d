use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = mindcap::Args::parse();

	mindcap::run(args).await
}
