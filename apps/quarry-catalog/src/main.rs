use clap::Parser;

use quarry_catalog::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	quarry_catalog::run(args).await
}
