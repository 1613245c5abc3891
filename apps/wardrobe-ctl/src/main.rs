use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	wardrobe_ctl::run(wardrobe_ctl::Args::parse()).await
}
