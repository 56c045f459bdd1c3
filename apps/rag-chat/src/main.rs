use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = rag_chat::Args::parse();

	rag_chat::run(args).await
}
